use crate::config::SearchConfig;
use crate::error::SearchError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use seoscope_scanner::error_chain;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Prefix of the text returned in place of search results when the provider fails.
pub const SEARCH_ERROR_PREFIX: &str = "Errore nella ricerca: ";

/// Returned by the Serper provider when the response holds nothing usable.
pub const NO_RESULTS_TEXT: &str = "No good Google Search Result was found";

/// Builds the query sent to the search provider for a focus keyword.
pub fn build_search_query(keyword: &str) -> String {
    format!("{} - Principali risultati di ricerca e snippet", keyword)
}

/// A web search backend that answers a query with plain text.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn run(&self, query: &str) -> Result<String, SearchError>;
}

/// Front door for web search.
#[derive(Clone)]
pub struct SearchClient {
    provider: Arc<dyn SearchProvider>,
}

impl SearchClient {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    /// Runs the query, turning any failure into `"Errore nella ricerca: <message>"`.
    pub async fn search(&self, query: &str) -> String {
        match self.try_search(query).await {
            Ok(text) => text,
            Err(e) => {
                let message = error_chain(&e);
                warn!("Search failed for {:?}: {}", query, message);
                format!("{}{}", SEARCH_ERROR_PREFIX, message)
            }
        }
    }

    pub async fn try_search(&self, query: &str) -> Result<String, SearchError> {
        info!("Searching: {}", query);
        let text = self.provider.run(query).await?;
        debug!("Search returned {} chars", text.len());
        Ok(text)
    }
}

// --- Serper (Google Search) ---

pub struct SerperProvider {
    api_key: String,
    client: Client,
    base_url: String,
    num_results: usize,
    gl: String,
    hl: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SerperResponse {
    #[serde(default)]
    answer_box: Option<AnswerBox>,
    #[serde(default)]
    knowledge_graph: Option<KnowledgeGraph>,
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerBox {
    answer: Option<String>,
    snippet: Option<String>,
    snippet_highlighted: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct KnowledgeGraph {
    title: Option<String>,
    #[serde(rename = "type")]
    entity_type: Option<String>,
    description: Option<String>,
    #[serde(default)]
    attributes: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct OrganicResult {
    snippet: Option<String>,
    #[serde(default)]
    attributes: Map<String, Value>,
}

impl SerperProvider {
    pub fn new(api_key: &str, config: &SearchConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            api_key: api_key.to_string(),
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            num_results: config.num_results,
            gl: config.gl.clone(),
            hl: config.hl.clone(),
        })
    }
}

#[async_trait]
impl SearchProvider for SerperProvider {
    async fn run(&self, query: &str) -> Result<String, SearchError> {
        info!(query, num = self.num_results, "Serper search");

        let body = serde_json::json!({
            "q": query,
            "num": self.num_results,
            "gl": self.gl,
            "hl": self.hl,
        });

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status { status, body });
        }

        let raw = response.text().await?;
        let data: SerperResponse =
            serde_json::from_str(&raw).map_err(|e| SearchError::Parse(e.to_string()))?;

        let snippets = collect_snippets(&data, self.num_results);
        info!(query, parts = snippets.len(), "Serper search complete");
        Ok(snippets.join(" "))
    }
}

/// Flattens a Serper payload into text parts.
///
/// A usable answer box short-circuits everything else; otherwise the
/// knowledge graph comes first, followed by up to `limit` organic results.
pub(crate) fn collect_snippets(data: &SerperResponse, limit: usize) -> Vec<String> {
    if let Some(answer_box) = &data.answer_box {
        if let Some(answer) = non_empty(&answer_box.answer) {
            return vec![answer.to_string()];
        }
        if let Some(snippet) = non_empty(&answer_box.snippet) {
            return vec![snippet.replace('\n', " ")];
        }
        if let Some(highlighted) = &answer_box.snippet_highlighted
            && !highlighted.is_empty()
        {
            return highlighted.clone();
        }
    }

    let mut snippets = Vec::new();

    if let Some(graph) = &data.knowledge_graph {
        let title = graph.title.as_deref().unwrap_or_default();
        if let Some(entity_type) = non_empty(&graph.entity_type) {
            snippets.push(format!("{}: {}.", title, entity_type));
        }
        if let Some(description) = non_empty(&graph.description) {
            snippets.push(description.to_string());
        }
        for (attribute, value) in &graph.attributes {
            snippets.push(format!("{} {}: {}.", title, attribute, value_text(value)));
        }
    }

    for result in data.organic.iter().take(limit) {
        if let Some(snippet) = &result.snippet {
            snippets.push(snippet.clone());
        }
        for (attribute, value) in &result.attributes {
            snippets.push(format!("{}: {}.", attribute, value_text(value)));
        }
    }

    if snippets.is_empty() {
        snippets.push(NO_RESULTS_TEXT.to_string());
    }
    snippets
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
