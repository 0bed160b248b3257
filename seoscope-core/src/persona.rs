// Personas and the per-stage task records sent to the text generator

use crate::llm::GenerationRequest;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three sequential steps of the report pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Analysis,
    Strategy,
    Summary,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Analysis, Stage::Strategy, Stage::Summary];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Analysis => "Analysis",
            Stage::Strategy => "Strategy",
            Stage::Summary => "Summary",
        };
        f.write_str(name)
    }
}

/// A role bound to exactly one stage. Carries no state between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Persona {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub personality: String,
}

impl Persona {
    pub fn keyword_analyst(keyword: &str) -> Self {
        Self {
            role: "SEO Keyword Analyst".to_string(),
            goal: format!(
                "Ricercare su Google le informazioni chiave riguardanti la keyword '{}' e \
                 analizzare snippet e risultati correlati.",
                keyword
            ),
            backstory: "Il SEO Keyword Analyst è un esperto di Search Engine Optimization, \
                        specializzato nell'identificare le keyword rilevanti e nell'analizzare \
                        i risultati di ricerca per capire come i contenuti sono posizionati. \
                        Utilizza Google Serper per estrarre snippet e pattern di query."
                .to_string(),
            personality: "Analitico, orientato ai dati, preciso".to_string(),
        }
    }

    pub fn strategist(keyword: &str) -> Self {
        Self {
            role: "SEO Strategist".to_string(),
            goal: format!(
                "Proporre suggerimenti di contenuto e ottimizzazioni SEO basati sui risultati \
                 di ricerca relativi a '{}'.",
                keyword
            ),
            backstory: "Il SEO Strategist è un consulente specializzato in content marketing e \
                        ottimizzazione per i motori di ricerca. Analizza le keyword principali, \
                        l'intento di ricerca, la struttura dei contenuti nei risultati di Google \
                        e propone strategie di ottimizzazione on-page e di contenuto per \
                        migliorare il ranking."
                .to_string(),
            personality: "Creativo, pragmatico, orientato ai risultati".to_string(),
        }
    }

    pub fn summary_agent() -> Self {
        Self {
            role: "Summary Agent".to_string(),
            goal: "Raccogliere i dati chiave dall'analisi SEO e dalle strategie proposte, \
                   producendo un riepilogo strutturato."
                .to_string(),
            backstory: "Il Summary Agent esamina le uscite degli altri agenti, estrae le \
                        informazioni più rilevanti e produce un riepilogo con punti chiave, \
                        raccomandazioni di contenuto e prossimi step di ottimizzazione."
                .to_string(),
            personality: "Conciso, strutturato e diretto".to_string(),
        }
    }

    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}\nPersonality: {}",
            self.role, self.backstory, self.goal, self.personality
        )
    }
}

/// Immutable request for one stage, built fresh for every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRequest {
    pub stage: Stage,
    pub persona: Persona,
    pub description: String,
    pub expected_output: String,
}

impl StageRequest {
    pub fn analysis(keyword: &str, search_results: &str, audit_string: &str) -> Self {
        let description = format!(
            "Il SEO Keyword Analyst deve raccogliere informazioni chiave sui risultati di \
             ricerca per la keyword:\n\
             '{keyword}'\n\n\
             Risultati di Google Serper (snippet):\n\
             {search_results}\n\n\
             Inoltre, deve analizzare il sito fornito:\n\
             {audit_string}\n\n\
             Richiedi di includere nel report:\n\
             - Principali query correlate (keyword simili o \"people also ask\")\n\
             - Analisi di snippet e meta tag (se disponibili)\n\
             - Struttura dei contenuti (titoli, heading, formati)\n\
             - Eventuali opportunità o gap di contenuto non coperto"
        );
        let expected_output = format!(
            "Report di Analisi SEO per '{keyword}'\n\n\
             Il report dovrebbe includere un'analisi strutturata con:\n\
             - Elenco di keyword correlate\n\
             - Principali osservazioni su snippet e meta tag\n\
             - Potenziali argomenti ancora poco coperti\n\
             - Informazioni raccolte dall'audit del sito"
        );

        Self {
            stage: Stage::Analysis,
            persona: Persona::keyword_analyst(keyword),
            description,
            expected_output,
        }
    }

    /// `analysis_report` is appended under a "Report di Analisi SEO" heading.
    pub fn strategy(keyword: &str, analysis_report: &str) -> Self {
        let description = format!(
            "Il SEO Strategist, basandosi sul report del SEO Keyword Analyst, deve proporre 3-4 \
             strategie concrete per migliorare il posizionamento della keyword '{keyword}' e \
             ottimizzare i contenuti.\n\n\
             Dettagli richiesti:\n\
             - Tipologie di contenuti da creare (blog post, landing page, FAQ)\n\
             - Ottimizzazioni on-page (titoli, meta description, heading)\n\
             - Potenziali link building o collaborazioni\n\
             - Suggerimenti di struttura e formattazione\
             \n\nReport di Analisi SEO:\n\
             {analysis_report}"
        );
        let expected_output = format!(
            "Strategia SEO per '{keyword}'\n\n\
             Il report dovrebbe includere:\n\
             - Lista di contenuti raccomandati con formati e argomenti\n\
             - Suggerimenti di ottimizzazione (on-page e off-page)\n\
             - Priorità di implementazione e metriche di successo"
        );

        Self {
            stage: Stage::Strategy,
            persona: Persona::strategist(keyword),
            description,
            expected_output,
        }
    }

    /// Both prior reports are appended, combined by [`combined_report`].
    pub fn summary(keyword: &str, analysis_report: &str, strategy_report: &str) -> Self {
        let full_report = combined_report(analysis_report, strategy_report);
        let description = format!(
            "Il Summary Agent deve raccogliere le uscite dei task di Analisi SEO e Strategie, \
             e produrre un riepilogo finale che evidenzi:\n\
             - Le principali keyword e query correlate\n\
             - Le strategie proposte e i relativi potenziali impatti\n\
             - Un elenco di raccomandazioni chiave e prossimi step\
             \n\nReport Completo:\n\
             {full_report}"
        );
        let expected_output = format!(
            "Riepilogo Finale per '{keyword}'\n\n\
             Il riepilogo deve includere bullet points con i principali insight e un breve \
             paragrafo conclusivo su come procedere con l'ottimizzazione."
        );

        Self {
            stage: Stage::Summary,
            persona: Persona::summary_agent(),
            description,
            expected_output,
        }
    }

    pub fn user_prompt(&self) -> String {
        format!(
            "Current Task: {}\n\n\
             This is the expected criteria for your final answer: {}\n\
             You MUST return the actual complete content as the final answer, not a summary.",
            self.description, self.expected_output
        )
    }

    pub fn to_generation_request(&self, temperature: f32) -> GenerationRequest {
        GenerationRequest {
            system: self.persona.system_prompt(),
            prompt: self.user_prompt(),
            temperature,
        }
    }
}

/// Text handed to the summary stage: both reports under their headings.
pub fn combined_report(analysis_report: &str, strategy_report: &str) -> String {
    format!(
        "Report di Analisi SEO:\n{}\n\nStrategia SEO:\n{}\n\n",
        analysis_report, strategy_report
    )
}
