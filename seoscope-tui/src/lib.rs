use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
};
use seoscope_core::{PipelineReport, StageOutcome};
use std::io;

const SCROLL_STEP: usize = 10;

/// One tab of the viewer: a stage report with a collapsible body.
#[derive(Debug, Clone)]
pub struct ReportTab {
    pub title: String,
    pub heading: String,
    pub body: Vec<String>,
    pub expanded: bool,
    pub succeeded: bool,
    scroll: usize,
}

impl ReportTab {
    fn new(title: impl Into<String>, heading: impl Into<String>, outcome: &StageOutcome) -> Self {
        Self {
            title: title.into(),
            heading: heading.into(),
            body: outcome.text.lines().map(str::to_string).collect(),
            expanded: true,
            succeeded: outcome.succeeded,
            scroll: 0,
        }
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }
}

pub struct App {
    keyword: String,
    url: Option<String>,
    generated_at: String,
    tabs: Vec<ReportTab>,
    selected: usize,
    should_quit: bool,
    /// Inner size of the report body at the last draw; zero until drawn.
    viewport: (u16, u16),
}

impl App {
    /// Summary tab first, then one tab per detail stage.
    pub fn from_report(report: &PipelineReport) -> Self {
        let mut tabs = vec![ReportTab::new(
            "Riepilogo Finale",
            "Report Finale",
            &report.output.summary,
        )];
        for outcome in report.output.detail_stages() {
            tabs.push(ReportTab::new(
                outcome.role.clone(),
                format!("{} Report", outcome.role),
                outcome,
            ));
        }

        Self {
            keyword: report.keyword.clone(),
            url: report.url.clone(),
            generated_at: report.generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            tabs,
            selected: 0,
            should_quit: false,
            viewport: (0, 0),
        }
    }

    pub fn tabs(&self) -> &[ReportTab] {
        &self.tabs
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_tab(&self) -> &ReportTab {
        &self.tabs[self.selected]
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn next_tab(&mut self) {
        self.selected = (self.selected + 1) % self.tabs.len();
    }

    pub fn previous_tab(&mut self) {
        self.selected = (self.selected + self.tabs.len() - 1) % self.tabs.len();
    }

    pub fn toggle_selected(&mut self) {
        let tab = &mut self.tabs[self.selected];
        tab.expanded = !tab.expanded;
        tab.scroll = 0;
    }

    /// Largest scroll offset that still fills the body with the report's
    /// wrapped rows. Before the first draw the width is unknown, so each
    /// logical line counts as one row.
    pub fn max_scroll(&self) -> usize {
        let tab = self.selected_tab();
        if !tab.expanded {
            return 0;
        }
        let (width, height) = self.viewport;
        if width == 0 {
            return tab.body.len().saturating_sub(1);
        }
        body_paragraph(tab)
            .line_count(width)
            .saturating_sub(usize::from(height))
    }

    pub fn scroll_down(&mut self, lines: usize) {
        let max = self.max_scroll();
        let tab = &mut self.tabs[self.selected];
        if tab.expanded {
            tab.scroll = tab.scroll.saturating_add(lines).min(max);
        }
    }

    pub fn scroll_up(&mut self, lines: usize) {
        let tab = &mut self.tabs[self.selected];
        tab.scroll = tab.scroll.saturating_sub(lines);
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Right | KeyCode::Tab => self.next_tab(),
            KeyCode::Left | KeyCode::BackTab => self.previous_tab(),
            KeyCode::Enter => self.toggle_selected(),
            KeyCode::Down => self.scroll_down(1),
            KeyCode::Up => self.scroll_up(1),
            KeyCode::PageDown => self.scroll_down(SCROLL_STEP),
            KeyCode::PageUp => self.scroll_up(SCROLL_STEP),
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }
}

/// Shows `report` in the tabbed viewer until the user quits.
pub fn run(report: &PipelineReport) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::from_report(report);
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            // Only process KeyPress events, ignore KeyRelease
            if key.kind != KeyEventKind::Press {
                continue;
            }
            app.handle_key(key.code);
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn body_paragraph(tab: &ReportTab) -> Paragraph<'static> {
    let body: Vec<Line> = if tab.expanded {
        tab.body.iter().map(|line| Line::from(line.clone())).collect()
    } else {
        vec![Line::from(Span::styled(
            "Premi Invio per visualizzare il report",
            Style::default().fg(Color::DarkGray),
        ))]
    };
    Paragraph::new(body).wrap(Wrap { trim: false })
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Length(3), // Tabs
            Constraint::Min(3),    // Report body
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", app.keyword),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(app.url.as_deref().unwrap_or("-").to_string()),
        Span::styled(
            format!("  {}", app.generated_at),
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    f.render_widget(header, chunks[0]);

    let titles: Vec<Line> = app
        .tabs
        .iter()
        .map(|tab| {
            let style = if tab.succeeded {
                Style::default()
            } else {
                Style::default().fg(Color::Yellow)
            };
            Line::from(Span::styled(tab.title.clone(), style))
        })
        .collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL))
        .select(app.selected)
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        );
    f.render_widget(tabs, chunks[1]);

    let inner = Block::default().borders(Borders::ALL).inner(chunks[2]);
    app.viewport = (inner.width, inner.height);
    let max = app.max_scroll();
    let selected = app.selected;
    let tab = &mut app.tabs[selected];
    tab.scroll = tab.scroll.min(max);

    let marker = if tab.expanded { "▼" } else { "▶" };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} {} ", marker, tab.heading));
    let offset = u16::try_from(tab.scroll).unwrap_or(u16::MAX);
    let content = body_paragraph(tab).block(block).scroll((offset, 0));
    f.render_widget(content, chunks[2]);

    let status = Paragraph::new(Line::from(vec![
        Span::styled("←→", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" tabs | "),
        Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" expand/collapse | "),
        Span::styled("PgUp/PgDn", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" scroll | "),
        Span::styled("q", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" quit | Fine Analisi"),
    ]))
    .style(Style::default().fg(Color::DarkGray));
    f.render_widget(status, chunks[3]);
}
