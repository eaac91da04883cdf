use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use expense_ledger::{format_amount, Category, ExpenseInput, Ledger, LedgerError, Persistence};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use tracing::error;

const EMPTY_MESSAGE: &str = "No expenses yet. Add one above!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Description,
    Amount,
    Category,
    List,
}

impl Focus {
    pub fn next(&self) -> Self {
        match self {
            Focus::Description => Focus::Amount,
            Focus::Amount => Focus::Category,
            Focus::Category => Focus::List,
            Focus::List => Focus::Description,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Focus::Description => Focus::List,
            Focus::Amount => Focus::Description,
            Focus::Category => Focus::Amount,
            Focus::List => Focus::Category,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Focus::Description => "Description",
            Focus::Amount => "Amount",
            Focus::Category => "Category",
            Focus::List => "Expenses",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

impl StatusMessage {
    fn info(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: false }
    }

    fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: true }
    }
}

pub struct App<P: Persistence> {
    pub ledger: Ledger<P>,
    pub currency: String,
    pub description: String,
    pub amount: String,
    pub category: Category,
    pub focus: Focus,
    pub state: TableState,
    pub status: Option<StatusMessage>,
}

impl<P: Persistence> App<P> {
    pub fn new(ledger: Ledger<P>, currency: String) -> Self {
        let mut state = TableState::default();
        if !ledger.is_empty() {
            state.select(Some(0));
        }

        Self {
            ledger,
            currency,
            description: String::new(),
            amount: String::new(),
            category: Category::default(),
            focus: Focus::Description,
            state,
            status: None,
        }
    }

    /// Both text fields filled in.
    pub fn can_submit(&self) -> bool {
        !self.description.trim().is_empty() && !self.amount.trim().is_empty()
    }

    pub fn submit(&mut self) {
        if !self.can_submit() {
            self.status = Some(StatusMessage::error("Description and amount are required"));
            return;
        }

        let input = ExpenseInput::new(self.description.clone(), self.amount.clone(), self.category);
        match self.ledger.add_expense(&input) {
            Ok(record) => {
                self.status = Some(StatusMessage::info(format!("Added {}", record.description)));
                // Category stays selected for the next entry
                self.description.clear();
                self.amount.clear();
                self.focus = Focus::Description;
                self.state.select(Some(0));
            }
            Err(LedgerError::Input(reason)) => {
                self.status = Some(StatusMessage::error(capitalize(&reason.to_string())));
            }
            Err(err) => {
                error!(%err, "Failed to save expense");
                self.status = Some(StatusMessage::error(format!("Could not save: {}", err)));
            }
        }
    }

    pub fn delete_selected(&mut self) {
        let id = match self.state.selected().and_then(|i| self.ledger.records().get(i)) {
            Some(record) => record.id.clone(),
            None => return,
        };

        match self.ledger.delete_expense(&id) {
            Ok(Some(record)) => {
                self.status = Some(StatusMessage::info(format!("Deleted {}", record.description)));
            }
            Ok(None) => {}
            Err(err) => {
                error!(%err, "Failed to save after delete");
                self.status = Some(StatusMessage::error(format!("Could not save: {}", err)));
            }
        }

        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.ledger.len();
        if len == 0 {
            self.state.select(None);
        } else if let Some(i) = self.state.selected() {
            if i >= len {
                self.state.select(Some(len - 1));
            }
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn next(&mut self) {
        let len = self.ledger.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.ledger.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    fn push_char(&mut self, c: char) {
        match self.focus {
            Focus::Description => self.description.push(c),
            Focus::Amount if accepts_amount_char(&self.amount, c) => self.amount.push(c),
            _ => {}
        }
    }

    fn pop_char(&mut self) {
        match self.focus {
            Focus::Description => {
                self.description.pop();
            }
            Focus::Amount => {
                self.amount.pop();
            }
            _ => {}
        }
    }

    /// Apply one key press. Returns true when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }

        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::BackTab => self.focus = self.focus.previous(),
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.focus = self.focus.previous();
                } else {
                    self.focus = self.focus.next();
                }
            }
            _ if self.focus == Focus::List => return self.handle_list_key(key),
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => self.pop_char(),
            KeyCode::Left if self.focus == Focus::Category => self.category = self.category.previous(),
            KeyCode::Right | KeyCode::Char(' ') if self.focus == Focus::Category => {
                self.category = self.category.next()
            }
            KeyCode::Char(c) => self.push_char(c),
            _ => {}
        }

        false
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Home => {
                if !self.ledger.is_empty() {
                    self.state.select(Some(0));
                }
            }
            KeyCode::End => {
                if !self.ledger.is_empty() {
                    self.state.select(Some(self.ledger.len() - 1));
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected(),
            _ => {}
        }
        false
    }
}

/// Numeric input with a 0.01 step: digits, one dot, at most two decimals.
fn accepts_amount_char(current: &str, c: char) -> bool {
    match c {
        '0'..='9' => match current.split_once('.') {
            Some((_, fraction)) => fraction.len() < 2,
            None => true,
        },
        '.' => !current.contains('.'),
        _ => false,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn run_ui<P: Persistence>(app: &mut App<P>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend, P: Persistence>(
    terminal: &mut Terminal<B>,
    app: &mut App<P>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui<P: Persistence>(f: &mut Frame, app: &mut App<P>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Summary
            Constraint::Length(3), // Entry form
            Constraint::Min(0),    // Expense list
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_summary(f, chunks[0], app);
    render_form(f, chunks[1], app);
    render_table(f, chunks[2], app);
    render_status_bar(f, chunks[3], app);
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_summary<P: Persistence>(f: &mut Frame, area: Rect, app: &App<P>) {
    let total_line = Line::from(vec![
        Span::styled("Total Expenses  ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(
            format_amount(app.ledger.total(), &app.currency),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
    ]);

    let mut bucket_spans = vec![];
    for (i, (category, amount)) in app.ledger.totals_by_category().iter().enumerate() {
        if i > 0 {
            bucket_spans.push(Span::raw(" │ "));
        }
        bucket_spans.push(Span::styled(category.as_str(), Style::default().fg(Color::Yellow)));
        bucket_spans.push(Span::raw(" "));
        bucket_spans.push(Span::raw(format_amount(amount, &app.currency)));
    }

    let summary = Paragraph::new(vec![total_line, Line::from(bucket_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Expense Tracker "),
    );

    f.render_widget(summary, area);
}

fn render_form<P: Persistence>(f: &mut Frame, area: Rect, app: &App<P>) {
    let fields = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Percentage(20),
            Constraint::Percentage(30),
        ])
        .split(area);

    let text_field = |value: &str, placeholder: &str, focus: Focus| {
        let text = if value.is_empty() {
            Span::styled(placeholder.to_string(), Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(value.to_string())
        };
        Paragraph::new(Line::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(app.focus == focus))
                .title(format!(" {} ", focus.title())),
        )
    };

    f.render_widget(text_field(&app.description, "What was it?", Focus::Description), fields[0]);
    f.render_widget(text_field(&app.amount, "0.00", Focus::Amount), fields[1]);

    let selector = Paragraph::new(Line::from(vec![
        Span::styled("◀ ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.category.as_str(), Style::default().fg(Color::Yellow)),
        Span::styled(" ▶", Style::default().fg(Color::DarkGray)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focus_style(app.focus == Focus::Category))
            .title(format!(" {} ", Focus::Category.title())),
    );
    f.render_widget(selector, fields[2]);

    // Cursor at the end of the focused text field
    let (value, field) = match app.focus {
        Focus::Description => (&app.description, fields[0]),
        Focus::Amount => (&app.amount, fields[1]),
        _ => return,
    };
    if let Some((x, y)) = cursor_position(field, value) {
        f.set_cursor(x, y);
    }
}

/// Cell just past the text inside a bordered field, or None once the text
/// no longer fits.
fn cursor_position(field: Rect, value: &str) -> Option<(u16, u16)> {
    let typed = u16::try_from(value.chars().count()).unwrap_or(u16::MAX);
    let x = field.x.saturating_add(1).saturating_add(typed);
    let right_border = field.x.saturating_add(field.width.saturating_sub(1));
    (x < right_border).then(|| (x, field.y.saturating_add(1)))
}

fn render_table<P: Persistence>(f: &mut Frame, area: Rect, app: &mut App<P>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(app.focus == Focus::List))
        .title(format!(" {} ({}) ", Focus::List.title(), app.ledger.len()));

    if app.ledger.is_empty() {
        let empty = Paragraph::new(Span::styled(
            EMPTY_MESSAGE,
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let header_cells = ["Description", "Category", "Date", "Amount"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.ledger.records().iter().map(|record| {
        let cells = vec![
            Cell::from(truncate(&record.description, 40)),
            Cell::from(record.category.as_str()),
            Cell::from(record.date.format("%Y-%m-%d").to_string()),
            Cell::from(format_amount(record.amount, &app.currency)).style(Style::default().fg(Color::Red)),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(15),
            Constraint::Length(12),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(block)
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar<P: Persistence>(f: &mut Frame, area: Rect, app: &App<P>) {
    let mut status_spans = vec![];

    if let Some(status) = &app.status {
        let color = if status.is_error { Color::Red } else { Color::Green };
        status_spans.push(Span::styled(format!(" {} ", status.text), Style::default().fg(color)));
        status_spans.push(Span::raw(" | "));
    }

    let hints: &[(&str, &str)] = match app.focus {
        Focus::List => &[("↑/↓", " Nav | "), ("d", " Delete | "), ("Tab", " Form | "), ("q", " Quit")],
        Focus::Category => &[("←/→", " Category | "), ("Enter", " Add | "), ("Tab", " Next | "), ("Esc", " Quit")],
        _ => &[("Enter", " Add | "), ("Tab", " Next | "), ("Esc", " Quit")],
    };
    for (key, label) in hints {
        status_spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(*label));
    }

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
