use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use gpay_analyzer::{
    format_amount, pie_slices, Analysis, Category, ClassifiedTransaction, PieSlice,
    TransactionDetail, TransactionRow,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Summary,
    Transactions,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Summary => Page::Transactions,
            Page::Transactions => Page::Summary,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Summary => "Spending by Category",
            Page::Transactions => "Transactions",
        }
    }
}

pub struct App {
    pub analysis: Analysis,
    pub currency_symbol: String,
    pub slices: Vec<PieSlice>,
    pub filtered_transactions: Vec<ClassifiedTransaction>,
    pub active_category: Option<Category>,
    pub state: TableState,
    pub summary_state: TableState,
    pub current_page: Page,
    pub show_detail: bool,
}

impl App {
    pub fn new(analysis: Analysis, currency_symbol: String) -> Self {
        let slices = pie_slices(analysis.aggregation());
        let filtered_transactions = analysis.transactions().to_vec();

        let mut state = TableState::default();
        if !filtered_transactions.is_empty() {
            state.select(Some(0));
        }

        let mut summary_state = TableState::default();
        if !slices.is_empty() {
            summary_state.select(Some(0));
        }

        Self {
            analysis,
            currency_symbol,
            slices,
            filtered_transactions,
            active_category: None,
            state,
            summary_state,
            current_page: Page::Summary,
            show_detail: false,
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_transaction(&self) -> Option<&ClassifiedTransaction> {
        self.state.selected().and_then(|i| self.filtered_transactions.get(i))
    }

    pub fn selected_slice(&self) -> Option<&PieSlice> {
        self.summary_state.selected().and_then(|i| self.slices.get(i))
    }

    /// Drill down into one category (None = all transactions)
    pub fn apply_filter(&mut self, category: Option<Category>) {
        self.active_category = category;

        self.filtered_transactions = match category {
            Some(c) => self.analysis.rows_for_category(c).to_vec(),
            None => self.analysis.transactions().to_vec(),
        };

        // Reset selection to first item
        if !self.filtered_transactions.is_empty() {
            self.state.select(Some(0));
        } else {
            self.state.select(None);
        }
    }

    pub fn open_selected_category(&mut self) {
        if let Some(category) = self.selected_slice().map(|s| s.category) {
            self.apply_filter(Some(category));
            self.current_page = Page::Transactions;
        }
    }

    pub fn clear_filter(&mut self) {
        self.apply_filter(None);
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    fn active_len(&self) -> usize {
        match self.current_page {
            Page::Summary => self.slices.len(),
            Page::Transactions => self.filtered_transactions.len(),
        }
    }

    fn active_state(&mut self) -> &mut TableState {
        match self.current_page {
            Page::Summary => &mut self.summary_state,
            Page::Transactions => &mut self.state,
        }
    }

    pub fn next(&mut self) {
        let len = self.active_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.active_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.active_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = state.selected().map(|i| (i + 20).min(len - 1)).unwrap_or(0);
        state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let state = self.active_state();
        let i = state.selected().map(|i| i.saturating_sub(20)).unwrap_or(0);
        state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
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

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(())
                }
                KeyCode::Enter => match app.current_page {
                    Page::Summary => app.open_selected_category(),
                    Page::Transactions => app.toggle_detail(),
                },
                KeyCode::Tab | KeyCode::BackTab => app.next_page(),
                KeyCode::Char('a') | KeyCode::Char('c') => {
                    app.clear_filter();
                    app.current_page = Page::Transactions;
                }
                KeyCode::Char('1') => {
                    app.apply_filter(Some(Category::Merchant));
                    app.current_page = Page::Transactions;
                }
                KeyCode::Char('2') => {
                    app.apply_filter(Some(Category::Friend));
                    app.current_page = Page::Transactions;
                }
                KeyCode::Char('3') => {
                    app.apply_filter(Some(Category::Stranger));
                    app.current_page = Page::Transactions;
                }
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.active_state().select(Some(0)),
                KeyCode::End => {
                    let len = app.active_len();
                    if len > 0 {
                        app.active_state().select(Some(len - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Summary => render_summary(f, chunks[1], app),
        Page::Transactions if app.show_detail => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Percentage(60), // Transaction list
                    Constraint::Percentage(40), // Detail panel
                ])
                .split(chunks[1]);

            render_table(f, content_chunks[0], app);
            render_detail_panel(f, content_chunks[1], app);
        }
        Page::Transactions => render_table(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn category_color(category: Category) -> Color {
    match category {
        Category::Merchant => Color::Cyan,
        Category::Friend => Color::Yellow,
        Category::Stranger => Color::Magenta,
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Summary, Page::Transactions].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    let aggregation = app.analysis.aggregation();
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Total: {}", aggregation.transaction_count()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format_amount(aggregation.grand_total(), &app.currency_symbol),
        Style::default().fg(Color::Green),
    ));
    if !app.analysis.skipped().is_empty() {
        tab_spans.push(Span::raw("  |  "));
        tab_spans.push(Span::styled(
            format!("⚠ {} skipped", app.analysis.skipped().len()),
            Style::default().fg(Color::Red),
        ));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn render_summary(f: &mut Frame, area: Rect, app: &mut App) {
    let bar_width = 30.0;

    let rows: Vec<Row> = app
        .slices
        .iter()
        .map(|slice| {
            let color = category_color(slice.category);
            let bar = "█".repeat((slice.share * bar_width).round() as usize);

            Row::new(vec![
                Cell::from(slice.category.as_str()).style(Style::default().fg(color)),
                Cell::from(format_amount(slice.total_amount, &app.currency_symbol)),
                Cell::from(format!("{}", slice.count)),
                Cell::from(format!("{:.1}%", slice.share * 100.0)),
                Cell::from(bar).style(Style::default().fg(color)),
            ])
            .height(1)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(16),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Min(10),
        ],
    )
    .header(header_row(&["Category", "Total", "Count", "Share", ""]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Spending by Category (Enter to drill down) "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.summary_state);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let rows: Vec<Row> = app
        .filtered_transactions
        .iter()
        .map(|tx| {
            let row = TransactionRow::new(tx, &app.currency_symbol);
            let color = category_color(row.category);

            Row::new(vec![
                Cell::from(row.display_timestamp),
                Cell::from(truncate(&row.account_name, 30)),
                Cell::from(row.display_amount).style(Style::default().fg(Color::Green)),
                Cell::from(row.category.as_str()).style(Style::default().fg(color)),
            ])
            .height(1)
        })
        .collect();

    let title = match app.active_category {
        Some(c) => format!(" Transactions under: {} ", c),
        None => " All Transactions ".to_string(),
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(24),
            Constraint::Length(32),
            Constraint::Length(14),
            Constraint::Length(10),
        ],
    )
    .header(header_row(&["Date & Time", "Sent To", "Amount", "Type"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let (selected, total) = match app.current_page {
        Page::Summary => (app.summary_state.selected(), app.slices.len()),
        Page::Transactions => (app.state.selected(), app.filtered_transactions.len()),
    };

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected.map(|i| i + 1).unwrap_or(0), total),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(category) = app.active_category {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Filter: {}", category),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("a", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" all)"));
    }

    for (key, label) in [
        ("Enter", " Open | "),
        ("Tab", " Page | "),
        ("1-3", " Category | "),
        ("↑/↓", " Nav | "),
    ] {
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(label));
    }
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Transaction Analysis ");

    let tx = match app.selected_transaction() {
        Some(t) => t,
        None => {
            f.render_widget(Paragraph::new("No transaction selected").block(block), area);
            return;
        }
    };

    let detail = TransactionDetail::new(&app.analysis, tx, &app.currency_symbol);
    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let mut content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Amount: ", label),
            Span::styled(detail.display_amount, Style::default().fg(Color::Green)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Sent To: ", label),
            Span::raw(detail.account_name),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Type: ", label),
            Span::styled(
                detail.category.as_str(),
                Style::default().fg(category_color(detail.category)),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Date & Time: ", label),
            Span::raw(detail.display_timestamp),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  PROVENANCE",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Line Number: ", label),
            Span::styled(detail.line.to_string(), Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![
            Span::styled("  Timestamp: ", label),
            Span::raw(detail.timestamp),
        ]),
    ];

    for field in detail.extra {
        content.push(Line::from(vec![
            Span::styled(format!("  {}: ", field.name), label),
            Span::raw(field.value),
        ]));
    }

    content.push(Line::from(""));
    content.push(Line::from(vec![Span::styled(
        "  Press Enter to close",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )]));

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpay_analyzer::{analyze_bytes, Classifier};

    fn app() -> App {
        let csv = "amount,account_name,timestamp\n\
                   499,Swiggy,2024-01-15T13:45:00\n\
                   1200,Rahul,2024-01-16T09:10:00\n\
                   50,RandomGuy99,2024-01-17T22:05:00\n\
                   20,Zomato,2024-01-18T10:00:00\n";
        let analysis = analyze_bytes(csv.as_bytes(), &Classifier::default()).unwrap();
        App::new(analysis, "₹".to_string())
    }

    #[test]
    fn test_open_selected_category() {
        let mut app = app();

        // Slices are sorted by total: Friend, Merchant, Stranger
        app.next();
        app.open_selected_category();

        assert_eq!(app.current_page, Page::Transactions);
        assert_eq!(app.active_category, Some(Category::Merchant));
        let names: Vec<&str> = app.filtered_transactions.iter().map(|t| t.account_name()).collect();
        assert_eq!(names, vec!["Swiggy", "Zomato"]);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = app();
        app.current_page = Page::Transactions;

        app.previous();
        assert_eq!(app.state.selected(), Some(3));
        app.next();
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_clear_filter_restores_all_rows() {
        let mut app = app();
        app.apply_filter(Some(Category::Stranger));
        assert_eq!(app.filtered_transactions.len(), 1);

        app.clear_filter();
        assert_eq!(app.filtered_transactions.len(), 4);
        assert_eq!(app.active_category, None);
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("Swiggy", 10), "Swiggy");
        assert_eq!(truncate("₹₹₹₹₹₹₹₹", 5), "₹₹...");
    }
}
