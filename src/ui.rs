use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use group_savings::{Group, Member, SavingsLedger, SnapshotStore};
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
    Members,
    Tiers,
    Summary,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Members => Page::Tiers,
            Page::Tiers => Page::Summary,
            Page::Summary => Page::Members,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Members => Page::Summary,
            Page::Tiers => Page::Members,
            Page::Summary => Page::Tiers,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Members => "Members",
            Page::Tiers => "Tiers",
            Page::Summary => "Summary",
        }
    }
}

pub struct App {
    pub ledger: SavingsLedger,
    pub group: Group,
    pub store: SnapshotStore,
    pub state: TableState,
    pub tiers_state: TableState,
    pub current_page: Page,
    pub show_detail: bool,
    pub status: Option<String>,
}

impl App {
    pub fn new(ledger: SavingsLedger, group: Group, store: SnapshotStore) -> Self {
        let mut state = TableState::default();
        if !group.members.is_empty() {
            state.select(Some(0));
        }

        let mut tiers_state = TableState::default();
        tiers_state.select(Some(0));

        Self {
            ledger,
            group,
            store,
            state,
            tiers_state,
            current_page: Page::Members,
            show_detail: false,
            status: None,
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_member(&self) -> Option<&Member> {
        self.state
            .selected()
            .and_then(|i| self.group.members.get(i))
    }

    /// One compounding step; the returned snapshot replaces the old one and
    /// is persisted immediately
    pub fn advance_week(&mut self) {
        self.group = self.ledger.advance_week(&self.group);
        self.persist();
        self.status = Some(format!("Advanced to week {}", self.group.current_week));
    }

    /// Withdraw the selected member and persist the result
    pub fn withdraw_selected(&mut self) {
        let (member_id, member_name) = match self.selected_member() {
            Some(m) => (m.id.clone(), m.name.clone()),
            None => {
                self.status = Some("No member selected".to_string());
                return;
            }
        };

        let (group, withdrawn) = self.ledger.withdraw(&self.group, &member_id);
        self.group = group;
        self.persist();
        self.status = Some(format!("{} withdrew {:.2}", member_name, withdrawn));

        // Keep the selection in range after removal
        let len = self.group.members.len();
        if len == 0 {
            self.state.select(None);
        } else if self.state.selected().map_or(true, |i| i >= len) {
            self.state.select(Some(len - 1));
        }
        self.show_detail = false;
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.group) {
            self.status = Some(format!("Save failed: {}", e));
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn next(&mut self) {
        let len = self.group.members.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.group.members.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
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
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::Char('w') => app.advance_week(),
                KeyCode::Char('x') if app.current_page == Page::Members => {
                    app.withdraw_selected()
                }
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Home => app.state.select(Some(0)),
                KeyCode::End => {
                    if !app.group.members.is_empty() {
                        app.state.select(Some(app.group.members.len() - 1));
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

    // Header with page navigation
    render_header(f, chunks[0], app);

    // Content area with optional split for detail panel
    if app.show_detail && app.current_page == Page::Members {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(60), // Member list
                Constraint::Percentage(40), // Detail panel
            ])
            .split(chunks[1]);

        render_members(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::Members => render_members(f, chunks[1], app),
            Page::Tiers => render_tiers(f, chunks[1], app),
            Page::Summary => render_summary(f, chunks[1], app),
        }
    }

    // Status bar
    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let totals = app.ledger.aggregate(&app.group);

    let pages = [Page::Members, Page::Tiers, Page::Summary];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
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

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Week {}", app.group.current_week),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("{} members", app.group.member_count()),
        Style::default().fg(Color::Cyan),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Withdrawable {:.2}", totals.total_withdrawable),
        Style::default().fg(Color::Green),
    ));

    let header_text = vec![Line::from(tab_spans)];

    let header = Paragraph::new(header_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_members(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Name", "Tier", "Balance", "Interest", "Weeks", "Joined"]
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

    let rows = app.group.members.iter().map(|member| {
        let tier_name = app
            .ledger
            .catalog()
            .lookup(member.tier_id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| format!("? ({})", member.tier_id));

        let cells = vec![
            Cell::from(truncate(&member.name, 24)),
            Cell::from(tier_name),
            Cell::from(format!("{:.2}", member.current_balance))
                .style(Style::default().fg(Color::Green)),
            Cell::from(format!("{:.2}", member.accumulated_interest))
                .style(Style::default().fg(Color::Cyan)),
            Cell::from(format!("{}", member.weeks_participated)),
            Cell::from(member.joined_at.format("%Y-%m-%d").to_string()),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(26),
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(7),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Members "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_tiers(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Id", "Name", "Principal", "Weekly Rate"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.ledger.catalog().all_tiers().iter().map(|tier| {
        let cells = vec![
            Cell::from(format!("{}", tier.id)),
            Cell::from(tier.name.clone()),
            Cell::from(format!("{:.2}", tier.amount)).style(Style::default().fg(Color::Green)),
            Cell::from(format!("{}%", tier.weekly_interest_rate))
                .style(Style::default().fg(Color::Cyan)),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(20),
            Constraint::Length(14),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Tier Catalog "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.tiers_state);
}

fn render_summary(f: &mut Frame, area: Rect, app: &App) {
    let totals = app.ledger.aggregate(&app.group);

    let content = vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Group Summary",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Current week:       ", Style::default().fg(Color::Cyan)),
            Span::styled(
                format!("{}", app.group.current_week),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("  Members:            ", Style::default().fg(Color::Cyan)),
            Span::styled(
                format!("{}", app.group.member_count()),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Total contributed:  ", Style::default().fg(Color::Cyan)),
            Span::styled(
                format!("{:.2}", totals.total_contributed),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("  Total interest:     ", Style::default().fg(Color::Cyan)),
            Span::styled(
                format!("{:.2}", totals.total_interest),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(vec![
            Span::styled("  Total withdrawable: ", Style::default().fg(Color::Cyan)),
            Span::styled(
                format!("{:.2}", totals.total_withdrawable),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  Hint: ",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::ITALIC),
            ),
            Span::styled(
                "press ",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ),
            Span::styled(
                "w",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::ITALIC),
            ),
            Span::styled(
                " to advance the week from any page",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ),
        ]),
    ];

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Summary "),
    );

    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.group.members.len();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(status) = &app.status {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            status.clone(),
            Style::default().fg(Color::Green),
        ));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("w", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Week | "));
    status_spans.push(Span::styled("x", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Withdraw | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Details | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_text = vec![Line::from(status_spans)];

    let status_bar = Paragraph::new(status_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let member = match app.selected_member() {
        Some(m) => m,
        None => {
            let no_selection = Paragraph::new("No member selected").block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" Member Details "),
            );
            f.render_widget(no_selection, area);
            return;
        }
    };

    let tier_label = match app.ledger.catalog().lookup(member.tier_id) {
        Some(t) => format!(
            "{} ({:.2} @ {}%/week)",
            t.name, t.amount, t.weekly_interest_rate
        ),
        None => format!("unknown tier {}", member.tier_id),
    };

    let content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  Name: ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(&member.name),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  Tier: ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(tier_label),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  Balance: ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("{:.2}", member.current_balance),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  Interest: ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("{:.2}", member.accumulated_interest),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  Weeks participated: ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("{}", member.weeks_participated)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  Joined: ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(member.joined_at.format("%Y-%m-%d %H:%M UTC").to_string()),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  Member id: ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(&member.id, Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(vec![
            Span::styled(
                "  Owner ref: ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(&member.owner_ref, Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Press Enter to close, x to withdraw",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]),
    ];

    let detail_panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Member Details "),
    );

    f.render_widget(detail_panel, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}
