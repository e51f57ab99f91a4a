use crate::app::{Action, App, Clock, Effect, ViewModel};
use crate::config::Settings;
use crate::derive::plural_days;
use crate::task::FilterMode;
use chrono::NaiveDate;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Tabs},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

const CELEBRATION: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
    Adding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Name,
    Description,
    DueDate,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::Name => FormField::Description,
            FormField::Description => FormField::DueDate,
            FormField::DueDate => FormField::Name,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AddForm {
    pub name: String,
    pub description: String,
    pub due_date: String,
    pub field: FormField,
}

impl AddForm {
    fn input(&mut self) -> &mut String {
        match self.field {
            FormField::Name => &mut self.name,
            FormField::Description => &mut self.description,
            FormField::DueDate => &mut self.due_date,
        }
    }

    /// Blank names keep the form open. An unparsable date is dropped.
    fn submit(&mut self) -> Option<Action> {
        if self.name.trim().is_empty() {
            return None;
        }
        let due_date = NaiveDate::parse_from_str(self.due_date.trim(), "%Y-%m-%d").ok();
        let form = std::mem::take(self);
        Some(Action::Add {
            name: form.name,
            description: form.description,
            due_date,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Nothing,
    Quit,
    Dispatch(Action),
}

/// Terminal-only state: what is selected, what is being typed.
#[derive(Debug, Default)]
pub struct Screen {
    pub mode: InputMode,
    pub selected: usize,
    pub form: AddForm,
    celebrate_until: Option<Instant>,
}

impl Screen {
    pub fn celebrate(&mut self, now: Instant) {
        self.celebrate_until = Some(now + CELEBRATION);
    }

    pub fn is_celebrating(&self, now: Instant) -> bool {
        self.celebrate_until.is_some_and(|until| now < until)
    }

    pub fn clamp_selection(&mut self, rows: usize) {
        self.selected = self.selected.min(rows.saturating_sub(1));
    }

    pub fn handle_key(&mut self, key: KeyEvent, view: &ViewModel) -> Command {
        match self.mode {
            InputMode::Normal => self.handle_normal(key, view),
            InputMode::Search => self.handle_search(key, view),
            InputMode::Adding => self.handle_form(key),
        }
    }

    fn handle_normal(&mut self, key: KeyEvent, view: &ViewModel) -> Command {
        let selected_id = view.rows.get(self.selected).map(|row| row.task.id);
        match key.code {
            KeyCode::Char('q') => Command::Quit,
            KeyCode::Char('a') => {
                self.mode = InputMode::Adding;
                Command::Nothing
            }
            KeyCode::Char('/') => {
                self.mode = InputMode::Search;
                Command::Nothing
            }
            KeyCode::Char('f') => Command::Dispatch(Action::SetFilter(view.filter.next())),
            KeyCode::Char('1') => Command::Dispatch(Action::SetFilter(FilterMode::All)),
            KeyCode::Char('2') => Command::Dispatch(Action::SetFilter(FilterMode::Completed)),
            KeyCode::Char('3') => Command::Dispatch(Action::SetFilter(FilterMode::Incomplete)),
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                Command::Nothing
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < view.rows.len() {
                    self.selected += 1;
                }
                Command::Nothing
            }
            KeyCode::Char(' ') | KeyCode::Enter => selected_id
                .map(|id| Command::Dispatch(Action::Toggle(id)))
                .unwrap_or(Command::Nothing),
            KeyCode::Char('d') | KeyCode::Delete => selected_id
                .map(|id| Command::Dispatch(Action::Delete(id)))
                .unwrap_or(Command::Nothing),
            KeyCode::Char('u') => Command::Dispatch(Action::Undo),
            KeyCode::Char('c') if view.reminder.is_some() => {
                Command::Dispatch(Action::MarkReminderComplete)
            }
            KeyCode::Char('x') if view.reminder.is_some() => {
                Command::Dispatch(Action::DismissReminder)
            }
            _ => Command::Nothing,
        }
    }

    fn handle_search(&mut self, key: KeyEvent, view: &ViewModel) -> Command {
        let mut search = view.search.clone();
        match key.code {
            KeyCode::Enter => {
                self.mode = InputMode::Normal;
                return Command::Nothing;
            }
            KeyCode::Esc => {
                self.mode = InputMode::Normal;
                search.clear();
            }
            KeyCode::Backspace => {
                search.pop();
            }
            KeyCode::Char(c) => search.push(c),
            _ => return Command::Nothing,
        }
        self.selected = 0;
        Command::Dispatch(Action::SetSearch(search))
    }

    fn handle_form(&mut self, key: KeyEvent) -> Command {
        match key.code {
            KeyCode::Esc => {
                self.form = AddForm::default();
                self.mode = InputMode::Normal;
            }
            KeyCode::Tab => self.form.field = self.form.field.next(),
            KeyCode::Backspace => {
                self.form.input().pop();
            }
            KeyCode::Enter => {
                if let Some(action) = self.form.submit() {
                    self.mode = InputMode::Normal;
                    return Command::Dispatch(action);
                }
            }
            KeyCode::Char(c) => self.form.input().push(c),
            _ => {}
        }
        Command::Nothing
    }
}

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    settings: &Settings,
) -> io::Result<()> {
    let mut screen = Screen::default();
    loop {
        let clock = Clock::now();
        app.update(Action::Tick, &clock);
        let view = app.view(&clock);
        screen.clamp_selection(view.rows.len());

        terminal.draw(|f| draw(f, &view, &screen, clock.instant))?;

        if !event::poll(settings.tick())? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match screen.handle_key(key, &view) {
                Command::Quit => return Ok(()),
                Command::Dispatch(action) => {
                    let clock = Clock::now();
                    for effect in app.update(action, &clock) {
                        match effect {
                            Effect::Celebrate => screen.celebrate(clock.instant),
                        }
                    }
                }
                Command::Nothing => {}
            }
        }
    }
}

pub fn draw(f: &mut Frame, view: &ViewModel, screen: &Screen, now: Instant) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(1),
            Constraint::Length(6),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(2),
        ])
        .split(f.area());

    f.render_widget(
        Paragraph::new(Span::styled(
            "📝 Task Manager",
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        chunks[0],
    );
    draw_dashboard(f, view, chunks[1]);

    let rate = view.analytics.completion_rate.min(100) as u16;
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(Color::Blue))
        .percent(rate)
        .label(format!("{}% Complete", rate));
    f.render_widget(gauge, chunks[2]);

    let search_style = if screen.mode == InputMode::Search {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let search_text = if view.search.is_empty() && screen.mode != InputMode::Search {
        Span::styled("Search tasks... (/)", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(view.search.as_str())
    };
    f.render_widget(
        Paragraph::new(search_text).block(
            Block::default()
                .title("Search")
                .borders(Borders::ALL)
                .border_style(search_style),
        ),
        chunks[3],
    );

    let selected_tab = FilterMode::ALL
        .iter()
        .position(|m| *m == view.filter)
        .unwrap_or(0);
    let tabs = Tabs::new(vec!["📋 All", "✅ Completed", "🕗 Incomplete"])
        .select(selected_tab)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, chunks[4]);

    draw_tasks(f, view, screen, chunks[5]);
    draw_status(f, view, screen, now, chunks[6]);

    if screen.mode == InputMode::Adding {
        draw_form(f, &screen.form);
    }
}

fn draw_dashboard(f: &mut Frame, view: &ViewModel, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(3), Constraint::Length(3)])
        .split(area);

    let streak = |n: u32| format!("{} {}", n, plural_days(n as i64));
    let cells = [
        [
            ("Total Tasks", view.analytics.total.to_string()),
            ("Completed", view.analytics.completed.to_string()),
            ("Incomplete", view.analytics.incomplete.to_string()),
            ("Completion Rate", format!("{}%", view.analytics.completion_rate)),
        ],
        [
            ("Current Streak", streak(view.streaks.current)),
            ("Longest Streak", streak(view.streaks.longest)),
            ("Due Today", view.due_today.to_string()),
            ("Overdue", view.overdue.to_string()),
        ],
    ];

    for (row_area, row) in rows.iter().zip(cells.iter()) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Percentage(25); 4])
            .split(*row_area);
        for (column, (label, value)) in columns.iter().zip(row.iter()) {
            let cell = Paragraph::new(Span::styled(
                value.as_str(),
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center)
            .block(Block::default().title(*label).borders(Borders::ALL));
            f.render_widget(cell, *column);
        }
    }
}

fn draw_tasks(f: &mut Frame, view: &ViewModel, screen: &Screen, area: Rect) {
    let block = Block::default().title("Tasks").borders(Borders::ALL);
    if view.rows.is_empty() {
        f.render_widget(
            Paragraph::new("No tasks to show.")
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = view
        .rows
        .iter()
        .map(|row| {
            let task = &row.task;
            let overdue = row.due_status.is_some_and(|s| s.is_overdue());
            let name_style = if task.completed {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else if overdue {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::White)
            };

            let mut spans = vec![
                Span::raw(if task.completed { "[x] " } else { "[ ] " }),
                Span::styled(task.name.as_str(), name_style),
            ];
            if !task.description.is_empty() {
                spans.push(Span::styled(
                    format!(" - {}", task.description),
                    Style::default().fg(Color::Gray),
                ));
            }
            if let (Some(due), Some(status)) = (task.due_date, row.due_status) {
                let status_style = if overdue {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default().fg(Color::Yellow)
                };
                spans.push(Span::raw(format!("  (Due: {}) ", due.format("%Y-%m-%d"))));
                spans.push(Span::styled(status.to_string(), status_style));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(screen.selected));
    f.render_stateful_widget(list, area, &mut state);
}

/// Two lines: the reminder banner owns the first so `c`/`x` always act on
/// something visible; transient notices share the second.
fn draw_status(f: &mut Frame, view: &ViewModel, screen: &Screen, now: Instant, area: Rect) {
    let reminder = match &view.reminder {
        Some(reminder) => Line::from(vec![
            Span::styled("Reminder: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("\"{}\" is due soon! ", reminder.name)),
            Span::raw("[c] Mark as Complete [x] Dismiss"),
        ]),
        None => Line::default(),
    };

    let mut notices = Vec::new();
    if screen.is_celebrating(now) {
        notices.push(Span::styled(
            "🎉 Task completed! 🎉 ",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));
    }
    if view.pending_undo.is_some() {
        notices.push(Span::styled("Task deleted ", Style::default().fg(Color::Yellow)));
        notices.push(Span::raw("[u] Undo"));
    }
    let notices = if notices.is_empty() {
        Line::from(Span::styled(
            "[a] add [space] toggle [d] delete [/] search [f] filter [q] quit",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(notices)
    };

    f.render_widget(Paragraph::new(vec![reminder, notices]), area);
}

fn draw_form(f: &mut Frame, form: &AddForm) {
    let area = centered(f.area(), 60, 11);
    f.render_widget(Clear, area);
    let block = Block::default()
        .title("Add Task (Tab next field, Enter save, Esc cancel)")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let fields = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(3); 3])
        .split(inner);
    let entries = [
        (FormField::Name, "Task Name", form.name.as_str()),
        (FormField::Description, "Task Description", form.description.as_str()),
        (FormField::DueDate, "Due date (YYYY-MM-DD)", form.due_date.as_str()),
    ];
    for (area, (field, title, value)) in fields.iter().zip(entries.iter()) {
        let border = if *field == form.field {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        f.render_widget(
            Paragraph::new(*value).block(
                Block::default()
                    .title(*title)
                    .borders(Borders::ALL)
                    .border_style(border),
            ),
            *area,
        );
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
