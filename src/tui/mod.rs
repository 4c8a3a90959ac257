use std::io::{self, stdout};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph},
};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};

use crate::domain::target::{Filter, Snapshot, SuspendChange, TargetStatus};
use crate::error::PulseError;
use crate::fmt::csv;
use crate::services::orchestrator::Monitor;

/// Interactive board state. Reads come from the monitor's snapshot channel;
/// actions are spawned on the runtime and report back through `notices`.
pub struct TuiApp {
    monitor: Arc<Monitor>,
    runtime: Handle,
    snapshots: watch::Receiver<Snapshot>,
    notices_tx: mpsc::UnboundedSender<String>,
    notices_rx: mpsc::UnboundedReceiver<String>,
    pub filter: Filter,
    pub selected: usize,
    pub message: Option<String>,
    pub should_quit: bool,
}

impl TuiApp {
    pub fn new(monitor: Arc<Monitor>, runtime: Handle) -> Self {
        let snapshots = monitor.subscribe();
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();
        Self {
            monitor,
            runtime,
            snapshots,
            notices_tx,
            notices_rx,
            filter: Filter::All,
            selected: 0,
            message: None,
            should_quit: false,
        }
    }

    fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Registry indices of the rows currently shown.
    fn visible(&self, snapshot: &Snapshot) -> Vec<usize> {
        snapshot
            .targets
            .iter()
            .enumerate()
            .filter(|(_, t)| self.filter.matches(t))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn run_cycle(&mut self) {
        if self.monitor.is_running() {
            self.message = Some("A check cycle is already running".into());
            return;
        }
        let monitor = Arc::clone(&self.monitor);
        let notices = self.notices_tx.clone();
        self.runtime.spawn(async move {
            let notice = match monitor.run_cycle().await {
                Ok(report) => format!(
                    "Cycle done: {} online, {} offline in {:.1}s",
                    report.stats.online,
                    report.stats.offline,
                    report.elapsed.as_secs_f64()
                ),
                Err(e) => format!("Cycle not started: {e}"),
            };
            let _ = notices.send(notice);
        });
    }

    pub fn toggle_selected(&mut self) {
        let snapshot = self.snapshot();
        let Some(&index) = self.visible(&snapshot).get(self.selected) else {
            return;
        };
        let monitor = Arc::clone(&self.monitor);
        let notices = self.notices_tx.clone();
        let address = snapshot.targets[index].address().to_string();
        self.runtime.spawn(async move {
            let notice = match monitor.toggle_suspend(index).await {
                Ok(SuspendChange::Suspended) => format!("{address}: maintenance on"),
                Ok(SuspendChange::Resumed(_)) => format!("{address}: maintenance off, re-checked"),
                Err(e) => format!("{address}: {e}"),
            };
            let _ = notices.send(notice);
        });
    }

    pub fn export(&mut self) {
        let snapshot = self.snapshot();
        let path = csv::report_file_name(Local::now().date_naive());
        self.message = Some(match std::fs::write(&path, csv::to_csv(&snapshot.targets)) {
            Ok(()) => format!("Exported {} targets to {path}", snapshot.targets.len()),
            Err(e) => format!("Export failed: {}", PulseError::from(e)),
        });
    }

    pub fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('r') | KeyCode::Char('R') => self.run_cycle(),
            KeyCode::Char('m') | KeyCode::Char('M') => self.toggle_selected(),
            KeyCode::Char('e') | KeyCode::Char('E') => self.export(),
            KeyCode::Char('f') | KeyCode::Char('F') => {
                self.filter = self.filter.next();
                self.selected = 0;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let rows = self.visible(&self.snapshot()).len();
                if self.selected + 1 < rows {
                    self.selected += 1;
                }
            }
            _ => {}
        }
    }

    fn drain_notices(&mut self) {
        while let Ok(notice) = self.notices_rx.try_recv() {
            self.message = Some(notice);
        }
    }
}

pub fn ui(frame: &mut Frame, app: &TuiApp) {
    let snapshot = app.snapshot();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // Progress
            Constraint::Length(3), // Stats
            Constraint::Min(8),    // Board
            Constraint::Length(3), // Help
        ])
        .split(frame.area());

    render_title(frame, chunks[0], &snapshot);
    render_progress(frame, chunks[1], &snapshot);
    render_stats(frame, chunks[2], &snapshot, app.filter);
    render_board(frame, chunks[3], app, &snapshot);
    render_help(frame, chunks[4], app.message.as_deref());
}

fn render_title(frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let title = Paragraph::new(format!("PULSEBOARD - {} probes", snapshot.capability))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, area);
}

fn render_progress(frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let p = snapshot.progress;
    let label = if p.running {
        format!("▶  {} / {} checks completed", p.completed, p.total)
    } else {
        format!("■  Idle - last cycle {} / {}", p.completed, p.total)
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(if p.running { Color::Green } else { Color::DarkGray }))
        .ratio(p.fraction().clamp(0.0, 1.0))
        .label(label);
    frame.render_widget(gauge, area);
}

fn render_stats(frame: &mut Frame, area: Rect, snapshot: &Snapshot, filter: Filter) {
    let stats = snapshot.stats;
    let line = Line::from(vec![
        Span::raw("Online: "),
        Span::styled(
            format!("{}", stats.online),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   Offline: "),
        Span::styled(
            format!("{}", stats.offline),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   Total: "),
        Span::styled(
            format!("{}", stats.total),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   Filter: "),
        Span::styled(filter.as_str(), Style::default().fg(Color::Cyan)),
    ]);
    let widget =
        Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Statistics"));
    frame.render_widget(widget, area);
}

fn render_board(frame: &mut Frame, area: Rect, app: &TuiApp, snapshot: &Snapshot) {
    let items: Vec<ListItem> = app
        .visible(snapshot)
        .into_iter()
        .map(|i| {
            let target = &snapshot.targets[i];
            let (symbol, color) = match target.status() {
                TargetStatus::Online => ("✓", Color::Green),
                TargetStatus::Offline => ("✗", Color::Red),
                TargetStatus::Suspended => ("⏸", Color::Yellow),
                TargetStatus::Pending => ("○", Color::Gray),
            };
            let latency = if target.last_checked_at().is_some() {
                format!("{:>6} ms", target.latency_ms())
            } else {
                "     - ms".to_string()
            };
            let checked = target
                .last_checked_at()
                .map(|ts| DateTime::<Local>::from(ts).format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "--:--:--".to_string());

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{symbol} "),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("{:<45}", target.address()),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!(" {:<22}", snapshot.capability.label(target.status())),
                    Style::default().fg(color),
                ),
                Span::styled(latency, Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!("  {:>3}", target.status_code()),
                    Style::default().fg(Color::Magenta),
                ),
                Span::styled(format!("  {checked}"), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Targets"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_help(frame: &mut Frame, area: Rect, message: Option<&str>) {
    let text = message.unwrap_or(
        "r: Run checks | m: Toggle maintenance | e: Export CSV | f: Filter | ↑↓: Select | q: Quit",
    );
    let help = Paragraph::new(text.to_string())
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, area);
}

/// Run the dashboard until the user quits.
pub fn run_tui(app: &mut TuiApp) -> io::Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_app(&mut terminal, app);

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut TuiApp,
) -> io::Result<()> {
    loop {
        app.drain_notices();
        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.handle_key(key.code);
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
