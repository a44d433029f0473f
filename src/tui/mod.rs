mod help;

use crate::cli::{build_config, Cli};
use crate::config::FooterInfo;
use crate::orchestrator::{PollSchedule, ProgressController, UiState};
use crate::runner::TaskRunner;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Terminal,
};
use std::{io, time::Duration, time::Instant};

/// Presentation-only state; everything about the task lives in `UiState`.
#[derive(Debug, Default)]
struct View {
    show_help: bool,
    footer: FooterInfo,
}

/// Button actions the key map can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Start,
    Cancel,
    ToggleHelp,
    Quit,
}

fn action_for_key(modifiers: KeyModifiers, code: KeyCode) -> Option<Action> {
    match (modifiers, code) {
        (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
            Some(Action::Quit)
        }
        (_, KeyCode::Char('s')) | (_, KeyCode::Enter) => Some(Action::Start),
        (_, KeyCode::Char('c')) | (_, KeyCode::Esc) => Some(Action::Cancel),
        (_, KeyCode::Char('?')) => Some(Action::ToggleHelp),
        _ => None,
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args)?;
    let footer = FooterInfo::from_env();
    let runtime = tokio::runtime::Handle::current();

    // TUI runs in a dedicated thread; the worker stays on the Tokio runtime.
    let ui_handle = std::thread::spawn(move || {
        let controller = ProgressController::new(
            TaskRunner::new(cfg, runtime),
            Duration::from(args.poll_interval),
        );
        run_threaded(controller, footer, args.start_on_launch)
    });

    match tokio::task::spawn_blocking(move || ui_handle.join()).await {
        Ok(Ok(res)) => res,
        Ok(Err(_)) => Err(anyhow::anyhow!("TUI thread panicked")),
        Err(e) => Err(anyhow::anyhow!("TUI join failed: {e}")),
    }
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    mut controller: ProgressController,
    footer: FooterInfo,
    start_on_launch: bool,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut view = View {
        footer,
        ..Default::default()
    };
    let mut schedule = PollSchedule::default();
    if start_on_launch && controller.start() {
        schedule.schedule(Instant::now(), Duration::ZERO);
    }

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut needs_draw = true;

    let res = loop {
        if schedule.is_due(Instant::now()) {
            let outcome = controller.poll(|_, state| {
                terminal.draw(|f| draw(f.area(), f, state, &view)).ok();
            });
            schedule.apply(outcome, Instant::now());
        }

        if needs_draw || last_tick.elapsed() >= tick_rate {
            terminal
                .draw(|f| draw(f.area(), f, controller.state(), &view))
                .ok();
            last_tick = Instant::now();
            needs_draw = false;
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match action_for_key(k.modifiers, k.code) {
                    Some(Action::Quit) => break Ok(()),
                    // Disabled buttons swallow their key.
                    Some(Action::Start) if controller.state().start_enabled => {
                        if controller.start() {
                            schedule.schedule(Instant::now(), Duration::ZERO);
                        }
                    }
                    Some(Action::Cancel) if controller.state().cancel_enabled => {
                        controller.cancel();
                        schedule.clear();
                    }
                    Some(Action::ToggleHelp) => view.show_help = !view.show_help,
                    _ => continue,
                }
                needs_draw = true;
            }
        }
    };

    controller.shutdown();
    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState, view: &View) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(area);

    if view.show_help {
        help::draw_help(outer[0], f);
    } else {
        draw_task_panel(centered_column(outer[0], 60), f, state);
    }
    draw_footer(outer[1], f, &view.footer);
}

/// Clamp a region to `max_width` columns, centered horizontally.
fn centered_column(area: Rect, max_width: u16) -> Rect {
    let width = area.width.min(max_width);
    Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    }
}

fn draw_task_panel(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3), // Status
                Constraint::Length(3), // Progress
                Constraint::Length(3), // Start
                Constraint::Length(3), // Cancel
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(area);

    let status = Paragraph::new(state.status.as_str())
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, rows[0]);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(gauge_color(state)))
        .ratio(state.progress.clamp(0.0, 1.0));
    f.render_widget(gauge, rows[1]);

    f.render_widget(button("Start task", "s", state.start_enabled), rows[2]);
    f.render_widget(button("Cancel task", "c", state.cancel_enabled), rows[3]);
}

fn gauge_color(state: &UiState) -> Color {
    use crate::model::TaskPhase;
    match state.phase {
        TaskPhase::Completed => Color::Green,
        TaskPhase::Failed => Color::Red,
        TaskPhase::Cancelled => Color::Yellow,
        TaskPhase::Idle | TaskPhase::Running => Color::Cyan,
    }
}

fn button<'a>(label: &'a str, key: &'a str, enabled: bool) -> Paragraph<'a> {
    let (text_style, border_style) = if enabled {
        (
            Style::default().add_modifier(Modifier::BOLD),
            Style::default().fg(Color::White),
        )
    } else {
        (
            Style::default().fg(Color::DarkGray),
            Style::default().fg(Color::DarkGray),
        )
    };
    Paragraph::new(Line::from(vec![
        Span::styled(label, text_style),
        Span::raw("  "),
        Span::styled(format!("[{key}]"), Style::default().fg(Color::Magenta)),
    ]))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style),
    )
}

fn draw_footer(area: Rect, f: &mut ratatui::Frame, footer: &FooterInfo) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(area);
    let style = Style::default().fg(Color::Gray);
    f.render_widget(
        Paragraph::new(Span::styled(footer.version_label(), style)),
        halves[0],
    );
    f.render_widget(
        Paragraph::new(Span::styled(footer.author_label(), style)).alignment(Alignment::Right),
        halves[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    fn render(state: &UiState, view: &View) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal
            .draw(|f| draw(f.area(), f, state, view))
            .unwrap();
        let buf = terminal.backend().buffer().clone();
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(
            action_for_key(KeyModifiers::NONE, KeyCode::Char('s')),
            Some(Action::Start)
        );
        assert_eq!(
            action_for_key(KeyModifiers::NONE, KeyCode::Esc),
            Some(Action::Cancel)
        );
        assert_eq!(
            action_for_key(KeyModifiers::CONTROL, KeyCode::Char('c')),
            Some(Action::Quit)
        );
        assert_eq!(
            action_for_key(KeyModifiers::NONE, KeyCode::Char('c')),
            Some(Action::Cancel)
        );
        assert_eq!(action_for_key(KeyModifiers::NONE, KeyCode::Char('x')), None);
    }

    #[test]
    fn renders_status_and_footer() {
        let state = UiState::default();
        let view = View {
            footer: FooterInfo::from_lookup(|key| match key {
                "AUTHOR" => Some("Jane".into()),
                _ => None,
            }),
            ..Default::default()
        };
        let screen = render(&state, &view);
        assert!(screen.contains("Ready"));
        assert!(screen.contains("Start task"));
        assert!(screen.contains("Ver. 1.0.0"));
        assert!(screen.contains("Made by Jane"));
    }

    #[test]
    fn help_replaces_the_task_panel() {
        let view = View {
            show_help: true,
            ..Default::default()
        };
        let screen = render(&UiState::default(), &view);
        assert!(screen.contains("Keybinds"));
        // Block titles and key markers only exist on the task panel.
        assert!(!screen.contains("Progress"));
        assert!(!screen.contains("[s]"));
    }

    #[test]
    fn centered_column_never_exceeds_area() {
        let area = Rect::new(0, 0, 40, 10);
        assert_eq!(centered_column(area, 60), area);
        let narrow = centered_column(Rect::new(0, 0, 100, 10), 60);
        assert_eq!((narrow.x, narrow.width), (20, 60));
    }
}
