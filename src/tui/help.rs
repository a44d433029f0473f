use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn keybind(keys: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(keys, Style::default().fg(Color::Magenta)),
        Span::raw(desc),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        keybind("s / Enter", "    Start task"),
        keybind("c / Esc", "      Cancel task"),
        keybind("q / Ctrl-C", "   Quit"),
        keybind("?", "            Toggle this help"),
        Line::from(""),
        Line::from("Buttons in gray are disabled and ignore their key."),
        Line::from("Cancelling waits for the current step to finish."),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
