use crate::app::{App, Focus, InputMode};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some(msg) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else if app.grabbed.is_some() {
        Cow::Borrowed("[j/k]pick place [g/Enter]drop [Esc]cancel")
    } else {
        match (&app.input, app.focus) {
            (InputMode::Normal, Focus::Snippets) => Cow::Borrowed(
                "[a]dd [c]opy [d]elete [D]clear [E]xport [z]collapse [Tab]urls [q]uit",
            ),
            (InputMode::Normal, Focus::Urls) => Cow::Borrowed(
                "[a]dd [v]iew [n/p]next/prev [J/K]move [g]rab [o]pen [d]elete [e]xport [q]uit",
            ),
            _ => Cow::Borrowed("Typing | ESC cancel | ENTER confirm"),
        }
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}
