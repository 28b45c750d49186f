use crate::app::App;
use crate::title::TitleState;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Render the viewer pane: the current entry and where it sits in the deck.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let (title, lines) = match (app.view.current_index(), app.view.current_entry()) {
        (Some(index), Some(entry)) => {
            let status = match app.title_state(entry.id) {
                TitleState::Resolving => "looking up title…",
                TitleState::Resolved | TitleState::Fallback => "",
            };
            let mut lines = vec![
                Line::from(Span::styled(
                    entry.label(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    entry.url.clone(),
                    Style::default()
                        .fg(Color::Blue)
                        .add_modifier(Modifier::UNDERLINED),
                )),
            ];
            if !status.is_empty() {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    status,
                    Style::default().fg(Color::DarkGray),
                )));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "[n]ext  [p]rev  [o]pen in browser",
                Style::default().fg(Color::DarkGray),
            )));
            (format!(" Viewer {}/{} ", index + 1, app.view.len()), lines)
        }
        _ => (
            " Viewer ".to_string(),
            vec![Line::from(Span::styled(
                "No URLs yet. Focus the URL list and press a to add one.",
                Style::default().fg(Color::DarkGray),
            ))],
        ),
    };

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}
