use crate::app::{App, Focus};
use crate::title::TitleState;
use crate::util::truncate_to_width;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

/// Render the URL deck list
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus == Focus::Urls;
    let current = app.view.current_index();
    let inner_width = area.width.saturating_sub(2) as usize;

    let items: Vec<ListItem> = if app.view.is_empty() {
        vec![ListItem::new("No URLs (a to add)")]
    } else {
        app.view
            .entries()
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                // ▶ marks the viewed entry, ↕ the grabbed one
                let marker = if app.grabbed == Some(i) {
                    Span::styled("↕ ", Style::default().fg(Color::Yellow))
                } else if current == Some(i) {
                    Span::styled("▶ ", Style::default().fg(Color::Cyan))
                } else {
                    Span::raw("  ")
                };

                let label = entry.label();
                let mut spans = vec![
                    marker,
                    Span::styled(
                        truncate_to_width(&label, inner_width.saturating_sub(4)).into_owned(),
                        if current == Some(i) {
                            Style::default().add_modifier(Modifier::BOLD)
                        } else {
                            Style::default()
                        },
                    ),
                ];
                if app.title_state(entry.id) == TitleState::Resolving {
                    spans.push(Span::styled(" …", Style::default().fg(Color::DarkGray)));
                }
                ListItem::new(Line::from(spans))
            })
            .collect()
    };

    let border_style = if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let title = format!("URLs ({})", app.view.len());
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default();
    if !app.view.is_empty() {
        state.select(Some(app.selected_url));
    }
    f.render_stateful_widget(list, area, &mut state);
}
