use crate::app::{App, Focus};
use crate::util::{display_width, single_line, truncate_to_width};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

/// Render the snippets panel. Collapsed, only the header line is shown.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus == Focus::Snippets;
    let border_style = if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let title = format!("Snippets ({})", app.snippets.len());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title);

    if app.snippets_collapsed {
        let hint = Paragraph::new(Span::styled(
            "collapsed, press z to expand",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        f.render_widget(hint, area);
        return;
    }

    // room for "title: preview" inside the borders
    let inner_width = area.width.saturating_sub(2) as usize;

    let items: Vec<ListItem> = if app.snippets.is_empty() {
        vec![ListItem::new("No snippets (a to add)")]
    } else {
        app.snippets
            .iter()
            .map(|snippet| {
                let label = snippet.label();
                let preview = single_line(&snippet.text);
                let rest = inner_width.saturating_sub(display_width(label) + 2);
                ListItem::new(Line::from(vec![
                    Span::styled(
                        truncate_to_width(label, inner_width).into_owned(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  {}", truncate_to_width(&preview, rest)),
                        Style::default().fg(Color::Gray),
                    ),
                ]))
            })
            .collect()
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default();
    if !app.snippets.is_empty() {
        state.select(Some(app.selected_snippet));
    }
    f.render_stateful_widget(list, area, &mut state);
}
