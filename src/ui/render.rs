//! Render functions for the TUI.

use crate::app::{App, InputMode, PendingConfirm, SnippetField};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::{snippets, status, urls, viewer};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 10;

/// Height of the snippets panel while collapsed (border + one line).
const COLLAPSED_HEIGHT: u16 = 3;

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    render_main_panels(f, app, rows[0]);
    status::render(f, app, rows[1]);

    match &app.input {
        InputMode::Normal => {}
        mode => render_input_overlay(f, mode),
    }

    if let Some(ref confirm) = app.pending_confirm {
        render_confirm_overlay(f, confirm);
    }
}

/// Left column: snippets over the URL list. Right: the viewer.
fn render_main_panels(f: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let snippets_height = if app.snippets_collapsed {
        Constraint::Length(COLLAPSED_HEIGHT)
    } else {
        Constraint::Percentage(40)
    };
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([snippets_height, Constraint::Min(0)])
        .split(columns[0]);

    snippets::render(f, app, left[0]);
    urls::render(f, app, left[1]);
    viewer::render(f, app, columns[1]);
}

/// Center a `width` x `height` box in `area`, shrinking it to fit.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Render a confirmation dialog overlay centered on screen.
fn render_confirm_overlay(f: &mut Frame, confirm: &PendingConfirm) {
    let overlay = centered(f.area(), 50, 7);
    if overlay.width < 10 || overlay.height < 5 {
        return;
    }

    let text = format!("{}\n\n(y) Confirm  (n/Esc) Cancel", confirm.prompt());

    f.render_widget(Clear, overlay);
    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Confirm "),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, overlay);
}

/// Render the add-URL or add-snippet editor.
fn render_input_overlay(f: &mut Frame, mode: &InputMode) {
    let (title, text, height) = match mode {
        InputMode::Normal => return,
        InputMode::Url { input } => (
            " Add URL ",
            format!("Enter URL:\n\n> {}_\n\n(Enter) Add  (Esc) Cancel", input),
            8,
        ),
        InputMode::Snippet { field, title, text } => {
            let (title_cursor, text_cursor) = match field {
                SnippetField::Title => ("_", ""),
                SnippetField::Text => ("", "_"),
            };
            (
                " New Snippet ",
                format!(
                    "Title: {}{}\n\n{}{}\n\n(Enter) Next/Save  (Alt+Enter) Newline  (Esc) Cancel",
                    title, title_cursor, text, text_cursor
                ),
                14,
            )
        }
    };

    let overlay = centered(f.area(), 64, height);
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }

    f.render_widget(Clear, overlay);
    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, overlay);
}
