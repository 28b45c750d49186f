//! Input handling for the TUI.
//!
//! Keys are translated into [`Intent`]s for the current focus and mode.

use crate::app::{App, Focus, InputMode, Intent, SnippetField};
use crate::export::ExportScope;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};

use super::Action;

/// Longest URL accepted from the keyboard.
const MAX_URL_INPUT: usize = 2048;
/// Longest snippet field accepted from the keyboard.
const MAX_SNIPPET_INPUT: usize = 64 * 1024;

/// Main input dispatch function.
///
/// Routes input to the appropriate handler based on current mode.
pub(super) async fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Result<Action> {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Ok(Action::Quit);
    }

    // Confirmation captures all keys when visible
    if app.pending_confirm.is_some() {
        return handle_confirm_input(app, code).await;
    }

    if app.input != InputMode::Normal {
        return handle_text_input(app, code, modifiers).await;
    }

    handle_browse_input(app, code, modifiers).await
}

/// Insert pasted text into the active editor. Ignored outside text entry.
pub(super) fn handle_paste(app: &mut App, text: &str) {
    match &mut app.input {
        InputMode::Normal => {}
        InputMode::Url { input } => {
            // URLs are single line
            let line = text.lines().next().unwrap_or_default();
            push_capped(input, line, MAX_URL_INPUT);
        }
        InputMode::Snippet { field, title, text: body } => match field {
            SnippetField::Title => {
                let line = text.lines().next().unwrap_or_default();
                push_capped(title, line, MAX_SNIPPET_INPUT);
            }
            SnippetField::Text => push_capped(body, text, MAX_SNIPPET_INPUT),
        },
    }
}

fn push_capped(buf: &mut String, text: &str, cap: usize) {
    for c in text.chars() {
        if buf.len() + c.len_utf8() > cap {
            break;
        }
        buf.push(c);
    }
}

async fn handle_browse_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Result<Action> {
    let shift = modifiers.contains(KeyModifiers::SHIFT);

    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Tab | KeyCode::BackTab => app.cycle_focus(),
        KeyCode::Esc => {
            if app.grabbed.take().is_some() {
                app.set_status("Move cancelled");
            }
        }

        // URL reordering, Shift+arrow or K/J
        KeyCode::Up if shift && app.focus == Focus::Urls => move_selected(app, -1).await?,
        KeyCode::Down if shift && app.focus == Focus::Urls => move_selected(app, 1).await?,
        KeyCode::Char('K') if app.focus == Focus::Urls => move_selected(app, -1).await?,
        KeyCode::Char('J') if app.focus == Focus::Urls => move_selected(app, 1).await?,

        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),

        // Viewer
        KeyCode::Char('n') | KeyCode::Char('l') | KeyCode::Right => {
            app.dispatch(Intent::ViewNext).await?
        }
        KeyCode::Char('p') | KeyCode::Char('h') | KeyCode::Left => {
            app.dispatch(Intent::ViewPrev).await?
        }
        KeyCode::Char('o') => app.dispatch(Intent::OpenCurrent).await?,

        KeyCode::Char('e') => app.dispatch(Intent::Export(ExportScope::All)).await?,
        KeyCode::Char('E') => {
            let scope = match app.focus {
                Focus::Snippets => ExportScope::Snippets,
                Focus::Urls => ExportScope::Urls,
            };
            app.dispatch(Intent::Export(scope)).await?
        }
        KeyCode::Char('z') => app.dispatch(Intent::ToggleSnippetsPanel).await?,

        KeyCode::Char('a') => {
            app.input = match app.focus {
                Focus::Snippets => InputMode::Snippet {
                    field: SnippetField::Title,
                    title: String::new(),
                    text: String::new(),
                },
                Focus::Urls => InputMode::Url {
                    input: String::new(),
                },
            };
        }

        _ => match app.focus {
            Focus::Snippets => handle_snippet_keys(app, code).await?,
            Focus::Urls => handle_url_keys(app, code).await?,
        },
    }
    Ok(Action::Continue)
}

async fn handle_snippet_keys(app: &mut App, code: KeyCode) -> Result<()> {
    let selected = app.selected_snippet().map(|s| s.id);
    match (code, selected) {
        (KeyCode::Enter | KeyCode::Char('c'), Some(id)) => {
            app.dispatch(Intent::CopySnippet(id)).await?
        }
        (KeyCode::Char('d') | KeyCode::Delete, Some(id)) => {
            app.dispatch(Intent::DeleteSnippet(id)).await?
        }
        (KeyCode::Char('D'), _) if !app.snippets.is_empty() => {
            app.dispatch(Intent::ClearSnippets).await?
        }
        _ => {}
    }
    Ok(())
}

async fn handle_url_keys(app: &mut App, code: KeyCode) -> Result<()> {
    let selected = app.selected_url_id();
    match (code, selected) {
        (KeyCode::Enter | KeyCode::Char('v'), Some(id)) => {
            if let Some(from) = app.grabbed.take() {
                let to = app.selected_url;
                app.dispatch(Intent::MoveUrlTo { from, to }).await?
            } else {
                app.dispatch(Intent::ViewUrl(id)).await?
            }
        }
        (KeyCode::Char('d') | KeyCode::Delete, Some(id)) => {
            app.grabbed = None;
            app.dispatch(Intent::DeleteUrl(id)).await?
        }
        (KeyCode::Char('D'), _) if !app.view.is_empty() => {
            app.grabbed = None;
            app.dispatch(Intent::ClearUrls).await?
        }
        (KeyCode::Char('g'), Some(_)) => match app.grabbed.take() {
            Some(from) => {
                let to = app.selected_url;
                app.dispatch(Intent::MoveUrlTo { from, to }).await?
            }
            None => {
                app.grabbed = Some(app.selected_url);
                app.set_status("Moving: pick a place and press g");
            }
        },
        _ => {}
    }
    Ok(())
}

async fn move_selected(app: &mut App, delta: isize) -> Result<()> {
    if let Some(id) = app.selected_url_id() {
        app.grabbed = None;
        app.dispatch(Intent::MoveUrl { id, delta }).await?;
    }
    Ok(())
}

/// Handle keys while an editor is open.
///
/// The mode is taken out and put back unless the edit ends.
async fn handle_text_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Result<Action> {
    let mode = std::mem::replace(&mut app.input, InputMode::Normal);
    match mode {
        InputMode::Normal => {}
        InputMode::Url { mut input } => match code {
            KeyCode::Esc => {}
            KeyCode::Enter => {
                if input.trim().is_empty() {
                    app.input = InputMode::Url { input };
                } else {
                    app.dispatch(Intent::AddUrl(input)).await?;
                }
            }
            KeyCode::Backspace => {
                input.pop();
                app.input = InputMode::Url { input };
            }
            KeyCode::Char(c) => {
                push_capped(&mut input, c.encode_utf8(&mut [0; 4]), MAX_URL_INPUT);
                app.input = InputMode::Url { input };
            }
            _ => app.input = InputMode::Url { input },
        },
        InputMode::Snippet {
            mut field,
            mut title,
            mut text,
        } => {
            let buf = match field {
                SnippetField::Title => &mut title,
                SnippetField::Text => &mut text,
            };
            match code {
                KeyCode::Esc => return Ok(Action::Continue),
                KeyCode::Enter
                    if field == SnippetField::Text && modifiers.contains(KeyModifiers::ALT) =>
                {
                    push_capped(buf, "\n", MAX_SNIPPET_INPUT);
                }
                KeyCode::Enter | KeyCode::Tab if field == SnippetField::Title => {
                    field = SnippetField::Text;
                }
                KeyCode::BackTab if field == SnippetField::Text => field = SnippetField::Title,
                KeyCode::Enter => {
                    app.dispatch(Intent::AddSnippet { title, text }).await?;
                    return Ok(Action::Continue);
                }
                KeyCode::Backspace => {
                    buf.pop();
                }
                KeyCode::Char(c) => push_capped(buf, c.encode_utf8(&mut [0; 4]), MAX_SNIPPET_INPUT),
                _ => {}
            }
            app.input = InputMode::Snippet { field, title, text };
        }
    }
    Ok(Action::Continue)
}

async fn handle_confirm_input(app: &mut App, code: KeyCode) -> Result<Action> {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm().await?,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_confirm(),
        _ => {} // Ignore other keys
    }
    Ok(Action::Continue)
}
