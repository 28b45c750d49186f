//! Clipboard access for copying snippets.

use arboard::Clipboard;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Clipboard unavailable: {0}")]
pub struct ClipboardError(String);

/// Somewhere copied text can go.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The system clipboard via `arboard`.
///
/// On X11 the copied text is only served while a `Clipboard` handle is
/// alive, so one handle is opened on the first copy and kept for the life
/// of the app. A failed copy drops it and the next copy reopens.
#[derive(Default)]
pub struct SystemClipboard {
    handle: Option<Clipboard>,
}

impl SystemClipboard {
    /// Whether a handle is currently held.
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }
}

impl std::fmt::Debug for SystemClipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemClipboard")
            .field("open", &self.is_open())
            .finish()
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard = match self.handle.take() {
            Some(clipboard) => clipboard,
            None => Clipboard::new().map_err(|e| ClipboardError(e.to_string()))?,
        };
        clipboard
            .set_text(text)
            .map_err(|e| ClipboardError(e.to_string()))?;
        self.handle = Some(clipboard);
        Ok(())
    }
}

/// Keeps the last copied text in memory. Used headless and in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
}

impl ClipboardSink for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.contents = Some(text.to_owned());
        Ok(())
    }
}

/// A clipboard that always fails, for exercising error paths.
#[derive(Debug, Default)]
pub struct UnavailableClipboard;

impl ClipboardSink for UnavailableClipboard {
    fn set_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError("no display".into()))
    }
}
