use serde::Serialize;
use thiserror::Error;

use crate::util::UrlValidationError;

// ============================================================================
// Error Types
// ============================================================================

/// Errors returned by the store layer.
///
/// Validation variants are raised before any statement runs, so a caller that
/// receives one can assume nothing was written.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another instance of the application has locked the database
    #[error("Another instance of cuedeck appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// URL failed validation, nothing was persisted
    #[error("{0}")]
    InvalidUrl(#[from] UrlValidationError),

    /// Snippet had neither a title nor any text
    #[error("Snippet needs a title or some text")]
    EmptySnippet,

    /// A reorder did not name every stored entry exactly once
    #[error("Order does not match stored entries (expected {expected} ids, got {got})")]
    OrderMismatch { expected: usize, got: usize },

    /// Generic database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Map a sqlx error, recognising SQLite lock conditions.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return StoreError::InstanceLocked;
        }
        StoreError::Database(err)
    }

    /// True for errors caused by user input rather than the storage engine.
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::InvalidUrl(_) | StoreError::EmptySnippet)
    }
}

/// SQLITE_BUSY (5), SQLITE_LOCKED (6) and SQLITE_CANTOPEN (14) surface as these messages.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("database is locked")
        || lower.contains("database table is locked")
        || lower.contains("sqlite_busy")
        || lower.contains("sqlite_locked")
        || lower.contains("unable to open database file")
}

// ============================================================================
// Data Structures
// ============================================================================

/// A saved text snippet. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub text: String,
    /// Unix milliseconds
    pub created_at: i64,
}

impl Snippet {
    /// Label shown in lists; untitled snippets get a placeholder.
    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            "(untitled)"
        } else {
            &self.title
        }
    }
}

/// A URL in the ordered deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UrlEntry {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    #[sqlx(rename = "sort_order")]
    pub order: i64,
    /// Unix milliseconds
    pub created_at: i64,
}

impl UrlEntry {
    /// Title if one is stored, otherwise the URL's host.
    pub fn label(&self) -> String {
        match self.title.as_deref() {
            Some(t) if !t.trim().is_empty() => t.to_owned(),
            _ => crate::title::fallback_title(&self.url),
        }
    }
}

/// Partial update for a [`UrlEntry`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UrlPatch {
    pub title: Option<String>,
}

impl UrlPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
    }
}
