//! JSON export of the snippet list and the URL deck.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::storage::{Database, Snippet, StoreError, UrlEntry};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which collections an export contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportScope {
    #[default]
    All,
    Snippets,
    Urls,
}

impl ExportScope {
    fn includes_snippets(self) -> bool {
        matches!(self, ExportScope::All | ExportScope::Snippets)
    }

    fn includes_urls(self) -> bool {
        matches!(self, ExportScope::All | ExportScope::Urls)
    }
}

impl fmt::Display for ExportScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportScope::All => "all",
            ExportScope::Snippets => "snippets",
            ExportScope::Urls => "urls",
        })
    }
}

/// The exported JSON document. Excluded collections are left out entirely.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippets: Option<Vec<Snippet>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<UrlEntry>>,
    pub exported_at: DateTime<Utc>,
}

impl ExportDocument {
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Snapshot the requested collections. URLs come out in deck order.
pub async fn build_export(db: &Database, scope: ExportScope) -> Result<ExportDocument, ExportError> {
    let snippets = if scope.includes_snippets() {
        Some(db.list_snippets().await?)
    } else {
        None
    };
    let urls = if scope.includes_urls() {
        Some(db.list_urls().await?)
    } else {
        None
    };
    Ok(ExportDocument {
        snippets,
        urls,
        exported_at: Utc::now(),
    })
}

/// `<dir>/cuedeck-<scope>-YYYYmmdd_HHMMSS.json`, local time.
pub fn default_export_path(dir: &Path, scope: ExportScope, now: DateTime<Local>) -> PathBuf {
    dir.join(format!(
        "cuedeck-{scope}-{}.json",
        now.format("%Y%m%d_%H%M%S")
    ))
}

/// Build and write an export, returning the path written.
pub async fn export_to(db: &Database, scope: ExportScope, path: &Path) -> Result<PathBuf, ExportError> {
    let doc = build_export(db, scope).await?;
    let json = doc.to_json()?;
    write_atomic(path, json.as_bytes())?;
    tracing::info!(path = %path.display(), %scope, "Export written");
    Ok(path.to_path_buf())
}

/// Write `content` to `dst` via a temp file in the same directory, then rename.
///
/// `dst` is either the old file or the complete new one, never a partial write.
pub fn write_atomic(dst: &Path, content: &[u8]) -> Result<(), ExportError> {
    use std::time::{SystemTime, UNIX_EPOCH};

    if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ExportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    // Unpredictable temp name; create_new refuses to follow a planted file
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = dst.with_extension(format!("tmp.{suffix:016x}"));

    let result = (|| {
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        drop(file);

        #[cfg(windows)]
        if dst.exists() {
            std::fs::remove_file(dst)?;
        }
        std::fs::rename(&temp_path, dst)
    })();

    if let Err(source) = result {
        let _ = std::fs::remove_file(&temp_path);
        return Err(ExportError::Io {
            path: dst.to_path_buf(),
            source,
        });
    }
    Ok(())
}
