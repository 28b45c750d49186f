use anyhow::{Context, Result};
use futures::FutureExt;
use std::borrow::Cow;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::clipboard::{ClipboardSink, SystemClipboard};
use crate::config::Config;
use crate::export::{default_export_path, export_to, ExportScope};
use crate::reorder;
use crate::storage::{Database, Snippet, StoreError, UrlPatch};
use crate::title::{fallback_title, http_client, resolve_title, TitleError, TitleState};
use crate::util::Timer;
use crate::viewer::ViewState;

// ============================================================================
// Intents and Events
// ============================================================================

/// Everything a user can ask the app to do.
///
/// Input handlers translate keys into intents; nothing else mutates the
/// store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    AddSnippet { title: String, text: String },
    CopySnippet(i64),
    DeleteSnippet(i64),
    ClearSnippets,
    AddUrl(String),
    DeleteUrl(i64),
    ClearUrls,
    /// Move an entry by `delta` places (up/down buttons).
    MoveUrl { id: i64, delta: isize },
    /// Move the entry at position `from` to position `to` (grab and drop).
    MoveUrlTo { from: usize, to: usize },
    ViewNext,
    ViewPrev,
    ViewUrl(i64),
    OpenCurrent,
    Export(ExportScope),
    ToggleSnippetsPanel,
}

impl Intent {
    /// Intents that lose data and go through a confirmation prompt.
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            Intent::DeleteSnippet(_)
                | Intent::DeleteUrl(_)
                | Intent::ClearSnippets
                | Intent::ClearUrls
        )
    }
}

/// Events from background tasks
#[derive(Debug)]
pub enum AppEvent {
    /// A title lookup finished.
    ///
    /// `fallback` is the title the entry was stored with; a resolved title
    /// equal to it is not written back.
    TitleResolved {
        id: i64,
        fallback: String,
        result: Result<String, TitleError>,
    },
    /// A background task panicked.
    TaskPanicked { task: &'static str, error: String },
}

// ============================================================================
// UI State
// ============================================================================

/// Which panel has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Snippets,
    Urls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetField {
    Title,
    Text,
}

/// Text entry state. While not `Normal`, keys are routed to the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Snippet {
        field: SnippetField,
        title: String,
        text: String,
    },
    Url {
        input: String,
    },
}

/// A destructive intent waiting for y/n, with the label shown in the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirm {
    pub intent: Intent,
    pub label: String,
}

impl PendingConfirm {
    pub fn prompt(&self) -> String {
        match &self.intent {
            Intent::DeleteSnippet(_) => format!("Delete snippet \"{}\"?", self.label),
            Intent::DeleteUrl(_) => format!("Delete \"{}\"?", self.label),
            Intent::ClearSnippets => "Delete ALL snippets?".to_string(),
            Intent::ClearUrls => "Delete ALL URLs?".to_string(),
            other => format!("{other:?}?"),
        }
    }
}

/// Opens a URL outside the terminal.
pub type UrlOpener = fn(&str) -> std::io::Result<()>;

fn open_in_browser(url: &str) -> std::io::Result<()> {
    open::that_detached(url)
}

/// Wraps a future to catch panics and convert them to errors.
///
/// Spawned tasks would otherwise vanish silently on panic; this turns the
/// payload into a message the UI can report.
pub(crate) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            }
        })
}

/// Post a background result to the UI. Returns `false` (and logs) when the
/// receiver is gone.
pub(crate) async fn send_event(tx: &mpsc::Sender<AppEvent>, event: AppEvent) -> bool {
    let name = match &event {
        AppEvent::TitleResolved { .. } => "TitleResolved",
        AppEvent::TaskPanicked { .. } => "TaskPanicked",
    };
    match tx.send(event).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, event = name, "Channel send failed (receiver dropped)");
            false
        }
    }
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state
pub struct App {
    pub db: Database,
    pub http_client: reqwest::Client,
    pub config: Config,
    /// Default home for exports.
    pub data_dir: PathBuf,

    // Data
    pub snippets: Vec<Snippet>,
    pub view: ViewState,
    pub title_states: HashMap<i64, TitleState>,

    // UI State
    pub focus: Focus,
    pub selected_snippet: usize,
    pub selected_url: usize,
    /// Position picked up for a grab-and-drop move.
    pub grabbed: Option<usize>,
    pub input: InputMode,
    pub pending_confirm: Option<PendingConfirm>,
    pub snippets_collapsed: bool,
    pub needs_redraw: bool,

    pub status_message: Option<Cow<'static, str>>,
    status_timer: Timer,

    /// URL last written to the `viewer.last_url` setting.
    last_viewed: Option<String>,

    clipboard: Box<dyn ClipboardSink>,
    opener: UrlOpener,
    event_tx: mpsc::Sender<AppEvent>,
    title_tasks: JoinSet<()>,
}

impl App {
    pub fn new(
        db: Database,
        config: Config,
        data_dir: PathBuf,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> Result<Self> {
        let http_client =
            http_client(&config.user_agent).context("Failed to build HTTP client")?;

        Ok(Self {
            db,
            http_client,
            config,
            data_dir,
            snippets: Vec::new(),
            view: ViewState::default(),
            title_states: HashMap::new(),
            focus: Focus::Urls,
            selected_snippet: 0,
            selected_url: 0,
            grabbed: None,
            input: InputMode::Normal,
            pending_confirm: None,
            snippets_collapsed: false,
            needs_redraw: true,
            status_message: None,
            status_timer: Timer::default(),
            last_viewed: None,
            clipboard: Box::new(SystemClipboard::default()),
            opener: open_in_browser,
            event_tx,
            title_tasks: JoinSet::new(),
        })
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn ClipboardSink>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_opener(mut self, opener: UrlOpener) -> Self {
        self.opener = opener;
        self
    }

    /// Load everything from the store and restore the last viewed entry.
    pub async fn load(&mut self) -> Result<()> {
        self.reload_snippets().await?;
        let entries = self.db.list_urls().await.context("Failed to load URLs")?;
        self.view.refresh(entries, false);

        for entry in self.view.entries() {
            let state = match entry.title.as_deref() {
                Some(t) if t != fallback_title(&entry.url) => TitleState::Resolved,
                _ => TitleState::Fallback,
            };
            self.title_states.insert(entry.id, state);
        }

        if let Some(url) = self.db.last_viewed_url().await? {
            if self.view.select_url(&url) {
                tracing::debug!(url = %url, "Restored last viewed URL");
            }
        }
        self.last_viewed = self.view.current_entry().map(|e| e.url.clone());
        self.selected_url = self.view.current_index().unwrap_or(0);

        self.snippets_collapsed = self.db.snippets_collapsed().await?;
        if self.snippets_collapsed {
            self.focus = Focus::Urls;
        }

        tracing::info!(
            snippets = self.snippets.len(),
            urls = self.view.len(),
            "Loaded deck"
        );
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Selection helpers
    // ------------------------------------------------------------------------

    pub fn selected_snippet(&self) -> Option<&Snippet> {
        self.snippets.get(self.selected_snippet)
    }

    pub fn selected_url_id(&self) -> Option<i64> {
        self.view.entries().get(self.selected_url).map(|e| e.id)
    }

    pub fn title_state(&self, id: i64) -> TitleState {
        self.title_states
            .get(&id)
            .copied()
            .unwrap_or(TitleState::Fallback)
    }

    pub fn nav_up(&mut self) {
        match self.focus {
            Focus::Snippets => self.selected_snippet = self.selected_snippet.saturating_sub(1),
            Focus::Urls => self.selected_url = self.selected_url.saturating_sub(1),
        }
    }

    pub fn nav_down(&mut self) {
        match self.focus {
            Focus::Snippets => {
                if self.selected_snippet + 1 < self.snippets.len() {
                    self.selected_snippet += 1;
                }
            }
            Focus::Urls => {
                if self.selected_url + 1 < self.view.len() {
                    self.selected_url += 1;
                }
            }
        }
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Urls if !self.snippets_collapsed => Focus::Snippets,
            _ => Focus::Urls,
        };
    }

    fn clamp_selections(&mut self) {
        self.selected_snippet = self
            .selected_snippet
            .min(self.snippets.len().saturating_sub(1));
        self.selected_url = self.selected_url.min(self.view.len().saturating_sub(1));
        if self.grabbed.is_some_and(|g| g >= self.view.len()) {
            self.grabbed = None;
        }
    }

    // ------------------------------------------------------------------------
    // Status line
    // ------------------------------------------------------------------------

    /// Set status message (auto-expires after `status_timeout_ms`)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some(msg.into());
        self.status_timer.start(self.config.status_timeout());
        self.needs_redraw = true;
    }

    /// Clear status message if expired.
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if self.status_message.is_some() && self.status_timer.is_expired() {
            self.status_message = None;
            self.status_timer.cancel();
            return true;
        }
        false
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    /// Handle an intent. Destructive intents wait for confirmation when
    /// `confirm_deletes` is on.
    pub async fn dispatch(&mut self, intent: Intent) -> Result<()> {
        if intent.is_destructive() && self.config.confirm_deletes {
            let label = self.label_for(&intent);
            self.pending_confirm = Some(PendingConfirm { intent, label });
            self.needs_redraw = true;
            return Ok(());
        }
        self.apply(intent).await
    }

    /// Run the pending destructive intent.
    pub async fn confirm(&mut self) -> Result<()> {
        match self.pending_confirm.take() {
            Some(pending) => self.apply(pending.intent).await,
            None => Ok(()),
        }
    }

    pub fn cancel_confirm(&mut self) {
        if self.pending_confirm.take().is_some() {
            self.set_status("Cancelled");
        }
    }

    fn label_for(&self, intent: &Intent) -> String {
        match intent {
            Intent::DeleteSnippet(id) => self
                .snippets
                .iter()
                .find(|s| s.id == *id)
                .map(|s| s.label().to_string())
                .unwrap_or_default(),
            Intent::DeleteUrl(id) => self
                .view
                .entries()
                .iter()
                .find(|e| e.id == *id)
                .map(|e| e.label())
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    async fn apply(&mut self, intent: Intent) -> Result<()> {
        tracing::debug!(?intent, "Dispatching intent");
        self.needs_redraw = true;

        match intent {
            Intent::AddSnippet { title, text } => self.add_snippet(&title, &text).await?,
            Intent::CopySnippet(id) => self.copy_snippet(id),
            Intent::DeleteSnippet(id) => {
                if self.db.delete_snippet(id).await? {
                    self.reload_snippets().await?;
                    self.set_status("Snippet deleted");
                }
            }
            Intent::ClearSnippets => {
                let n = self.db.clear_snippets().await?;
                self.reload_snippets().await?;
                self.set_status(format!("Deleted {n} snippets"));
            }
            Intent::AddUrl(url) => self.add_url(&url).await?,
            Intent::DeleteUrl(id) => {
                if self.db.delete_url(id).await? {
                    self.title_states.remove(&id);
                    self.refresh_urls(true).await?;
                    self.set_status("URL deleted");
                }
            }
            Intent::ClearUrls => {
                let n = self.db.clear_urls().await?;
                self.title_states.clear();
                self.refresh_urls(false).await?;
                self.set_status(format!("Deleted {n} URLs"));
            }
            Intent::MoveUrl { id, delta } => {
                let ids = self.view.ids();
                if let Some(index) = ids.iter().position(|&i| i == id) {
                    let order = reorder::move_by(&ids, index, delta);
                    self.save_order(order, id).await?;
                }
            }
            Intent::MoveUrlTo { from, to } => {
                let ids = self.view.ids();
                if let Some(&id) = ids.get(from) {
                    let order = reorder::move_to(&ids, from, to);
                    self.save_order(order, id).await?;
                }
            }
            Intent::ViewNext => self.view.next(),
            Intent::ViewPrev => self.view.prev(),
            Intent::ViewUrl(id) => {
                self.view.select_id(id);
            }
            Intent::OpenCurrent => self.open_current(),
            Intent::Export(scope) => self.export(scope).await?,
            Intent::ToggleSnippetsPanel => {
                self.snippets_collapsed = !self.snippets_collapsed;
                if self.snippets_collapsed {
                    self.focus = Focus::Urls;
                }
                self.db
                    .set_snippets_collapsed(self.snippets_collapsed)
                    .await?;
            }
        }

        self.clamp_selections();
        self.remember_current().await;
        Ok(())
    }

    async fn add_snippet(&mut self, title: &str, text: &str) -> Result<()> {
        match self.db.add_snippet(title, text).await {
            Ok(id) => {
                self.reload_snippets().await?;
                if let Some(pos) = self.snippets.iter().position(|s| s.id == id) {
                    self.selected_snippet = pos;
                }
                self.set_status("Snippet saved");
            }
            Err(e) if e.is_validation() => self.set_status(e.to_string()),
            Err(e) => return Err(e).context("Failed to save snippet"),
        }
        Ok(())
    }

    fn copy_snippet(&mut self, id: i64) {
        let Some(text) = self
            .snippets
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.text.clone())
        else {
            return;
        };
        match self.clipboard.set_text(&text) {
            Ok(()) => self.set_status("Copied"),
            Err(e) => {
                tracing::warn!(error = %e, "Clipboard copy failed");
                self.set_status(format!("Copy failed: {e}"));
            }
        }
    }

    async fn add_url(&mut self, url: &str) -> Result<()> {
        let url = url.trim();
        let fallback = fallback_title(url);
        let id = match self.db.add_url(url, Some(&fallback)).await {
            Ok(id) => id,
            Err(e) if e.is_validation() => {
                self.set_status(e.to_string());
                return Ok(());
            }
            Err(e) => return Err(e).context("Failed to add URL"),
        };

        self.refresh_urls(true).await?;
        self.selected_url = self.view.len().saturating_sub(1);
        self.set_status("URL added");

        if self.config.fetch_titles {
            self.title_states.insert(id, TitleState::Resolving);
            self.spawn_title_resolution(id, url.to_string(), fallback);
        } else {
            self.title_states.insert(id, TitleState::Fallback);
        }
        Ok(())
    }

    /// Persist a computed order, then re-read the deck.
    ///
    /// `moved` is the entry being moved; the list selection follows it.
    async fn save_order(&mut self, order: Option<Vec<i64>>, moved: i64) -> Result<()> {
        let Some(order) = order else {
            return Ok(());
        };
        match self.db.save_order(&order).await {
            Ok(()) => self.set_status("Order saved"),
            Err(StoreError::OrderMismatch { .. }) => {
                tracing::warn!("Deck changed underneath a reorder, refreshing");
                self.set_status("List changed, refreshed");
            }
            Err(e) => return Err(e).context("Failed to save order"),
        }
        self.refresh_urls(true).await?;
        if let Some(pos) = self.view.entries().iter().position(|e| e.id == moved) {
            self.selected_url = pos;
        }
        Ok(())
    }

    fn open_current(&mut self) {
        let Some(url) = self.view.current_entry().map(|e| e.url.clone()) else {
            self.set_status("No URL to open");
            return;
        };
        match (self.opener)(&url) {
            Ok(()) => self.set_status("Opened in browser"),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Failed to open URL");
                self.set_status(format!("Could not open browser: {e}"));
            }
        }
    }

    async fn export(&mut self, scope: ExportScope) -> Result<()> {
        let dir = self.config.export_dir_or(&self.data_dir).to_path_buf();
        let path = default_export_path(&dir, scope, chrono::Local::now());
        match export_to(&self.db, scope, &path).await {
            Ok(path) => self.set_status(format!("Exported to {}", path.display())),
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                self.set_status(format!("Export failed: {e}"));
            }
        }
        Ok(())
    }

    async fn reload_snippets(&mut self) -> Result<()> {
        self.snippets = self
            .db
            .list_snippets()
            .await
            .context("Failed to load snippets")?;
        Ok(())
    }

    /// Re-read the deck from the store. `keep` relocates the viewer to the
    /// same entry; otherwise it resets to the head.
    pub async fn refresh_urls(&mut self, keep: bool) -> Result<()> {
        let entries = self.db.list_urls().await.context("Failed to load URLs")?;
        self.view.refresh(entries, keep);
        self.clamp_selections();
        self.needs_redraw = true;
        Ok(())
    }

    /// Write `viewer.last_url` when the viewed entry changed.
    async fn remember_current(&mut self) {
        let current = self.view.current_entry().map(|e| e.url.clone());
        if current == self.last_viewed {
            return;
        }
        if let Some(url) = &current {
            if let Err(e) = self.db.set_last_viewed_url(url).await {
                tracing::warn!(error = %e, "Failed to persist last viewed URL");
                return;
            }
        }
        self.last_viewed = current;
    }

    // ------------------------------------------------------------------------
    // Background tasks
    // ------------------------------------------------------------------------

    fn spawn_title_resolution(&mut self, id: i64, url: String, fallback: String) {
        let client = self.http_client.clone();
        let tx = self.event_tx.clone();

        tracing::debug!(id, url = %url, "Spawning title lookup");
        self.title_tasks.spawn(async move {
            let event = match catch_task_panic(resolve_title(&client, &url)).await {
                Ok(result) => AppEvent::TitleResolved {
                    id,
                    fallback,
                    result,
                },
                Err(panic_msg) => {
                    tracing::error!(error = %panic_msg, "Title lookup task panicked");
                    AppEvent::TaskPanicked {
                        task: "title",
                        error: panic_msg,
                    }
                }
            };
            send_event(&tx, event).await;
        });
    }

    /// Handle application events from background tasks.
    pub async fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        self.needs_redraw = true;
        // reap finished lookups
        while self.title_tasks.try_join_next().is_some() {}
        match event {
            AppEvent::TitleResolved {
                id,
                fallback,
                result,
            } => self.handle_title_resolved(id, &fallback, result).await?,
            AppEvent::TaskPanicked { task, error } => {
                tracing::error!(task, error = %error, "Background task panicked");
                self.set_status(format!("Internal error in {task} task"));
            }
        }
        Ok(())
    }

    async fn handle_title_resolved(
        &mut self,
        id: i64,
        fallback: &str,
        result: Result<String, TitleError>,
    ) -> Result<()> {
        let title = match result {
            Ok(title) if title != fallback => title,
            Ok(_) => {
                self.title_states.insert(id, TitleState::Fallback);
                return Ok(());
            }
            Err(e) => {
                tracing::debug!(id, error = %e, "Title lookup failed, keeping fallback");
                self.title_states.insert(id, TitleState::Fallback);
                return Ok(());
            }
        };

        match self.db.update_url(id, &UrlPatch::title(title)).await {
            Ok(true) => {
                self.title_states.insert(id, TitleState::Resolved);
                self.refresh_urls(true).await?;
            }
            Ok(false) => {
                // deleted while the lookup was in flight
                self.title_states.remove(&id);
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "Failed to store resolved title");
                self.title_states.insert(id, TitleState::Fallback);
            }
        }
        Ok(())
    }
}
