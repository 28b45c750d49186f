//! Local persistence: snippets, the ordered URL deck, and settings.
//!
//! Every public operation is one SQLite statement or one transaction, so a
//! caller never observes a partial write.

mod schema;
mod settings;
mod snippets;
mod types;
mod urls;

pub use schema::Database;
pub use settings::{LAST_VIEWED_URL, SNIPPETS_COLLAPSED};
pub use types::{Snippet, StoreError, UrlEntry, UrlPatch};
