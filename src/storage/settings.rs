use super::schema::Database;
use super::types::StoreError;

/// URL of the entry last shown in the viewer pane.
pub const LAST_VIEWED_URL: &str = "viewer.last_url";
/// Whether the snippet panel is collapsed.
pub const SNIPPETS_COLLAPSED: &str = "panel.snippets_collapsed";

impl Database {
    // ========================================================================
    // Settings Operations
    // ========================================================================

    /// Get a single setting by key, or `None` if it was never set.
    ///
    /// Keys use dotted convention: `viewer.last_url`, `panel.snippets_collapsed`.
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    /// Set a setting (UPSERT), refreshing its timestamp.
    pub async fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn last_viewed_url(&self) -> Result<Option<String>, StoreError> {
        self.get_setting(LAST_VIEWED_URL).await
    }

    pub async fn set_last_viewed_url(&self, url: &str) -> Result<(), StoreError> {
        self.set_setting(LAST_VIEWED_URL, url).await
    }

    /// Anything other than a stored `"true"` reads as expanded.
    pub async fn snippets_collapsed(&self) -> Result<bool, StoreError> {
        Ok(self.get_setting(SNIPPETS_COLLAPSED).await?.as_deref() == Some("true"))
    }

    pub async fn set_snippets_collapsed(&self, collapsed: bool) -> Result<(), StoreError> {
        let value = if collapsed { "true" } else { "false" };
        self.set_setting(SNIPPETS_COLLAPSED, value).await
    }
}
