use super::schema::{now_millis, Database};
use super::types::{Snippet, StoreError};

impl Database {
    // ========================================================================
    // Snippet Operations
    // ========================================================================

    /// Save a snippet, returning its id.
    ///
    /// The title is trimmed; the text is stored as given. A snippet with
    /// neither a title nor any non-blank text is rejected before insert.
    pub async fn add_snippet(&self, title: &str, text: &str) -> Result<i64, StoreError> {
        let title = title.trim();
        if title.is_empty() && text.trim().is_empty() {
            return Err(StoreError::EmptySnippet);
        }

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO snippets (title, text, created_at) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(title)
        .bind(text)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(id, "Snippet saved");
        Ok(id)
    }

    /// All snippets in creation order.
    pub async fn list_snippets(&self) -> Result<Vec<Snippet>, StoreError> {
        let snippets = sqlx::query_as::<_, Snippet>(
            "SELECT id, title, text, created_at FROM snippets ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(snippets)
    }

    /// Delete one snippet. Returns `false` if it was already gone.
    pub async fn delete_snippet(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM snippets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every snippet, returning how many were removed.
    pub async fn clear_snippets(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM snippets")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
