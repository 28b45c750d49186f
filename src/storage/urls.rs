use sqlx::{QueryBuilder, SqliteConnection};
use std::collections::HashSet;

use super::schema::{now_millis, Database};
use super::types::{StoreError, UrlEntry, UrlPatch};
use crate::reorder;
use crate::util::{strip_control_chars, validate_url};

impl Database {
    // ========================================================================
    // URL Deck Operations
    // ========================================================================

    /// Append a URL to the end of the deck, returning its id.
    ///
    /// The URL is validated before anything touches the database. The new
    /// entry gets `order = count()`, computed in the same statement as the
    /// insert so two racing adds cannot share a slot.
    pub async fn add_url(&self, url: &str, initial_title: Option<&str>) -> Result<i64, StoreError> {
        let url = url.trim();
        validate_url(url)?;
        let title = initial_title.and_then(clean_title);

        let (id, order): (i64, i64) = sqlx::query_as(
            r#"
            INSERT INTO urls (url, title, sort_order, created_at)
            SELECT ?, ?, COUNT(*), ? FROM urls
            RETURNING id, sort_order
        "#,
        )
        .bind(url)
        .bind(title)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(id, order, "URL appended");
        Ok(id)
    }

    /// All entries in ascending `order`.
    pub async fn list_urls(&self) -> Result<Vec<UrlEntry>, StoreError> {
        let entries = sqlx::query_as::<_, UrlEntry>(
            "SELECT id, url, title, sort_order, created_at FROM urls ORDER BY sort_order, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    pub async fn get_url(&self, id: i64) -> Result<Option<UrlEntry>, StoreError> {
        let entry = sqlx::query_as::<_, UrlEntry>(
            "SELECT id, url, title, sort_order, created_at FROM urls WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    /// Merge `patch` into an entry.
    ///
    /// Returns `false` when the id no longer exists; a vanished entry is not
    /// an error.
    pub async fn update_url(&self, id: i64, patch: &UrlPatch) -> Result<bool, StoreError> {
        if patch.is_empty() {
            return Ok(self.get_url(id).await?.is_some());
        }

        let title = patch.title.as_deref().and_then(clean_title);
        let result = sqlx::query("UPDATE urls SET title = ? WHERE id = ?")
            .bind(title)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove an entry and re-pack the remaining orders to `0..N-1`.
    ///
    /// Both steps run in one transaction. Returns `false` if the id was
    /// already gone, in which case nothing is written.
    pub async fn delete_url(&self, id: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM urls WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        let remaining: Vec<i64> =
            sqlx::query_scalar::<_, i64>("SELECT id FROM urls ORDER BY sort_order, id")
                .fetch_all(&mut *tx)
                .await?;
        write_order(&mut *tx, &remaining).await?;

        tx.commit().await?;
        tracing::debug!(id, remaining = remaining.len(), "URL deleted, orders re-packed");
        Ok(true)
    }

    /// Reassign `order` so entries follow `ids` exactly.
    ///
    /// `ids` must name every stored entry once. Anything else (a duplicate,
    /// an unknown id, a missing id) fails with [`StoreError::OrderMismatch`]
    /// and the store is left as it was.
    pub async fn save_order(&self, ids: &[i64]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let stored: HashSet<i64> = sqlx::query_scalar::<_, i64>("SELECT id FROM urls")
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .collect();
        let given: HashSet<i64> = ids.iter().copied().collect();

        if given.len() != ids.len() || given != stored {
            tracing::debug!(
                stored = stored.len(),
                given = ids.len(),
                "Rejecting reorder that is not a permutation of stored ids"
            );
            return Err(StoreError::OrderMismatch {
                expected: stored.len(),
                got: ids.len(),
            });
        }

        write_order(&mut *tx, ids).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Move an entry `delta` places towards the tail (negative: the head).
    ///
    /// Returns `false` when the id is unknown or the move would leave the deck.
    pub async fn move_url(&self, id: i64, delta: isize) -> Result<bool, StoreError> {
        let ids: Vec<i64> = self.list_urls().await?.iter().map(|e| e.id).collect();
        let Some(index) = ids.iter().position(|&x| x == id) else {
            return Ok(false);
        };
        match reorder::move_by(&ids, index, delta) {
            Some(next) => {
                self.save_order(&next).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Delete every entry, returning how many were removed.
    pub async fn clear_urls(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM urls")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Write `sort_order = position` for every id in a single UPDATE.
///
/// Builds `UPDATE urls SET sort_order = CASE id WHEN ? THEN ? ... END WHERE id IN (...)`.
async fn write_order(conn: &mut SqliteConnection, ids: &[i64]) -> Result<(), sqlx::Error> {
    if ids.is_empty() {
        return Ok(());
    }

    let mut builder: QueryBuilder<sqlx::Sqlite> =
        QueryBuilder::new("UPDATE urls SET sort_order = CASE id ");
    for (position, id) in ids.iter().enumerate() {
        builder.push("WHEN ");
        builder.push_bind(*id);
        builder.push(" THEN ");
        builder.push_bind(position as i64);
        builder.push(" ");
    }
    builder.push("END WHERE id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    builder.build().execute(&mut *conn).await?;
    Ok(())
}

/// Titles are stored trimmed and free of control characters; blank means none.
fn clean_title(title: &str) -> Option<String> {
    let cleaned = strip_control_chars(title);
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{Database, StoreError, UrlPatch};
    use pretty_assertions::assert_eq;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    fn orders(entries: &[crate::storage::UrlEntry]) -> Vec<i64> {
        entries.iter().map(|e| e.order).collect()
    }

    #[tokio::test]
    async fn test_add_url_appends_at_tail() {
        let db = test_db().await;
        let a = db.add_url("https://a.example/", None).await.unwrap();
        let b = db.add_url("https://b.example/", Some("B")).await.unwrap();

        let entries = db.list_urls().await.unwrap();
        assert_eq!(entries.iter().map(|e| e.id).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(orders(&entries), vec![0, 1]);
        assert_eq!(entries[0].title, None);
        assert_eq!(entries[1].title.as_deref(), Some("B"));
        assert!(entries[0].created_at > 0);
    }

    #[tokio::test]
    async fn test_add_url_trims_input() {
        let db = test_db().await;
        db.add_url("  https://a.example/path  ", None).await.unwrap();
        let entries = db.list_urls().await.unwrap();
        assert_eq!(entries[0].url, "https://a.example/path");
    }

    #[tokio::test]
    async fn test_add_url_rejects_malformed_without_writing() {
        let db = test_db().await;
        let err = db.add_url("not-a-url", None).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidUrl(_)));
        assert!(err.is_validation());

        let err = db.add_url("ftp://files.example/", None).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidUrl(_)));

        assert!(db.list_urls().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_url_blank_title_stored_as_none() {
        let db = test_db().await;
        let id = db.add_url("https://a.example/", Some("   ")).await.unwrap();
        assert_eq!(db.get_url(id).await.unwrap().unwrap().title, None);
    }

    #[tokio::test]
    async fn test_update_url_title() {
        let db = test_db().await;
        let id = db.add_url("https://a.example/", Some("a.example")).await.unwrap();

        let found = db.update_url(id, &UrlPatch::title("Song X")).await.unwrap();
        assert!(found);
        assert_eq!(
            db.get_url(id).await.unwrap().unwrap().title.as_deref(),
            Some("Song X")
        );
    }

    #[tokio::test]
    async fn test_update_url_strips_control_chars() {
        let db = test_db().await;
        let id = db.add_url("https://a.example/", None).await.unwrap();
        db.update_url(id, &UrlPatch::title("Evil\x1b[31m Title"))
            .await
            .unwrap();
        let title = db.get_url(id).await.unwrap().unwrap().title.unwrap();
        assert!(!title.contains('\x1b'));
        assert!(title.contains("Evil"));
    }

    #[tokio::test]
    async fn test_update_missing_url_is_noop() {
        let db = test_db().await;
        let found = db.update_url(999, &UrlPatch::title("x")).await.unwrap();
        assert!(!found);
        assert!(!db.update_url(999, &UrlPatch::default()).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_url_repacks_orders() {
        let db = test_db().await;
        let a = db.add_url("https://a.example/", None).await.unwrap();
        let b = db.add_url("https://b.example/", None).await.unwrap();
        let c = db.add_url("https://c.example/", None).await.unwrap();

        assert!(db.delete_url(b).await.unwrap());

        let entries = db.list_urls().await.unwrap();
        assert_eq!(entries.iter().map(|e| e.id).collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(orders(&entries), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_delete_missing_url_is_noop() {
        let db = test_db().await;
        db.add_url("https://a.example/", None).await.unwrap();
        assert!(!db.delete_url(12345).await.unwrap());
        assert_eq!(db.list_urls().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let db = test_db().await;
        let a = db.add_url("https://a.example/", None).await.unwrap();
        db.delete_url(a).await.unwrap();
        let b = db.add_url("https://b.example/", None).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_save_order_rejects_duplicates() {
        let db = test_db().await;
        let a = db.add_url("https://a.example/", None).await.unwrap();
        let b = db.add_url("https://b.example/", None).await.unwrap();

        let err = db.save_order(&[a, a]).await.unwrap_err();
        assert!(matches!(err, StoreError::OrderMismatch { .. }));

        let ids: Vec<i64> = db.list_urls().await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[tokio::test]
    async fn test_save_order_rejects_partial_and_unknown() {
        let db = test_db().await;
        let a = db.add_url("https://a.example/", None).await.unwrap();
        let b = db.add_url("https://b.example/", None).await.unwrap();

        assert!(db.save_order(&[b]).await.is_err());
        assert!(db.save_order(&[b, a, 777]).await.is_err());
        assert!(db.save_order(&[b, 777]).await.is_err());

        let entries = db.list_urls().await.unwrap();
        assert_eq!(entries.iter().map(|e| e.id).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(orders(&entries), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_save_order_on_empty_deck() {
        let db = test_db().await;
        db.save_order(&[]).await.unwrap();
        assert!(db.save_order(&[1]).await.is_err());
    }

    #[tokio::test]
    async fn test_move_url_swaps_neighbours() {
        let db = test_db().await;
        let a = db.add_url("https://a.example/", None).await.unwrap();
        let b = db.add_url("https://b.example/", None).await.unwrap();
        let c = db.add_url("https://c.example/", None).await.unwrap();

        assert!(db.move_url(c, -1).await.unwrap());
        let ids: Vec<i64> = db.list_urls().await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, c, b]);

        assert!(db.move_url(a, 1).await.unwrap());
        let entries = db.list_urls().await.unwrap();
        assert_eq!(entries.iter().map(|e| e.id).collect::<Vec<_>>(), vec![c, a, b]);
        assert_eq!(orders(&entries), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_move_url_past_ends_is_noop() {
        let db = test_db().await;
        let a = db.add_url("https://a.example/", None).await.unwrap();
        let b = db.add_url("https://b.example/", None).await.unwrap();

        assert!(!db.move_url(a, -1).await.unwrap());
        assert!(!db.move_url(b, 1).await.unwrap());
        assert!(!db.move_url(999, 1).await.unwrap());

        let ids: Vec<i64> = db.list_urls().await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[tokio::test]
    async fn test_clear_urls() {
        let db = test_db().await;
        db.add_url("https://a.example/", None).await.unwrap();
        db.add_url("https://b.example/", None).await.unwrap();

        assert_eq!(db.clear_urls().await.unwrap(), 2);
        assert!(db.list_urls().await.unwrap().is_empty());

        // Appending after a clear starts from order 0 again
        db.add_url("https://c.example/", None).await.unwrap();
        assert_eq!(orders(&db.list_urls().await.unwrap()), vec![0]);
    }
}
