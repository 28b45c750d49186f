//! Integration tests for the URL deck: ordering, reordering and the viewer.
//!
//! Each test creates its own in-memory SQLite database for isolation.

use cuedeck::reorder;
use cuedeck::storage::{Database, StoreError, UrlPatch};
use cuedeck::viewer::ViewState;
use proptest::prelude::*;

async fn test_db() -> Database {
    Database::open(":memory:").await.unwrap()
}

async fn seed(db: &Database, urls: &[&str]) -> Vec<i64> {
    let mut ids = Vec::new();
    for url in urls {
        ids.push(db.add_url(url, None).await.unwrap());
    }
    ids
}

fn orders(entries: &[cuedeck::storage::UrlEntry]) -> Vec<i64> {
    entries.iter().map(|e| e.order).collect()
}

// ============================================================================
// Ordering
// ============================================================================

#[tokio::test]
async fn test_added_urls_append_in_order() {
    let db = test_db().await;
    seed(&db, &["https://a.example/", "https://b.example/", "https://c.example/"]).await;

    let urls = db.list_urls().await.unwrap();
    let listed: Vec<&str> = urls.iter().map(|e| e.url.as_str()).collect();
    assert_eq!(
        listed,
        vec!["https://a.example/", "https://b.example/", "https://c.example/"]
    );
    assert_eq!(orders(&urls), vec![0, 1, 2]);
}

#[tokio::test]
async fn test_delete_middle_repacks() {
    let db = test_db().await;
    let ids = seed(&db, &["https://a.example/", "https://b.example/", "https://c.example/"]).await;

    assert!(db.delete_url(ids[1]).await.unwrap());
    let urls = db.list_urls().await.unwrap();
    assert_eq!(orders(&urls), vec![0, 1]);
    assert_eq!(urls[1].id, ids[2]);

    // a new entry lands at the end
    let d = db.add_url("https://d.example/", None).await.unwrap();
    let urls = db.list_urls().await.unwrap();
    assert_eq!(urls[2].id, d);
    assert_eq!(urls[2].order, 2);
}

#[tokio::test]
async fn test_delete_missing_is_noop() {
    let db = test_db().await;
    seed(&db, &["https://a.example/"]).await;
    assert!(!db.delete_url(999).await.unwrap());
    assert_eq!(db.list_urls().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_save_order_permutation() {
    let db = test_db().await;
    let ids = seed(&db, &["https://a.example/", "https://b.example/", "https://c.example/"]).await;

    db.save_order(&[ids[2], ids[0], ids[1]]).await.unwrap();
    let listed: Vec<i64> = db.list_urls().await.unwrap().iter().map(|e| e.id).collect();
    assert_eq!(listed, vec![ids[2], ids[0], ids[1]]);
}

#[tokio::test]
async fn test_save_order_rejects_stale_list() {
    let db = test_db().await;
    let ids = seed(&db, &["https://a.example/", "https://b.example/"]).await;

    // missing an id
    let err = db.save_order(&[ids[1]]).await.unwrap_err();
    assert!(matches!(err, StoreError::OrderMismatch { .. }));

    // unknown id
    let err = db.save_order(&[ids[1], 4242]).await.unwrap_err();
    assert!(matches!(err, StoreError::OrderMismatch { .. }));

    // nothing changed
    let listed: Vec<i64> = db.list_urls().await.unwrap().iter().map(|e| e.id).collect();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn test_move_url_past_ends_is_refused() {
    let db = test_db().await;
    let ids = seed(&db, &["https://a.example/", "https://b.example/"]).await;

    assert!(!db.move_url(ids[0], -1).await.unwrap());
    assert!(!db.move_url(ids[1], 1).await.unwrap());
    assert!(db.move_url(ids[0], 1).await.unwrap());

    let listed: Vec<i64> = db.list_urls().await.unwrap().iter().map(|e| e.id).collect();
    assert_eq!(listed, vec![ids[1], ids[0]]);
}

#[tokio::test]
async fn test_update_title_keeps_position() {
    let db = test_db().await;
    let ids = seed(&db, &["https://a.example/", "https://b.example/"]).await;

    assert!(db.update_url(ids[1], &UrlPatch::title("Bee")).await.unwrap());
    let entry = db.get_url(ids[1]).await.unwrap().unwrap();
    assert_eq!(entry.title.as_deref(), Some("Bee"));
    assert_eq!(entry.order, 1);

    assert!(!db.update_url(999, &UrlPatch::title("x")).await.unwrap());
}

// ============================================================================
// Viewer against the store
// ============================================================================

#[tokio::test]
async fn test_viewer_follows_entry_across_delete() {
    let db = test_db().await;
    let ids = seed(&db, &["https://a.example/", "https://b.example/", "https://c.example/"]).await;

    let mut view = ViewState::new(db.list_urls().await.unwrap());
    assert!(view.select_id(ids[1]));

    db.delete_url(ids[0]).await.unwrap();
    view.refresh(db.list_urls().await.unwrap(), true);

    assert_eq!(view.current_index(), Some(0));
    assert_eq!(view.current_entry().map(|e| e.id), Some(ids[1]));
}

#[tokio::test]
async fn test_viewer_follows_entry_across_reorder() {
    let db = test_db().await;
    let ids = seed(&db, &["https://a.example/", "https://b.example/", "https://c.example/"]).await;

    let mut view = ViewState::new(db.list_urls().await.unwrap());
    view.select_id(ids[0]);

    let order = reorder::move_to(&view.ids(), 0, 2).unwrap();
    db.save_order(&order).await.unwrap();
    view.refresh(db.list_urls().await.unwrap(), true);

    assert_eq!(view.current_index(), Some(2));
    assert_eq!(view.current_entry().map(|e| e.id), Some(ids[0]));
}

#[tokio::test]
async fn test_clear_urls_empties_viewer() {
    let db = test_db().await;
    seed(&db, &["https://a.example/", "https://b.example/"]).await;
    let mut view = ViewState::new(db.list_urls().await.unwrap());
    view.next();

    assert_eq!(db.clear_urls().await.unwrap(), 2);
    view.refresh(db.list_urls().await.unwrap(), true);
    assert!(view.current_entry().is_none());
    assert_eq!(view.current_index(), None);
}

// ============================================================================
// Properties
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Add,
    Delete(usize),
    Move(usize, isize),
    MoveTo(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Add),
        (0usize..8).prop_map(Op::Delete),
        (0usize..8, -3isize..=3).prop_map(|(i, d)| Op::Move(i, d)),
        (0usize..8, 0usize..8).prop_map(|(f, t)| Op::MoveTo(f, t)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Orders stay 0..n-1 and match list positions after any mix of edits.
    #[test]
    fn prop_orders_stay_contiguous(ops in prop::collection::vec(op(), 1..24)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let db = test_db().await;
            let mut n = 0usize;
            for op in ops {
                let ids: Vec<i64> = db.list_urls().await.unwrap().iter().map(|e| e.id).collect();
                match op {
                    Op::Add => {
                        db.add_url(&format!("https://site{n}.example/"), None).await.unwrap();
                        n += 1;
                    }
                    Op::Delete(i) => {
                        if let Some(&id) = ids.get(i) {
                            db.delete_url(id).await.unwrap();
                        }
                    }
                    Op::Move(i, d) => {
                        if let Some(&id) = ids.get(i) {
                            db.move_url(id, d).await.unwrap();
                        }
                    }
                    Op::MoveTo(from, to) => {
                        if let Some(order) = reorder::move_to(&ids, from, to) {
                            db.save_order(&order).await.unwrap();
                        }
                    }
                }

                let urls = db.list_urls().await.unwrap();
                let expected: Vec<i64> = (0..urls.len() as i64).collect();
                prop_assert_eq!(orders(&urls), expected);
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// `move_to` is always a permutation that puts the moved id at `to`.
    #[test]
    fn prop_move_to_is_permutation(len in 1usize..12, from in 0usize..12, to in 0usize..12) {
        let ids: Vec<i64> = (100..100 + len as i64).collect();
        match reorder::move_to(&ids, from, to) {
            Some(moved) => {
                prop_assert!(from < len && to < len && from != to);
                prop_assert_eq!(moved[to], ids[from]);
                let mut sorted = moved.clone();
                sorted.sort_unstable();
                prop_assert_eq!(sorted, ids);
            }
            None => prop_assert!(from >= len || to >= len || from == to),
        }
    }
}
