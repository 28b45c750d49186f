//! End-to-end title backfill: add a URL through the app, let the background
//! lookup hit a mock server, then apply the result.

use std::time::Duration;

use cuedeck::app::{App, AppEvent, Intent};
use cuedeck::config::Config;
use cuedeck::storage::Database;
use cuedeck::title::TitleState;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn test_app() -> (App, mpsc::Receiver<AppEvent>) {
    let db = Database::open(":memory:").await.unwrap();
    let (tx, rx) = mpsc::channel(8);
    let config = Config {
        fetch_titles: true,
        confirm_deletes: false,
        ..Config::default()
    };
    let app = App::new(db, config, std::env::temp_dir(), tx).unwrap();
    (app, rx)
}

async fn next_event(rx: &mut mpsc::Receiver<AppEvent>) -> AppEvent {
    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("title lookup did not report back")
        .expect("channel closed")
}

#[tokio::test]
async fn test_resolved_title_replaces_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/song"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><head><title>Never Gonna Give You Up</title></head></html>",
            "text/html; charset=utf-8",
        ))
        .mount(&server)
        .await;

    let (mut app, mut rx) = test_app().await;
    app.dispatch(Intent::AddUrl(format!("{}/song", server.uri())))
        .await
        .unwrap();

    let id = app.view.ids()[0];
    assert_eq!(app.title_state(id), TitleState::Resolving);
    assert_eq!(app.view.current_entry().unwrap().label(), "127.0.0.1");

    let event = next_event(&mut rx).await;
    app.handle_event(event).await.unwrap();

    assert_eq!(app.title_state(id), TitleState::Resolved);
    assert_eq!(
        app.view.current_entry().unwrap().label(),
        "Never Gonna Give You Up"
    );
    let stored = app.db.get_url(id).await.unwrap().unwrap();
    assert_eq!(stored.title.as_deref(), Some("Never Gonna Give You Up"));
}

#[tokio::test]
async fn test_failed_lookup_keeps_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (mut app, mut rx) = test_app().await;
    app.dispatch(Intent::AddUrl(format!("{}/broken", server.uri())))
        .await
        .unwrap();
    let id = app.view.ids()[0];

    let event = next_event(&mut rx).await;
    app.handle_event(event).await.unwrap();

    assert_eq!(app.title_state(id), TitleState::Fallback);
    let stored = app.db.get_url(id).await.unwrap().unwrap();
    assert_eq!(stored.title.as_deref(), Some("127.0.0.1"));
}

#[tokio::test]
async fn test_lookup_for_deleted_entry_is_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<title>Late</title>", "text/html")
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let (mut app, mut rx) = test_app().await;
    app.dispatch(Intent::AddUrl(format!("{}/late", server.uri())))
        .await
        .unwrap();
    let id = app.view.ids()[0];
    app.dispatch(Intent::DeleteUrl(id)).await.unwrap();

    let event = next_event(&mut rx).await;
    app.handle_event(event).await.unwrap();

    assert!(app.view.is_empty());
    assert!(app.db.list_urls().await.unwrap().is_empty());
}
