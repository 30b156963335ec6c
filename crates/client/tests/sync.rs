//! Integration tests for REST reconciliation into the store.

mod common;

use assert_matches::assert_matches;
use ustaz_client::{NotificationSync, SyncError};
use ustaz_realtime::{NotificationApi, NotificationApiError};
use ustaz_store::NotificationStore;

use common::{notification_json, serve_http};

fn page_body(ids: &[(&str, bool)], page: u32, pages: u32, total: u64, unread: u64) -> String {
    let notifications: Vec<_> = ids.iter().map(|(id, read)| notification_json(id, *read)).collect();
    serde_json::json!({
        "data": {
            "notifications": notifications,
            "pagination": { "page": page, "limit": 2, "total": total, "pages": pages },
            "unreadCount": unread
        }
    })
    .to_string()
}

// ---------------------------------------------------------------------------
// Test: first page replaces the list and sets the unread count
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_page_populates_store() {
    let (url, server) = serve_http(vec![(
        "200 OK",
        page_body(&[("n1", false), ("n2", true)], 1, 2, 3, 2),
    )])
    .await;
    let store = NotificationStore::new();
    let sync = NotificationSync::new(NotificationApi::new(url, "tok"), store.clone(), 2);

    sync.load_first_page().await.unwrap();

    let state = store.snapshot();
    assert_eq!(state.notifications.len(), 2);
    assert_eq!(state.unread_count, 2);
    assert!(state.pagination.has_more());
    assert!(!state.loading);
    assert!(state.error.is_none());

    let heads = server.await.unwrap();
    assert!(heads[0].starts_with("GET /api/notifications?limit=2&skip=0 "), "{}", heads[0]);
}

// ---------------------------------------------------------------------------
// Test: next page appends and stops when exhausted
// ---------------------------------------------------------------------------

#[tokio::test]
async fn next_page_appends_until_exhausted() {
    let (url, server) = serve_http(vec![
        ("200 OK", page_body(&[("n1", false), ("n2", false)], 1, 2, 3, 3)),
        ("200 OK", page_body(&[("n2", false), ("n3", false)], 2, 2, 3, 3)),
    ])
    .await;
    let store = NotificationStore::new();
    let sync = NotificationSync::new(NotificationApi::new(url, "tok"), store.clone(), 2);

    sync.load_first_page().await.unwrap();
    assert!(sync.load_next_page().await.unwrap());
    // Page 2 of 2 loaded; no request is made.
    assert!(!sync.load_next_page().await.unwrap());

    let ids: Vec<String> = store.read(|s| s.notifications.iter().map(|n| n.id.clone()).collect());
    assert_eq!(ids, vec!["n1", "n2", "n3"]);

    let heads = server.await.unwrap();
    assert!(heads[1].starts_with("GET /api/notifications?limit=2&skip=2 "), "{}", heads[1]);
}

// ---------------------------------------------------------------------------
// Test: a failed load records the error in the store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_load_sets_store_error() {
    let (url, _server) = serve_http(vec![("500 Internal Server Error", r#"{"message":"db down"}"#.into())]).await;
    let store = NotificationStore::new();
    let sync = NotificationSync::new(NotificationApi::new(url, "tok"), store.clone(), 20);

    let err = sync.load_first_page().await.unwrap_err();

    assert_matches!(err, SyncError::Api(NotificationApiError::ApiError { status: 500, .. }));
    let state = store.snapshot();
    assert!(!state.loading);
    assert!(state.error.unwrap().contains("db down"));
}

// ---------------------------------------------------------------------------
// Test: unread count refresh overwrites the badge
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unread_count_refresh() {
    let (url, _server) = serve_http(vec![("200 OK", r#"{"data":{"count":4}}"#.into())]).await;
    let store = NotificationStore::new();
    let sync = NotificationSync::new(NotificationApi::new(url, "tok"), store.clone(), 20);

    assert_eq!(sync.refresh_unread_count().await.unwrap(), 4);
    assert_eq!(store.unread_count(), 4);
}

// ---------------------------------------------------------------------------
// Test: delete removes locally only after the server accepted it
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_removes_after_server_ack() {
    let (url, server) = serve_http(vec![
        ("200 OK", page_body(&[("n1", false), ("n2", false)], 1, 1, 2, 2)),
        ("404 Not Found", r#"{"message":"not found"}"#.into()),
        ("200 OK", r#"{"data":null}"#.into()),
    ])
    .await;
    let store = NotificationStore::new();
    let sync = NotificationSync::new(NotificationApi::new(url, "tok"), store.clone(), 20);
    sync.load_first_page().await.unwrap();

    assert!(sync.delete("n1").await.is_err());
    assert!(store.contains("n1"));

    sync.delete("n1").await.unwrap();
    assert!(!store.contains("n1"));
    assert_eq!(store.unread_count(), 1);

    let heads = server.await.unwrap();
    assert!(heads[2].starts_with("DELETE /api/notifications/n1 "));
}
