//! Standalone regression tests.
//!
//! Drives the management API router end to end against an in-memory store:
//! monitor CRUD, validation, and the check log view.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use uptime_api::build_router;
use uptime_state::*;

fn test_store() -> StateStore {
    StateStore::open_in_memory().unwrap()
}

async fn call(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn standalone_api_list_monitors_empty() {
    let router = build_router(test_store());

    let (status, body) = call(&router, get("/api/v1/monitors")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn standalone_api_create_and_get_monitor() {
    let router = build_router(test_store());

    let (status, body) = call(
        &router,
        post_json(
            "/api/v1/monitors",
            json!({
                "name": "shop",
                "url": "https://shop.example.com/health",
                "method": "HEAD",
                "interval": 60,
                "keyword": "OK",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created = &body["data"];
    assert_eq!(created["name"], "shop");
    assert_eq!(created["method"], "HEAD");
    assert_eq!(created["interval_secs"], 60);
    assert_eq!(created["status"], "UP");
    assert_eq!(created["retry_count"], 0);

    let id = created["id"].as_u64().unwrap();
    let (status, body) = call(&router, get(&format!("/api/v1/monitors/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["url"], "https://shop.example.com/health");
    assert_eq!(body["data"]["keyword"], "OK");
}

#[tokio::test]
async fn standalone_api_create_applies_defaults() {
    let router = build_router(test_store());

    let (status, body) = call(
        &router,
        post_json(
            "/api/v1/monitors",
            json!({ "name": "blog", "url": "http://blog.example.com", "keyword": "" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["method"], "GET");
    assert_eq!(body["data"]["interval_secs"], 300);
    assert!(body["data"]["keyword"].is_null());
}

#[tokio::test]
async fn standalone_api_create_rejects_invalid() {
    let router = build_router(test_store());

    for payload in [
        json!({ "url": "https://example.com" }),
        json!({ "name": "x" }),
        json!({ "name": "x", "url": "   " }),
        json!({ "name": "x", "url": "ftp://example.com" }),
        json!({ "name": "x", "url": "https://example.com", "interval": 0 }),
    ] {
        let (status, body) = call(&router, post_json("/api/v1/monitors", payload.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {payload}");
        assert_eq!(body["success"], false);
    }

    let (_, body) = call(&router, get("/api/v1/monitors")).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn standalone_api_get_nonexistent_returns_404() {
    let router = build_router(test_store());

    let (status, _) = call(&router, get("/api/v1/monitors/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&router, delete("/api/v1/monitors/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&router, get("/api/v1/monitors/42/logs")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn standalone_api_delete_removes_monitor_and_logs() {
    let store = test_store();
    let monitor = store
        .create_monitor(
            &NewMonitor {
                name: "api".to_string(),
                url: "https://api.example.com".to_string(),
                ..NewMonitor::default()
            },
            1_000,
        )
        .unwrap();
    store
        .append_log(
            monitor.id,
            &NewLogEntry {
                status_code: 200,
                latency_ms: 12,
                failed: false,
                reason: String::new(),
            },
            1_000,
        )
        .unwrap();

    let router = build_router(store.clone());
    let (status, _) = call(&router, delete(&format!("/api/v1/monitors/{}", monitor.id))).await;
    assert_eq!(status, StatusCode::OK);

    assert!(store.get_monitor(monitor.id).unwrap().is_none());
    assert!(store.list_logs_for_monitor(monitor.id, 10).unwrap().is_empty());
}

#[tokio::test]
async fn standalone_api_logs_newest_first_with_limit() {
    let store = test_store();
    let monitor = store
        .create_monitor(
            &NewMonitor {
                name: "api".to_string(),
                url: "https://api.example.com".to_string(),
                ..NewMonitor::default()
            },
            1_000,
        )
        .unwrap();
    for (i, code) in [200u16, 500, 503].into_iter().enumerate() {
        store
            .append_log(
                monitor.id,
                &NewLogEntry {
                    status_code: code,
                    latency_ms: 10,
                    failed: code != 200,
                    reason: if code == 200 {
                        String::new()
                    } else {
                        format!("HTTP {code}")
                    },
                },
                1_000 + i as u64,
            )
            .unwrap();
    }

    let router = build_router(store);
    let (status, body) = call(
        &router,
        get(&format!("/api/v1/monitors/{}/logs?limit=2", monitor.id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let logs = body["data"].as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["status_code"], 503);
    assert_eq!(logs[1]["status_code"], 500);
    assert_eq!(logs[1]["reason"], "HTTP 500");
}

#[tokio::test]
async fn standalone_healthz() {
    let router = build_router(test_store());

    let resp = router.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
