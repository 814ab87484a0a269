//! The HTTP poll source and the event-stream subscription against a local axum server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::time::timeout;

use sentinel::error::SourceError;
use sentinel::push::Subscription;
use sentinel::{driver, fallback, Engine, HttpLogSource, LogSource, SourceStatus};

const WAIT: Duration = Duration::from_secs(10);

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

// an address nothing listens on
async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

fn source_for(addr: SocketAddr) -> HttpLogSource {
    HttpLogSource::new(reqwest::Client::new(), format!("http://{addr}/logs"), Duration::from_secs(5))
}

fn logs_body() -> Value {
    json!([
        {
            "proof_type": "Execution Correctness",
            "success": true,
            "message": "Execution results (fee) match: 159909413",
            "evidence": {"ref_fee": 159909413, "nut_fee": 159909413},
            "timestamp": 1768814319.173694
        },
        {
            "proof_type": "Head Correctness",
            "success": false,
            "message": "STATE ROOT MISMATCH at block 29578443",
            "evidence": {"block_number": 29578443},
            "timestamp": 1768814306.787851
        }
    ])
}

async fn events() -> impl IntoResponse {
    let first = json!({
        "proof_type": "Freshness",
        "success": false,
        "message": "STALE DATA DETECTED. Node is 3 blocks behind (~18s)",
        "evidence": {"estimated_lag_seconds": 18},
        "timestamp": 1768814400.5
    });
    let second = json!({
        "proof_type": "Freshness",
        "success": true,
        "message": "Node is fresh. Node is 0 blocks behind (~0s)",
        "evidence": {"estimated_lag_seconds": 0},
        "timestamp": 1768814406.5
    });
    let body = format!(
        ": hello\n\n\
         event: logUpdate\ndata: {first}\n\n\
         event: heartbeat\ndata: {{}}\n\n\
         event: logUpdate\ndata: {{\"message\": \"half a record\"}}\n\n\
         event: logUpdate\ndata: {second}\n\n"
    );
    ([(header::CONTENT_TYPE, "text/event-stream")], body)
}

#[tokio::test]
async fn test_fetch_returns_server_sequence() {
    let addr = serve(Router::new().route("/logs", get(|| async { Json(logs_body()) }))).await;
    let records = source_for(addr).fetch().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].proof_type(), "Execution Correctness");
    assert_eq!(records[1].evidence(), &json!({"block_number": 29578443}));
}

#[tokio::test]
async fn test_fetch_error_status() {
    let app = Router::new().route(
        "/logs",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let addr = serve(app).await;
    assert!(matches!(source_for(addr).fetch().await, Err(SourceError::Status(500))));
}

#[tokio::test]
async fn test_fetch_malformed_body() {
    let addr = serve(Router::new().route("/logs", get(|| async { "definitely not json" }))).await;
    assert!(matches!(source_for(addr).fetch().await, Err(SourceError::Malformed(_))));
}

#[tokio::test]
async fn test_fetch_unreachable() {
    let addr = dead_addr().await;
    assert!(matches!(source_for(addr).fetch().await, Err(SourceError::Transport(_))));
}

#[tokio::test]
async fn test_subscription_delivers_log_updates_only() {
    let addr = serve(Router::new().route("/events", get(events))).await;
    let mut subscription = Subscription::connect(
        reqwest::Client::new(),
        format!("http://{addr}/events"),
        Duration::from_secs(30),
    );
    let first = timeout(WAIT, subscription.next()).await.unwrap().unwrap();
    let second = timeout(WAIT, subscription.next()).await.unwrap().unwrap();
    assert!(first.message().starts_with("STALE DATA DETECTED"));
    assert!(second.message().starts_with("Node is fresh"));
    subscription.unsubscribe();
}

#[tokio::test]
async fn test_engine_goes_live_against_server() {
    let app = Router::new()
        .route("/logs", get(|| async { Json(logs_body()) }))
        .route("/events", get(events));
    let addr = serve(app).await;
    let subscription = Subscription::connect(
        reqwest::Client::new(),
        format!("http://{addr}/events"),
        Duration::from_secs(30),
    );
    let handle = driver::spawn(
        Engine::new(10),
        Arc::new(source_for(addr)),
        Some(subscription),
        Duration::from_secs(5),
    );
    let mut rx = handle.subscribe();
    timeout(WAIT, async {
        while rx.borrow_and_update().status != SourceStatus::Live {
            rx.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    // pushed records that arrive before the poll completes are replaced by it
    let snapshot = handle.current();
    assert!((2..=4).contains(&snapshot.total_records));
    for message in ["Execution results (fee) match: 159909413", "STATE ROOT MISMATCH at block 29578443"] {
        assert!(snapshot.records.iter().any(|r| r.message() == message));
    }
    let engine = handle.shutdown().await.unwrap();
    assert!(engine.records().len() >= 2);
}

#[tokio::test]
async fn test_engine_degrades_when_server_is_down() {
    let addr = dead_addr().await;
    let handle = driver::spawn(Engine::new(10), Arc::new(source_for(addr)), None, Duration::from_secs(5));
    let mut rx = handle.subscribe();
    timeout(WAIT, async {
        while rx.borrow_and_update().status != SourceStatus::Degraded {
            rx.changed().await.unwrap();
        }
    })
    .await
    .unwrap();
    assert_eq!(handle.current().records, fallback::records());
    handle.shutdown().await.unwrap();
}
