//! Exercises `ReqwestTransport` + `Dispatcher` against a local axum endpoint.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use dispatch::{DispatchError, Dispatcher, Endpoint, ReqwestTransport, RetryPolicy};
use serde_json::{Value, json};

#[derive(Clone)]
struct Script {
    hits: Arc<AtomicU32>,
    /// Status codes returned before the endpoint starts succeeding.
    failures: Arc<Vec<u16>>,
}

async fn handler(State(script): State<Script>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let n = script.hits.fetch_add(1, Ordering::SeqCst) as usize;
    if let Some(code) = script.failures.get(n) {
        let status = StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, Json(json!({ "error": "scripted" })));
    }
    (StatusCode::OK, Json(json!({ "echo": body["prompt"], "attempt": n + 1 })))
}

async fn serve(failures: Vec<u16>) -> (String, Arc<AtomicU32>) {
    let hits = Arc::new(AtomicU32::new(0));
    let script = Script { hits: hits.clone(), failures: Arc::new(failures) };
    let app = Router::new().route("/generate", post(handler)).with_state(script);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/generate?key=test"), hits)
}

fn dispatcher(base_ms: u64) -> Dispatcher {
    let transport = ReqwestTransport::new(Duration::from_secs(2), Duration::from_secs(5)).unwrap();
    Dispatcher::new(Arc::new(transport), RetryPolicy::new(3, Duration::from_millis(base_ms), Duration::from_secs(5)))
}

#[tokio::test]
async fn retries_rate_limit_then_decodes_success() {
    let (url, hits) = serve(vec![429, 429]).await;
    let d = dispatcher(20);

    let start = Instant::now();
    let body: Value = d.call(&Endpoint::new("local", url), &json!({ "prompt": "hello" })).await.unwrap();

    assert_eq!(body["echo"], "hello");
    assert_eq!(body["attempt"], 3);
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert!(start.elapsed() >= Duration::from_millis(20 * (1 + 2)));
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let (url, hits) = serve(vec![404]).await;
    let d = dispatcher(20);

    let err = d.call_raw(&Endpoint::new("local", url), &json!({})).await.unwrap_err();
    assert!(matches!(err, DispatchError::Status { status: 404, .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn server_errors_exhaust_attempts() {
    let (url, hits) = serve(vec![500, 502, 503, 504]).await;
    let d = dispatcher(5);

    let err = d.call_raw(&Endpoint::new("local", url), &json!({})).await.unwrap_err();
    assert!(matches!(err, DispatchError::Exhausted { attempts: 3, .. }));
    assert_eq!(err.last_status(), Some(503));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn connection_refused_is_transient_then_exhausted() {
    // Bind then drop to get a port with nothing listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let d = dispatcher(5);
    let err = d.call_raw(&Endpoint::new("closed", format!("http://{addr}/x")), &json!({})).await.unwrap_err();
    match err {
        DispatchError::Exhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, DispatchError::Transport(_)));
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
}
