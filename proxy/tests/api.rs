//! Proxy endpoint tests driven through the router with `oneshot`.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use ballot_gateway::ContractMethod;
use ballot_nullables::NullGateway;
use ballot_proxy::{router, ProxyMetrics, ProxyServer, ProxyState};
use ballot_types::Address;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN: &str = "0xA";
const VOTER: &str = "0xC";

fn addr(s: &str) -> Address {
    Address::parse(s).unwrap()
}

fn election() -> Arc<NullGateway> {
    let gateway = Arc::new(NullGateway::new(addr(ADMIN)));
    gateway.seed_candidate("Alice", 3);
    gateway.seed_candidate("Bob", 0);
    gateway.seed_authorized(&addr(VOTER));
    gateway.seed_open(true);
    gateway
}

fn app(gateway: Arc<NullGateway>) -> (Router, Arc<ProxyMetrics>) {
    let metrics = Arc::new(ProxyMetrics::new().unwrap());
    let state = ProxyState::new(gateway).with_metrics(metrics.clone());
    (router(state), metrics)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ── GET /api/candidates ──────────────────────────────────────────────────

#[tokio::test]
async fn lists_candidates_with_vote_counts() {
    let (app, _) = app(election());
    let (status, body) = send(app, get("/api/candidates")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "id": 1, "name": "Alice", "votes": 3 },
            { "id": 2, "name": "Bob", "votes": 0 }
        ])
    );
}

#[tokio::test]
async fn empty_election_lists_nothing() {
    let (app, _) = app(Arc::new(NullGateway::new(addr(ADMIN))));
    let (status, body) = send(app, get("/api/candidates")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn read_failure_is_500_with_message() {
    let gateway = election();
    gateway.fail_reads(ContractMethod::CandidatesCount, "daily request count exceeded");
    let (app, metrics) = app(gateway);

    let (status, body) = send(app, get("/api/candidates")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "daily request count exceeded" }));
    assert_eq!(metrics.read_failures.get(), 1);
}

// ── POST /api/vote ───────────────────────────────────────────────────────

#[tokio::test]
async fn vote_returns_transaction_hash() {
    let gateway = election();
    let (app, metrics) = app(gateway.clone());

    let (status, body) = send(
        app,
        post_json("/api/vote", json!({ "candidateId": 2, "voterAddress": VOTER })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert!(body["transactionHash"].as_str().unwrap().starts_with("0x"));
    assert_eq!(gateway.candidates_snapshot()[1].vote_count, 1);
    assert_eq!(metrics.votes_accepted.get(), 1);
}

#[tokio::test]
async fn string_candidate_id_is_accepted() {
    let gateway = election();
    let (app, _) = app(gateway.clone());
    let (status, _) = send(
        app,
        post_json("/api/vote", json!({ "candidateId": "1", "voterAddress": VOTER })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(gateway.candidates_snapshot()[0].vote_count, 4);
}

#[tokio::test]
async fn contract_rejection_is_400_with_raw_message() {
    let (app, metrics) = app(election());
    let (status, body) = send(
        app,
        post_json("/api/vote", json!({ "candidateId": 1, "voterAddress": "0xB" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "success": false,
            "error": format!("execution reverted: {}", NullGateway::NOT_AUTHORIZED)
        })
    );
    assert_eq!(metrics.votes_failed.get(), 1);
}

#[tokio::test]
async fn malformed_body_is_400() {
    let gateway = election();
    let (app, _) = app(gateway.clone());
    let (status, body) = send(app, post_json("/api/vote", json!({ "candidateId": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("voterAddress"));
    assert!(gateway.writes().is_empty());
}

// ── Ambient ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn metrics_endpoint_counts_requests() {
    let (app, _) = app(election());
    send(app.clone(), get("/api/candidates")).await;

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("ballot_proxy_requests_total{endpoint=\"candidates\"} 1"));
}

#[tokio::test]
async fn metrics_are_404_when_disabled() {
    let app = router(ProxyState::new(election()));
    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let (app, _) = app(election());
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/vote")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn server_stops_on_shutdown() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (tx, rx) = tokio::sync::broadcast::channel(1);
    let server = ProxyServer::new(0, ProxyState::new(election()));
    let handle = tokio::spawn(server.serve(listener, rx));

    tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn server_stops_when_the_controller_fires() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let controller = ballot_utils::ShutdownController::new();
    let server = ProxyServer::new(0, ProxyState::new(election()));
    let handle = tokio::spawn(server.serve(listener, controller.subscribe()));

    // Still accepting connections until the stop request.
    tokio::net::TcpStream::connect(addr).await.unwrap();

    controller.shutdown();
    tokio::time::timeout(std::time::Duration::from_secs(2), handle)
        .await
        .expect("server kept running after shutdown")
        .unwrap()
        .unwrap();
}
