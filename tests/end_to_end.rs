//! End-to-end tests for the payment flow.
//!
//! Each test stands up an in-process mock of the IPG REST service and
//! drives the adapter through token, redirect, result, verify, and
//! settlement against it.

use asanpardakht_rs::{
    Gateway, GatewayConfig, GatewayError, MemoryTransactions, TransactionSink, TransactionStatus,
};
use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Scripted stand-in for the remote gateway.
#[derive(Clone)]
struct MockGateway {
    token_status: u16,
    token_body: String,
    tran_result_status: u16,
    tran_result_body: String,
    verify_status: u16,
    settle_status: u16,
    token_request: Arc<Mutex<Option<Value>>>,
    tran_result_query: Arc<Mutex<Option<HashMap<String, String>>>>,
    verify_calls: Arc<AtomicUsize>,
    settle_calls: Arc<AtomicUsize>,
}

impl MockGateway {
    /// A gateway that lets the whole flow pass.
    fn happy() -> Self {
        Self {
            token_status: 200,
            token_body: "\"REF1\"".to_string(),
            tran_result_status: 200,
            tran_result_body:
                r#"{"refID":"REF1","rrn":"RRN1","cardNumber":"1234","payGateTranID":"PG1"}"#
                    .to_string(),
            verify_status: 200,
            settle_status: 200,
            token_request: Arc::new(Mutex::new(None)),
            tran_result_query: Arc::new(Mutex::new(None)),
            verify_calls: Arc::new(AtomicUsize::new(0)),
            settle_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    async fn spawn(self) -> (String, Self) {
        let mock = self.clone();
        let app = Router::new()
            .route("/v1/Token", post(token_handler))
            .route("/v1/TranResult", get(tran_result_handler))
            .route("/v1/Verify", post(verify_handler))
            .route("/v1/Settlement", post(settle_handler))
            .route("/v1/Time", get(|| async { "\"2024-05-01T09:30:00\"" }))
            .route("/v1/CardHash", get(|| async { "CARDHASH1" }))
            .route("/v1/Cancel", post(|| async { StatusCode::OK }))
            .route("/v1/Reverse", post(|| async { StatusCode::OK }))
            .with_state(self);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (base_url, mock)
    }
}

fn reply(status: u16, body: String) -> (StatusCode, String) {
    (StatusCode::from_u16(status).unwrap(), body)
}

async fn token_handler(
    State(mock): State<MockGateway>,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    *mock.token_request.lock().unwrap() = Some(body);
    reply(mock.token_status, mock.token_body.clone())
}

async fn tran_result_handler(
    State(mock): State<MockGateway>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    *mock.tran_result_query.lock().unwrap() = Some(query);
    reply(mock.tran_result_status, mock.tran_result_body.clone())
}

async fn verify_handler(State(mock): State<MockGateway>) -> (StatusCode, String) {
    mock.verify_calls.fetch_add(1, Ordering::SeqCst);
    reply(mock.verify_status, String::new())
}

async fn settle_handler(State(mock): State<MockGateway>) -> (StatusCode, String) {
    mock.settle_calls.fetch_add(1, Ordering::SeqCst);
    reply(mock.settle_status, String::new())
}

fn gateway_for(base_url: &str) -> Gateway {
    let config = GatewayConfig::new(1044, "user", "pass", "https://shop.example/callback")
        .with_base_url(base_url);
    Gateway::new(config)
}

/// Sink wrapper that counts lifecycle transitions.
struct CountingSink {
    inner: MemoryTransactions,
    fail_calls: usize,
}

impl CountingSink {
    fn new() -> Self {
        Self { inner: MemoryTransactions::new(), fail_calls: 0 }
    }
}

#[async_trait]
impl TransactionSink for CountingSink {
    async fn begin(&mut self, amount: u64) -> asanpardakht_rs::Result<u64> {
        self.inner.begin(amount).await
    }

    async fn set_reference(&mut self, ref_id: &str) -> asanpardakht_rs::Result<()> {
        self.inner.set_reference(ref_id).await
    }

    async fn set_receipt(
        &mut self,
        tracking_code: &str,
        card_number: &str,
    ) -> asanpardakht_rs::Result<()> {
        self.inner.set_receipt(tracking_code, card_number).await
    }

    async fn succeed(&mut self) -> asanpardakht_rs::Result<()> {
        self.inner.succeed().await
    }

    async fn fail(&mut self) -> asanpardakht_rs::Result<()> {
        self.fail_calls += 1;
        self.inner.fail().await
    }

    async fn resume(&mut self, id: u64) -> asanpardakht_rs::Result<()> {
        self.inner.resume(id).await
    }
}

#[tokio::test]
async fn full_flow_succeeds() {
    let (base_url, mock) = MockGateway::happy().spawn().await;
    let mut sink = MemoryTransactions::new();
    let mut gateway = gateway_for(&base_url);

    gateway.set(150_000).ready(&mut sink).await.unwrap();
    assert_eq!(gateway.ref_id(), Some("REF1"));

    let html = gateway.redirect().unwrap().to_html();
    assert!(html.contains("name=\"RefId\" value=\"REF1\""));

    let record = sink.get(1).unwrap().clone();
    gateway.verify(&record, &mut sink).await.unwrap();

    assert_eq!(gateway.ref_id(), Some("REF1"));
    assert_eq!(gateway.tracking_code(), Some("RRN1"));
    assert_eq!(gateway.card_number(), Some("1234"));

    let record = sink.get(1).unwrap();
    assert_eq!(record.status, TransactionStatus::Succeeded);
    assert_eq!(record.ref_id.as_deref(), Some("REF1"));
    assert_eq!(record.tracking_code.as_deref(), Some("RRN1"));
    assert_eq!(record.card_number.as_deref(), Some("1234"));

    assert_eq!(mock.verify_calls.load(Ordering::SeqCst), 1);
    assert_eq!(mock.settle_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn token_request_follows_the_provider_contract() {
    let (base_url, mock) = MockGateway::happy().spawn().await;
    let mut sink = MemoryTransactions::new();
    let mut gateway = gateway_for(&base_url);

    gateway.set(150_000).ready(&mut sink).await.unwrap();

    let body = mock.token_request.lock().unwrap().clone().unwrap();
    assert_eq!(body["serviceTypeId"], 1);
    assert_eq!(body["merchantConfigurationId"], 1044);
    assert_eq!(body["localInvoiceId"], 1);
    assert_eq!(body["amountInRials"], 150_000);
    assert_eq!(body["paymentId"], 0);
    assert_eq!(body["additionalData"], "");
    assert_eq!(body["callbackURL"], "https://shop.example/callback?invoice=1");

    let local_date = body["localDate"].as_str().unwrap();
    let (date, time) = local_date.split_once(' ').unwrap();
    assert_eq!(date.len(), 8);
    assert_eq!(time.len(), 6);
}

#[tokio::test]
async fn tran_result_lookup_is_keyed_by_invoice() {
    let (base_url, mock) = MockGateway::happy().spawn().await;
    let mut sink = MemoryTransactions::new();
    let mut gateway = gateway_for(&base_url);

    gateway.set(150_000).ready(&mut sink).await.unwrap();
    let record = sink.get(1).unwrap().clone();
    gateway.verify(&record, &mut sink).await.unwrap();

    let query = mock.tran_result_query.lock().unwrap().clone().unwrap();
    assert_eq!(query["merchantConfigurationId"], "1044");
    assert_eq!(query["localInvoiceId"], "1");
}

#[tokio::test]
async fn rejected_token_fails_the_transaction() {
    let mut mock = MockGateway::happy();
    mock.token_status = 401;
    mock.token_body = String::new();
    let (base_url, _mock) = mock.spawn().await;

    let mut sink = MemoryTransactions::new();
    let mut gateway = gateway_for(&base_url);

    let err = gateway.set(150_000).ready(&mut sink).await.unwrap_err();
    assert_eq!(err.provider_code(), Some(401));
    assert_eq!(sink.get(1).unwrap().status, TransactionStatus::Failed);
    assert!(gateway.ref_id().is_none());
}

#[tokio::test]
async fn rejected_tran_result_fails_exactly_once() {
    let mut mock = MockGateway::happy();
    mock.tran_result_status = 472;
    mock.tran_result_body = String::new();
    let (base_url, mock) = mock.spawn().await;

    let mut sink = CountingSink::new();
    let mut gateway = gateway_for(&base_url);

    gateway.set(150_000).ready(&mut sink).await.unwrap();
    let record = sink.inner.get(1).unwrap().clone();
    let err = gateway.verify(&record, &mut sink).await.unwrap_err();

    assert_eq!(err.provider_code(), Some(472));
    assert_eq!(sink.fail_calls, 1);
    assert_eq!(sink.inner.get(1).unwrap().status, TransactionStatus::Failed);
    assert_eq!(mock.verify_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn settlement_is_skipped_when_verify_fails() {
    let mut mock = MockGateway::happy();
    mock.verify_status = 500;
    let (base_url, mock) = mock.spawn().await;

    let mut sink = MemoryTransactions::new();
    let mut gateway = gateway_for(&base_url);

    gateway.set(150_000).ready(&mut sink).await.unwrap();
    let record = sink.get(1).unwrap().clone();
    let err = gateway.verify(&record, &mut sink).await.unwrap_err();

    assert_eq!(err.provider_code(), Some(500));
    assert_eq!(mock.verify_calls.load(Ordering::SeqCst), 1);
    assert_eq!(mock.settle_calls.load(Ordering::SeqCst), 0);
    assert_eq!(sink.get(1).unwrap().status, TransactionStatus::Failed);
}

#[tokio::test]
async fn failed_settlement_never_marks_success() {
    let mut mock = MockGateway::happy();
    mock.settle_status = 402;
    let (base_url, mock) = mock.spawn().await;

    let mut sink = MemoryTransactions::new();
    let mut gateway = gateway_for(&base_url);

    gateway.set(150_000).ready(&mut sink).await.unwrap();
    let record = sink.get(1).unwrap().clone();
    let err = gateway.verify(&record, &mut sink).await.unwrap_err();

    assert_eq!(err.provider_code(), Some(402));
    assert_eq!(mock.verify_calls.load(Ordering::SeqCst), 1);
    assert_eq!(mock.settle_calls.load(Ordering::SeqCst), 1);
    assert_eq!(sink.get(1).unwrap().status, TransactionStatus::Failed);
}

#[tokio::test]
async fn transport_failure_is_not_a_provider_status() {
    // Nothing listens on port 9: the connection is refused below HTTP.
    let mut sink = MemoryTransactions::new();
    let mut gateway = gateway_for("http://127.0.0.1:9");

    let err = gateway.set(150_000).ready(&mut sink).await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)));
    assert_eq!(err.provider_code(), None);
    assert_eq!(sink.get(1).unwrap().status, TransactionStatus::Failed);
}

#[tokio::test]
async fn supplementary_operations_round_trip() {
    let (base_url, _mock) = MockGateway::happy().spawn().await;
    let mut sink = MemoryTransactions::new();
    let mut gateway = gateway_for(&base_url);

    assert_eq!(gateway.time().await.unwrap(), "2024-05-01T09:30:00");

    gateway.set(150_000).ready(&mut sink).await.unwrap();
    assert_eq!(gateway.card_hash().await.unwrap(), "CARDHASH1");
    gateway.cancel("PG1").await.unwrap();
    gateway.reverse("PG1").await.unwrap();
}

#[tokio::test]
async fn numeric_pay_gate_tran_id_is_accepted() {
    let mut mock = MockGateway::happy();
    mock.tran_result_body =
        r#"{"refID":"REF1","rrn":"RRN1","cardNumber":"1234","payGateTranID":991}"#.to_string();
    let (base_url, _mock) = mock.spawn().await;

    let mut sink = MemoryTransactions::new();
    let mut gateway = gateway_for(&base_url);

    gateway.set(150_000).ready(&mut sink).await.unwrap();
    let record = sink.get(1).unwrap().clone();
    gateway.verify(&record, &mut sink).await.unwrap();
    assert_eq!(sink.get(1).unwrap().status, TransactionStatus::Succeeded);
}
