use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use httpmock::prelude::*;
use serde_json::{json, Value};
use sourcebot::core::{DatasetPaths, HubSettings};
use sourcebot::{
    orchestrator_router, AnthropicClient, ElevenLabsClient, NotificationHub, WorkflowEngine,
};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::ServiceExt;

const PLAN: &str = r#"```json
[{"step_number": 1, "title": "Analyze suppliers", "description": "Review dairy data"},
 {"step_number": 2, "title": "Draft emails", "description": "Contact suppliers"}]
```"#;
const FINDINGS: &str = r#"{"summary": "Dairy Co is overstocked on milk",
  "relevant_suppliers": [{"supplier": "Dairy Co", "product": "Milk"}]}"#;
const DRAFTS: &str = r#"{"emails": [{"supplier_name": "Dairy Co", "to": "sales@dairy.example",
  "subject": "Order review", "body": "Hello"}], "summary": "Renegotiate volumes"}"#;
const REPORT: &str = "We reviewed dairy suppliers and drafted one email.";

struct Harness {
    router: Router,
    hub: NotificationHub,
    _inventory: NamedTempFile,
    _sales: NamedTempFile,
}

fn csv_files() -> (NamedTempFile, NamedTempFile) {
    let mut inventory = NamedTempFile::new().unwrap();
    writeln!(
        inventory,
        "Product,OrderList,Trade Price,RRP,Branch Stock Level\nMilk,Dairy Co,0.80,1.20,340"
    )
    .unwrap();
    let mut sales = NamedTempFile::new().unwrap();
    writeln!(
        sales,
        "Product,Qty Sold,Turnover,Profit\nMilk,12,14.40,4.80\nMilk,3,3.60,1.20"
    )
    .unwrap();
    (inventory, sales)
}

fn anthropic_reply(text: &str) -> Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}]
    })
}

async fn mock_agents(server: &MockServer) {
    for (phrase, reply) in [
        ("strategic planning assistant", PLAN),
        ("retail analyst", FINDINGS),
        ("business communication specialist", DRAFTS),
        ("status update", REPORT),
    ] {
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/messages")
                    .header("x-api-key", "test-key")
                    .body_contains(phrase);
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(anthropic_reply(reply));
            })
            .await;
    }
}

fn harness(anthropic_url: String, voice: Option<(String, String)>) -> Harness {
    let (inventory, sales) = csv_files();
    let model = AnthropicClient::new(Some("test-key".to_string()), "claude-test")
        .with_base_url(anthropic_url);
    let speech = match voice {
        Some((key, url)) => ElevenLabsClient::new(Some(key), "voice-1").with_base_url(url),
        None => ElevenLabsClient::new(None, "voice-1"),
    };

    let hub = NotificationHub::new(HubSettings::default(), None);
    let engine = WorkflowEngine::new(
        Arc::new(model),
        Arc::new(speech),
        DatasetPaths::new(inventory.path(), sales.path()),
    )
    .with_notifications(hub.clone());

    Harness {
        router: orchestrator_router(Arc::new(engine)),
        hub,
        _inventory: inventory,
        _sales: sales,
    }
}

async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, _, bytes) = call_raw(router, method, uri, body).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn call_raw(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, bytes.to_vec())
}

#[tokio::test]
async fn test_full_workflow_over_http() {
    let anthropic = MockServer::start_async().await;
    mock_agents(&anthropic).await;
    let elevenlabs = MockServer::start_async().await;
    let tts_mock = elevenlabs
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/text-to-speech/voice-1")
                .header("xi-api-key", "voice-key")
                .body_contains("drafted one email");
            then.status(200)
                .header("Content-Type", "audio/mpeg")
                .body(b"ID3-report");
        })
        .await;

    let h = harness(
        anthropic.base_url(),
        Some(("voice-key".to_string(), elevenlabs.base_url())),
    );

    let (status, body) = call(&h.router, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoints"]["submit_goal"], "/api/submit-goal");

    let (status, body) = call(
        &h.router,
        "POST",
        "/api/submit-goal",
        Some(json!({"goal": "Find better dairy suppliers"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Goal submitted and plan created");
    assert_eq!(body["state"]["status"], "planned");
    assert_eq!(body["state"]["plan"][1]["status"], "pending");

    let (status, body) = call(&h.router, "POST", "/api/execute-research", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Research completed");
    assert_eq!(body["state"]["status"], "awaiting_approval");
    assert_eq!(body["state"]["current_step"], 2);
    assert_eq!(body["state"]["suppliers_data"]["inventory_count"], 1);
    assert_eq!(body["state"]["suppliers_data"]["sales_count"], 2);

    let (_, state) = call(&h.router, "GET", "/api/state", None).await;
    assert!(state.get("suppliers_data").is_none());
    assert_eq!(state["suppliers_count"], 3);
    assert_eq!(state["findings"]["summary"], "Dairy Co is overstocked on milk");

    let pending = h.hub.pending().await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].data["findings"]["supplier_count"], 1);

    let (status, body) = call(
        &h.router,
        "POST",
        "/api/approve-findings",
        Some(json!({"approved": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Emails drafted successfully");
    assert_eq!(body["state"]["status"], "completed");
    assert_eq!(body["state"]["current_step"], 4);
    assert_eq!(body["state"]["drafts"]["emails"][0]["to"], "sales@dairy.example");

    let (status, body) = call(&h.router, "GET", "/api/get-text-report", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"], REPORT);

    let (status, headers, audio) = call_raw(&h.router, "GET", "/api/get-voice-report", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "audio/mpeg");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "inline; filename=\"status_report.mp3\""
    );
    assert_eq!(audio, b"ID3-report".to_vec());
    tts_mock.assert_async().await;

    let (status, body) = call(&h.router, "POST", "/api/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Workflow reset");
    assert_eq!(body["state"]["status"], "idle");
}

#[tokio::test]
async fn test_wrong_order_is_rejected() {
    let anthropic = MockServer::start_async().await;
    let h = harness(anthropic.base_url(), None);

    let (status, body) = call(&h.router, "POST", "/api/execute-research", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Must complete planning first");

    let (status, body) = call(
        &h.router,
        "POST",
        "/api/approve-findings",
        Some(json!({"approved": true})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No findings awaiting approval");

    let (status, body) = call(&h.router, "GET", "/api/get-text-report", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No active workflow");

    let (status, body) = call(&h.router, "POST", "/api/submit-goal", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Goal is required");

    let (_, state) = call(&h.router, "GET", "/api/state", None).await;
    assert_eq!(state["status"], "idle");
}

#[tokio::test]
async fn test_planner_failure_reports_error() {
    let anthropic = MockServer::start_async().await;
    anthropic
        .mock_async(|when, then| {
            when.method(POST).path("/v1/messages");
            then.status(529).body("overloaded");
        })
        .await;
    let h = harness(anthropic.base_url(), None);

    let (status, body) = call(
        &h.router,
        "POST",
        "/api/submit-goal",
        Some(json!({"goal": "Find dairy suppliers"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to create plan");
    assert!(body["details"].as_str().unwrap().contains("529"));

    let (_, state) = call(&h.router, "GET", "/api/state", None).await;
    assert_eq!(state["status"], "error");
    assert_eq!(state["goal"], "Find dairy suppliers");

    let errors = h.hub.history(10, Some("error")).await;
    assert_eq!(errors.len(), 1);
}

#[tokio::test]
async fn test_rejected_findings_and_voice_without_key() {
    let anthropic = MockServer::start_async().await;
    mock_agents(&anthropic).await;
    let h = harness(anthropic.base_url(), None);

    call(
        &h.router,
        "POST",
        "/api/submit-goal",
        Some(json!({"goal": "Find dairy suppliers"})),
    )
    .await;
    call(&h.router, "POST", "/api/execute-research", None).await;

    let (status, body) = call(&h.router, "POST", "/api/approve-findings", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Findings rejected");
    assert_eq!(body["state"]["status"], "rejected");

    let (status, body) = call(&h.router, "GET", "/api/get-voice-report", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to generate voice");
    assert_eq!(body["text_report"], REPORT);
    assert!(body["details"].as_str().unwrap().contains("ELEVENLABS_API_KEY"));
}

async fn post_text(router: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_malformed_approval_never_rejects_findings() {
    let anthropic = MockServer::start_async().await;
    mock_agents(&anthropic).await;
    let h = harness(anthropic.base_url(), None);

    call(
        &h.router,
        "POST",
        "/api/submit-goal",
        Some(json!({"goal": "Find dairy suppliers"})),
    )
    .await;
    call(&h.router, "POST", "/api/execute-research", None).await;

    let (status, body) = post_text(&h.router, "/api/approve-findings", "approved=true").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));

    let (status, _) = call(
        &h.router,
        "POST",
        "/api/approve-findings",
        Some(json!({"approved": "sure"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, state) = call(&h.router, "GET", "/api/state", None).await;
    assert_eq!(state["status"], "awaiting_approval");

    let (status, body) = call(
        &h.router,
        "POST",
        "/api/approve-findings",
        Some(json!({"approved": "true"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Emails drafted successfully");
    assert_eq!(body["state"]["status"], "completed");
}

#[tokio::test]
async fn test_malformed_goal_body_is_a_bad_request() {
    let anthropic = MockServer::start_async().await;
    let h = harness(anthropic.base_url(), None);

    let (status, body) = post_text(&h.router, "/api/submit-goal", "{\"goal\": ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));

    let (_, state) = call(&h.router, "GET", "/api/state", None).await;
    assert_eq!(state["status"], "idle");
}
