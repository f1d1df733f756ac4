use super::{approval_flag, json_fields};
use crate::app::error::ApiError;
use crate::core::WorkflowEngine;
use crate::domain::model::WorkflowState;
use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

pub type EngineState = Arc<WorkflowEngine>;

fn with_state(message: &str, state: &WorkflowState) -> Json<Value> {
    Json(json!({ "message": message, "state": state }))
}

pub fn orchestrator_router(engine: EngineState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(home))
        .route("/api/health", get(health))
        .route("/api/submit-goal", post(submit_goal))
        .route("/api/execute-research", post(execute_research))
        .route("/api/approve-findings", post(approve_findings))
        .route("/api/get-voice-report", get(voice_report))
        .route("/api/get-text-report", get(text_report))
        .route("/api/state", get(workflow_state))
        .route("/api/reset", post(reset))
        .layer(cors)
        .with_state(engine)
}

async fn home() -> Json<Value> {
    Json(json!({
        "message": "SourceBot Multi-Agent Orchestrator",
        "version": "1.0",
        "endpoints": {
            "health": "/api/health",
            "submit_goal": "/api/submit-goal",
            "execute_research": "/api/execute-research",
            "approve_findings": "/api/approve-findings",
            "get_voice_report": "/api/get-voice-report",
            "get_text_report": "/api/get-text-report",
            "get_state": "/api/state",
            "reset": "/api/reset"
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "message": "Orchestrator is running"}))
}

async fn submit_goal(
    State(engine): State<EngineState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let fields = json_fields(&body)?;
    let goal = fields.get("goal").and_then(Value::as_str).unwrap_or_default();

    let state = engine.submit_goal(goal).await?;
    Ok(with_state("Goal submitted and plan created", &state))
}

async fn execute_research(State(engine): State<EngineState>) -> Result<Json<Value>, ApiError> {
    let state = engine.execute_research().await?;
    Ok(with_state("Research completed", &state))
}

async fn approve_findings(
    State(engine): State<EngineState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let approved = approval_flag(&json_fields(&body)?)?;

    let state = engine.approve_findings(approved).await?;
    let message = if approved {
        "Emails drafted successfully"
    } else {
        "Findings rejected"
    };
    Ok(with_state(message, &state))
}

async fn text_report(State(engine): State<EngineState>) -> Result<Json<Value>, ApiError> {
    let report = engine.text_report().await?;
    Ok(Json(json!({ "report": report })))
}

async fn voice_report(State(engine): State<EngineState>) -> Result<Response, ApiError> {
    let report = engine.text_report().await?;
    let audio = engine
        .speak(&report)
        .await
        .map_err(|source| ApiError::Voice {
            source,
            text_report: report.clone(),
        })?;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/mpeg"),
            (
                header::CONTENT_DISPOSITION,
                "inline; filename=\"status_report.mp3\"",
            ),
        ],
        audio,
    )
        .into_response())
}

async fn workflow_state(State(engine): State<EngineState>) -> Json<Value> {
    Json(engine.state().await.summary())
}

async fn reset(State(engine): State<EngineState>) -> Json<Value> {
    let state = engine.reset().await;
    with_state("Workflow reset", &state)
}
