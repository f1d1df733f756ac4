use super::{approval_flag, json_fields};
use crate::app::error::ApiError;
use crate::core::notification::DEFAULT_HISTORY_LIMIT;
use crate::core::NotificationHub;
use crate::domain::notification::{NewNotification, StreamEvent};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderName},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use tower_http::cors::{Any, CorsLayer};

const REQUIRED_FIELDS: [&str; 3] = ["type", "title", "message"];

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Kept as text so a bad value falls back to the default instead of failing the request.
    pub limit: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

const DEFAULT_MANAGER: &str = "manager";

pub fn notification_router(hub: NotificationHub) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/notifications/health", get(health))
        .route("/api/notifications/create", post(create))
        .route("/api/notifications/pending", get(pending))
        .route("/api/notifications/history", get(history))
        .route("/api/notifications/state", get(hub_state))
        .route("/api/notifications/clear", post(clear))
        .route("/api/notifications/stream", get(stream_events))
        .route("/api/notifications/{id}", get(get_notification))
        .route("/api/notifications/{id}/voice", get(voice))
        .route("/api/notifications/{id}/approve", post(approve))
        .layer(cors)
        .with_state(hub)
}

async fn health(State(hub): State<NotificationHub>) -> Json<Value> {
    let snapshot = hub.snapshot().await;
    Json(json!({
        "status": "healthy",
        "message": "Notification service is running",
        "active_listeners": snapshot.active_listeners,
        "pending_count": snapshot.pending_count,
        "voice_enabled": snapshot.voice_available,
        "cached_voices": snapshot.cached_voices,
    }))
}

async fn create(
    State(hub): State<NotificationHub>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let raw: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;
    let Some(fields) = raw.as_object() else {
        return Err(ApiError::BadRequest("Request body must be a JSON object".to_string()));
    };
    if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !fields.contains_key(**f)) {
        return Err(ApiError::BadRequest(format!("Missing required field: {}", missing)));
    }

    let request: NewNotification = serde_json::from_value(raw)
        .map_err(|e| ApiError::BadRequest(format!("Invalid notification: {}", e)))?;
    let notification = hub.create(request).await;

    Ok(Json(json!({
        "message": "Notification created",
        "notification": notification,
    })))
}

async fn voice(
    State(hub): State<NotificationHub>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let audio = hub
        .voice(&id)
        .await
        .ok_or_else(|| ApiError::NotFound("Voice notification not available".to_string()))?;

    let disposition = format!(
        "inline; filename=\"notification_{}.mp3\"",
        &id[..id.len().min(8)]
    );
    Ok((
        [
            (header::CONTENT_TYPE, "audio/mpeg".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        audio,
    )
        .into_response())
}

async fn approve(
    State(hub): State<NotificationHub>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let fields = json_fields(&body)?;
    let approved = approval_flag(&fields)?;
    let manager_id = fields
        .get("manager_id")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_MANAGER);

    // 未知 id 與不需核准的通知都回 400
    let notification = hub
        .approve(&id, approved, manager_id)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(Json(json!({
        "message": "Approval recorded",
        "notification": notification,
    })))
}

async fn pending(State(hub): State<NotificationHub>) -> Json<Value> {
    let pending = hub.pending().await;
    Json(json!({ "count": pending.len(), "pending": pending }))
}

async fn get_notification(
    State(hub): State<NotificationHub>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let notification = hub
        .get(&id)
        .await
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;
    Ok(Json(json!(notification)))
}

async fn history(
    State(hub): State<NotificationHub>,
    Query(query): Query<HistoryQuery>,
) -> Json<Value> {
    let limit = query
        .limit
        .as_deref()
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_HISTORY_LIMIT);
    let history = hub.history(limit, query.kind.as_deref()).await;
    Json(json!({ "count": history.len(), "history": history }))
}

async fn hub_state(State(hub): State<NotificationHub>) -> Json<Value> {
    Json(json!(hub.snapshot().await))
}

async fn clear(State(hub): State<NotificationHub>) -> Json<Value> {
    let removed = hub.clear().await;
    Json(json!({
        "message": format!("Cleared {} notifications", removed),
        "state": hub.snapshot().await,
    }))
}

fn to_sse(event: &StreamEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_else(|e| {
        tracing::error!("Failed to serialize stream event: {}", e);
        r#"{"type":"keepalive"}"#.to_string()
    });
    Event::default().data(data)
}

async fn stream_events(State(hub): State<NotificationHub>) -> impl IntoResponse {
    let listener = hub.subscribe();

    let connected = stream::once(async { Ok::<_, Infallible>(to_sse(&StreamEvent::connected())) });
    let events = stream::unfold(listener, |mut listener| async move {
        let event = listener.next_event().await?;
        Some((Ok::<_, Infallible>(to_sse(&event)), listener))
    });

    (
        [(HeaderName::from_static("x-accel-buffering"), "no")],
        Sse::new(connected.chain(events)),
    )
}
