use crate::domain::model::WorkflowStep;
use crate::utils::error::SourceBotError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] SourceBotError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    /// Report text was generated but could not be voiced.
    #[error("Failed to generate voice: {source}")]
    Voice {
        source: SourceBotError,
        text_report: String,
    },
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_report: Option<String>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            text_report: None,
        }
    }

    fn details(mut self, details: impl ToString) -> Self {
        self.details = Some(details.to_string());
        self
    }
}

fn service_error(err: &SourceBotError) -> (StatusCode, ErrorBody) {
    match err {
        SourceBotError::WorkflowStateError { .. }
        | SourceBotError::ValidationError { .. }
        | SourceBotError::InvalidConfigValueError { .. } => {
            (StatusCode::BAD_REQUEST, ErrorBody::new(err.to_string()))
        }
        SourceBotError::NotFound { .. } => (StatusCode::NOT_FOUND, ErrorBody::new(err.to_string())),
        SourceBotError::StepFailed { step, source } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::new(step.failure_message()).details(source),
        ),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::new("Internal server error").details(other),
        ),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Service(err) => service_error(err),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, ErrorBody::new(message)),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, ErrorBody::new(message)),
            ApiError::Voice {
                source,
                text_report,
            } => {
                let details = match source {
                    SourceBotError::StepFailed { source, .. } => source.to_string(),
                    other => other.to_string(),
                };
                let mut body = ErrorBody::new(WorkflowStep::Voice.failure_message()).details(details);
                body.text_report = Some(text_report.clone());
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        };

        if status.is_server_error() {
            tracing::error!("❌ {} ({})", self, status);
        } else {
            tracing::debug!("Request rejected: {} ({})", self, status);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_workflow_errors_are_bad_requests() {
        let response =
            ApiError::from(SourceBotError::workflow_state("Must complete planning first")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Must complete planning first"})
        );
    }

    #[tokio::test]
    async fn test_step_failure_carries_details() {
        let err = SourceBotError::step_failed(
            WorkflowStep::Drafting,
            SourceBotError::model_reply("JSON parsing error"),
        );
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Failed to draft emails");
        assert!(body["details"].as_str().unwrap().contains("JSON parsing error"));
    }

    #[tokio::test]
    async fn test_voice_failure_returns_text_report() {
        let response = ApiError::Voice {
            source: SourceBotError::step_failed(
                WorkflowStep::Voice,
                SourceBotError::config("ELEVENLABS_API_KEY is missing"),
            ),
            text_report: "All good.".to_string(),
        }
        .into_response();

        let body = body_json(response).await;
        assert_eq!(body["error"], "Failed to generate voice");
        assert_eq!(body["text_report"], "All good.");
        assert!(body["details"].as_str().unwrap().contains("ELEVENLABS_API_KEY"));
    }

    #[tokio::test]
    async fn test_not_found() {
        let response = ApiError::NotFound("Notification not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Notification not found");
    }
}
