use crate::domain::model::WorkflowStep;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceBotError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{service} returned HTTP {status}: {body}")]
    UpstreamError {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Model reply error: {message}")]
    ModelReplyError { message: String },

    #[error("{message}")]
    WorkflowStateError { message: String },

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("{message}")]
    ValidationError { message: String },

    #[error("{step} step failed: {source}")]
    StepFailed {
        step: WorkflowStep,
        source: Box<SourceBotError>,
    },
}

pub type Result<T> = std::result::Result<T, SourceBotError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Upstream,
    Data,
    Workflow,
    Request,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SourceBotError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn model_reply(message: impl Into<String>) -> Self {
        Self::ModelReplyError {
            message: message.into(),
        }
    }

    pub fn workflow_state(message: impl Into<String>) -> Self {
        Self::WorkflowStateError {
            message: message.into(),
        }
    }

    pub fn step_failed(step: WorkflowStep, source: SourceBotError) -> Self {
        Self::StepFailed {
            step,
            source: Box::new(source),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) => ErrorCategory::Network,
            Self::CsvError(_) | Self::SerializationError(_) | Self::ModelReplyError { .. } => {
                ErrorCategory::Data
            }
            Self::IoError(_) => ErrorCategory::System,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::UpstreamError { .. } => ErrorCategory::Upstream,
            Self::WorkflowStateError { .. } | Self::StepFailed { .. } => ErrorCategory::Workflow,
            Self::NotFound { .. } | Self::ValidationError { .. } => ErrorCategory::Request,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::WorkflowStateError { .. } | Self::NotFound { .. } | Self::ValidationError { .. } => {
                ErrorSeverity::Low
            }
            Self::ApiError(_) | Self::UpstreamError { .. } => ErrorSeverity::Medium,
            Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::ModelReplyError { .. }
            | Self::StepFailed { .. } => ErrorSeverity::High,
            Self::IoError(_)
            | Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ApiError(_) => "Could not reach an external API".to_string(),
            Self::UpstreamError { service, status, .. } => {
                format!("{} rejected the request (HTTP {})", service, status)
            }
            Self::CsvError(_) => "A data file could not be read as CSV".to_string(),
            Self::IoError(e) => format!("File or network I/O failed: {}", e),
            Self::ModelReplyError { .. } | Self::SerializationError(_) => {
                "The model reply could not be understood".to_string()
            }
            Self::ConfigError { message } => format!("Configuration problem: {}", message),
            Self::MissingConfigError { field } => format!("Missing setting: {}", field),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting {}: {}", field, reason)
            }
            Self::StepFailed { step, .. } => step.failure_message().to_string(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check api.env, the TOML config file and the command line flags"
            }
            ErrorCategory::Network => "Check network connectivity and retry",
            ErrorCategory::Upstream => "Verify the API key and model/voice identifiers, then retry",
            ErrorCategory::Data => "Inspect the CSV files or retry the step to get a new model reply",
            ErrorCategory::Workflow => "Check /api/state and follow the workflow order",
            ErrorCategory::Request => "Fix the request parameters",
            ErrorCategory::System => "Check file paths, permissions and that the ports are free",
        }
    }
}
