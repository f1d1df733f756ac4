pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;
pub use config::ServiceConfig;

pub use adapters::{AnthropicClient, ElevenLabsClient};
pub use app::{notification_router, orchestrator_router, ApiError};
pub use crate::core::{NotificationHub, WorkflowEngine};
pub use utils::error::{Result, SourceBotError};
