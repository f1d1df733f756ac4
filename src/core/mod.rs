pub mod agents;
pub mod dataset;
pub mod notification;
pub mod reply;
pub mod speech_text;
pub mod workflow;

pub use crate::domain::ports::{ModelClient, SpeechSynthesizer};
pub use crate::utils::error::Result;
pub use dataset::DatasetPaths;
pub use notification::{HubSettings, NotificationHub, NotificationListener};
pub use workflow::WorkflowEngine;
