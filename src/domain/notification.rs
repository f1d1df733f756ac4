use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    ApprovalRequest,
    WorkflowUpdate,
    Error,
    Info,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApprovalRequest => "approval_request",
            Self::WorkflowUpdate => "workflow_update",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    /// High and critical notifications get a voice clip unless told otherwise.
    pub fn wants_voice(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Delivered,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approval {
    pub approved: bool,
    pub manager_id: String,
    pub response_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: Priority,
    pub requires_approval: bool,
    pub agent_id: Option<String>,
    pub data: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub status: NotificationStatus,
    pub approval: Option<Approval>,
    pub manager_response_at: Option<DateTime<Utc>>,
    pub has_voice: bool,
    pub voice_url: Option<String>,
}

impl Notification {
    pub fn voice_path(id: &str) -> String {
        format!("/api/notifications/{}/voice", id)
    }
}

/// Input for creating a notification, as accepted by `/api/notifications/create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub requires_approval: bool,
    #[serde(default)]
    pub agent_id: Option<String>,
    /// `None` lets the hub decide from the priority.
    #[serde(default)]
    pub generate_voice: Option<bool>,
}

impl NewNotification {
    pub fn new(kind: NotificationType, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            priority: Priority::default(),
            data: None,
            requires_approval: false,
            agent_id: None,
            generate_voice: None,
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn data(mut self, data: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = data {
            self.data = Some(map);
        }
        self
    }

    pub fn requires_approval(mut self, requires_approval: bool) -> Self {
        self.requires_approval = requires_approval;
        self
    }

    pub fn agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn voice(mut self, generate_voice: bool) -> Self {
        self.generate_voice = Some(generate_voice);
        self
    }
}

/// Control messages pushed to stream listeners next to notifications.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    Connected {
        message: String,
    },
    Keepalive,
    VoiceReady {
        notification_id: String,
        voice_url: String,
    },
    ApprovalResponse {
        notification_id: String,
        approved: bool,
        manager_id: String,
    },
}

/// Everything a stream listener can receive. Notifications serialize flat,
/// so their own `type` field doubles as the event tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StreamEvent {
    Notification(Box<Notification>),
    Signal(Signal),
}

impl StreamEvent {
    pub fn connected() -> Self {
        Self::Signal(Signal::Connected {
            message: "Connected to notification stream".to_string(),
        })
    }

    pub fn keepalive() -> Self {
        Self::Signal(Signal::Keepalive)
    }
}
