use crate::core::speech_text::format_notification_text;
use crate::domain::notification::{
    Approval, NewNotification, Notification, NotificationStatus, NotificationType, Priority,
    Signal, StreamEvent,
};
use crate::domain::ports::SpeechSynthesizer;
use crate::utils::error::{Result, SourceBotError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 256;
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct HubSettings {
    pub auto_approval: bool,
    pub voice_enabled: bool,
    pub keepalive_interval: Duration,
    /// Events buffered per listener before a slow listener starts skipping.
    pub channel_capacity: usize,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            auto_approval: false,
            voice_enabled: true,
            keepalive_interval: Duration::from_secs(30),
            channel_capacity: CHANNEL_CAPACITY,
        }
    }
}

#[derive(Default)]
struct HubState {
    notifications: Vec<Notification>,
    pending: Vec<String>,
    voice_cache: HashMap<String, Vec<u8>>,
    last_update: Option<DateTime<Utc>>,
}

struct HubInner {
    state: RwLock<HubState>,
    sender: broadcast::Sender<StreamEvent>,
    active_listeners: AtomicUsize,
    settings: HubSettings,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HubSnapshot {
    pub total_notifications: usize,
    pub pending_count: usize,
    pub active_listeners: usize,
    pub auto_approval_enabled: bool,
    pub voice_enabled: bool,
    /// Voice enabled and a configured synthesizer is present.
    pub voice_available: bool,
    pub cached_voices: usize,
    pub last_update: Option<DateTime<Utc>>,
}

/// Business figures for `notify_business_update`.
#[derive(Debug, Clone, Default)]
pub struct BusinessUpdate {
    pub title: String,
    pub message: String,
    pub inventory: Option<serde_json::Value>,
    pub cashflow: Option<serde_json::Value>,
    pub purchase_recommendation: Option<serde_json::Value>,
    pub priority: Option<Priority>,
    pub agent_id: Option<String>,
}

/// In-memory notification center: history, pending approvals, cached voice
/// clips and a broadcast channel feeding every stream listener.
#[derive(Clone)]
pub struct NotificationHub {
    inner: Arc<HubInner>,
}

impl NotificationHub {
    pub fn new(settings: HubSettings, speech: Option<Arc<dyn SpeechSynthesizer>>) -> Self {
        let (sender, _) = broadcast::channel(settings.channel_capacity.max(1));
        Self {
            inner: Arc::new(HubInner {
                state: RwLock::new(HubState::default()),
                sender,
                active_listeners: AtomicUsize::new(0),
                settings,
                speech,
            }),
        }
    }

    pub fn settings(&self) -> &HubSettings {
        &self.inner.settings
    }

    fn configured_speech(&self) -> Option<Arc<dyn SpeechSynthesizer>> {
        self.inner
            .speech
            .as_ref()
            .filter(|speech| speech.is_configured())
            .cloned()
    }

    pub fn voice_available(&self) -> bool {
        self.settings().voice_enabled && self.configured_speech().is_some()
    }

    pub fn active_listeners(&self) -> usize {
        self.inner.active_listeners.load(Ordering::SeqCst)
    }

    fn publish(&self, event: StreamEvent) {
        // 沒有訂閱者時 send 會回傳錯誤，事件直接丟棄
        let _ = self.inner.sender.send(event);
    }

    pub fn subscribe(&self) -> NotificationListener {
        let receiver = self.inner.sender.subscribe();
        let listeners = self.inner.active_listeners.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!("📡 Stream listener connected ({} active)", listeners);

        NotificationListener {
            receiver,
            inner: Arc::clone(&self.inner),
        }
    }

    pub async fn create(&self, request: NewNotification) -> Notification {
        let now = Utc::now();
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            kind: request.kind,
            title: request.title,
            message: request.message,
            priority: request.priority,
            requires_approval: request.requires_approval,
            agent_id: request.agent_id,
            data: request.data.unwrap_or_default(),
            created_at: now,
            status: if request.requires_approval {
                NotificationStatus::Pending
            } else {
                NotificationStatus::Delivered
            },
            approval: None,
            manager_response_at: None,
            has_voice: false,
            voice_url: None,
        };

        {
            let mut state = self.inner.state.write().await;
            state.notifications.push(notification.clone());
            if notification.requires_approval {
                state.pending.push(notification.id.clone());
            }
            state.last_update = Some(now);
            self.publish(StreamEvent::Notification(Box::new(notification.clone())));
        }

        tracing::info!(
            "🔔 [{}] {}",
            notification.kind.as_str().to_uppercase(),
            notification.title
        );
        if notification.requires_approval {
            tracing::info!("  → Awaiting manager approval (ID: {})", notification.id);
        }

        let wants_voice = request.generate_voice.unwrap_or_else(|| {
            self.settings().voice_enabled && notification.priority.wants_voice()
        });
        if wants_voice {
            match self.configured_speech() {
                Some(speech) => self.spawn_voice(notification.clone(), speech),
                None => tracing::debug!("Voice requested for {} but no synthesizer is configured", notification.id),
            }
        }

        notification
    }

    fn spawn_voice(&self, notification: Notification, speech: Arc<dyn SpeechSynthesizer>) {
        let hub = self.clone();
        tokio::spawn(async move {
            let text = format_notification_text(&notification);
            match speech.synthesize(&text).await {
                Ok(audio) => hub.attach_voice(&notification.id, audio).await,
                Err(e) => tracing::warn!("✗ Voice generation failed for {}: {}", notification.id, e),
            }
        });
    }

    async fn attach_voice(&self, id: &str, audio: Vec<u8>) {
        let voice_url = Notification::voice_path(id);
        let mut state = self.inner.state.write().await;

        // clear() 可能在合成期間清掉了這則通知
        let Some(notification) = state.notifications.iter_mut().find(|n| n.id == id) else {
            tracing::debug!("Dropping voice clip for cleared notification {}", id);
            return;
        };
        notification.has_voice = true;
        notification.voice_url = Some(voice_url.clone());
        state.voice_cache.insert(id.to_string(), audio);

        self.publish(StreamEvent::Signal(Signal::VoiceReady {
            notification_id: id.to_string(),
            voice_url,
        }));
        tracing::info!("✓ Voice notification ready: {}", &id[..id.len().min(8)]);
    }

    pub async fn approve(&self, id: &str, approved: bool, manager_id: &str) -> Result<Notification> {
        let now = Utc::now();
        let mut state = self.inner.state.write().await;

        let notification = state
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| SourceBotError::NotFound {
                what: format!("Notification {}", id),
            })?;

        if !notification.requires_approval {
            return Err(SourceBotError::ValidationError {
                message: "This notification does not require approval".to_string(),
            });
        }

        notification.approval = Some(Approval {
            approved,
            manager_id: manager_id.to_string(),
            response_at: now,
        });
        notification.status = if approved {
            NotificationStatus::Approved
        } else {
            NotificationStatus::Rejected
        };
        notification.manager_response_at = Some(now);
        let updated = notification.clone();

        state.pending.retain(|pending_id| pending_id != id);
        state.last_update = Some(now);

        self.publish(StreamEvent::Signal(Signal::ApprovalResponse {
            notification_id: id.to_string(),
            approved,
            manager_id: manager_id.to_string(),
        }));

        tracing::info!(
            "[APPROVAL] {} - {}",
            if approved { "✓ Approved" } else { "✗ Rejected" },
            id
        );
        Ok(updated)
    }

    /// Approves on behalf of the system when auto-approval is switched on.
    pub async fn auto_approve_if_enabled(&self, id: &str) -> Result<bool> {
        if !self.settings().auto_approval {
            return Ok(false);
        }
        self.approve(id, true, "auto_approval_system").await?;
        Ok(true)
    }

    pub async fn get(&self, id: &str) -> Option<Notification> {
        let state = self.inner.state.read().await;
        state.notifications.iter().find(|n| n.id == id).cloned()
    }

    pub async fn pending(&self) -> Vec<Notification> {
        let state = self.inner.state.read().await;
        state
            .pending
            .iter()
            .filter_map(|id| state.notifications.iter().find(|n| &n.id == id).cloned())
            .collect()
    }

    /// Most recent first, optionally filtered by notification type name.
    pub async fn history(&self, limit: usize, kind: Option<&str>) -> Vec<Notification> {
        let state = self.inner.state.read().await;
        let mut history: Vec<Notification> = state
            .notifications
            .iter()
            .rev()
            .filter(|n| kind.map_or(true, |k| n.kind.as_str() == k))
            .cloned()
            .collect();
        history.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        history.truncate(limit);
        history
    }

    pub async fn voice(&self, id: &str) -> Option<Vec<u8>> {
        let state = self.inner.state.read().await;
        state.voice_cache.get(id).cloned()
    }

    pub async fn snapshot(&self) -> HubSnapshot {
        let state = self.inner.state.read().await;
        HubSnapshot {
            total_notifications: state.notifications.len(),
            pending_count: state.pending.len(),
            active_listeners: self.active_listeners(),
            auto_approval_enabled: self.settings().auto_approval,
            voice_enabled: self.settings().voice_enabled,
            voice_available: self.voice_available(),
            cached_voices: state.voice_cache.len(),
            last_update: state.last_update,
        }
    }

    /// Drops history, pending approvals and cached audio. Connected listeners stay subscribed.
    pub async fn clear(&self) -> usize {
        let mut state = self.inner.state.write().await;
        let removed = state.notifications.len();
        *state = HubState::default();
        tracing::info!("🧹 Cleared {} notifications", removed);
        removed
    }

    pub async fn notify_approval_required(
        &self,
        workflow_id: &str,
        workflow_name: &str,
        findings: serde_json::Value,
        agent_id: &str,
    ) -> Notification {
        let request = NewNotification::new(
            NotificationType::ApprovalRequest,
            format!("Approval Required: {}", workflow_name),
            format!(
                "Research phase complete for '{}'. Please review findings and approve to proceed with email drafting.",
                workflow_name
            ),
        )
        .priority(Priority::High)
        .requires_approval(true)
        .agent(agent_id)
        .data(serde_json::json!({
            "workflow_id": workflow_id,
            "workflow_name": workflow_name,
            "findings": findings,
        }))
        .voice(true);

        self.create(request).await
    }

    pub async fn notify_workflow_update(
        &self,
        workflow_id: &str,
        stage: &str,
        status: &str,
        agent_id: &str,
    ) -> Notification {
        let request = NewNotification::new(
            NotificationType::WorkflowUpdate,
            format!("Workflow Update: {}", stage),
            format!("Workflow '{}' is now {}", workflow_id, status),
        )
        .agent(agent_id)
        .data(serde_json::json!({
            "workflow_id": workflow_id,
            "stage": stage,
            "status": status,
        }));

        self.create(request).await
    }

    pub async fn notify_error(
        &self,
        error_message: &str,
        workflow_id: Option<&str>,
        agent_id: &str,
        critical: bool,
    ) -> Notification {
        let request = NewNotification::new(NotificationType::Error, "Error Occurred", error_message)
            .priority(if critical { Priority::Critical } else { Priority::High })
            .agent(agent_id)
            .data(serde_json::json!({
                "workflow_id": workflow_id,
                "is_critical": critical,
            }))
            .voice(critical);

        self.create(request).await
    }

    pub async fn notify_business_update(&self, update: BusinessUpdate) -> Notification {
        let mut data = serde_json::Map::new();
        if let Some(inventory) = update.inventory {
            data.insert("inventory".to_string(), inventory);
        }
        if let Some(cashflow) = update.cashflow {
            data.insert("cashflow".to_string(), cashflow);
        }
        if let Some(recommendation) = update.purchase_recommendation {
            data.insert("purchase_recommendation".to_string(), recommendation);
        }

        let request = NewNotification::new(NotificationType::Info, update.title, update.message)
            .priority(update.priority.unwrap_or(Priority::High))
            .agent(update.agent_id.unwrap_or_else(|| "BusinessAgent".to_string()))
            .data(serde_json::Value::Object(data))
            .voice(true);

        self.create(request).await
    }
}

/// A stream subscription. Counts as an active listener until dropped.
pub struct NotificationListener {
    receiver: broadcast::Receiver<StreamEvent>,
    inner: Arc<HubInner>,
}

impl NotificationListener {
    /// Next event in publish order, or a keepalive after a quiet interval.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        let keepalive = self.inner.settings.keepalive_interval;
        loop {
            match tokio::time::timeout(keepalive, self.receiver.recv()).await {
                Err(_) => return Some(StreamEvent::keepalive()),
                Ok(Ok(event)) => return Some(event),
                Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                    tracing::warn!("Stream listener lagged, skipped {} events", skipped);
                    continue;
                }
                Ok(Err(broadcast::error::RecvError::Closed)) => return None,
            }
        }
    }
}

impl Drop for NotificationListener {
    fn drop(&mut self) {
        let remaining = self.inner.active_listeners.fetch_sub(1, Ordering::SeqCst) - 1;
        tracing::info!("📡 Stream listener disconnected ({} active)", remaining);
    }
}
