use crate::core::agents;
use crate::core::dataset::DatasetPaths;
use crate::core::notification::NotificationHub;
use crate::domain::model::{WorkflowState, WorkflowStatus, WorkflowStep};
use crate::domain::ports::{ModelClient, SpeechSynthesizer};
use crate::utils::error::{Result, SourceBotError};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Drives the single active workflow: plan → research → approval → drafting.
pub struct WorkflowEngine {
    state: RwLock<WorkflowState>,
    model: Arc<dyn ModelClient>,
    speech: Arc<dyn SpeechSynthesizer>,
    datasets: DatasetPaths,
    notifications: Option<NotificationHub>,
}

impl WorkflowEngine {
    pub fn new(
        model: Arc<dyn ModelClient>,
        speech: Arc<dyn SpeechSynthesizer>,
        datasets: DatasetPaths,
    ) -> Self {
        Self {
            state: RwLock::new(WorkflowState::default()),
            model,
            speech,
            datasets,
            notifications: None,
        }
    }

    /// Publish stage changes, approval requests and failures to `hub`.
    pub fn with_notifications(mut self, hub: NotificationHub) -> Self {
        self.notifications = Some(hub);
        self
    }

    pub async fn state(&self) -> WorkflowState {
        self.state.read().await.clone()
    }

    pub async fn reset(&self) -> WorkflowState {
        let mut state = self.state.write().await;
        *state = WorkflowState::default();
        tracing::info!("🔄 Workflow reset");
        state.clone()
    }

    /// Applies `update` only if the workflow was not replaced in the meantime.
    async fn commit<F>(&self, workflow_id: &str, update: F) -> Result<WorkflowState>
    where
        F: FnOnce(&mut WorkflowState),
    {
        let mut state = self.state.write().await;
        if state.workflow_id.as_deref() != Some(workflow_id) {
            return Err(SourceBotError::workflow_state(
                "Workflow was reset while a step was running",
            ));
        }
        update(&mut state);
        Ok(state.clone())
    }

    async fn fail(&self, step: WorkflowStep, workflow_id: &str, error: SourceBotError) -> SourceBotError {
        tracing::error!("❌ {}: {}", step.failure_message(), error);

        let marked = self
            .commit(workflow_id, |state| state.status = WorkflowStatus::Error)
            .await
            .is_ok();

        if marked {
            if let Some(hub) = &self.notifications {
                let message = format!("{}: {}", step.failure_message(), error);
                hub.notify_error(&message, Some(workflow_id), "Orchestrator", false)
                    .await;
            }
        }

        SourceBotError::step_failed(step, error)
    }

    async fn announce(&self, workflow_id: &str, stage: &str, status: WorkflowStatus) {
        tracing::info!("➡️  Workflow {} is now {}", workflow_id, status);
        if let Some(hub) = &self.notifications {
            hub.notify_workflow_update(workflow_id, stage, status.as_str(), "Orchestrator")
                .await;
        }
    }

    /// Starts a new workflow. The goal is stored exactly as sent; only an empty one is refused.
    pub async fn submit_goal(&self, goal: &str) -> Result<WorkflowState> {
        if goal.is_empty() {
            return Err(SourceBotError::ValidationError {
                message: "Goal is required".to_string(),
            });
        }

        let workflow_id = Uuid::new_v4().to_string();
        {
            let mut state = self.state.write().await;
            *state = WorkflowState::for_goal(workflow_id.clone(), goal.to_string());
        }
        tracing::info!("🎯 New goal submitted: {}", goal);
        self.announce(&workflow_id, "planning", WorkflowStatus::Planning)
            .await;

        let plan = match agents::create_plan(self.model.as_ref(), goal).await {
            Ok(plan) => plan,
            Err(e) => return Err(self.fail(WorkflowStep::Planning, &workflow_id, e).await),
        };

        let state = self
            .commit(&workflow_id, |state| {
                state.plan = plan;
                state.status = WorkflowStatus::Planned;
            })
            .await?;
        self.announce(&workflow_id, "planning", WorkflowStatus::Planned)
            .await;
        Ok(state)
    }

    pub async fn execute_research(&self) -> Result<WorkflowState> {
        let (workflow_id, goal) = {
            let mut state = self.state.write().await;
            if state.status != WorkflowStatus::Planned {
                return Err(SourceBotError::workflow_state("Must complete planning first"));
            }
            state.status = WorkflowStatus::Researching;
            state.current_step = 1;
            (
                state.workflow_id.clone().unwrap_or_default(),
                state.goal.clone().unwrap_or_default(),
            )
        };
        self.announce(&workflow_id, "research", WorkflowStatus::Researching)
            .await;

        let paths = self.datasets.clone();
        let loaded = tokio::task::spawn_blocking(move || paths.load())
            .await
            .map_err(|e| SourceBotError::IoError(std::io::Error::other(e)))
            .and_then(|result| result);
        let dataset = match loaded {
            Ok(dataset) => dataset,
            Err(e) => return Err(self.fail(WorkflowStep::DataLoad, &workflow_id, e).await),
        };

        let stored = dataset.clone();
        self.commit(&workflow_id, |state| state.suppliers_data = Some(stored))
            .await?;

        let findings = match agents::analyze_suppliers(self.model.as_ref(), &goal, &dataset).await {
            Ok(findings) => findings,
            Err(e) => return Err(self.fail(WorkflowStep::Research, &workflow_id, e).await),
        };

        let spoken_findings = serde_json::json!({
            "summary": findings.summary(),
            "supplier_count": findings.relevant_suppliers().len(),
        });
        let state = self
            .commit(&workflow_id, |state| {
                state.findings = Some(findings);
                state.status = WorkflowStatus::AwaitingApproval;
                state.current_step = 2;
            })
            .await?;
        self.announce(&workflow_id, "research", WorkflowStatus::AwaitingApproval)
            .await;

        if let Some(hub) = &self.notifications {
            let request = hub
                .notify_approval_required(&workflow_id, &goal, spoken_findings, "Researcher")
                .await;
            if let Err(e) = hub.auto_approve_if_enabled(&request.id).await {
                tracing::warn!("Auto-approval failed for {}: {}", request.id, e);
            }
        }

        Ok(state)
    }

    /// Human-in-the-loop decision on the research findings.
    pub async fn approve_findings(&self, approved: bool) -> Result<WorkflowState> {
        let (workflow_id, goal, findings) = {
            let mut state = self.state.write().await;
            if state.status != WorkflowStatus::AwaitingApproval {
                return Err(SourceBotError::workflow_state("No findings awaiting approval"));
            }
            let workflow_id = state.workflow_id.clone().unwrap_or_default();

            if !approved {
                state.status = WorkflowStatus::Rejected;
                let snapshot = state.clone();
                drop(state);
                self.announce(&workflow_id, "approval", WorkflowStatus::Rejected)
                    .await;
                return Ok(snapshot);
            }

            state.status = WorkflowStatus::Drafting;
            state.current_step = 3;
            (
                workflow_id,
                state.goal.clone().unwrap_or_default(),
                state.findings.clone().unwrap_or_default(),
            )
        };
        self.announce(&workflow_id, "drafting", WorkflowStatus::Drafting)
            .await;

        let suppliers = findings.relevant_suppliers();
        let drafts = match agents::draft_emails(self.model.as_ref(), &goal, &findings, &suppliers).await {
            Ok(drafts) => drafts,
            Err(e) => return Err(self.fail(WorkflowStep::Drafting, &workflow_id, e).await),
        };

        let state = self
            .commit(&workflow_id, |state| {
                state.drafts = Some(drafts);
                state.status = WorkflowStatus::Completed;
                state.current_step = 4;
            })
            .await?;
        self.announce(&workflow_id, "drafting", WorkflowStatus::Completed)
            .await;
        Ok(state)
    }

    pub async fn text_report(&self) -> Result<String> {
        let state = self.state().await;
        if state.status == WorkflowStatus::Idle {
            return Err(SourceBotError::workflow_state("No active workflow"));
        }

        agents::status_report(self.model.as_ref(), &state)
            .await
            .map_err(|e| SourceBotError::step_failed(WorkflowStep::Reporting, e))
    }

    /// MP3 rendering of an already generated report.
    pub async fn speak(&self, report: &str) -> Result<Vec<u8>> {
        self.speech
            .synthesize(report)
            .await
            .map_err(|e| SourceBotError::step_failed(WorkflowStep::Voice, e))
    }
}
