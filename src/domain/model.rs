use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 一筆 CSV 資料列：欄位名稱 -> 原始字串值，保留標題列順序
pub type CsvRow = IndexMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Idle,
    Planning,
    Planned,
    Researching,
    AwaitingApproval,
    Rejected,
    Drafting,
    Completed,
    Error,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Planning => "planning",
            Self::Planned => "planned",
            Self::Researching => "researching",
            Self::AwaitingApproval => "awaiting_approval",
            Self::Rejected => "rejected",
            Self::Drafting => "drafting",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow stage that can fail; carries the message reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    Planning,
    DataLoad,
    Research,
    Drafting,
    Reporting,
    Voice,
}

impl WorkflowStep {
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::Planning => "Failed to create plan",
            Self::DataLoad => "Failed to load data",
            Self::Research => "Failed to analyze suppliers",
            Self::Drafting => "Failed to draft emails",
            Self::Reporting => "Failed to generate report",
            Self::Voice => "Failed to generate voice",
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Planning => "planning",
            Self::DataLoad => "data load",
            Self::Research => "research",
            Self::Drafting => "drafting",
            Self::Reporting => "reporting",
            Self::Voice => "voice",
        };
        f.write_str(name)
    }
}

fn pending() -> String {
    "pending".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub step_number: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "pending")]
    pub status: String,
}

/// Researcher output. The model decides the exact shape, so the object is kept open.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Findings(pub serde_json::Map<String, serde_json::Value>);

impl Findings {
    pub fn summary(&self) -> Option<&str> {
        self.0.get("summary").and_then(|v| v.as_str())
    }

    pub fn relevant_suppliers(&self) -> Vec<serde_json::Value> {
        self.0
            .get("relevant_suppliers")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmailDraft {
    #[serde(default)]
    pub supplier_id: String,
    #[serde(default)]
    pub supplier_name: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmailDrafts {
    #[serde(default)]
    pub emails: Vec<EmailDraft>,
    #[serde(default)]
    pub summary: String,
}

/// Inventory snapshot and sales history rows loaded for the researcher.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RetailDataset {
    pub inventory: Vec<CsvRow>,
    pub sales: Vec<CsvRow>,
    pub inventory_count: usize,
    pub sales_count: usize,
}

impl RetailDataset {
    pub fn new(inventory: Vec<CsvRow>, sales: Vec<CsvRow>) -> Self {
        Self {
            inventory_count: inventory.len(),
            sales_count: sales.len(),
            inventory,
            sales,
        }
    }

    pub fn len(&self) -> usize {
        self.inventory.len() + self.sales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowState {
    pub workflow_id: Option<String>,
    pub goal: Option<String>,
    pub status: WorkflowStatus,
    pub current_step: u32,
    pub plan: Vec<PlanStep>,
    pub findings: Option<Findings>,
    pub drafts: Option<EmailDrafts>,
    pub suppliers_data: Option<RetailDataset>,
}

impl WorkflowState {
    pub fn for_goal(workflow_id: String, goal: String) -> Self {
        Self {
            workflow_id: Some(workflow_id),
            goal: Some(goal),
            status: WorkflowStatus::Planning,
            ..Self::default()
        }
    }

    /// State without the raw rows; `suppliers_count` replaces `suppliers_data`.
    pub fn summary(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let serde_json::Value::Object(map) = &mut value {
            map.remove("suppliers_data");
            if let Some(data) = &self.suppliers_data {
                map.insert("suppliers_count".to_string(), data.len().into());
            }
        }
        value
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
        }
    }
}
