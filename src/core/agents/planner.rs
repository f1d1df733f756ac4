use crate::core::reply::parse_json_reply;
use crate::domain::model::{CompletionRequest, PlanStep};
use crate::domain::ports::ModelClient;
use crate::utils::error::Result;

const MAX_TOKENS: u32 = 2000;

fn plan_prompt(goal: &str) -> String {
    format!(
        r#"You are a strategic planning assistant for supplier relationship management.

The manager has submitted this goal: "{goal}"

Create a detailed, actionable plan to achieve this goal, broken into clear steps.
The plan should cover:
1. Researching supplier data from the inventory and sales records
2. Analyzing the data to identify relevant insights
3. Drafting communications to suppliers if needed
4. Any other relevant steps

Return a JSON array of steps. Each step has:
- "step_number": integer
- "title": brief title
- "description": what needs to be done
- "status": "pending"

Example:
[
  {{"step_number": 1, "title": "Research Suppliers", "description": "Gather supplier data", "status": "pending"}},
  {{"step_number": 2, "title": "Analyze Data", "description": "Review stock and sales", "status": "pending"}}
]

Only return the JSON array, no other text."#
    )
}

/// Planner agent: turns the manager's goal into ordered plan steps.
pub async fn create_plan(model: &dyn ModelClient, goal: &str) -> Result<Vec<PlanStep>> {
    let reply = model
        .complete(CompletionRequest::new(plan_prompt(goal), MAX_TOKENS))
        .await?;
    let plan: Vec<PlanStep> = parse_json_reply(&reply)?;

    tracing::info!("🗺️  Planner produced {} steps", plan.len());
    Ok(plan)
}
