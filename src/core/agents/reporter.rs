use crate::domain::model::{CompletionRequest, WorkflowState};
use crate::domain::ports::ModelClient;
use crate::utils::error::Result;

const MAX_TOKENS: u32 = 1000;

fn report_prompt(state_summary: &str) -> String {
    format!(
        r#"You are a business assistant providing a status update to a manager.

Current Workflow State:
{state_summary}

Create a clear, concise status report that the manager can listen to. The report should:
1. Summarize the goal
2. Explain what has been completed so far
3. Highlight key findings or results
4. Mention what steps are remaining or pending approval

Keep it conversational and professional, suitable for text-to-speech conversion.
Limit to 2-3 paragraphs (about 200-300 words).

Return only the status report text, no JSON or formatting."#
    )
}

/// Reporter agent: spoken-style summary of the current workflow.
pub async fn status_report(model: &dyn ModelClient, state: &WorkflowState) -> Result<String> {
    let state_summary = serde_json::to_string_pretty(&serde_json::json!({
        "goal": state.goal,
        "status": state.status,
        "current_step": state.current_step,
        "plan": state.plan,
        "has_findings": state.findings.is_some(),
        "has_drafts": state.drafts.is_some(),
    }))?;

    model
        .complete(CompletionRequest::new(report_prompt(&state_summary), MAX_TOKENS))
        .await
}
