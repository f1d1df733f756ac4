use crate::core::reply::parse_json_reply;
use crate::domain::model::{CompletionRequest, EmailDrafts, Findings};
use crate::domain::ports::ModelClient;
use crate::utils::error::Result;

const MAX_TOKENS: u32 = 4000;

fn drafting_prompt(goal: &str, findings: &str, suppliers: &str) -> String {
    format!(
        r#"You are a professional business communication specialist.

Goal: {goal}

Research Findings:
{findings}

Relevant Suppliers:
{suppliers}

Draft professional emails for the relevant suppliers based on the goal and findings.
Each email should be personalized, professional, and actionable.

Return a JSON object:
{{
  "emails": [
    {{
      "supplier_id": "SUP-XXX",
      "supplier_name": "Company Name",
      "to": "email@example.com",
      "subject": "Email subject",
      "body": "Email body text"
    }}
  ],
  "summary": "Brief summary of communication strategy"
}}

Only return the JSON object, no other text."#
    )
}

/// Communicator agent: drafts one email per relevant supplier.
pub async fn draft_emails(
    model: &dyn ModelClient,
    goal: &str,
    findings: &Findings,
    relevant_suppliers: &[serde_json::Value],
) -> Result<EmailDrafts> {
    let findings_json = serde_json::to_string_pretty(findings)?;
    let suppliers_json = serde_json::to_string_pretty(relevant_suppliers)?;

    let reply = model
        .complete(CompletionRequest::new(
            drafting_prompt(goal, &findings_json, &suppliers_json),
            MAX_TOKENS,
        ))
        .await?;
    let drafts: EmailDrafts = parse_json_reply(&reply)?;

    tracing::info!("✉️  Communicator drafted {} emails", drafts.emails.len());
    Ok(drafts)
}
