use crate::utils::error::{Result, SourceBotError};
use serde::de::DeserializeOwned;

/// Removes a surrounding markdown code fence (```json or ```) from a model reply.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

pub fn parse_json_reply<T: DeserializeOwned>(text: &str) -> Result<T> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str(cleaned).map_err(|e| {
        let preview: String = cleaned.chars().take(200).collect();
        SourceBotError::model_reply(format!(
            "JSON parsing error: {}. Response was: {}",
            e, preview
        ))
    })
}
