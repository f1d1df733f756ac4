use crate::domain::notification::{Notification, Priority};
use serde_json::Value;

fn spoken(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders a notification as one paragraph suitable for text-to-speech.
pub fn format_notification_text(notification: &Notification) -> String {
    let mut parts: Vec<String> = Vec::new();

    match notification.priority {
        Priority::Critical => parts.push("Urgent notification.".to_string()),
        Priority::High => parts.push("Important notification.".to_string()),
        Priority::Low | Priority::Medium => {}
    }

    if !notification.title.is_empty() {
        parts.push(notification.title.clone());
    }
    if !notification.message.is_empty() {
        parts.push(notification.message.clone());
    }

    let data = &notification.data;

    if let Some(inventory) = data.get("inventory") {
        if let Some(stock) = inventory.get("current_stock") {
            parts.push(format!("Current stock: {} units.", spoken(stock)));
        }
        if let Some(items) = inventory.get("low_stock_items").and_then(Value::as_array) {
            if !items.is_empty() {
                let names: Vec<String> = items.iter().take(3).map(spoken).collect();
                parts.push(format!("Low stock items: {}.", names.join(", ")));
            }
        }
    }

    if let Some(cashflow) = data.get("cashflow") {
        if let Some(balance) = cashflow.get("balance") {
            parts.push(format!("Cash balance: {} dollars.", spoken(balance)));
        }
        match cashflow.get("status").and_then(Value::as_str) {
            Some("warning") => parts.push("Cash flow requires attention.".to_string()),
            Some("critical") => parts.push("Critical cash flow situation.".to_string()),
            _ => {}
        }
    }

    if let Some(Value::Object(findings)) = data.get("findings") {
        if let Some(count) = findings.get("supplier_count") {
            parts.push(format!("Found {} suppliers.", spoken(count)));
        }
        if let Some(summary) = findings.get("summary") {
            parts.push(spoken(summary));
        }
    }

    parts.join(" ")
}
