// crates/host/src/time_entry.rs

//! Time-entry submission: completeness gate and the downstream webhook POST.

use std::time::Duration;

use serde_json::{json, Value};

use deskmate_core::error::{Result, ToolError};
use deskmate_core::types::{ExtractedTimeEntry, Identity};

/// Webhook delivery gets a longer leash than completion calls; the workflow
/// engine on the other side may itself be slow.
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Reject incomplete entries with a message that names the missing fields
/// exactly and shows a worked example, so the agent can re-prompt the user
/// in one round trip.
pub fn require_complete(entry: &ExtractedTimeEntry) -> Result<()> {
    if entry.is_complete() {
        return Ok(());
    }
    Err(ToolError::IncompleteInput(format!(
        "missing required fields: {}. A complete entry looks like: \
         \"Log 8 hours for Arvaya Internal on 2026-01-03, preparing the quarterly report\". \
         Required: date, client, description, hours.",
        entry.missing_fields.join(", ")
    )))
}

/// Flat JSON payload for the workflow webhook.
pub fn webhook_payload(user: &Identity, entry: &ExtractedTimeEntry, query: &str) -> Value {
    json!({
        "user_name": user.name,
        "user_email": user.email,
        "date": entry.date,
        "client": entry.client,
        "description": entry.description,
        "hours": entry.hours,
        "project": entry.project,
        "task": entry.task,
        "query": query,
    })
}

/// Single synchronous POST; a timeout or non-2xx is the caller's problem to
/// retry, never ours.
pub fn submit(webhook_url: &str, payload: &Value) -> Result<Value> {
    let client = reqwest::blocking::Client::builder()
        .timeout(WEBHOOK_TIMEOUT)
        .build()
        .map_err(|e| ToolError::Configuration(format!("failed to build HTTP client: {e}")))?;

    let resp = client
        .post(webhook_url)
        .json(payload)
        .send()
        .map_err(|e| ToolError::Provider(format!("time entry webhook unreachable: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        return Err(ToolError::Provider(format!(
            "time entry webhook failed: HTTP {} - {}",
            status,
            deskmate_core::error::preview(&body, 500)
        )));
    }

    // Some workflow engines answer with plain text; surface it as a string
    // rather than failing the already-accepted entry.
    let text = resp
        .text()
        .map_err(|e| ToolError::Provider(format!("failed to read webhook response: {e}")))?;
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_entry_passes_the_gate() {
        let mut entry = ExtractedTimeEntry {
            date: Some("2026-01-03".to_string()),
            client: Some("Acme".to_string()),
            description: Some("support".to_string()),
            hours: Some(2.0),
            ..ExtractedTimeEntry::default()
        };
        entry.recompute_missing_fields();
        assert!(require_complete(&entry).is_ok());
    }

    #[test]
    fn missing_hours_is_named_exactly() {
        let mut entry = ExtractedTimeEntry {
            date: Some("2026-01-03".to_string()),
            client: Some("Acme".to_string()),
            description: Some("support".to_string()),
            hours: None,
            ..ExtractedTimeEntry::default()
        };
        entry.recompute_missing_fields();
        let err = require_complete(&entry).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("missing required fields: hours"));
        assert!(!message.contains("date,"));
    }

    #[test]
    fn payload_is_flat_and_carries_the_original_query() {
        let user = Identity::new("Zaki Quereshy", "zaki@x.com");
        let entry = ExtractedTimeEntry {
            date: Some("2026-01-03".to_string()),
            client: Some("Acme".to_string()),
            description: Some("support".to_string()),
            hours: Some(2.0),
            project: None,
            task: None,
            missing_fields: vec![],
        };
        let payload = webhook_payload(&user, &entry, "log 2h for Acme support on 1/3");
        assert_eq!(payload["user_email"], "zaki@x.com");
        assert_eq!(payload["hours"], 2.0);
        assert_eq!(payload["query"], "log 2h for Acme support on 1/3");
        assert!(payload.as_object().unwrap().values().all(|v| !v.is_object()));
    }
}
