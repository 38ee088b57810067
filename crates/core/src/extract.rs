// crates/core/src/extract.rs

//! Structured extraction of time-entry fields from free text.

use serde_json::Value;

use crate::ai_client::{strip_code_fences, CompletionClient};
use crate::error::{Result, ToolError};
use crate::types::ExtractedTimeEntry;

const EXTRACT_MAX_TOKENS: u32 = 500;

/// Turns a natural-language time-entry query into an [`ExtractedTimeEntry`].
///
/// The backend parses; this gateway decides completeness. `missing_fields`
/// is always recomputed locally from the four required attributes, because
/// the backend's own self-report may omit or hallucinate entries.
pub struct TimeEntryExtractor<'a, C: CompletionClient> {
    client: &'a C,
}

impl<'a, C: CompletionClient> TimeEntryExtractor<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Extract fields from `query`. A blank query yields the all-missing
    /// record without calling the backend; backend or parse failures are
    /// [`ToolError::Backend`].
    pub fn extract(&self, query: &str) -> Result<ExtractedTimeEntry> {
        if query.trim().is_empty() {
            return Ok(ExtractedTimeEntry::all_missing());
        }

        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        let prompt = format!(
            r#"Extract time entry information from this natural language query.

Query: "{query}"

Extract the following fields:
- date: Date of work, converted to YYYY-MM-DD format (e.g., "1/3/2026" -> "2026-01-03", "January 3, 2026" -> "2026-01-03")
- client: Client/customer name (e.g., "Arvaya Internal", "Customer ABC")
- description: Description of work performed (full description text, not truncated)
- hours: Duration in decimal hours (e.g., "8 hours" -> 8.0, "8h" -> 8.0, "30 minutes" -> 0.5, "half hour" -> 0.5)

Optional fields:
- project: Project name (if mentioned)
- task: Specific task (if mentioned)

Rules:
- Today's date is {today}. If a date is mentioned but its format is unclear, use today's date as fallback.
- Client name should be extracted exactly as mentioned.

Return JSON:
{{
  "date": "YYYY-MM-DD" or null,
  "client": "client name" or null,
  "description": "description" or null,
  "hours": 8.0 or null,
  "project": "project name" or null,
  "task": "task name" or null,
  "missing_fields": ["field1", "field2"]
}}

Required fields are: date, client, description, hours.
Return ONLY valid JSON, no other text."#
        );

        let reply = self.client.complete(
            "You are a time entry extraction assistant. Return only valid JSON.",
            &prompt,
            EXTRACT_MAX_TOKENS,
        )?;

        let payload = strip_code_fences(&reply);
        let raw: Value = serde_json::from_str(payload).map_err(|e| {
            ToolError::Backend(format!(
                "time entry extraction backend returned invalid JSON ({e}): {}",
                crate::error::preview(payload, 200)
            ))
        })?;

        let mut entry: ExtractedTimeEntry = serde_json::from_value(raw).map_err(|e| {
            ToolError::Backend(format!(
                "time entry extraction backend returned malformed fields: {e}"
            ))
        })?;

        entry.recompute_missing_fields();
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai_client::tests_support::ScriptedClient;

    #[test]
    fn complete_entry_has_no_missing_fields() {
        let client = ScriptedClient::replying(
            r#"{"date": "2026-01-03", "client": "Arvaya Internal", "description": "Quarterly report prep", "hours": 8.0, "project": null, "task": null, "missing_fields": []}"#,
        );
        let entry = TimeEntryExtractor::new(&client).extract("log 8h...").unwrap();
        assert!(entry.is_complete());
        assert_eq!(entry.hours, Some(8.0));
    }

    #[test]
    fn blank_query_returns_all_missing_without_backend_call() {
        let client = ScriptedClient::failing("must not be called");
        let entry = TimeEntryExtractor::new(&client).extract("   ").unwrap();
        assert_eq!(
            entry.missing_fields,
            vec!["date", "client", "description", "hours"]
        );
        assert_eq!(client.calls(), 0);
    }

    #[test]
    fn backend_self_report_is_overridden() {
        // Backend claims completeness but omits hours.
        let client = ScriptedClient::replying(
            r#"{"date": "2026-01-03", "client": "Acme", "description": "support", "hours": null, "missing_fields": []}"#,
        );
        let entry = TimeEntryExtractor::new(&client)
            .extract("worked for Acme on support")
            .unwrap();
        assert_eq!(entry.missing_fields, vec!["hours"]);
    }

    #[test]
    fn hallucinated_missing_fields_are_discarded() {
        let client = ScriptedClient::replying(
            r#"{"date": "2026-01-03", "client": "Acme", "description": "support", "hours": 2.5, "missing_fields": ["date", "client"]}"#,
        );
        let entry = TimeEntryExtractor::new(&client).extract("...").unwrap();
        assert!(entry.is_complete());
    }

    #[test]
    fn fenced_reply_is_accepted() {
        let client = ScriptedClient::replying(
            "```json\n{\"date\": \"2026-01-03\", \"client\": \"Acme\", \"description\": \"support\", \"hours\": 0.5}\n```",
        );
        let entry = TimeEntryExtractor::new(&client).extract("half hour").unwrap();
        assert_eq!(entry.hours, Some(0.5));
    }

    #[test]
    fn invalid_json_is_a_backend_error() {
        let client = ScriptedClient::replying("I could not find any fields");
        let err = TimeEntryExtractor::new(&client).extract("...").unwrap_err();
        assert!(matches!(err, ToolError::Backend(_)));
    }

    #[test]
    fn multibyte_garbage_reply_is_a_backend_error_not_a_panic() {
        let client = ScriptedClient::replying(&format!("{}火曜日 not JSON", "x".repeat(199)));
        let err = TimeEntryExtractor::new(&client).extract("...").unwrap_err();
        assert!(matches!(err, ToolError::Backend(_)));
    }

    #[test]
    fn backend_failure_propagates() {
        let client = ScriptedClient::failing("timeout");
        let err = TimeEntryExtractor::new(&client).extract("...").unwrap_err();
        assert!(matches!(err, ToolError::Backend(_)));
    }
}
