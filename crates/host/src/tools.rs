// crates/host/src/tools.rs

//! Tool dispatch: maps named tool invocations onto the directory, calendar,
//! resolution and webhook machinery.

use serde_json::{json, Value};

use deskmate_core::ai_resolver::AiNameResolver;
use deskmate_core::azure_openai::AzureOpenAiClient;
use deskmate_core::error::{Result, ToolError};
use deskmate_core::extract::TimeEntryExtractor;
use deskmate_core::resolve;
use deskmate_core::sanitize::sanitize_value;
use deskmate_core::sender::{find_sender_by_email, SenderValidator};
use deskmate_core::types::{Identity, MatchResult, ValidatedSender};

use crate::availability;
use crate::booking;
use crate::graph::GraphClient;
use crate::log;
use crate::time_entry;

/// Everything the tool surface needs, constructed once and passed by
/// reference. No ambient globals: thresholds and clients are state here.
pub struct ToolHost {
    graph: GraphClient,
    ai: Option<AzureOpenAiClient>,
    webhook_url: Option<String>,
}

impl ToolHost {
    /// The directory provider is mandatory; AI credentials and the webhook
    /// URL are optional and disable only the paths that need them.
    pub fn from_env() -> Result<Self> {
        let graph = GraphClient::from_env()?;

        let ai = match AzureOpenAiClient::from_env() {
            Ok(client) => Some(client),
            Err(e) => {
                log::warn(format!("AI matching disabled: {e}"));
                None
            }
        };

        let webhook_url = std::env::var("TIME_ENTRY_WEBHOOK_URL").ok();
        if webhook_url.is_none() {
            log::warn("TIME_ENTRY_WEBHOOK_URL not set; process_time_entry disabled");
        }

        Ok(Self {
            graph,
            ai,
            webhook_url,
        })
    }

    /// Dispatch one tool invocation. Every result is Unicode-sanitized on
    /// the way out; the delivery channel is not trusted with high codepoints.
    pub fn handle(&self, tool: &str, args: &Value) -> Result<Value> {
        let result = match tool {
            "get_users_with_name_and_email" => self.get_users(),
            "check_availability" => self.check_availability(args),
            "book_meeting" => self.book_meeting(args),
            "process_time_entry" => self.process_time_entry(args),
            other => Err(ToolError::InvalidInput(format!("unknown tool: {other}"))),
        }?;
        Ok(sanitize_value(result))
    }

    fn ai(&self) -> Result<&AzureOpenAiClient> {
        self.ai.as_ref().ok_or_else(|| {
            ToolError::Configuration(
                "AI matching unavailable: Azure OpenAI credentials are not configured. \
                 Pass an exact email address instead of a name, or configure the backend."
                    .to_string(),
            )
        })
    }

    /// Map a name-or-email reference onto exactly one directory identity.
    ///
    /// Bare emails are a factual lookup against the pool; anything else goes
    /// through the confidence-gated AI resolver. Both rejection flavors
    /// (nothing found, nothing confident enough) surface as `NotFound` with
    /// the same remediation.
    fn resolve_user(&self, user: &str, pool: &[Identity]) -> Result<Identity> {
        let trimmed = user.trim();
        if trimmed.is_empty() {
            return Err(ToolError::InvalidInput("user must not be empty".to_string()));
        }

        if trimmed.contains('@') {
            let needle = trimmed.to_lowercase();
            return pool
                .iter()
                .find(|identity| identity.email == needle)
                .cloned()
                .ok_or_else(|| {
                    let examples: Vec<&str> =
                        pool.iter().map(|i| i.email.as_str()).take(3).collect();
                    ToolError::NotFound(format!(
                        "email '{trimmed}' not found in the directory. \
                         Call get_users_with_name_and_email first. Example emails: {}",
                        examples.join(", ")
                    ))
                });
        }

        match AiNameResolver::new(self.ai()?).resolve(trimmed, pool)? {
            MatchResult::Resolved(identity) => Ok(identity),
            MatchResult::Rejected { reason } => Err(ToolError::NotFound(format!(
                "could not resolve user '{trimmed}': {reason}. \
                 Call get_users_with_name_and_email and retry with a more specific \
                 name or an exact email address."
            ))),
        }
    }

    fn get_users(&self) -> Result<Value> {
        let users = self.graph.fetch_users()?;
        serde_json::to_value(users)
            .map_err(|e| ToolError::Provider(format!("failed to serialize users: {e}")))
    }

    fn check_availability(&self, args: &Value) -> Result<Value> {
        let user = required_str(args, "user")?;
        let date = match optional_str(args, "date") {
            Some(date) => date.to_string(),
            None => chrono::Local::now().format("%Y-%m-%d").to_string(),
        };
        let day_of_week = availability::day_of_week(&date).ok_or_else(|| {
            ToolError::InvalidInput(format!("invalid date '{date}'. Use YYYY-MM-DD"))
        })?;

        let pool = self.graph.fetch_users()?;
        let identity = self.resolve_user(user, &pool)?;

        let events = self.graph.calendar_view(
            &identity.email,
            &format!("{date}T{}", availability::BUSINESS_START),
            &format!("{date}T{}", availability::BUSINESS_END),
        )?;
        let busy = availability::busy_times_for_date(&events, &date);
        let free = availability::free_slots(&busy, &date);
        let total_events = busy.len();
        let is_completely_free = busy.is_empty();

        Ok(json!({
            "user_email": identity.email,
            "date": date,
            "day_of_week": day_of_week,
            "busy_times": busy,
            "total_events": total_events,
            "free_slots": free,
            "is_completely_free": is_completely_free,
        }))
    }

    fn book_meeting(&self, args: &Value) -> Result<Value> {
        let user = required_str(args, "user")?;
        let subject = required_str(args, "subject")?;
        let start_datetime = required_str(args, "start_datetime")?;
        let end_datetime = required_str(args, "end_datetime")?;
        let sender_email = required_str(args, "sender_email")?;
        let sender_name = optional_str(args, "sender_name");
        let body = optional_str(args, "body");
        let attendees = string_array(args, "attendees")?;

        // Window validation comes first: a malformed or inverted window must
        // fail before any provider call is spent on it.
        let (start, end) = booking::validate_window(start_datetime, end_datetime)?;

        let pool = self.graph.fetch_users()?;
        let target = self.resolve_user(user, &pool)?;

        let sender = match sender_name {
            // No name claim: the factual email check alone is sufficient and
            // needs no backend.
            None => ValidatedSender {
                identity: find_sender_by_email(sender_email, &pool)?.clone(),
            },
            Some(name) => {
                SenderValidator::new(self.ai()?).validate(Some(name), sender_email, &pool)?
            }
        };

        let payload = booking::build_event_payload(
            subject,
            start_datetime,
            end_datetime,
            &sender,
            &attendees,
            body,
        );
        let mut created = self.graph.create_event(&target.email, &payload)?;

        let details = booking::booking_details(subject, start, end, &sender, &attendees, &created);
        if let Some(event) = created.as_object_mut() {
            event.insert("booking_details".to_string(), details);
        }
        Ok(created)
    }

    fn process_time_entry(&self, args: &Value) -> Result<Value> {
        let user_name = required_str(args, "user_name")?;
        let query = required_str(args, "query")?;

        let webhook_url = self.webhook_url.as_deref().ok_or_else(|| {
            ToolError::Configuration(
                "time entry submission unavailable: TIME_ENTRY_WEBHOOK_URL is not set".to_string(),
            )
        })?;

        let pool = self.graph.fetch_users()?;

        // Deliberately the deterministic resolver, not the AI one: time
        // entry inherits the heuristic lookup and its longest-name
        // tie-break, matching the calendar side only at the email level.
        let user = match resolve::resolve(user_name, &pool) {
            MatchResult::Resolved(identity) => identity,
            MatchResult::Rejected { reason } => {
                return Err(ToolError::NotFound(format!(
                    "could not resolve user '{user_name}': {reason}. \
                     Call get_users_with_name_and_email and retry with the exact display name."
                )))
            }
        };

        let entry = TimeEntryExtractor::new(self.ai()?).extract(query)?;
        time_entry::require_complete(&entry)?;

        let payload = time_entry::webhook_payload(&user, &entry, query);
        let response = time_entry::submit(webhook_url, &payload)?;

        Ok(json!({
            "success": true,
            "user_name": user.name,
            "user_email": user.email,
            "entry": entry,
            "webhook_response": response,
        }))
    }
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    match args.get(key).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ToolError::InvalidInput(format!(
            "missing required argument: {key}"
        ))),
    }
}

fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn string_array(args: &Value, key: &str) -> Result<Vec<String>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ToolError::InvalidInput(format!("{key} must be an array of strings"))
                })
            })
            .collect(),
        Some(_) => Err(ToolError::InvalidInput(format!(
            "{key} must be an array of strings"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_str_rejects_blank_and_missing() {
        let args = json!({ "user": "  ", "subject": "Sync" });
        assert!(required_str(&args, "user").is_err());
        assert!(required_str(&args, "missing").is_err());
        assert_eq!(required_str(&args, "subject").unwrap(), "Sync");
    }

    #[test]
    fn string_array_accepts_absent_and_null() {
        assert!(string_array(&json!({}), "attendees").unwrap().is_empty());
        assert!(string_array(&json!({ "attendees": null }), "attendees")
            .unwrap()
            .is_empty());
        assert_eq!(
            string_array(&json!({ "attendees": ["a@x.com"] }), "attendees").unwrap(),
            vec!["a@x.com"]
        );
    }

    #[test]
    fn string_array_rejects_non_string_items() {
        assert!(string_array(&json!({ "attendees": [1, 2] }), "attendees").is_err());
    }
}
