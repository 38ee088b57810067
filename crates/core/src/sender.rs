// crates/core/src/sender.rs

//! Two-stage sender validation: deterministic email existence, then
//! AI-checked name-to-email consistency.
//!
//! Sender identity is a trust boundary, so the email is mandatory and the
//! consistency gate (0.95) is stricter than the 0.9 name-matching gate.
//! Failure policy intentionally diverges from the AI resolver: if the
//! backend dies during the *secondary* consistency check, validation
//! degrades to the identity already proven by email, since the factual check
//! has passed and an AI outage is non-fatal here. Do not unify the two
//! policies.

use serde::Deserialize;

use crate::ai_client::{strip_code_fences, CompletionClient};
use crate::error::{Result, ToolError};
use crate::types::{Identity, ValidatedSender};

/// Stricter than name matching: spoofed senders are higher-stakes than a
/// missed lookup. Strictly greater-than; exactly 0.95 is rejected.
pub const DEFAULT_SENDER_CONFIDENCE: f64 = 0.95;

const VALIDATE_MAX_TOKENS: u32 = 200;

/// Stage 1 of sender validation: exact case-insensitive email lookup.
///
/// Email existence is a factual check, never a fuzzy-match problem, so this
/// is a plain linear scan. Callers that received no claimed name can use
/// this directly and skip the consistency stage. The mandatory-email rule
/// is enforced here: a blank email fails before anything else happens.
pub fn find_sender_by_email<'p>(sender_email: &str, pool: &'p [Identity]) -> Result<&'p Identity> {
    if sender_email.trim().is_empty() {
        return Err(ToolError::Validation(
            "sender_email is required. Call get_users_with_name_and_email first \
             to get the sender's email address, then pass it as sender_email."
                .to_string(),
        ));
    }

    let needle = sender_email.trim().to_lowercase();
    if let Some(identity) = pool.iter().find(|identity| identity.email == needle) {
        return Ok(identity);
    }

    let examples: Vec<&str> = pool
        .iter()
        .map(|identity| identity.email.as_str())
        .take(3)
        .collect();
    Err(ToolError::Validation(format!(
        "sender email '{sender_email}' not found in the directory. \
         Call get_users_with_name_and_email first to get a valid sender email. \
         Example emails: {}",
        examples.join(", ")
    )))
}

pub struct SenderValidator<'a, C: CompletionClient> {
    client: &'a C,
    min_confidence: f64,
}

impl<'a, C: CompletionClient> SenderValidator<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self::with_min_confidence(client, DEFAULT_SENDER_CONFIDENCE)
    }

    pub fn with_min_confidence(client: &'a C, min_confidence: f64) -> Self {
        Self {
            client,
            min_confidence,
        }
    }

    /// Validate a claimed sender against the directory pool.
    ///
    /// `sender_email` is required; the claimed name is optional and when
    /// absent the email-matched identity is returned directly.
    pub fn validate(
        &self,
        sender_name: Option<&str>,
        sender_email: &str,
        pool: &[Identity],
    ) -> Result<ValidatedSender> {
        let by_email = find_sender_by_email(sender_email, pool)?;

        let sender_name = match sender_name.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            // No claimed name: the email match alone is sufficient proof.
            _ => {
                return Ok(ValidatedSender {
                    identity: by_email.clone(),
                })
            }
        };

        // Stage 2: name-to-email consistency.
        match self.check_name_consistency(sender_name, &by_email.email, by_email, pool) {
            Ok(Some(identity)) => Ok(ValidatedSender { identity }),
            Ok(None) => Err(ToolError::Validation(format!(
                "sender name '{sender_name}' does not match the user associated with \
                 sender email '{sender_email}'. Call get_users_with_name_and_email \
                 to get the correct sender information."
            ))),
            // Documented degradation: the email check already passed, so a
            // backend outage or garbage reply falls back to that identity.
            Err(e) => {
                eprintln!("[warn] sender consistency check unavailable ({e}); using email match");
                Ok(ValidatedSender {
                    identity: by_email.clone(),
                })
            }
        }
    }

    /// Ask the backend whether the claimed name denotes the same person as
    /// the email-matched identity. `Ok(Some)` = confirmed, `Ok(None)` =
    /// denied or below the gate, `Err` = backend/parse failure.
    fn check_name_consistency(
        &self,
        sender_name: &str,
        sender_email: &str,
        by_email: &Identity,
        pool: &[Identity],
    ) -> Result<Option<Identity>> {
        let found_json = serde_json::to_string_pretty(by_email)
            .map_err(|e| ToolError::Backend(format!("failed to serialize identity: {e}")))?;
        let users_json = serde_json::to_string_pretty(pool)
            .map_err(|e| ToolError::Backend(format!("failed to serialize user pool: {e}")))?;

        let prompt = format!(
            r#"Validate that sender_email "{sender_email}" belongs to a user
whose name matches "{sender_name}" (allowing for natural variations like possessive
forms and nicknames, but it must be the SAME person).

Found user by email: {found_json}
All users: {users_json}

CRITICAL:
- sender_email existence in the user list is already verified
- sender_name MUST match the user associated with sender_email
- Be strict - if uncertain, return valid: false

Return JSON: {{"name": "...", "email": "...", "valid": true/false, "confidence": 0.0-1.0}}
Return ONLY valid JSON, no other text."#
        );

        let reply = self.client.complete(
            "You are a strict sender validation assistant. Return only valid JSON.",
            &prompt,
            VALIDATE_MAX_TOKENS,
        )?;

        let payload = strip_code_fences(&reply);
        let reply: ValidationReply = serde_json::from_str(payload).map_err(|e| {
            ToolError::Backend(format!("sender validation backend returned invalid JSON: {e}"))
        })?;

        if !reply.valid || reply.confidence <= self.min_confidence {
            return Ok(None);
        }

        Ok(Some(Identity::new(
            reply.name.unwrap_or_else(|| by_email.name.clone()),
            reply.email.unwrap_or_else(|| by_email.email.clone()),
        )))
    }
}

#[derive(Deserialize)]
struct ValidationReply {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    valid: bool,
    #[serde(default)]
    confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai_client::tests_support::ScriptedClient;

    fn pool() -> Vec<Identity> {
        vec![
            Identity::new("Ryan Botindari", "ryan@x.com"),
            Identity::new("Zaki Quereshy", "zaki@x.com"),
            Identity::new("Ana Lopez", "ana@x.com"),
            Identity::new("Ben Tran", "ben@x.com"),
        ]
    }

    #[test]
    fn blank_email_fails_before_any_backend_call() {
        let client = ScriptedClient::failing("must not be called");
        let err = SenderValidator::new(&client)
            .validate(Some("Ryan"), "  ", &pool())
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
        assert_eq!(client.calls(), 0);
    }

    #[test]
    fn unknown_email_fails_with_example_emails() {
        let client = ScriptedClient::failing("must not be called");
        let err = SenderValidator::new(&client)
            .validate(None, "ghost@x.com", &pool())
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("ryan@x.com"));
        assert_eq!(client.calls(), 0);
    }

    #[test]
    fn email_only_validation_skips_consistency_check() {
        let client = ScriptedClient::failing("must not be called");
        let sender = SenderValidator::new(&client)
            .validate(None, "Ryan@X.com", &pool())
            .unwrap();
        assert_eq!(sender.identity.email, "ryan@x.com");
        assert_eq!(client.calls(), 0);
    }

    #[test]
    fn consistent_name_above_gate_is_accepted() {
        let client = ScriptedClient::replying(
            r#"{"name": "Ryan Botindari", "email": "ryan@x.com", "valid": true, "confidence": 0.99}"#,
        );
        let sender = SenderValidator::new(&client)
            .validate(Some("ryan's"), "ryan@x.com", &pool())
            .unwrap();
        assert_eq!(sender.identity.name, "Ryan Botindari");
        assert_eq!(client.calls(), 1);
    }

    #[test]
    fn confidence_exactly_at_gate_is_rejected() {
        let client = ScriptedClient::replying(
            r#"{"name": "Ryan Botindari", "email": "ryan@x.com", "valid": true, "confidence": 0.95}"#,
        );
        let err = SenderValidator::new(&client)
            .validate(Some("Ryan"), "ryan@x.com", &pool())
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }

    #[test]
    fn confidence_just_above_gate_is_accepted() {
        let client = ScriptedClient::replying(
            r#"{"name": "Ryan Botindari", "email": "ryan@x.com", "valid": true, "confidence": 0.9501}"#,
        );
        assert!(SenderValidator::new(&client)
            .validate(Some("Ryan"), "ryan@x.com", &pool())
            .is_ok());
    }

    #[test]
    fn backend_denial_is_a_validation_error() {
        let client = ScriptedClient::replying(
            r#"{"valid": false, "confidence": 0.99}"#,
        );
        let err = SenderValidator::new(&client)
            .validate(Some("Zaki"), "ryan@x.com", &pool())
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }

    #[test]
    fn backend_outage_degrades_to_email_match() {
        let client = ScriptedClient::failing("connection refused");
        let sender = SenderValidator::new(&client)
            .validate(Some("Ryan"), "ryan@x.com", &pool())
            .unwrap();
        assert_eq!(sender.identity.email, "ryan@x.com");
    }

    #[test]
    fn unparseable_reply_degrades_to_email_match() {
        let client = ScriptedClient::replying("sure, looks fine to me");
        let sender = SenderValidator::new(&client)
            .validate(Some("Ryan"), "ryan@x.com", &pool())
            .unwrap();
        assert_eq!(sender.identity.name, "Ryan Botindari");
    }
}
