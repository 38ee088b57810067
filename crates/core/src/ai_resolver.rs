// crates/core/src/ai_resolver.rs

//! Confidence-gated AI name resolver.
//!
//! The completion backend does the fuzzy work (possessives, nicknames,
//! partial names) and reports a confidence; this module enforces the gate.
//! A backend or parse failure is an error, never a silent "no match": there
//! is intentionally no fallback to the deterministic resolver, so a degraded
//! backend cannot quietly lower matching quality.

use serde::Deserialize;
use serde_json::Value;

use crate::ai_client::{strip_code_fences, CompletionClient};
use crate::error::{Result, ToolError};
use crate::types::{Identity, MatchResult};

/// Matches below or at this confidence are rejected. Strictly greater-than:
/// exactly 0.9 does not clear the gate.
pub const DEFAULT_NAME_CONFIDENCE: f64 = 0.9;

const MATCH_MAX_TOKENS: u32 = 200;

/// Name resolver backed by a completion client, holding its threshold as
/// constructor state so tests and policy overrides can tune it.
pub struct AiNameResolver<'a, C: CompletionClient> {
    client: &'a C,
    min_confidence: f64,
}

impl<'a, C: CompletionClient> AiNameResolver<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self::with_min_confidence(client, DEFAULT_NAME_CONFIDENCE)
    }

    pub fn with_min_confidence(client: &'a C, min_confidence: f64) -> Self {
        Self {
            client,
            min_confidence,
        }
    }

    /// Resolve a free-text name reference to at most one pool identity.
    ///
    /// Blank queries and empty pools are rejected without touching the
    /// backend. Backend transport failures and unparseable replies surface
    /// as [`ToolError::Backend`].
    pub fn resolve(&self, query: &str, pool: &[Identity]) -> Result<MatchResult> {
        if query.trim().is_empty() {
            return Ok(MatchResult::rejected("empty name query"));
        }
        if pool.is_empty() {
            return Ok(MatchResult::rejected("no users in directory"));
        }

        let users_json = serde_json::to_string_pretty(pool)
            .map_err(|e| ToolError::Backend(format!("failed to serialize user pool: {e}")))?;

        let prompt = format!(
            r#"You are a user name matching assistant. Given a query name and a list of users,
find the best matching user. You must be STRICT to prevent false matches.

Query: "{query}"
Users: {users_json}

Rules:
- Match possessive forms (e.g., "ryan's" -> "Ryan Botindari") ONLY if unambiguous
- Match partial names (e.g., "zaki" -> "Zaki Quereshy") ONLY if unique
- Match nicknames ONLY if obvious and unambiguous
- If multiple users could match, return null (do not guess)
- Return JSON: {{"name": "...", "email": "...", "confidence": 0.0-1.0}}
- If ambiguous or no plausible match, return: {{"match": null, "reason": "..."}}

Return ONLY valid JSON, no other text."#
        );

        let reply = self.client.complete(
            "You are a strict user name matching assistant. Return only valid JSON.",
            &prompt,
            MATCH_MAX_TOKENS,
        )?;

        let payload = strip_code_fences(&reply);
        let raw: Value = serde_json::from_str(payload).map_err(|e| {
            ToolError::Backend(format!(
                "name matching backend returned invalid JSON ({e}): {}",
                crate::error::preview(payload, 100)
            ))
        })?;

        // An explicit null match is a rejection, not an error.
        if raw.get("match").map_or(false, Value::is_null) {
            let reason = raw
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or("no match")
                .to_string();
            return Ok(MatchResult::Rejected { reason });
        }

        let reply: MatchReply = serde_json::from_value(raw).map_err(|e| {
            ToolError::Backend(format!("name matching backend returned malformed match: {e}"))
        })?;

        if reply.confidence <= self.min_confidence {
            return Ok(MatchResult::rejected(format!(
                "match confidence {} did not clear the {} threshold",
                reply.confidence, self.min_confidence
            )));
        }

        Ok(MatchResult::Resolved(Identity::new(reply.name, reply.email)))
    }
}

#[derive(Deserialize)]
struct MatchReply {
    name: String,
    email: String,
    #[serde(default)]
    confidence: f64,
}
