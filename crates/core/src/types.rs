// crates/core/src/types.rs

use serde::{Deserialize, Serialize};

/// One addressable person in the organization's directory.
///
/// `email` is the unique key, lowercase-normalized at construction. `name`
/// is human-assigned display text and is not unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into().to_lowercase(),
        }
    }
}

/// Outcome of a resolution attempt.
///
/// `Resolved` is produced only when the strategy's specificity or confidence
/// criterion is met. There is no best-guess-under-uncertainty variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Resolved(Identity),
    Rejected { reason: String },
}

impl MatchResult {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    pub fn resolved(&self) -> Option<&Identity> {
        match self {
            Self::Resolved(identity) => Some(identity),
            Self::Rejected { .. } => None,
        }
    }
}

/// A sender identity that passed validation.
///
/// Only the sender validator constructs this, and only after the mandatory
/// email was found verbatim in the directory. When a claimed name was also
/// supplied, the name-to-email consistency check passed (or degraded per the
/// validator's documented policy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedSender {
    pub identity: Identity,
}

/// Structured fields extracted from a free-text time-entry query.
///
/// `missing_fields` is always recomputed locally from the four required
/// attributes (date, client, description, hours) after extraction. The
/// backend's own self-report is never trusted: it may omit or hallucinate
/// entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTimeEntry {
    /// ISO calendar date, `YYYY-MM-DD`.
    pub date: Option<String>,
    pub client: Option<String>,
    pub description: Option<String>,
    /// Decimal hours, non-negative.
    pub hours: Option<f64>,
    pub project: Option<String>,
    pub task: Option<String>,
    #[serde(default)]
    pub missing_fields: Vec<String>,
}

impl ExtractedTimeEntry {
    pub const REQUIRED_FIELDS: [&'static str; 4] = ["date", "client", "description", "hours"];

    /// Record with every required field reported missing. Returned for
    /// blank queries instead of an error.
    pub fn all_missing() -> Self {
        Self {
            missing_fields: Self::REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Recompute `missing_fields` from the required attributes, discarding
    /// whatever the extraction backend claimed.
    pub fn recompute_missing_fields(&mut self) {
        let mut missing = Vec::new();
        if self.date.as_deref().map_or(true, |s| s.trim().is_empty()) {
            missing.push("date".to_string());
        }
        if self.client.as_deref().map_or(true, |s| s.trim().is_empty()) {
            missing.push("client".to_string());
        }
        if self
            .description
            .as_deref()
            .map_or(true, |s| s.trim().is_empty())
        {
            missing.push("description".to_string());
        }
        if self.hours.is_none() {
            missing.push("hours".to_string());
        }
        self.missing_fields = missing;
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_lowercased_on_construction() {
        let id = Identity::new("Ryan Botindari", "Ryan@X.Com");
        assert_eq!(id.email, "ryan@x.com");
    }

    #[test]
    fn missing_fields_ignore_backend_self_report() {
        let mut entry = ExtractedTimeEntry {
            date: Some("2026-01-03".to_string()),
            client: Some("Arvaya Internal".to_string()),
            description: None,
            hours: None,
            // Contradictory self-report from the backend.
            missing_fields: vec!["project".to_string()],
            ..ExtractedTimeEntry::default()
        };
        entry.recompute_missing_fields();
        assert_eq!(entry.missing_fields, vec!["description", "hours"]);
    }

    #[test]
    fn whitespace_only_required_field_counts_as_missing() {
        let mut entry = ExtractedTimeEntry {
            date: Some("  ".to_string()),
            client: Some("Acme".to_string()),
            description: Some("work".to_string()),
            hours: Some(1.5),
            ..ExtractedTimeEntry::default()
        };
        entry.recompute_missing_fields();
        assert_eq!(entry.missing_fields, vec!["date"]);
    }
}
