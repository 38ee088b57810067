// crates/core/src/error.rs

//! Error taxonomy shared by the core engine and the tool host.

use thiserror::Error;

/// Every failure a tool call can surface to the invoking agent.
///
/// Messages carry remediation text (which tool to call first, example valid
/// values) because the agent on the other side retries by re-prompting, not
/// by inspecting error codes. Nothing here is retried internally; a single
/// failed attempt is a failed call.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A required credential or endpoint is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The directory/calendar provider returned non-2xx or was unreachable.
    #[error("provider error: {0}")]
    Provider(String),

    /// The completion backend failed or returned unparseable output.
    ///
    /// Never downgraded to "no match": a backend regression must be visible
    /// to the caller. The one documented exception is the sender validator's
    /// secondary consistency check, which degrades to its email match.
    #[error("AI backend error: {0}")]
    Backend(String),

    /// Resolution found zero acceptable candidates, or none cleared the
    /// confidence gate. Both look the same to the caller; the remediation
    /// (list the directory, re-query with more specific input) is the same.
    #[error("{0}")]
    NotFound(String),

    /// Sender email missing, unknown, or name/email mismatch.
    #[error("sender validation failed: {0}")]
    Validation(String),

    /// An extracted time entry is missing required fields.
    #[error("incomplete time entry: {0}")]
    IncompleteInput(String),

    /// A tool argument was malformed (bad datetime, missing parameter).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T, E = ToolError> = std::result::Result<T, E>;

/// Truncate untrusted text for inclusion in an error message, cutting on a
/// char boundary. Backend replies and HTTP error bodies can carry multibyte
/// UTF-8 at any offset; slicing them at a byte index would panic inside the
/// very path that is supposed to report the failure.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(preview("hello", 100), "hello");
    }

    #[test]
    fn long_text_is_cut_at_the_limit() {
        assert_eq!(preview("abcdef", 3), "abc");
    }

    #[test]
    fn multibyte_text_cuts_on_char_boundaries() {
        let text = format!("{}é tail", "a".repeat(99));
        // Byte index 100 splits the 'é'; char-based truncation must not.
        assert_eq!(preview(&text, 100), format!("{}é", "a".repeat(99)));
        let emoji = "📅📅📅";
        assert_eq!(preview(emoji, 2), "📅📅");
    }
}

