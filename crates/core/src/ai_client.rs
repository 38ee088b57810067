// crates/core/src/ai_client.rs

use crate::error::Result;

/// Abstract single-turn completion backend.
///
/// The resolvers and the extraction gateway only ever need "system prompt +
/// user prompt in, text out"; keeping the seam this narrow makes the engine
/// testable with scripted fakes. Implementations can target Azure OpenAI,
/// OpenAI, Ollama, etc.
pub trait CompletionClient {
    /// Send one prompt pair and return the raw completion text.
    fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String>;
}

/// Strip an optional markdown code fence from a completion payload.
///
/// Backends instructed to return "only JSON" still wrap it in ``` or
/// ```json fences often enough that every JSON consumer in this crate runs
/// its payload through here first.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_payload_passes_through() {
        assert_eq!(strip_code_fences(r#"{"a": 1}"#), r#"{"a": 1}"#);
    }

    #[test]
    fn bare_fence_is_stripped() {
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn json_fence_is_stripped() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(strip_code_fences("  {\"a\": 1}\n"), "{\"a\": 1}");
    }
}
