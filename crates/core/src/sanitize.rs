// crates/core/src/sanitize.rs

//! Unicode sanitation for the tool boundary.
//!
//! The delivery channel to the calling agent is not guaranteed to be
//! Unicode-safe, so every value this system returns across its external
//! boundary is scrubbed: any codepoint above U+00FF is replaced
//! character-for-character with `?`, recursively through nested structures.
//! Latin-1 accented names survive; emoji and CJK do not.

use serde_json::Value;

/// Highest codepoint passed through unmodified.
const SAFE_CEILING: u32 = 0xFF;
const PLACEHOLDER: char = '?';

/// Replace every codepoint above the safe ceiling with the placeholder.
pub fn sanitize_str(text: &str) -> String {
    text.chars()
        .map(|c| if c as u32 > SAFE_CEILING { PLACEHOLDER } else { c })
        .collect()
}

/// Recursively sanitize every string in a JSON value, object keys included.
/// Numbers, booleans and nulls pass through unchanged, as does structure.
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_str(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (sanitize_str(&k), sanitize_value(v)))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ascii_passes_through() {
        assert_eq!(sanitize_str("Ryan Botindari"), "Ryan Botindari");
    }

    #[test]
    fn latin1_accents_survive_the_ceiling() {
        assert_eq!(sanitize_str("José Muñoz"), "José Muñoz");
    }

    #[test]
    fn high_codepoints_replaced_one_for_one() {
        assert_eq!(sanitize_str("calendar 📅 ready ✓"), "calendar ? ready ?");
        assert_eq!(sanitize_str("火曜日"), "???");
    }

    #[test]
    fn nested_structures_are_scrubbed_preserving_shape() {
        let input = json!({
            "users": [
                {"name": "Zoë ✨", "email": "zoe@x.com", "events": 3},
                {"name": "Ben", "email": "ben@x.com", "events": 0}
            ],
            "note™": "done ✓",
            "is_free": true,
            "total": 3.5
        });
        let sanitized = sanitize_value(input);
        assert_eq!(
            sanitized,
            json!({
                "users": [
                    {"name": "Zoë ?", "email": "zoe@x.com", "events": 3},
                    {"name": "Ben", "email": "ben@x.com", "events": 0}
                ],
                "note?": "done ?",
                "is_free": true,
                "total": 3.5
            })
        );
    }
}
