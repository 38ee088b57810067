// crates/core/src/resolve.rs

//! Deterministic name resolver: exact match, then substring match with a
//! longest-name tie-break.
//!
//! This is a heuristic, not a confidence-scored match. Unlike the AI
//! resolver it never refuses on ambiguity: among overlapping substring
//! matches it always prefers the most specific (longest) display name. That
//! is a materially weaker guarantee, kept deliberately distinct from the
//! confidence-gated strategy.

use crate::types::{Identity, MatchResult};

/// Lowercase, collapse internal whitespace runs, trim.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve a free-text name against the candidate pool.
///
/// Pass order:
/// 1. exact normalized equality (first match wins; the directory is assumed
///    free of exact-name duplicates);
/// 2. substring containment in either direction, so over-specified queries
///    like "Ryan Botindari (Sales)" still find "Ryan Botindari";
/// 3. tie-break among substring hits by longest normalized name, first-seen
///    winning further ties. Known-weak: "Jon" picks the longest of all names
///    containing "jon".
pub fn resolve(query: &str, pool: &[Identity]) -> MatchResult {
    let needle = normalize_name(query);
    if needle.is_empty() {
        return MatchResult::rejected("empty name query");
    }

    for identity in pool {
        if normalize_name(&identity.name) == needle {
            return MatchResult::Resolved(identity.clone());
        }
    }

    let mut best: Option<(usize, &Identity)> = None;
    for identity in pool {
        let candidate = normalize_name(&identity.name);
        if candidate.contains(&needle) || needle.contains(&candidate) {
            let len = candidate.chars().count();
            // Strictly-greater keeps the first-seen candidate on equal length.
            if best.map_or(true, |(best_len, _)| len > best_len) {
                best = Some((len, identity));
            }
        }
    }

    match best {
        Some((_, identity)) => MatchResult::Resolved(identity.clone()),
        None => MatchResult::rejected(format!("user not found: {query}")),
    }
}
