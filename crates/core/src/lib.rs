// crates/core/src/lib.rs

//! Core identity-resolution and extraction engine for the deskmate tool host.
//!
//! Everything in this crate is provider-agnostic: it knows about identities,
//! confidence gates, and a completion backend behind the [`ai_client::CompletionClient`]
//! trait, but nothing about Microsoft Graph or the downstream webhook.

pub mod ai_client;
pub mod ai_resolver;
pub mod azure_openai;
pub mod error;
pub mod extract;
pub mod resolve;
pub mod sanitize;
pub mod sender;
pub mod types;
