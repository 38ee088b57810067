// crates/core/src/azure_openai.rs

//! Azure OpenAI client for the chat-completions API.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::ai_client::CompletionClient;
use crate::error::{Result, ToolError};

/// Low temperature for deterministic matching behavior.
const TEMPERATURE: f64 = 0.1;
/// Bounded per-call wait; a hung backend fails the call, it is never retried.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking Azure OpenAI chat-completions client.
///
/// Environment variables:
/// - AZURE_OPENAI_ENDPOINT: e.g. "https://myresource.openai.azure.com"
/// - AZURE_OPENAI_DEPLOYMENT: deployment name, e.g. "gpt-4o"
/// - AZURE_OPENAI_MODEL: model identifier passed in the request body
/// - AZURE_OPENAI_API_KEY: your API key
/// - AZURE_OPENAI_API_VERSION (optional): default "2024-12-01-preview"
pub struct AzureOpenAiClient {
    client: Client,
    url: String,
    api_key: String,
    model: String,
}

impl AzureOpenAiClient {
    pub fn new(
        endpoint: &str,
        deployment: &str,
        model: &str,
        api_key: &str,
        api_version: &str,
    ) -> Result<Self> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            deployment,
            api_version
        );

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ToolError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url,
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Construct from environment variables, reporting every missing one at
    /// once so the operator fixes the .env in a single pass.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("AZURE_OPENAI_API_KEY").ok();
        let endpoint = std::env::var("AZURE_OPENAI_ENDPOINT").ok();
        let deployment = std::env::var("AZURE_OPENAI_DEPLOYMENT").ok();
        let model = std::env::var("AZURE_OPENAI_MODEL").ok();
        let api_version = std::env::var("AZURE_OPENAI_API_VERSION")
            .unwrap_or_else(|_| "2024-12-01-preview".to_string());

        // Report every missing variable at once.
        let (Some(api_key), Some(endpoint), Some(deployment), Some(model)) =
            (api_key, endpoint, deployment, model)
        else {
            let vars = [
                ("AZURE_OPENAI_API_KEY", std::env::var("AZURE_OPENAI_API_KEY").is_err()),
                ("AZURE_OPENAI_ENDPOINT", std::env::var("AZURE_OPENAI_ENDPOINT").is_err()),
                ("AZURE_OPENAI_DEPLOYMENT", std::env::var("AZURE_OPENAI_DEPLOYMENT").is_err()),
                ("AZURE_OPENAI_MODEL", std::env::var("AZURE_OPENAI_MODEL").is_err()),
            ];
            let missing: Vec<&str> = vars
                .iter()
                .filter(|(_, absent)| *absent)
                .map(|(name, _)| *name)
                .collect();
            return Err(ToolError::Configuration(format!(
                "Azure OpenAI credentials not found. Missing: {}. \
                 Please set these environment variables.",
                missing.join(", ")
            )));
        };

        Self::new(&endpoint, &deployment, &model, &api_key, &api_version)
    }
}

#[derive(Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl CompletionClient for AzureOpenAiClient {
    fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String> {
        let request = ChatCompletionsRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens,
        };

        // Single attempt. A timeout or 5xx surfaces to the invoking agent,
        // which owns the retry decision.
        let resp = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .map_err(|e| ToolError::Backend(format!("completion request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(ToolError::Backend(format!(
                "completion request failed: HTTP {} - {}",
                status,
                crate::error::preview(&body, 500)
            )));
        }

        let parsed: ChatCompletionsResponse = resp
            .json()
            .map_err(|e| ToolError::Backend(format!("failed to parse completion response: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ToolError::Backend("completion response had no content".to_string()))?;

        Ok(content.trim().to_string())
    }
}
