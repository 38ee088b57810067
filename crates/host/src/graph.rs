// crates/host/src/graph.rs

//! Microsoft Graph client: directory listing, calendar views, event creation.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use deskmate_core::error::{Result, ToolError};
use deskmate_core::types::Identity;

const GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";
const SCOPE: &str = "https://graph.microsoft.com/.default";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking Microsoft Graph client authenticated with client credentials.
///
/// A fresh token is requested per operation and never cached, the same way
/// the directory itself is re-fetched per resolution: correctness over
/// latency, nothing stale.
///
/// Environment variables: TENANT_ID, CLIENT_ID, CLIENT_SECRET.
pub struct GraphClient {
    client: Client,
    tenant_id: String,
    client_id: String,
    client_secret: String,
}

impl GraphClient {
    pub fn from_env() -> Result<Self> {
        let tenant_id = std::env::var("TENANT_ID")
            .map_err(|_| ToolError::Configuration("TENANT_ID not set".to_string()))?;
        let client_id = std::env::var("CLIENT_ID")
            .map_err(|_| ToolError::Configuration("CLIENT_ID not set".to_string()))?;
        let client_secret = std::env::var("CLIENT_SECRET")
            .map_err(|_| ToolError::Configuration("CLIENT_SECRET not set".to_string()))?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ToolError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            tenant_id,
            client_id,
            client_secret,
        })
    }

    fn access_token(&self) -> Result<String> {
        let url = format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
            self.tenant_id
        );
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", SCOPE),
            ("grant_type", "client_credentials"),
        ];

        let resp = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .map_err(|e| ToolError::Provider(format!("token request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(ToolError::Provider(format!(
                "token request failed: HTTP {}",
                resp.status()
            )));
        }

        let body: TokenResponse = resp
            .json()
            .map_err(|e| ToolError::Provider(format!("failed to parse token response: {e}")))?;
        Ok(body.access_token)
    }

    /// GET a Graph URL and all of its continuation pages, returning the
    /// concatenated `value` arrays. Graph truncates collections and hands
    /// back `@odata.nextLink`; stopping at the first page silently drops
    /// users and events.
    fn get_paged(
        &self,
        token: &str,
        url: &str,
        query: &[(&str, &str)],
        prefer: Option<&str>,
    ) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut next: Option<String> = None;
        let mut first = true;

        loop {
            let mut request = match &next {
                // nextLink already carries the query string.
                Some(link) => self.client.get(link),
                None => self.client.get(url).query(query),
            };
            request = request.bearer_auth(token);
            if let Some(prefer) = prefer {
                request = request.header("Prefer", prefer);
            }

            let resp = request
                .send()
                .map_err(|e| ToolError::Provider(format!("Graph request failed: {e}")))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().unwrap_or_default();
                return Err(ToolError::Provider(format!(
                    "Graph request failed: HTTP {} - {}",
                    status,
                    deskmate_core::error::preview(&body, 500)
                )));
            }

            let page: Value = resp
                .json()
                .map_err(|e| ToolError::Provider(format!("failed to parse Graph response: {e}")))?;

            if let Some(values) = page.get("value").and_then(Value::as_array) {
                items.extend(values.iter().cloned());
            } else if first {
                return Err(ToolError::Provider(
                    "Graph response had no 'value' collection".to_string(),
                ));
            }

            next = page
                .get("@odata.nextLink")
                .and_then(Value::as_str)
                .map(str::to_string);
            first = false;

            if next.is_none() {
                return Ok(items);
            }
        }
    }

    /// Full directory snapshot as (display name, email) identities.
    ///
    /// Email prefers `mail` and falls back to `userPrincipalName`; entries
    /// with neither are skipped. Display name defaults to "Unknown".
    pub fn fetch_users(&self) -> Result<Vec<Identity>> {
        let token = self.access_token()?;
        let raw = self.get_paged(
            &token,
            &format!("{GRAPH_BASE}/users"),
            &[("$select", "displayName,mail,userPrincipalName")],
            None,
        )?;

        let mut users = Vec::with_capacity(raw.len());
        for value in raw {
            let user: GraphUser = serde_json::from_value(value)
                .map_err(|e| ToolError::Provider(format!("malformed Graph user: {e}")))?;
            let Some(email) = user.mail.or(user.user_principal_name) else {
                continue;
            };
            users.push(Identity::new(
                user.display_name.unwrap_or_else(|| "Unknown".to_string()),
                email,
            ));
        }
        Ok(users)
    }

    /// Resolve an email to the Graph object id, matching `mail` or
    /// `userPrincipalName` case-insensitively.
    fn user_id_by_email(&self, token: &str, email: &str) -> Result<String> {
        let needle = email.to_lowercase();
        let raw = self.get_paged(
            token,
            &format!("{GRAPH_BASE}/users"),
            &[("$select", "id,mail,userPrincipalName")],
            None,
        )?;

        for value in raw {
            let user: GraphUser = serde_json::from_value(value)
                .map_err(|e| ToolError::Provider(format!("malformed Graph user: {e}")))?;
            let mail_matches = user
                .mail
                .as_deref()
                .is_some_and(|m| m.to_lowercase() == needle);
            let upn_matches = user
                .user_principal_name
                .as_deref()
                .is_some_and(|u| u.to_lowercase() == needle);
            if mail_matches || upn_matches {
                if let Some(id) = user.id {
                    return Ok(id);
                }
            }
        }

        Err(ToolError::NotFound(format!(
            "user not found in directory: {email}"
        )))
    }

    /// Calendar events for a user in the given window, Eastern time.
    pub fn calendar_view(
        &self,
        email: &str,
        start_datetime: &str,
        end_datetime: &str,
    ) -> Result<Vec<CalendarEvent>> {
        let token = self.access_token()?;
        let user_id = self.user_id_by_email(&token, email)?;
        let raw = self.get_paged(
            &token,
            &format!("{GRAPH_BASE}/users/{user_id}/calendarView"),
            &[
                ("startDateTime", start_datetime),
                ("endDateTime", end_datetime),
                ("$select", "subject,start,end,isAllDay"),
            ],
            Some(r#"outlook.timezone="Eastern Standard Time""#),
        )?;

        let mut events = Vec::with_capacity(raw.len());
        for value in raw {
            let event: GraphEvent = serde_json::from_value(value)
                .map_err(|e| ToolError::Provider(format!("malformed Graph event: {e}")))?;
            events.push(CalendarEvent {
                subject: event.subject,
                start: event.start.date_time,
                end: event.end.date_time,
            });
        }
        Ok(events)
    }

    /// Create a calendar event on the user's calendar, returning the raw
    /// provider event object.
    pub fn create_event(&self, email: &str, event: &Value) -> Result<Value> {
        let token = self.access_token()?;
        let user_id = self.user_id_by_email(&token, email)?;

        let resp = self
            .client
            .post(format!("{GRAPH_BASE}/users/{user_id}/events"))
            .bearer_auth(&token)
            .json(event)
            .send()
            .map_err(|e| ToolError::Provider(format!("event creation failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(ToolError::Provider(format!(
                "event creation failed: HTTP {} - {}",
                status,
                deskmate_core::error::preview(&body, 500)
            )));
        }

        resp.json()
            .map_err(|e| ToolError::Provider(format!("failed to parse created event: {e}")))
    }
}

/// One calendar event projected down to what availability math needs.
#[derive(Debug, Clone)]
pub struct CalendarEvent {
    pub subject: Option<String>,
    pub start: String,
    pub end: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphUser {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    mail: Option<String>,
    #[serde(default)]
    user_principal_name: Option<String>,
}

#[derive(Deserialize)]
struct GraphEvent {
    #[serde(default)]
    subject: Option<String>,
    start: GraphDateTime,
    end: GraphDateTime,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphDateTime {
    date_time: String,
}
