// crates/host/src/booking.rs

//! Meeting-booking helpers: datetime validation, event payload assembly,
//! and the human-readable summary attached to the provider's response.

use chrono::NaiveDateTime;
use serde_json::{json, Value};

use deskmate_core::error::{Result, ToolError};
use deskmate_core::types::ValidatedSender;

const TIME_ZONE: &str = "Eastern Standard Time";

/// Parse and order-check the meeting window. Runs before any provider call,
/// so a bad window never costs a directory fetch.
pub fn validate_window(
    start_datetime: &str,
    end_datetime: &str,
) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let start = parse(start_datetime)?;
    let end = parse(end_datetime)?;
    if end <= start {
        return Err(ToolError::InvalidInput(
            "end time must be after start time".to_string(),
        ));
    }
    Ok((start, end))
}

fn parse(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%dT%H:%M:%S").map_err(|_| {
        ToolError::InvalidInput(format!(
            "invalid datetime '{raw}'. Use YYYY-MM-DDTHH:MM:SS"
        ))
    })
}

/// Sender plus explicit attendees, deduplicated case-insensitively. The
/// sender is always on the invite.
pub fn attendee_emails(sender: &ValidatedSender, attendees: &[String]) -> Vec<String> {
    let mut emails = vec![sender.identity.email.clone()];
    for attendee in attendees {
        let trimmed = attendee.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !emails.iter().any(|e| e.eq_ignore_ascii_case(trimmed)) {
            emails.push(trimmed.to_string());
        }
    }
    emails
}

/// Graph event payload with Teams meeting enabled and sender attribution
/// always prepended into the HTML body.
pub fn build_event_payload(
    subject: &str,
    start_datetime: &str,
    end_datetime: &str,
    sender: &ValidatedSender,
    attendees: &[String],
    body: Option<&str>,
) -> Value {
    let attribution = format!(
        "<p>Meeting requested by {} ({})</p>",
        sender.identity.name, sender.identity.email
    );
    let content = match body {
        Some(body) if !body.trim().is_empty() => format!("{attribution}{body}"),
        _ => attribution,
    };

    json!({
        "subject": subject,
        "start": { "dateTime": start_datetime, "timeZone": TIME_ZONE },
        "end": { "dateTime": end_datetime, "timeZone": TIME_ZONE },
        "isOnlineMeeting": true,
        "onlineMeetingProvider": "teamsForBusiness",
        "body": { "contentType": "HTML", "content": content },
        "attendees": attendee_emails(sender, attendees)
            .iter()
            .map(|email| json!({
                "emailAddress": { "address": email },
                "type": "required"
            }))
            .collect::<Vec<_>>()
    })
}

/// Summary block merged into the provider's event object so the agent can
/// confirm the booking without parsing Graph's own shape.
pub fn booking_details(
    subject: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
    sender: &ValidatedSender,
    attendees: &[String],
    created: &Value,
) -> Value {
    let teams_link = created
        .get("onlineMeeting")
        .and_then(|m| m.get("joinUrl"))
        .and_then(Value::as_str);

    json!({
        "subject": subject,
        "day_of_week": start.format("%A").to_string(),
        "date_formatted": start.format("%B %d, %Y").to_string(),
        "start_time": start.format("%I:%M %p").to_string(),
        "end_time": end.format("%I:%M %p").to_string(),
        "duration_minutes": (end - start).num_minutes(),
        "teams_link": teams_link,
        "has_teams_link": teams_link.is_some(),
        "attendee_emails": attendee_emails(sender, attendees),
        "sender_name": sender.identity.name,
        "sender_email": sender.identity.email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskmate_core::types::Identity;

    fn sender() -> ValidatedSender {
        ValidatedSender {
            identity: Identity::new("Ryan Botindari", "ryan@x.com"),
        }
    }

    #[test]
    fn equal_start_and_end_are_rejected() {
        let err = validate_window("2026-01-05T10:00:00", "2026-01-05T10:00:00").unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let err = validate_window("2026-01-05T11:00:00", "2026-01-05T10:00:00").unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[test]
    fn unparseable_datetime_is_rejected() {
        let err = validate_window("tomorrow at ten", "2026-01-05T11:00:00").unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[test]
    fn valid_window_parses() {
        let (start, end) = validate_window("2026-01-05T10:00:00", "2026-01-05T10:30:00").unwrap();
        assert_eq!((end - start).num_minutes(), 30);
    }

    #[test]
    fn sender_is_always_an_attendee_and_never_duplicated() {
        let emails = attendee_emails(
            &sender(),
            &["RYAN@X.COM".to_string(), "zaki@x.com".to_string()],
        );
        assert_eq!(emails, vec!["ryan@x.com", "zaki@x.com"]);
    }

    #[test]
    fn attribution_is_prepended_to_the_body() {
        let payload = build_event_payload(
            "Sync",
            "2026-01-05T10:00:00",
            "2026-01-05T10:30:00",
            &sender(),
            &[],
            Some("<p>Agenda</p>"),
        );
        let content = payload["body"]["content"].as_str().unwrap();
        assert!(content.starts_with("<p>Meeting requested by Ryan Botindari (ryan@x.com)</p>"));
        assert!(content.ends_with("<p>Agenda</p>"));
    }

    #[test]
    fn attribution_stands_alone_without_a_body() {
        let payload = build_event_payload(
            "Sync",
            "2026-01-05T10:00:00",
            "2026-01-05T10:30:00",
            &sender(),
            &[],
            None,
        );
        assert!(payload["body"]["content"]
            .as_str()
            .unwrap()
            .contains("Meeting requested by"));
    }

    #[test]
    fn teams_link_is_surfaced_when_present() {
        let (start, end) =
            validate_window("2026-01-05T10:00:00", "2026-01-05T11:00:00").unwrap();
        let created = serde_json::json!({
            "onlineMeeting": { "joinUrl": "https://teams.example/join/abc" }
        });
        let details = booking_details("Sync", start, end, &sender(), &[], &created);
        assert_eq!(details["has_teams_link"], true);
        assert_eq!(details["teams_link"], "https://teams.example/join/abc");
        assert_eq!(details["duration_minutes"], 60);
        assert_eq!(details["day_of_week"], "Monday");
    }

    #[test]
    fn missing_teams_link_is_reported_not_invented() {
        let (start, end) =
            validate_window("2026-01-05T10:00:00", "2026-01-05T11:00:00").unwrap();
        let details =
            booking_details("Sync", start, end, &sender(), &[], &serde_json::json!({}));
        assert_eq!(details["has_teams_link"], false);
        assert_eq!(details["teams_link"], Value::Null);
    }
}
