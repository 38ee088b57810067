// crates/host/src/tool_defs.rs

//! Tool definitions exposed to the calling agent.

use serde_json::json;

pub fn tool_definitions() -> Vec<serde_json::Value> {
    vec![
        json!({
            "type": "function",
            "function": {
                "name": "get_users_with_name_and_email",
                "description": "Get every user in the directory with their display name and email address. Call this first when a name or email needs verifying.",
                "parameters": {
                    "type": "object",
                    "properties": {},
                    "required": []
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": "check_availability",
                "description": "Check a user's calendar availability for one date within business hours (09:00-17:00 Eastern).",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "user": {
                            "type": "string",
                            "description": "The user's name or email address. Names are resolved against the directory; ambiguous names are rejected."
                        },
                        "date": {
                            "type": "string",
                            "description": "Date to check, YYYY-MM-DD. Defaults to today."
                        }
                    },
                    "required": ["user"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": "book_meeting",
                "description": "Book a Teams meeting on a user's calendar. The sender email is mandatory and is validated against the directory; the sender is always added as a required attendee.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "user": {
                            "type": "string",
                            "description": "Name or email of the user whose calendar to book on."
                        },
                        "subject": {
                            "type": "string",
                            "description": "Meeting subject line."
                        },
                        "start_datetime": {
                            "type": "string",
                            "description": "Start time, YYYY-MM-DDTHH:MM:SS."
                        },
                        "end_datetime": {
                            "type": "string",
                            "description": "End time, YYYY-MM-DDTHH:MM:SS. Must be after start_datetime."
                        },
                        "sender_email": {
                            "type": "string",
                            "description": "Email address of the person requesting the meeting. Required; must exist in the directory."
                        },
                        "sender_name": {
                            "type": "string",
                            "description": "Display name of the requester, checked for consistency with sender_email."
                        },
                        "attendees": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Additional attendee email addresses."
                        },
                        "body": {
                            "type": "string",
                            "description": "Optional HTML meeting body."
                        }
                    },
                    "required": ["user", "subject", "start_datetime", "end_datetime", "sender_email"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": "process_time_entry",
                "description": "Log billable time from a natural-language query. The query must mention date, client, description and hours.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "user_name": {
                            "type": "string",
                            "description": "Name of the user logging time."
                        },
                        "query": {
                            "type": "string",
                            "description": "Natural-language description, e.g. 'Log 8 hours for Arvaya Internal on 1/3, preparing the quarterly report'."
                        }
                    },
                    "required": ["user_name", "query"]
                }
            }
        }),
    ]
}
