// crates/host/src/main.rs

//! deskmate tool host: calendar availability, meeting booking and time-entry
//! logging exposed as callable tools over line-delimited JSON on stdio.
//!
//! One request per line in (`{"tool": "...", "arguments": {...}}`), one
//! reply per line out (`{"ok": true, "result": ...}` or
//! `{"ok": false, "error": "..."}`). The literal line `tools` prints the
//! tool definitions.

mod availability;
mod booking;
mod graph;
mod log;
mod time_entry;
mod tool_defs;
mod tools;

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use serde_json::{json, Value};

use deskmate_core::sanitize::sanitize_str;

use tools::ToolHost;

fn main() -> Result<()> {
    let host = ToolHost::from_env().context("failed to initialize tool host")?;
    log::info("deskmate tool host ready; send one JSON request per line");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line.context("failed to read from stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("tools") {
            let listing = serde_json::to_string(&tool_defs::tool_definitions())?;
            writeln!(stdout, "{listing}")?;
            stdout.flush()?;
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let reply = match parse_request(line) {
            Ok((tool, args)) => {
                log::tool_call(&tool, &args.to_string());
                match host.handle(&tool, &args) {
                    Ok(result) => {
                        log::tool_result(&tool, &result.to_string(), false);
                        json!({ "ok": true, "result": result })
                    }
                    Err(e) => {
                        log::tool_result(&tool, &e.to_string(), true);
                        error_reply(&e.to_string())
                    }
                }
            }
            Err(e) => {
                log::error(&e);
                error_reply(&e)
            }
        };

        writeln!(stdout, "{reply}")?;
        stdout.flush()?;
    }

    Ok(())
}

/// Failure replies cross the same untrusted channel as results, and error
/// text echoes user input and backend payloads, so it is scrubbed too.
fn error_reply(message: &str) -> Value {
    json!({ "ok": false, "error": sanitize_str(message) })
}

fn parse_request(line: &str) -> Result<(String, Value), String> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| format!("invalid request JSON: {e}"))?;
    let tool = value
        .get("tool")
        .and_then(Value::as_str)
        .ok_or_else(|| "request is missing the 'tool' field".to_string())?
        .to_string();
    let args = value.get("arguments").cloned().unwrap_or_else(|| json!({}));
    Ok((tool, args))
}
