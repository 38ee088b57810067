// crates/host/src/log.rs

//! Colored stderr logging for tool invocations.

use std::fmt::Display;

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

/// Log an incoming tool call with an argument preview.
pub fn tool_call(name: &str, args: &str) {
    let preview = truncate(args, 120);
    eprintln!("{BOLD}[tool]{RESET} {CYAN}→ {name}{RESET} {DIM}{preview}{RESET}");
}

/// Log a tool outcome.
pub fn tool_result(name: &str, result: &str, is_error: bool) {
    let preview = truncate(result, 150);
    let (symbol, color) = if is_error { ("✗", RED) } else { ("✓", GREEN) };
    eprintln!("{BOLD}[tool]{RESET} {color}{symbol} {name}{RESET}: {DIM}{preview}{RESET}");
}

/// Log info message.
pub fn info(message: impl Display) {
    eprintln!("{DIM}[info]{RESET} {message}");
}

/// Log a warning.
pub fn warn(message: impl Display) {
    eprintln!("{YELLOW}[warn]{RESET} {message}");
}

/// Log an error.
pub fn error(message: impl Display) {
    eprintln!("{RED}{BOLD}[error]{RESET} {message}");
}

fn truncate(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max).collect();
        format!("{cut}…")
    }
}
