// crates/host/src/availability.rs

//! Free/busy arithmetic inside the fixed business-hours window.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::graph::CalendarEvent;

pub const BUSINESS_START: &str = "09:00:00";
pub const BUSINESS_END: &str = "17:00:00";

/// A booked interval on the requested date.
#[derive(Debug, Clone, Serialize)]
pub struct BusyTime {
    pub subject: Option<String>,
    pub start: String,
    pub end: String,
}

/// An open interval between meetings.
#[derive(Debug, Clone, Serialize)]
pub struct FreeSlot {
    pub start: String,
    pub end: String,
    pub duration_hours: f64,
}

/// Strip timezone suffixes and fractional seconds so provider timestamps
/// like "2026-01-03T09:00:00.0000000" parse as plain local datetimes.
fn clean_datetime(raw: &str) -> &str {
    let raw = raw.trim_end_matches('Z');
    let raw = raw.split('+').next().unwrap_or(raw);
    raw.split('.').next().unwrap_or(raw)
}

pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(clean_datetime(raw), "%Y-%m-%dT%H:%M:%S").ok()
}

/// Decimal hours between two timestamps, rounded to 2 places; 0 when either
/// side is unparseable.
pub fn duration_hours(start: &str, end: &str) -> f64 {
    match (parse_datetime(start), parse_datetime(end)) {
        (Some(s), Some(e)) => {
            let hours = (e - s).num_seconds() as f64 / 3600.0;
            (hours * 100.0).round() / 100.0
        }
        _ => 0.0,
    }
}

/// Events overlapping other dates are dropped; the availability question is
/// always about one calendar date.
pub fn busy_times_for_date(events: &[CalendarEvent], date: &str) -> Vec<BusyTime> {
    let mut busy: Vec<BusyTime> = events
        .iter()
        .filter(|event| event.start.split('T').next() == Some(date))
        .map(|event| BusyTime {
            subject: event.subject.clone(),
            start: event.start.clone(),
            end: event.end.clone(),
        })
        .collect();
    busy.sort_by(|a, b| a.start.cmp(&b.start));
    busy
}

/// Subtract sorted busy intervals from the 09:00-17:00 window.
///
/// An empty calendar yields the whole window as one 8-hour slot. Gaps of
/// zero length (back-to-back meetings) are not slots.
pub fn free_slots(busy: &[BusyTime], date: &str) -> Vec<FreeSlot> {
    let business_start = format!("{date}T{BUSINESS_START}");
    let business_end = format!("{date}T{BUSINESS_END}");

    if busy.is_empty() {
        return vec![FreeSlot {
            start: business_start,
            end: business_end,
            duration_hours: 8.0,
        }];
    }

    let mut slots = Vec::new();

    if let Some(first_start) = parse_datetime(&busy[0].start) {
        if first_start.format("%H:%M:%S").to_string().as_str() > BUSINESS_START {
            slots.push(FreeSlot {
                start: business_start.clone(),
                end: busy[0].start.clone(),
                duration_hours: duration_hours(&business_start, &busy[0].start),
            });
        }
    }

    for pair in busy.windows(2) {
        let gap = duration_hours(&pair[0].end, &pair[1].start);
        if gap > 0.0 {
            slots.push(FreeSlot {
                start: pair[0].end.clone(),
                end: pair[1].start.clone(),
                duration_hours: gap,
            });
        }
    }

    let last = &busy[busy.len() - 1];
    if let Some(last_end) = parse_datetime(&last.end) {
        if last_end.format("%H:%M:%S").to_string().as_str() < BUSINESS_END {
            slots.push(FreeSlot {
                start: last.end.clone(),
                end: business_end.clone(),
                duration_hours: duration_hours(&last.end, &business_end),
            });
        }
    }

    slots
}

/// English weekday name for an ISO date.
pub fn day_of_week(date: &str) -> Option<String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%A").to_string())
}
