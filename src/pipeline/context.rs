//! Context hint sent along with each document
//!
//! Creation time is read at a fixed UTC offset, not a real time zone, so
//! daylight saving shifts the work-hours window by an hour for half the year.

use crate::config::TimeContextSettings;
use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeContext {
    WorkHours,
    AfterHours,
}

impl TimeContext {
    pub fn hint(&self) -> &'static str {
        match self {
            Self::WorkHours => "Created on a weekday during work hours (likely work-related).",
            Self::AfterHours => "Created on a weekend or after hours (likely personal).",
        }
    }
}

pub fn time_context(created: DateTime<Utc>, settings: &TimeContextSettings) -> TimeContext {
    // Out-of-range offsets are rejected by settings validation
    let local = match FixedOffset::east_opt(settings.utc_offset_hours * 3600) {
        Some(offset) => created.with_timezone(&offset).naive_local(),
        None => created.naive_utc(),
    };

    let weekday = !matches!(local.weekday(), Weekday::Sat | Weekday::Sun);
    let hour = local.hour();
    if weekday && hour >= settings.work_start_hour && hour < settings.work_end_hour {
        TimeContext::WorkHours
    } else {
        TimeContext::AfterHours
    }
}

/// `File located in folder: {label}.` plus the time-of-day hint when known
pub fn context_hint(
    folder_label: &str,
    created: Option<DateTime<Utc>>,
    settings: &TimeContextSettings,
) -> String {
    let mut hint = format!("File located in folder: {}.", folder_label);
    if let Some(created) = created {
        hint.push(' ');
        hint.push_str(time_context(created, settings).hint());
    }
    hint
}
