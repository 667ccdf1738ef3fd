use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

pub const DEFAULT_START_TIME: &str = "22:00";
pub const DEFAULT_END_TIME: &str = "06:00";

/// Persisted scheduling preferences: a daily activation window plus the
/// enabled flag for the background loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleConfig {
    #[serde(default = "default_start_time")]
    pub start_time: String,
    #[serde(default = "default_end_time")]
    pub end_time: String,
    #[serde(default)]
    pub enabled: bool,
}

fn default_start_time() -> String {
    DEFAULT_START_TIME.to_string()
}

fn default_end_time() -> String {
    DEFAULT_END_TIME.to_string()
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            start_time: default_start_time(),
            end_time: default_end_time(),
            enabled: false,
        }
    }
}

impl ScheduleConfig {
    pub fn validate(&self) -> Result<(), String> {
        parse_window_time(&self.start_time)?;
        parse_window_time(&self.end_time)?;
        Ok(())
    }

    pub fn window(&self) -> Result<TimeWindow, String> {
        TimeWindow::parse(&self.start_time, &self.end_time)
    }
}

/// Parse a strict `HH:MM` time-of-day string. Unlike chrono's `%H:%M`
/// format, single-digit hours ("8:00") are rejected.
pub fn parse_window_time(value: &str) -> Result<NaiveTime, String> {
    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 5
        && bytes[2] == b':'
        && bytes
            .iter()
            .enumerate()
            .all(|(index, byte)| index == 2 || byte.is_ascii_digit());
    if !well_formed {
        return Err(format!("invalid time '{value}': expected HH:MM"));
    }
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| format!("invalid time '{value}': expected HH:MM"))
}

/// A daily time-of-day interval during which the external mode should be
/// active. The window may wrap past midnight (`start > end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn parse(start: &str, end: &str) -> Result<Self, String> {
        Ok(Self {
            start: parse_window_time(start)?,
            end: parse_window_time(end)?,
        })
    }

    /// `start == end` denotes an empty window: the mode is never active.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether the mode should be active at `now`. Seconds are ignored;
    /// comparison happens at minute resolution.
    pub fn contains(&self, now: NaiveTime) -> bool {
        let now = truncate_to_minute(now);
        if self.start <= self.end {
            self.start <= now && now < self.end
        } else {
            now >= self.start || now < self.end
        }
    }
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}
