use crate::utils::error::{EpgError, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

const XMLTV_FORMAT: &str = "%Y%m%d%H%M%S";

/// How epoch values from the schedule API map onto XMLTV timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum TimestampMode {
    /// The epoch already carries local wall-clock time; only the offset label is added.
    Label,
    /// Convert the instant into the configured offset before formatting.
    Convert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleClock {
    offset: FixedOffset,
    mode: TimestampMode,
}

impl ScheduleClock {
    pub fn new(offset: FixedOffset, mode: TimestampMode) -> Self {
        Self { offset, mode }
    }

    pub fn parse(offset: &str, mode: TimestampMode) -> Result<Self> {
        Ok(Self::new(parse_utc_offset(offset)?, mode))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// `YYYYMMDDHHMMSS ±ZZZZ`
    pub fn format(&self, instant: DateTime<Utc>) -> String {
        match self.mode {
            TimestampMode::Label => format!(
                "{} {}",
                instant.naive_utc().format(XMLTV_FORMAT),
                self.offset_label()
            ),
            TimestampMode::Convert => instant
                .with_timezone(&self.offset)
                .format("%Y%m%d%H%M%S %z")
                .to_string(),
        }
    }

    pub fn format_local(&self, local: DateTime<FixedOffset>) -> String {
        local.format("%Y%m%d%H%M%S %z").to_string()
    }

    fn offset_label(&self) -> String {
        let seconds = self.offset.local_minus_utc();
        let sign = if seconds < 0 { '-' } else { '+' };
        let minutes = seconds.abs() / 60;
        format!("{}{:02}{:02}", sign, minutes / 60, minutes % 60)
    }
}

/// Accepts `+0530`, `-03:00`, `Z` or `UTC`.
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset> {
    let invalid = |reason: &str| EpgError::InvalidConfigValueError {
        field: "render.utc_offset".to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(|| invalid("offset out of range"));
    }

    let (sign, rest) = match trimmed.chars().next() {
        Some('+') => (1, &trimmed[1..]),
        Some('-') => (-1, &trimmed[1..]),
        _ => return Err(invalid("expected a leading '+' or '-'")),
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("expected four digits, e.g. +0530"));
    }

    let hours: i32 = digits[..2].parse().map_err(|_| invalid("bad hours"))?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid("bad minutes"))?;
    if hours > 14 || minutes > 59 {
        return Err(invalid("offset out of range"));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| invalid("offset out of range"))
}
