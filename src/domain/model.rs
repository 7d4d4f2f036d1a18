use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One playlist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub logo: Option<String>,
    pub group: Option<String>,
}

/// One schedule API call: a channel on a given day offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchTask {
    pub channel_id: String,
    pub offset: i32,
}

impl std::fmt::Display for FetchTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} offset={}", self.channel_id, self.offset)
    }
}

/// The raw `epg` list of a successful schedule response.
#[derive(Debug, Clone)]
pub struct SchedulePayload {
    pub channel_id: String,
    pub offset: i32,
    pub entries: Vec<serde_json::Value>,
}

/// One programme slot as returned by the schedule API.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub poster: Option<String>,
}

impl ScheduleEntry {
    /// Returns `None` when either epoch field is missing or not a number.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let start = epoch_millis(value.get("startEpoch")?)?;
        let end = epoch_millis(value.get("endEpoch")?)?;

        let title = value
            .get("showname")
            .and_then(text_value)
            .unwrap_or_else(|| "Unknown".to_string());

        let description = value
            .get("description")
            .and_then(text_value)
            .unwrap_or_default();

        let category = value
            .get("genre")
            .and_then(text_value)
            .filter(|s| !s.is_empty());

        let poster = value
            .get("episodePoster")
            .and_then(text_value)
            .filter(|s| !s.is_empty());

        Some(Self {
            start,
            end,
            title,
            description,
            category,
            poster,
        })
    }
}

fn epoch_millis(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    let millis = match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        _ => return None,
    };
    DateTime::from_timestamp_millis(millis)
}

fn text_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Result of one fetch task after retries.
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(SchedulePayload),
    /// HTTP 200 without a usable schedule list.
    Empty,
    Skipped { status: u16 },
    Failed { reason: String, attempts: u32 },
}

#[derive(Debug, Default)]
pub struct DispatchReport {
    pub payloads: Vec<SchedulePayload>,
    pub fetched: usize,
    pub empty: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DispatchReport {
    pub fn total(&self) -> usize {
        self.fetched + self.empty + self.skipped + self.failed
    }

    pub fn record(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Fetched(payload) => {
                self.fetched += 1;
                self.payloads.push(payload);
            }
            FetchOutcome::Empty => self.empty += 1,
            FetchOutcome::Skipped { .. } => self.skipped += 1,
            FetchOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// A serialized guide ready to be written.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub xml: Vec<u8>,
    pub channels: usize,
    pub programmes: usize,
    pub dropped: usize,
}
