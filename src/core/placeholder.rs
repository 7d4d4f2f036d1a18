use crate::core::clock::ScheduleClock;
use crate::core::xmltv::{GuideChannel, Programme};
use crate::domain::model::Channel;
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};

const START_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const PROGRAM_TITLES: [&str; 10] = [
    "Morning Show",
    "Daily News",
    "Prime Drama",
    "Movie Time",
    "Kids Hour",
    "Evening Sports",
    "Music Mix",
    "Late Night Special",
    "Documentary Hour",
    "Talk Show",
];

const PROGRAM_DESCS: [&str; 10] = [
    "A lively talk and music show.",
    "Latest news & headlines.",
    "A dramatic serial episode.",
    "Featured movie presentation.",
    "Cartoons and kids entertainment.",
    "Live sports highlights & analysis.",
    "Top chart music videos.",
    "Late-night interviews and features.",
    "A deep-dive documentary.",
    "Celebrity chat and gossip.",
];

const DEFAULT_CATEGORY: &str = "General";

/// Fixed-length rotating slots for channels without a real schedule.
#[derive(Debug, Clone)]
pub struct PlaceholderSchedule {
    start: DateTime<FixedOffset>,
    days: u32,
    slot: Duration,
}

impl PlaceholderSchedule {
    pub fn new(start: DateTime<FixedOffset>, days: u32, slot_minutes: u32) -> Self {
        Self {
            start,
            days,
            slot: Duration::minutes(i64::from(slot_minutes.max(1))),
        }
    }

    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    pub fn slots_per_channel(&self) -> usize {
        let total = Duration::days(i64::from(self.days));
        let slot = self.slot.num_seconds().max(1);
        ((total.num_seconds() + slot - 1) / slot) as usize
    }

    /// Slots start at `start` and run until `days` have elapsed; titles restart per channel.
    pub fn programmes_for(&self, channel: &Channel, clock: &ScheduleClock) -> Vec<Programme> {
        let end = self.start + Duration::days(i64::from(self.days));
        let category = channel
            .group
            .clone()
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let mut programmes = Vec::with_capacity(self.slots_per_channel());
        let mut current = self.start;
        let mut index = 0usize;
        while current < end {
            let stop = current + self.slot;
            programmes.push(Programme {
                channel: channel.id.clone(),
                start: clock.format_local(current),
                stop: clock.format_local(stop),
                title: PROGRAM_TITLES[index % PROGRAM_TITLES.len()].to_string(),
                desc: Some(PROGRAM_DESCS[index % PROGRAM_DESCS.len()].to_string()),
                category: Some(category.clone()),
                icon: None,
                lang: Some("en".to_string()),
            });
            current = stop;
            index += 1;
        }
        programmes
    }

    pub fn build(
        &self,
        channels: &[Channel],
        clock: &ScheduleClock,
    ) -> (Vec<GuideChannel>, Vec<Programme>) {
        let guide_channels = channels.iter().map(GuideChannel::from).collect();
        let programmes = channels
            .iter()
            .flat_map(|channel| self.programmes_for(channel, clock))
            .collect();
        (guide_channels, programmes)
    }
}

/// Parses `YYYY-MM-DDTHH:MM:SS` as local time at `offset`; anything else
/// falls back to today's midnight at that offset.
pub fn resolve_start(override_value: Option<&str>, offset: FixedOffset) -> DateTime<FixedOffset> {
    resolve_start_at(override_value, offset, Utc::now())
}

fn resolve_start_at(
    override_value: Option<&str>,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> DateTime<FixedOffset> {
    if let Some(value) = override_value.map(str::trim).filter(|v| !v.is_empty()) {
        match NaiveDateTime::parse_from_str(value, START_FORMAT) {
            Ok(naive) => {
                if let Some(start) = offset.from_local_datetime(&naive).single() {
                    return start;
                }
                tracing::warn!("⚠️ Start date '{}' is ambiguous, using midnight", value);
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ Couldn't parse start date override '{}': {}; using today's midnight",
                    value,
                    e
                );
            }
        }
    }

    midnight(now.with_timezone(&offset))
}

fn midnight(local: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let naive = local.date_naive().and_time(chrono::NaiveTime::MIN);
    local
        .timezone()
        .from_local_datetime(&naive)
        .single()
        .unwrap_or(local)
}
