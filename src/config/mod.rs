#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::clock::{ScheduleClock, TimestampMode};
use crate::core::output::Compression;
use crate::core::retry::RetryPolicy;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EpgError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_API_ENDPOINT: &str = "https://jiotvapi.cdn.jio.com/apis/v1.3/getepg/get";
pub const DEFAULT_FEED_URL: &str =
    "https://raw.githubusercontent.com/undertaker321/epg/refs/heads/main/jio.xml.gz";
pub const DEFAULT_POSTER_BASE: &str = "https://jiotvimages.cdn.jio.com/dare_images/shows/";

/// Where the schedule data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// One schedule API call per channel and day offset.
    Api,
    /// Filter a pre-built remote XMLTV feed.
    Feed,
    /// Generate rotating placeholder slots.
    Placeholder,
}

impl std::fmt::Display for SourceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Api => "api",
            Self::Feed => "feed",
            Self::Placeholder => "placeholder",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub mode: SourceMode,
    pub playlist_path: String,
    pub api_endpoint: String,
    pub feed_url: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            mode: SourceMode::Api,
            playlist_path: "jstar.m3u".to_string(),
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            feed_url: DEFAULT_FEED_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub workers: usize,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub timeout_secs: u64,
    pub first_offset: i32,
    pub last_offset: i32,
    pub headers: BTreeMap<String, String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        let headers = [
            ("User-Agent", "Mozilla/5.0 (Linux; Android 13)"),
            ("Accept", "application/json"),
            ("Referer", "https://www.jiotv.com/"),
            ("Origin", "https://www.jiotv.com"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            workers: 10,
            max_attempts: 3,
            retry_delay_ms: 2000,
            timeout_secs: 20,
            first_offset: -1,
            last_offset: 3,
            headers,
        }
    }
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn day_offsets(&self) -> Vec<i32> {
        (self.first_offset..=self.last_offset).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub poster_base_url: String,
    pub utc_offset: String,
    pub timestamp_mode: TimestampMode,
    pub generator_name: String,
    pub pretty: bool,
    pub days: u32,
    pub slot_minutes: u32,
    /// `YYYY-MM-DDTHH:MM:SS`, placeholder mode only.
    pub start_date: Option<String>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            poster_base_url: DEFAULT_POSTER_BASE.to_string(),
            utc_offset: "+0530".to_string(),
            timestamp_mode: TimestampMode::Label,
            generator_name: "epg-builder".to_string(),
            pretty: false,
            days: 7,
            slot_minutes: 30,
            start_date: None,
        }
    }
}

impl RenderSettings {
    pub fn clock(&self) -> Result<ScheduleClock> {
        ScheduleClock::parse(&self.utc_offset, self.timestamp_mode)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub path: String,
    pub compression: Compression,
    /// Also write `<path>.gz` when the main output is plain XML.
    pub gzip_copy: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: "jio_epg.xml.gz".to_string(),
            compression: Compression::Auto,
            gzip_copy: false,
        }
    }
}

/// Complete run configuration, shared read-only by every stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EpgConfig {
    pub source: SourceSettings,
    pub fetch: FetchSettings,
    pub render: RenderSettings,
    pub output: OutputSettings,
}

impl ConfigProvider for EpgConfig {
    fn source(&self) -> &SourceSettings {
        &self.source
    }

    fn fetch(&self) -> &FetchSettings {
        &self.fetch
    }

    fn render(&self) -> &RenderSettings {
        &self.render
    }

    fn output(&self) -> &OutputSettings {
        &self.output
    }
}

impl Validate for EpgConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("source.playlist_path", &self.source.playlist_path)?;
        validation::validate_path("output.path", &self.output.path)?;

        match self.source.mode {
            SourceMode::Api => {
                validation::validate_url("source.api_endpoint", &self.source.api_endpoint)?
            }
            SourceMode::Feed => validation::validate_url("source.feed_url", &self.source.feed_url)?,
            SourceMode::Placeholder => {}
        }

        validation::validate_workers("fetch.workers", self.fetch.workers)?;
        validation::validate_range("fetch.max_attempts", self.fetch.max_attempts, 1, 20)?;
        validation::validate_range("fetch.timeout_secs", self.fetch.timeout_secs, 1, 600)?;
        validation::validate_range("fetch.first_offset", self.fetch.first_offset, -30, 30)?;
        validation::validate_offset_window(self.fetch.first_offset, self.fetch.last_offset)?;

        for (name, value) in &self.fetch.headers {
            validation::validate_header(name, value)?;
        }

        self.render.clock()?;
        validation::validate_range("render.days", self.render.days, 1, 31)?;
        validation::validate_range("render.slot_minutes", self.render.slot_minutes, 1, 24 * 60)?;
        validation::validate_non_empty_string("render.generator_name", &self.render.generator_name)
            .map_err(|_| EpgError::ConfigValidationError {
                field: "render.generator_name".to_string(),
                message: "generator name cannot be empty".to_string(),
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EpgConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fetch.day_offsets(), vec![-1, 0, 1, 2, 3]);
        assert_eq!(config.fetch.workers, 10);
        assert_eq!(config.fetch.headers["Accept"], "application/json");
    }

    #[test]
    fn test_inverted_offsets_rejected() {
        let mut config = EpgConfig::default();
        config.fetch.first_offset = 2;
        config.fetch.last_offset = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_feed_mode_checks_feed_url() {
        let mut config = EpgConfig::default();
        config.source.mode = SourceMode::Feed;
        config.source.api_endpoint = String::new();
        config.source.feed_url = "file:///tmp/epg.xml".to_string();
        assert!(config.validate().is_err());

        config.source.feed_url = "https://example.com/epg.xml.gz".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_utc_offset_rejected() {
        let mut config = EpgConfig::default();
        config.render.utc_offset = "IST".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_worker_count_is_bounded() {
        let mut config = EpgConfig::default();
        config.fetch.workers = 0;
        assert!(config.validate().is_err());

        config.fetch.workers = 256;
        assert!(config.validate().is_ok());

        config.fetch.workers = usize::MAX >> 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_header_rejected_before_run() {
        let mut config = EpgConfig::default();
        config
            .fetch
            .headers
            .insert("User Agent".to_string(), "x".to_string());
        assert!(matches!(
            config.validate(),
            Err(EpgError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_missing_api_endpoint_reported() {
        let mut config = EpgConfig::default();
        config.source.api_endpoint = String::new();
        assert!(matches!(
            config.validate(),
            Err(EpgError::MissingConfigError { .. })
        ));
    }
}
