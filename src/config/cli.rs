use crate::config::{EpgConfig, SourceMode};
use crate::core::clock::TimestampMode;
use crate::core::output::Compression;
use crate::utils::error::Result;
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

/// Command line and environment overrides. Unset values fall back to the
/// config file (when given) and then to built-in defaults.
#[derive(Debug, Clone, Parser)]
#[command(name = "epg-builder")]
#[command(about = "Build an XMLTV guide for the channels of an M3U playlist")]
pub struct CliConfig {
    /// TOML configuration file
    #[arg(short, long, env = "EPG_CONFIG")]
    pub config: Option<String>,

    #[arg(long, value_enum, env = "EPG_MODE")]
    pub mode: Option<SourceMode>,

    #[arg(long, env = "M3U_FILE")]
    pub playlist: Option<String>,

    #[arg(short, long, env = "OUTPUT_FILE")]
    pub output: Option<String>,

    #[arg(long, env = "EPG_API_URL")]
    pub api_endpoint: Option<String>,

    #[arg(long, env = "EPG_FEED_URL")]
    pub feed_url: Option<String>,

    #[arg(long, env = "EPG_POSTER_BASE")]
    pub poster_base_url: Option<String>,

    /// Concurrent schedule requests
    #[arg(long, env = "MAX_WORKERS")]
    pub workers: Option<usize>,

    /// Total attempts per request, including the first
    #[arg(long, env = "MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Base retry delay; attempt n waits n times this
    #[arg(long, env = "RETRY_DELAY_MS")]
    pub retry_delay_ms: Option<u64>,

    #[arg(long, env = "REQUEST_TIMEOUT")]
    pub timeout_secs: Option<u64>,

    #[arg(long, env = "EPG_FIRST_OFFSET", allow_hyphen_values = true)]
    pub first_offset: Option<i32>,

    #[arg(long, env = "EPG_LAST_OFFSET", allow_hyphen_values = true)]
    pub last_offset: Option<i32>,

    /// Offset written after every timestamp, e.g. +0530
    #[arg(long, env = "EPG_UTC_OFFSET", allow_hyphen_values = true)]
    pub utc_offset: Option<String>,

    #[arg(long, value_enum, env = "EPG_TIMESTAMP_MODE")]
    pub timestamp_mode: Option<TimestampMode>,

    #[arg(long, value_enum, env = "EPG_COMPRESSION")]
    pub compression: Option<Compression>,

    /// Also write a gzip copy next to a plain XML output
    #[arg(long, env = "EPG_GZIP_COPY")]
    pub gzip_copy: bool,

    /// Indent the XML output
    #[arg(long)]
    pub pretty: bool,

    #[arg(long, env = "DAYS")]
    pub days: Option<u32>,

    #[arg(long, env = "SLOT_MINUTES")]
    pub slot_minutes: Option<u32>,

    /// Placeholder start, YYYY-MM-DDTHH:MM:SS
    #[arg(long, env = "START_DATE_OVERRIDE")]
    pub start_date: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per stage")]
    pub monitor: bool,

    #[arg(long, value_enum, default_value = "compact")]
    pub log_format: LogFormat,
}

impl CliConfig {
    /// Loads the config file (if any) and applies every explicit override.
    pub fn resolve(&self) -> Result<EpgConfig> {
        let base = match &self.config {
            Some(path) => EpgConfig::from_file(path)?,
            None => EpgConfig::default(),
        };
        Ok(self.apply(base))
    }

    pub fn apply(&self, mut config: EpgConfig) -> EpgConfig {
        if let Some(mode) = self.mode {
            config.source.mode = mode;
        }
        if let Some(playlist) = &self.playlist {
            config.source.playlist_path = playlist.clone();
        }
        if let Some(endpoint) = &self.api_endpoint {
            config.source.api_endpoint = endpoint.clone();
        }
        if let Some(feed_url) = &self.feed_url {
            config.source.feed_url = feed_url.clone();
        }

        if let Some(workers) = self.workers {
            config.fetch.workers = workers;
        }
        if let Some(max_retries) = self.max_retries {
            config.fetch.max_attempts = max_retries;
        }
        if let Some(delay) = self.retry_delay_ms {
            config.fetch.retry_delay_ms = delay;
        }
        if let Some(timeout) = self.timeout_secs {
            config.fetch.timeout_secs = timeout;
        }
        if let Some(first) = self.first_offset {
            config.fetch.first_offset = first;
        }
        if let Some(last) = self.last_offset {
            config.fetch.last_offset = last;
        }

        if let Some(base) = &self.poster_base_url {
            config.render.poster_base_url = base.clone();
        }
        if let Some(offset) = &self.utc_offset {
            config.render.utc_offset = offset.clone();
        }
        if let Some(mode) = self.timestamp_mode {
            config.render.timestamp_mode = mode;
        }
        if self.pretty {
            config.render.pretty = true;
        }
        if let Some(days) = self.days {
            config.render.days = days;
        }
        if let Some(slot) = self.slot_minutes {
            config.render.slot_minutes = slot;
        }
        if let Some(start) = &self.start_date {
            config.render.start_date = Some(start.clone());
        }

        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(compression) = self.compression {
            config.output.compression = compression;
        }
        if self.gzip_copy {
            config.output.gzip_copy = true;
        }

        config
    }
}
