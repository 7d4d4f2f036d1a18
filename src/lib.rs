pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::storage::{LocalStorage, MemoryStorage};
pub use config::{EpgConfig, SourceMode};
pub use core::engine::{EpgEngine, RunSummary};
pub use utils::error::{EpgError, Result};
