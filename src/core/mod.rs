pub mod clock;
pub mod dispatcher;
pub mod engine;
pub mod feed;
pub mod output;
pub mod placeholder;
pub mod playlist;
pub mod retry;
pub mod xmltv;

pub use crate::domain::model::TransformResult;
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
pub use engine::{EpgEngine, RunSummary};
