pub mod pipelines;

use crate::config::{EpgConfig, SourceMode};
use crate::core::engine::{EpgEngine, RunSummary};
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use pipelines::{ApiPipeline, FeedPipeline, PlaceholderPipeline};

/// Runs the pipeline selected by `config.source.mode` against `storage`.
pub async fn run<S>(storage: S, config: EpgConfig, monitor: bool) -> Result<RunSummary>
where
    S: Storage + 'static,
{
    tracing::info!("Source mode: {}", config.source.mode);

    match config.source.mode {
        SourceMode::Api => {
            let pipeline = ApiPipeline::new(storage, config)?;
            EpgEngine::new_with_monitoring(pipeline, monitor).run().await
        }
        SourceMode::Feed => {
            let pipeline = FeedPipeline::new(storage, config)?;
            EpgEngine::new_with_monitoring(pipeline, monitor).run().await
        }
        SourceMode::Placeholder => {
            let pipeline = PlaceholderPipeline::new(storage, config);
            EpgEngine::new_with_monitoring(pipeline, monitor).run().await
        }
    }
}
