use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub output_path: String,
    pub channels: usize,
    pub programmes: usize,
    pub dropped: usize,
    pub elapsed: Duration,
}

pub struct EpgEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EpgEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        tracing::info!("🚀 Starting guide build");

        // Extract
        tracing::info!("📥 Extracting...");
        let extracted = self.pipeline.extract().await?;
        self.monitor.log_stage("extract");

        // Transform
        tracing::info!("🔄 Building XMLTV document...");
        let result = self.pipeline.transform(extracted).await?;
        tracing::info!(
            "🔄 Built {} channels, {} programmes ({} dropped)",
            result.channels,
            result.programmes,
            result.dropped
        );
        self.monitor.log_stage("transform");

        let channels = result.channels;
        let programmes = result.programmes;
        let dropped = result.dropped;

        // Load
        tracing::info!("💾 Writing output...");
        let output_path = self.pipeline.load(result).await?;
        self.monitor.log_stage("load");
        self.monitor.log_final();

        let elapsed = started.elapsed();
        tracing::info!("✅ Guide written to {} in {:?}", output_path, elapsed);

        Ok(RunSummary {
            output_path,
            channels,
            programmes,
            dropped,
            elapsed,
        })
    }
}
