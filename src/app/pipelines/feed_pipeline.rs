use crate::core::dispatcher::build_client;
use crate::core::feed::{download_feed, filter_feed};
use crate::core::output;
use crate::core::playlist::load_playlist;
use crate::domain::model::TransformResult;
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::Result;
use reqwest::Client;
use std::collections::HashSet;

#[derive(Debug)]
pub struct FeedExtract {
    pub channel_ids: HashSet<String>,
    pub feed: Vec<u8>,
}

/// Trims a complete upstream XMLTV feed down to the playlist's channels.
pub struct FeedPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> FeedPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let client = build_client(config.fetch())?;
        Ok(Self {
            storage,
            config,
            client,
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for FeedPipeline<S, C> {
    type Extracted = FeedExtract;

    async fn extract(&self) -> Result<FeedExtract> {
        let channels = load_playlist(&self.storage, &self.config.source().playlist_path).await?;
        let channel_ids: HashSet<String> = channels.into_iter().map(|c| c.id).collect();

        let policy = self.config.fetch().retry_policy();
        let feed = download_feed(&self.client, &self.config.source().feed_url, &policy).await?;
        Ok(FeedExtract { channel_ids, feed })
    }

    async fn transform(&self, data: FeedExtract) -> Result<TransformResult> {
        let filtered = filter_feed(&data.feed, &data.channel_ids, self.config.render().pretty)?;
        tracing::info!(
            "🔍 Kept {} channels and {} programmes, discarded {} elements",
            filtered.channels,
            filtered.programmes,
            filtered.discarded
        );

        Ok(TransformResult {
            xml: filtered.xml,
            channels: filtered.channels,
            programmes: filtered.programmes,
            dropped: filtered.discarded,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        output::persist(&self.storage, self.config.output(), &result.xml).await
    }
}
