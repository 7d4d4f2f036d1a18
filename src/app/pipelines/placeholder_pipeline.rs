use crate::core::placeholder::{resolve_start, PlaceholderSchedule};
use crate::core::playlist::load_playlist;
use crate::core::output;
use crate::core::xmltv::Document;
use crate::domain::model::{Channel, TransformResult};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::Result;

/// Fills every playlist channel with rotating filler slots; no network access.
pub struct PlaceholderPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
}

impl<S: Storage, C: ConfigProvider> PlaceholderPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for PlaceholderPipeline<S, C> {
    type Extracted = Vec<Channel>;

    async fn extract(&self) -> Result<Vec<Channel>> {
        load_playlist(&self.storage, &self.config.source().playlist_path).await
    }

    async fn transform(&self, data: Vec<Channel>) -> Result<TransformResult> {
        let render = self.config.render();
        let clock = render.clock()?;
        let start = resolve_start(render.start_date.as_deref(), clock.offset());
        let schedule = PlaceholderSchedule::new(start, render.days, render.slot_minutes);

        tracing::info!(
            "🗓️ Generating {} day(s) of {}-minute slots from {}",
            render.days,
            render.slot_minutes,
            clock.format_local(schedule.start())
        );

        let (channels, programmes) = schedule.build(&data, &clock);
        let document = Document {
            generator: Some(render.generator_name.clone()),
            channels,
            programmes,
        };

        Ok(TransformResult {
            xml: document.to_xml(render.pretty)?,
            channels: document.channels.len(),
            programmes: document.programmes.len(),
            dropped: 0,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        output::persist(&self.storage, self.config.output(), &result.xml).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStorage;
    use crate::config::{EpgConfig, SourceMode};
    use crate::core::output::Compression;

    #[tokio::test]
    async fn test_placeholder_run_fills_each_channel() {
        let mut config = EpgConfig::default();
        config.source.mode = SourceMode::Placeholder;
        config.render.days = 1;
        config.render.slot_minutes = 60;
        config.render.start_date = Some("2024-03-01T00:00:00".to_string());
        config.output.path = "epg.xml".to_string();
        config.output.compression = Compression::Never;
        config.output.gzip_copy = true;

        let storage = MemoryStorage::new();
        storage
            .insert(
                "jstar.m3u",
                "#EXTM3U\n\
                 #EXTINF:-1 tvg-id=\"1\" group-title=\"Sports\",One\nhttp://s/1\n\
                 #EXTINF:-1 tvg-id=\"2\",Two\nhttp://s/2\n",
            )
            .await;

        let pipeline = PlaceholderPipeline::new(storage.clone(), config);
        let channels = pipeline.extract().await.unwrap();
        let result = pipeline.transform(channels).await.unwrap();
        assert_eq!(result.channels, 2);
        assert_eq!(result.programmes, 48);

        pipeline.load(result).await.unwrap();

        let xml = String::from_utf8(storage.get_file("epg.xml").await.unwrap()).unwrap();
        assert!(xml.contains(
            r#"<programme start="20240301000000 +0530" stop="20240301010000 +0530" channel="1">"#
        ));
        assert!(xml.contains(r#"<category lang="en">Sports</category>"#));
        assert!(xml.contains(r#"<category lang="en">General</category>"#));
        assert!(storage.get_file("epg.xml.gz").await.is_some());
    }
}
