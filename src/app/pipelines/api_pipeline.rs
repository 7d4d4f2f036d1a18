use crate::core::dispatcher::FetchDispatcher;
use crate::core::playlist::load_playlist;
use crate::core::{output, xmltv};
use crate::domain::model::{Channel, DispatchReport, TransformResult};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::Result;

/// Playlist channels and the schedules fetched for them.
#[derive(Debug)]
pub struct ApiExtract {
    pub channels: Vec<Channel>,
    pub report: DispatchReport,
}

/// Builds the guide from the per-channel, per-day schedule API.
pub struct ApiPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    dispatcher: FetchDispatcher,
}

impl<S: Storage, C: ConfigProvider> ApiPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let dispatcher = FetchDispatcher::new(&config.source().api_endpoint, config.fetch())?;
        Ok(Self {
            storage,
            config,
            dispatcher,
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ApiPipeline<S, C> {
    type Extracted = ApiExtract;

    async fn extract(&self) -> Result<ApiExtract> {
        let channels = load_playlist(&self.storage, &self.config.source().playlist_path).await?;
        if channels.is_empty() {
            tracing::warn!("⚠️ Playlist has no channels with a tvg-id");
        }

        let offsets = self.config.fetch().day_offsets();
        let report = self.dispatcher.dispatch(&channels, &offsets).await;
        Ok(ApiExtract { channels, report })
    }

    async fn transform(&self, data: ApiExtract) -> Result<TransformResult> {
        let render = self.config.render();
        let clock = render.clock()?;

        let (mut document, stats) = xmltv::build_document(
            &data.channels,
            data.report.payloads,
            &clock,
            &render.poster_base_url,
        );
        document.generator = Some(render.generator_name.clone());

        if stats.unknown_channels > 0 {
            tracing::warn!(
                "Ignored {} schedules for channels outside the playlist",
                stats.unknown_channels
            );
        }

        Ok(TransformResult {
            xml: document.to_xml(render.pretty)?,
            channels: document.channels.len(),
            programmes: document.programmes.len(),
            dropped: stats.dropped_entries,
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
    use crate::config::EpgConfig;
    use crate::core::output::Compression;
    use crate::utils::error::EpgError;
    use httpmock::prelude::*;
    use serde_json::json;

    const PLAYLIST: &str = "#EXTM3U\n\
        #EXTINF:-1 tvg-id=\"101\" tvg-logo=\"https://img.example.com/101.png\",Test Channel\n\
        https://stream.example.com/101.m3u8\n\
        #EXTINF:-1 tvg-id=\"202\",Quiet Channel\n\
        https://stream.example.com/202.m3u8\n";

    fn config(server: &MockServer) -> EpgConfig {
        let mut config = EpgConfig::default();
        config.source.api_endpoint = server.url("/getepg/get");
        config.fetch.first_offset = 0;
        config.fetch.last_offset = 0;
        config.fetch.retry_delay_ms = 1;
        config.render.poster_base_url = "https://img.example.com/".to_string();
        config.output.path = "epg.xml".to_string();
        config.output.compression = Compression::Never;
        config
    }

    #[tokio::test]
    async fn test_full_run_writes_guide() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/getepg/get")
                    .query_param("channel_id", "101")
                    .query_param("offset", "0");
                then.status(200).json_body(json!({
                    "epg": [{
                        "startEpoch": 1700000000000i64,
                        "endEpoch": 1700001800000i64,
                        "showname": "Test Show",
                        "description": "Pilot",
                        "episodePoster": "p/1.jpg"
                    }]
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/getepg/get")
                    .query_param("channel_id", "202");
                then.status(404);
            })
            .await;

        let storage = MemoryStorage::new();
        storage.insert("jstar.m3u", PLAYLIST).await;
        let pipeline = ApiPipeline::new(storage.clone(), config(&server)).unwrap();

        let extracted = pipeline.extract().await.unwrap();
        assert_eq!(extracted.channels.len(), 2);
        assert_eq!(extracted.report.fetched, 1);
        assert_eq!(extracted.report.skipped, 1);

        let result = pipeline.transform(extracted).await.unwrap();
        assert_eq!(result.channels, 2);
        assert_eq!(result.programmes, 1);

        let path = pipeline.load(result).await.unwrap();
        assert_eq!(path, "epg.xml");

        let xml = String::from_utf8(storage.get_file("epg.xml").await.unwrap()).unwrap();
        assert!(xml.contains(r#"<tv generator-info-name="epg-builder">"#));
        assert!(xml.contains(r#"<channel id="202"><display-name>Quiet Channel</display-name></channel>"#));
        assert!(xml.contains(
            r#"<programme start="20231114221320 +0530" stop="20231114224320 +0530" channel="101">"#
        ));
        assert!(xml.contains(r#"<icon src="https://img.example.com/p/1.jpg"/>"#));
    }

    #[tokio::test]
    async fn test_missing_playlist_makes_no_requests() {
        let server = MockServer::start_async().await;
        let any = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200);
            })
            .await;

        let pipeline = ApiPipeline::new(MemoryStorage::new(), config(&server)).unwrap();
        let err = pipeline.extract().await.unwrap_err();

        assert!(matches!(err, EpgError::PlaylistNotFound { .. }));
        any.assert_hits_async(0).await;
    }
}
