use anyhow::Result;
use epg_builder::core::output::gunzip_if_needed;
use epg_builder::utils::validation::Validate;
use epg_builder::{app, EpgConfig, EpgError, LocalStorage, SourceMode};
use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

const PLAYLIST: &str = r#"#EXTM3U
#EXTINF:-1 tvg-id="101" tvg-logo="https://img.example.com/101.png" group-title="Entertainment",Test Channel
https://stream.example.com/101.m3u8
"#;

fn api_config(server: &MockServer, output: &str) -> Result<EpgConfig> {
    let config = EpgConfig::from_toml_str(&format!(
        r#"
[source]
mode = "api"
playlist_path = "jstar.m3u"
api_endpoint = "{}"

[fetch]
workers = 2
max_attempts = 2
retry_delay_ms = 1
first_offset = 0
last_offset = 0

[output]
path = "{}"
"#,
        server.url("/apis/v1.3/getepg/get"),
        output
    ))?;
    config.validate()?;
    Ok(config)
}

async fn mock_schedule(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/apis/v1.3/getepg/get")
                .query_param("channel_id", "101")
                .query_param("offset", "0");
            then.status(200).json_body(json!({
                "epg": [{
                    "startEpoch": 1700000000000i64,
                    "endEpoch": 1700001800000i64,
                    "showname": "Test Show",
                    "description": "The first episode."
                }]
            }));
        })
        .await
}

/// 單一頻道、單一節目的完整流程
#[tokio::test]
async fn test_end_to_end_plain_xml() -> Result<()> {
    let temp_dir = TempDir::new()?;
    tokio::fs::write(temp_dir.path().join("jstar.m3u"), PLAYLIST).await?;

    let server = MockServer::start_async().await;
    let schedule = mock_schedule(&server).await;

    let config = api_config(&server, "epg.xml")?;
    let summary = app::run(LocalStorage::new(temp_dir.path()), config, false).await?;

    schedule.assert_async().await;
    assert_eq!(summary.output_path, "epg.xml");
    assert_eq!(summary.channels, 1);
    assert_eq!(summary.programmes, 1);

    let xml = tokio::fs::read_to_string(temp_dir.path().join("epg.xml")).await?;
    assert_eq!(xml.matches("<channel id=\"101\">").count(), 1);
    assert!(xml.contains("<display-name>Test Channel</display-name>"));
    assert!(xml.contains(
        r#"<programme start="20231114221320 +0530" stop="20231114224320 +0530" channel="101">"#
    ));
    assert!(xml.contains("<title>Test Show</title>"));
    assert!(xml.contains("<desc>The first episode.</desc>"));

    Ok(())
}

#[tokio::test]
async fn test_gz_output_is_compressed() -> Result<()> {
    let temp_dir = TempDir::new()?;
    tokio::fs::write(temp_dir.path().join("jstar.m3u"), PLAYLIST).await?;

    let server = MockServer::start_async().await;
    mock_schedule(&server).await;

    let config = api_config(&server, "out/jio_epg.xml.gz")?;
    app::run(LocalStorage::new(temp_dir.path()), config, false).await?;

    let raw = tokio::fs::read(temp_dir.path().join("out/jio_epg.xml.gz")).await?;
    assert_eq!(&raw[..2], &[0x1f, 0x8b]);

    let xml = String::from_utf8(gunzip_if_needed(raw)?)?;
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains("<title>Test Show</title>"));

    Ok(())
}

#[tokio::test]
async fn test_missing_playlist_fails_without_requests() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start_async().await;
    let schedule = mock_schedule(&server).await;

    let config = api_config(&server, "epg.xml")?;
    let err = app::run(LocalStorage::new(temp_dir.path()), config, false)
        .await
        .unwrap_err();

    assert!(matches!(err, EpgError::PlaylistNotFound { .. }));
    assert_ne!(err.exit_code(), 0);
    schedule.assert_hits_async(0).await;
    assert!(!temp_dir.path().join("epg.xml").exists());

    Ok(())
}

/// 相同輸入重跑兩次，輸出內容一致
#[tokio::test]
async fn test_repeated_runs_are_identical() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let playlist = format!(
        "{}#EXTINF:-1 tvg-id=\"202\",Second Channel\nhttps://stream.example.com/202.m3u8\n",
        PLAYLIST
    );
    tokio::fs::write(temp_dir.path().join("jstar.m3u"), playlist).await?;

    let server = MockServer::start_async().await;
    mock_schedule(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/apis/v1.3/getepg/get")
                .query_param("channel_id", "202");
            then.status(200).json_body(json!({
                "epg": [
                    {"startEpoch": 1700000000000i64, "endEpoch": 1700003600000i64, "showname": "Late"},
                    {"startEpoch": "oops", "endEpoch": 1700003600000i64, "showname": "Broken"}
                ]
            }));
        })
        .await;

    let storage = LocalStorage::new(temp_dir.path());
    app::run(storage.clone(), api_config(&server, "epg.xml")?, false).await?;
    let first = tokio::fs::read(temp_dir.path().join("epg.xml")).await?;

    let summary = app::run(storage, api_config(&server, "epg.xml")?, false).await?;
    let second = tokio::fs::read(temp_dir.path().join("epg.xml")).await?;

    assert_eq!(first, second);
    assert_eq!(summary.programmes, 2);
    assert_eq!(summary.dropped, 1);

    let xml = String::from_utf8(second)?;
    let first_channel = xml.find("channel=\"101\"").unwrap_or(usize::MAX);
    let second_channel = xml.find("channel=\"202\"").unwrap_or(0);
    assert!(first_channel < second_channel);

    Ok(())
}

#[tokio::test]
async fn test_failed_channel_does_not_abort_run() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let playlist = format!(
        "{}#EXTINF:-1 tvg-id=\"500\",Flaky Channel\nhttps://stream.example.com/500.m3u8\n",
        PLAYLIST
    );
    tokio::fs::write(temp_dir.path().join("jstar.m3u"), playlist).await?;

    let server = MockServer::start_async().await;
    mock_schedule(&server).await;
    let flaky = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/apis/v1.3/getepg/get")
                .query_param("channel_id", "500");
            then.status(503);
        })
        .await;

    let config = api_config(&server, "epg.xml")?;
    let summary = app::run(LocalStorage::new(temp_dir.path()), config, false).await?;

    flaky.assert_hits_async(2).await;
    assert_eq!(summary.channels, 2);
    assert_eq!(summary.programmes, 1);

    let xml = tokio::fs::read_to_string(temp_dir.path().join("epg.xml")).await?;
    assert!(xml.contains("<channel id=\"500\">"));
    assert!(!xml.contains("channel=\"500\""));

    Ok(())
}

#[tokio::test]
async fn test_feed_mode_end_to_end() -> Result<()> {
    let temp_dir = TempDir::new()?;
    tokio::fs::write(temp_dir.path().join("jstar.m3u"), PLAYLIST).await?;

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/epg.xml");
            then.status(200).body(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<tv>
  <channel id="101"><display-name>Test Channel</display-name></channel>
  <channel id="9"><display-name>Other</display-name></channel>
  <programme start="20240101000000 +0530" stop="20240101010000 +0530" channel="9"><title>Nope</title></programme>
</tv>"#,
            );
        })
        .await;

    let mut config = EpgConfig::default();
    config.source.mode = SourceMode::Feed;
    config.source.feed_url = server.url("/epg.xml");
    config.output.path = "filtered.xml".to_string();
    config.validate()?;

    let summary = app::run(LocalStorage::new(temp_dir.path()), config, false).await?;
    assert_eq!(summary.channels, 1);
    assert_eq!(summary.programmes, 0);

    let xml = tokio::fs::read_to_string(temp_dir.path().join("filtered.xml")).await?;
    assert!(xml.contains("<channel id=\"101\">"));
    assert!(!xml.contains("Nope"));

    Ok(())
}

#[tokio::test]
async fn test_placeholder_mode_slot_count() -> Result<()> {
    let temp_dir = TempDir::new()?;
    tokio::fs::write(temp_dir.path().join("jstar.m3u"), PLAYLIST).await?;

    let config_path = temp_dir.path().join("epg.toml");
    tokio::fs::write(
        &config_path,
        r#"
[source]
mode = "placeholder"

[render]
days = 7
slot_minutes = 30
start_date = "2024-01-01T00:00:00"

[output]
path = "epg.xml"
gzip_copy = true
"#,
    )
    .await?;
    let config = EpgConfig::from_file(&config_path)?;

    let summary = app::run(LocalStorage::new(temp_dir.path()), config, false).await?;
    assert_eq!(summary.programmes, 7 * 1440 / 30);

    let xml = tokio::fs::read_to_string(temp_dir.path().join("epg.xml")).await?;
    assert!(xml.contains(r#"<tv generator-info-name="epg-builder">"#));
    assert!(xml.contains(r#"start="20240101000000 +0530""#));
    assert!(xml.contains(r#"stop="20240108000000 +0530""#));
    assert!(temp_dir.path().join("epg.xml.gz").exists());

    Ok(())
}
