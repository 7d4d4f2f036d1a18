use crate::core::output::gunzip_if_needed;
use crate::core::retry::{Attempt, RetryOutcome, RetryPolicy, StatusClass};
use crate::utils::error::{EpgError, Result};
use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::{Reader, Writer};
use reqwest::Client;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct FilteredFeed {
    pub xml: Vec<u8>,
    pub channels: usize,
    pub programmes: usize,
    pub discarded: usize,
}

/// Downloads the feed, retrying transient failures; gzip bodies are decompressed.
pub async fn download_feed(client: &Client, url: &str, policy: &RetryPolicy) -> Result<Vec<u8>> {
    tracing::info!("⬇️ Downloading guide feed from {}", url);

    let outcome = policy
        .run("feed", |_| async move {
            let response = match client.get(url).send().await {
                Ok(response) => response,
                Err(e) => return Attempt::Retry(format!("request error: {}", e)),
            };

            let status = response.status().as_u16();
            match policy.classify(status) {
                StatusClass::Success => {}
                StatusClass::Retryable => return Attempt::Retry(format!("HTTP {}", status)),
                StatusClass::Skip | StatusClass::Fatal => {
                    return Attempt::Fail(format!("HTTP {}", status))
                }
            }

            match response.bytes().await {
                Ok(body) => Attempt::Done(body.to_vec()),
                Err(e) => Attempt::Retry(format!("body read error: {}", e)),
            }
        })
        .await;

    match outcome {
        RetryOutcome::Done { value, attempts } => {
            tracing::debug!("Feed downloaded: {} bytes in {} attempt(s)", value.len(), attempts);
            gunzip_if_needed(value)
        }
        RetryOutcome::Skipped { status } => Err(EpgError::FeedError {
            message: format!("HTTP {}", status),
        }),
        RetryOutcome::Failed { reason, attempts } => Err(EpgError::FeedError {
            message: format!("{} after {} attempt(s)", reason, attempts),
        }),
    }
}

enum Kept {
    Channel,
    Programme,
}

/// Copies the `<tv>` root and only those direct children whose channel
/// identifier is in `channel_ids`.
pub fn filter_feed(xml: &[u8], channel_ids: &HashSet<String>, pretty: bool) -> Result<FilteredFeed> {
    let mut reader = Reader::from_reader(xml);

    let mut writer = if pretty {
        Writer::new_with_indent(Vec::new(), b' ', 2)
    } else {
        Writer::new(Vec::new())
    };
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut result = FilteredFeed::default();
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut keep_until: Option<usize> = None;
    let mut saw_root = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => {
                depth += 1;
                if depth == 1 {
                    check_root(&e)?;
                    saw_root = true;
                    writer.write_event(Event::Start(e))?;
                } else if keep_until.is_some() {
                    writer.write_event(Event::Start(e))?;
                } else if depth == 2 {
                    match wanted(&e, channel_ids) {
                        Some(kind) => {
                            result.count(kind);
                            keep_until = Some(depth);
                            writer.write_event(Event::Start(e))?;
                        }
                        None => result.discarded += 1,
                    }
                }
            }
            Event::End(e) => {
                if depth == 1 {
                    writer.write_event(Event::End(e))?;
                } else if let Some(level) = keep_until {
                    writer.write_event(Event::End(e))?;
                    if level == depth {
                        keep_until = None;
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Empty(e) => {
                if depth == 0 {
                    // <tv/>: a valid feed without entries
                    check_root(&e)?;
                    saw_root = true;
                    writer.write_event(Event::Empty(e))?;
                } else if keep_until.is_some() {
                    writer.write_event(Event::Empty(e))?;
                } else if depth == 1 {
                    match wanted(&e, channel_ids) {
                        Some(kind) => {
                            result.count(kind);
                            writer.write_event(Event::Empty(e))?;
                        }
                        None => result.discarded += 1,
                    }
                }
            }
            Event::Decl(_) | Event::DocType(_) | Event::PI(_) => {}
            // 保留的子樹原樣輸出，其餘空白由 writer 重新縮排
            other => {
                if keep_until.is_some() {
                    writer.write_event(other)?;
                }
            }
        }
        buf.clear();
    }

    if !saw_root {
        return Err(EpgError::FeedError {
            message: "feed contains no <tv> element".to_string(),
        });
    }

    let mut xml = writer.into_inner();
    xml.push(b'\n');
    result.xml = xml;
    Ok(result)
}

impl FilteredFeed {
    fn count(&mut self, kind: Kept) {
        match kind {
            Kept::Channel => self.channels += 1,
            Kept::Programme => self.programmes += 1,
        }
    }
}

fn check_root(element: &BytesStart) -> Result<()> {
    if element.name().as_ref() == b"tv" {
        return Ok(());
    }
    Err(EpgError::FeedError {
        message: format!(
            "unexpected root element <{}>",
            String::from_utf8_lossy(element.name().as_ref())
        ),
    })
}

fn wanted(element: &BytesStart, channel_ids: &HashSet<String>) -> Option<Kept> {
    let (kind, key) = match element.name().as_ref() {
        b"channel" => (Kept::Channel, b"id".as_slice()),
        b"programme" => (Kept::Programme, b"channel".as_slice()),
        _ => return None,
    };

    let value = attribute(element, key)?;
    channel_ids.contains(&value).then_some(kind)
}

fn attribute(element: &BytesStart, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| {
            let raw = String::from_utf8_lossy(&attr.value).into_owned();
            quick_xml::escape::unescape(&raw)
                .map(|value| value.into_owned())
                .unwrap_or(raw)
        })
}
