use crate::config::FetchSettings;
use crate::core::retry::{Attempt, RetryOutcome, RetryPolicy, StatusClass};
use crate::domain::model::{Channel, DispatchReport, FetchOutcome, FetchTask, SchedulePayload};
use crate::utils::error::{EpgError, Result};
use crate::utils::validation::MAX_WORKERS;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Shared HTTP client with the configured headers and request timeout.
pub fn build_client(settings: &FetchSettings) -> Result<Client> {
    let mut headers = HeaderMap::new();
    for (name, value) in &settings.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            EpgError::InvalidConfigValueError {
                field: "fetch.headers".to_string(),
                value: name.clone(),
                reason: e.to_string(),
            }
        })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|e| EpgError::InvalidConfigValueError {
                field: format!("fetch.headers.{}", name),
                value: value.clone(),
                reason: e.to_string(),
            })?;
        headers.insert(header_name, header_value);
    }

    let client = Client::builder()
        .default_headers(headers)
        .timeout(settings.timeout())
        .build()?;
    Ok(client)
}

/// Fans schedule requests out over a bounded pool and collects them as they complete.
#[derive(Clone)]
pub struct FetchDispatcher {
    client: Client,
    endpoint: Arc<str>,
    policy: Arc<RetryPolicy>,
    workers: usize,
}

impl FetchDispatcher {
    pub fn new(endpoint: &str, settings: &FetchSettings) -> Result<Self> {
        Ok(Self {
            client: build_client(settings)?,
            endpoint: Arc::from(endpoint),
            policy: Arc::new(settings.retry_policy()),
            workers: settings.workers.clamp(1, MAX_WORKERS),
        })
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    pub async fn dispatch(&self, channels: &[Channel], offsets: &[i32]) -> DispatchReport {
        let tasks: Vec<FetchTask> = offsets
            .iter()
            .flat_map(|&offset| {
                channels.iter().map(move |channel| FetchTask {
                    channel_id: channel.id.clone(),
                    offset,
                })
            })
            .collect();

        let total = tasks.len();
        tracing::info!(
            "📡 Fetching {} schedules ({} channels × {} offsets, {} workers)",
            total,
            channels.len(),
            offsets.len(),
            self.workers
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut set = JoinSet::new();

        for task in tasks {
            let dispatcher = self.clone();
            let semaphore = Arc::clone(&semaphore);
            set.spawn(async move {
                let _permit = semaphore.acquire().await.ok();
                let outcome = dispatcher.fetch(&task).await;
                (task, outcome)
            });
        }

        let mut report = DispatchReport::default();
        let step = (total / 10).max(1);
        let mut done = 0;

        while let Some(joined) = set.join_next().await {
            done += 1;
            match joined {
                Ok((task, outcome)) => {
                    log_outcome(&task, &outcome);
                    report.record(outcome);
                }
                Err(e) => {
                    tracing::error!("❌ fetch worker aborted: {}", e);
                    report.record(FetchOutcome::Failed {
                        reason: e.to_string(),
                        attempts: 0,
                    });
                }
            }

            if done % step == 0 || done == total {
                tracing::info!("📡 Progress: {}/{}", done, total);
            } else {
                tracing::debug!("📡 Progress: {}/{}", done, total);
            }
        }

        tracing::info!(
            "📦 Fetch finished: {} ok, {} empty, {} skipped, {} failed",
            report.fetched,
            report.empty,
            report.skipped,
            report.failed
        );
        report
    }

    /// One task, retried according to the policy.
    pub async fn fetch(&self, task: &FetchTask) -> FetchOutcome {
        let label = task.to_string();
        match self.policy.run(&label, |_| self.attempt(task)).await {
            RetryOutcome::Done {
                value: Some(entries),
                ..
            } => FetchOutcome::Fetched(SchedulePayload {
                channel_id: task.channel_id.clone(),
                offset: task.offset,
                entries,
            }),
            RetryOutcome::Done { value: None, .. } => FetchOutcome::Empty,
            RetryOutcome::Skipped { status } => FetchOutcome::Skipped { status },
            RetryOutcome::Failed { reason, attempts } => FetchOutcome::Failed { reason, attempts },
        }
    }

    async fn attempt(&self, task: &FetchTask) -> Attempt<Option<Vec<Value>>> {
        let response = match self
            .client
            .get(&*self.endpoint)
            .query(&[
                ("channel_id", task.channel_id.clone()),
                ("offset", task.offset.to_string()),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Attempt::Retry(format!("request error: {}", e)),
        };

        let status = response.status().as_u16();
        match self.policy.classify(status) {
            StatusClass::Success => {}
            StatusClass::Skip => return Attempt::Skip(status),
            StatusClass::Retryable => return Attempt::Retry(format!("HTTP {}", status)),
            StatusClass::Fatal => return Attempt::Fail(format!("HTTP {}", status)),
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return Attempt::Retry(format!("body read error: {}", e)),
        };

        Attempt::Done(schedule_list(&body))
    }
}

/// The `epg` array of a response body, if the body is JSON and has one.
fn schedule_list(body: &[u8]) -> Option<Vec<Value>> {
    let mut value: Value = serde_json::from_slice(body).ok()?;
    match value.get_mut("epg").map(Value::take) {
        Some(Value::Array(items)) => Some(items),
        _ => None,
    }
}

fn log_outcome(task: &FetchTask, outcome: &FetchOutcome) {
    match outcome {
        FetchOutcome::Fetched(payload) => {
            tracing::debug!("✅ {} -> {} entries", task, payload.entries.len())
        }
        FetchOutcome::Empty => tracing::warn!("⚠️ {} -> response without schedule list", task),
        FetchOutcome::Skipped { status } => tracing::debug!("⏭️ {} -> {} (no data)", task, status),
        FetchOutcome::Failed { reason, attempts } => {
            tracing::warn!("❌ {} -> {} after {} attempt(s)", task, reason, attempts)
        }
    }
}
