//! Drives a submitted ModelScope task to a terminal state.
//!
//! The poller queries the task, backs off exponentially while it is still
//! queued or running, and stops on success, failure, an unknown status, the
//! attempt ceiling, or caller cancellation.

use crate::{
    config::PollConfig,
    error::{RelayError, Result},
    models::{TaskSnapshot, TaskStatus},
};
use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const TASK_TYPE_HEADER: &str = "X-ModelScope-Task-Type";
pub const TASK_TYPE_IMAGE_GENERATION: &str = "image_generation";

/// Source of task status snapshots. Implementations carry their own
/// credentials and endpoint.
#[async_trait]
pub trait TaskStatusSource: Send + Sync {
    async fn query(&self, task_id: &str) -> Result<TaskSnapshot>;
}

/// Queries `GET {base}/v1/tasks/{task_id}` over HTTP.
#[derive(Clone)]
pub struct HttpTaskStatusSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpTaskStatusSource {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", self.api_key)
            .parse()
            .map_err(|_| RelayError::ConfigError("API key is not a valid header value".into()))?;
        headers.insert(reqwest::header::AUTHORIZATION, bearer);
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            TASK_TYPE_HEADER,
            reqwest::header::HeaderValue::from_static(TASK_TYPE_IMAGE_GENERATION),
        );
        Ok(headers)
    }
}

pub fn task_url(base_url: &str, task_id: &str) -> String {
    format!("{}/v1/tasks/{}", base_url.trim_end_matches('/'), task_id)
}

#[async_trait]
impl TaskStatusSource for HttpTaskStatusSource {
    async fn query(&self, task_id: &str) -> Result<TaskSnapshot> {
        let response = self
            .client
            .get(task_url(&self.base_url, task_id))
            .headers(self.build_headers()?)
            .send()
            .await
            .map_err(|e| {
                RelayError::TransportError(format!("failed to query task status: {}", e))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| {
                RelayError::TransportError(format!("failed to read query response: {}", e))
            })?;

        if status != reqwest::StatusCode::OK {
            return Err(RelayError::QueryStatus {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            RelayError::ResponseError(format!("failed to decode query response: {}", e))
        })
    }
}

pub struct TaskPoller<S> {
    source: S,
    config: PollConfig,
}

impl<S: TaskStatusSource> TaskPoller<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, PollConfig::default())
    }

    pub fn with_config(source: S, config: PollConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll `task_id` until it succeeds. Every non-success terminal outcome is
    /// returned as an error.
    pub async fn poll(&self, task_id: &str, cancel: &CancellationToken) -> Result<TaskSnapshot> {
        let mut interval = self.config.initial_interval;

        for attempt in 1..=self.config.max_attempts {
            if cancel.is_cancelled() {
                log::info!("Polling for task {} cancelled", task_id);
                return Err(RelayError::Cancelled);
            }

            let snapshot = self.source.query(task_id).await?;
            if cancel.is_cancelled() {
                log::info!("Discarding status of task {} after cancellation", task_id);
                return Err(RelayError::Cancelled);
            }
            log::debug!(
                "Task {} is {} (attempt {}/{})",
                task_id,
                snapshot.task_status.as_str(),
                attempt,
                self.config.max_attempts
            );

            match snapshot.task_status {
                TaskStatus::Succeeded => return Ok(snapshot),
                TaskStatus::Failed => {
                    let message = snapshot
                        .message
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| "upstream reported failure without a message".into());
                    log::warn!("❌ Task {} failed: {}", task_id, message);
                    return Err(RelayError::TaskFailed(message));
                }
                TaskStatus::Pending | TaskStatus::Running | TaskStatus::Processing => {
                    log::debug!("Waiting {:?} before polling task {} again", interval, task_id);
                    cancellable_sleep(interval, cancel).await?;
                    interval = next_interval(interval, self.config.max_interval);
                }
                TaskStatus::Unknown(ref raw) => {
                    log::error!("Task {} reported unknown status {:?}", task_id, raw);
                    return Err(RelayError::UnknownTaskStatus(raw.clone()));
                }
            }
        }

        log::warn!(
            "⚠️  Task {} still running after {} polls",
            task_id,
            self.config.max_attempts
        );
        Err(RelayError::PollingTimeout {
            attempts: self.config.max_attempts,
        })
    }
}

fn next_interval(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max)
}

async fn cancellable_sleep(duration: Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        _ = cancel.cancelled() => Err(RelayError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
