//! HTTP source fetcher for the campus API.

use super::{extract_records, SourceFetcher};
use crate::config::SourcesConfig;
use crate::error::SourceFailure;
use crate::models::{RawRecord, SourceKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Delay unit between attempts; attempt `n` waits `n * BACKOFF_STEP`.
const BACKOFF_STEP: Duration = Duration::from_millis(500);

/// Fetcher issuing one GET per source against the campus API.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
    users_endpoint: String,
    complaints_endpoint: String,
    feedback_endpoint: String,
    retries: usize,
}

impl HttpFetcher {
    /// Build a fetcher from the `[sources]` settings.
    pub fn from_config(config: &SourcesConfig) -> Result<Self> {
        let base_url = config
            .api_url
            .clone()
            .context("No API URL configured for the HTTP fetcher")?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            users_endpoint: config.users_endpoint.clone(),
            complaints_endpoint: config.complaints_endpoint.clone(),
            feedback_endpoint: config.feedback_endpoint.clone(),
            retries: config.retries,
        })
    }

    /// Full URL for a source.
    pub fn url_for(&self, kind: SourceKind) -> String {
        let endpoint = match kind {
            SourceKind::Users => &self.users_endpoint,
            SourceKind::Complaints => &self.complaints_endpoint,
            SourceKind::Feedback => &self.feedback_endpoint,
        };
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// One GET. Server errors and transport errors are retryable; client errors are not.
    async fn attempt(&self, kind: SourceKind, url: &str) -> Result<Value, (SourceFailure, bool)> {
        let response = self.client.get(url).send().await.map_err(|e| {
            let failure = SourceFailure::Unreachable {
                source_kind: kind,
                message: e.to_string(),
            };
            (failure, true)
        })?;

        let status = response.status();
        if !status.is_success() {
            let failure = SourceFailure::Status {
                source_kind: kind,
                status: status.as_u16(),
            };
            return Err((failure, status.is_server_error()));
        }

        response.json::<Value>().await.map_err(|e| {
            let failure = SourceFailure::Payload {
                source_kind: kind,
                message: e.to_string(),
            };
            (failure, false)
        })
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, kind: SourceKind) -> Result<Vec<RawRecord>, SourceFailure> {
        let url = self.url_for(kind);
        let mut attempt = 0;

        loop {
            debug!("GET {} (attempt {})", url, attempt + 1);

            match self.attempt(kind, &url).await {
                Ok(document) => return extract_records(document, kind),
                Err((failure, retryable)) => {
                    if !retryable || attempt >= self.retries {
                        return Err(failure);
                    }
                    attempt += 1;
                    warn!("{}; retrying ({}/{})", failure, attempt, self.retries);
                    tokio::time::sleep(BACKOFF_STEP * attempt as u32).await;
                }
            }
        }
    }
}
