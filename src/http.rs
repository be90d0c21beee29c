//! HTTP client for the Strava v3 API.
//!
//! This module fetches athlete records and activity streams:
//! - Connection pooling through a shared `reqwest::Client`
//! - Bearer token authentication
//! - Concurrent stream fetching bounded by a semaphore
//!
//! Every retrieval returns `None` on failure (bad status, transport error,
//! malformed body) after logging the reason. There is no retry policy and no
//! OAuth token refresh.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use reqwest::Client;
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::activity::{ActivityStreams, StreamType};
use crate::error::{MetricsError, Result};

/// Production API root.
pub const STRAVA_API_BASE: &str = "https://www.strava.com/api/v3";

// Parallel requests when fetching many activities
const MAX_CONCURRENCY: usize = 8;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Strava API client for a single access token.
#[derive(Debug, Clone)]
pub struct StravaClient {
    client: Client,
    base_url: String,
    auth_header: String,
}

impl StravaClient {
    /// Create a client against the production API.
    pub fn new(access_token: &str) -> Result<Self> {
        Self::with_base_url(access_token, STRAVA_API_BASE)
    }

    /// Create a client against another API root (tests, proxies).
    pub fn with_base_url(access_token: &str, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(MAX_CONCURRENCY)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MetricsError::HttpError {
                message: format!("Failed to create HTTP client: {}", e),
                status_code: None,
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: authorization_header(access_token),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current athlete record (`GET /athlete`).
    pub async fn retrieve_athlete(&self) -> Option<Value> {
        self.get_json("/athlete").await
    }

    /// Heart rate and power zones of the current athlete (`GET /athlete/zones`).
    pub async fn retrieve_athlete_zones(&self) -> Option<Value> {
        self.get_json("/athlete/zones").await
    }

    /// Activity summary (`GET /activities/{id}`).
    pub async fn retrieve_activity(&self, activity_id: &str) -> Option<Value> {
        self.get_json(&format!("/activities/{}", activity_id)).await
    }

    /// Streams of one activity (`GET /activities/{id}/streams/{types}`).
    pub async fn retrieve_streams(
        &self,
        activity_id: &str,
        types: &[StreamType],
    ) -> Option<ActivityStreams> {
        let path = streams_path(activity_id, types);
        let body = self.get_text(&path).await?;
        match ActivityStreams::from_json(activity_id, &body) {
            Ok(streams) => Some(streams),
            Err(e) => {
                warn!("[StravaClient] Bad streams body for {}: {}", activity_id, e);
                None
            }
        }
    }

    /// Streams of many activities, fetched concurrently.
    ///
    /// Results come back in the order of `activity_ids`.
    pub async fn retrieve_streams_many(
        &self,
        activity_ids: Vec<String>,
        types: &[StreamType],
    ) -> Vec<(String, Option<ActivityStreams>)> {
        let total = activity_ids.len();
        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENCY));
        let types: Arc<[StreamType]> = types.into();

        info!(
            "[StravaClient] Fetching streams for {} activities with {} concurrent workers",
            total, MAX_CONCURRENCY
        );
        let start = Instant::now();

        let tasks: Vec<_> = activity_ids
            .iter()
            .cloned()
            .map(|id| {
                let client = self.clone();
                let semaphore = Arc::clone(&semaphore);
                let types = Arc::clone(&types);

                tokio::spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            warn!("[StravaClient] Semaphore closed: {}", e);
                            return None;
                        }
                    };
                    client.retrieve_streams(&id, &types).await
                })
            })
            .collect();

        let joined = futures::future::join_all(tasks).await;
        let results: Vec<(String, Option<ActivityStreams>)> = activity_ids
            .into_iter()
            .zip(joined)
            .map(|(id, outcome)| match outcome {
                Ok(streams) => (id, streams),
                Err(e) => {
                    warn!("[StravaClient] Task join error for {}: {}", id, e);
                    (id, None)
                }
            })
            .collect();

        let success_count = results.iter().filter(|(_, s)| s.is_some()).count();
        info!(
            "[StravaClient] Completed: {}/{} successful in {:.2}s",
            success_count,
            total,
            start.elapsed().as_secs_f64()
        );
        results
    }

    async fn get_json(&self, path: &str) -> Option<Value> {
        let body = self.get_text(path).await?;
        match serde_json::from_str(&body) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("[StravaClient] Parse error for {}: {}", path, e);
                None
            }
        }
    }

    async fn get_text(&self, path: &str) -> Option<String> {
        let url = format!("{}{}", self.base_url, path);
        debug!("[StravaClient] GET {}", url);

        let response = match self
            .client
            .get(&url)
            .header("Authorization", &self.auth_header)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!("[StravaClient] Request error for {}: {}", path, e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("[StravaClient] HTTP {} for {}", status, path);
            return None;
        }

        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!("[StravaClient] Failed to read body for {}: {}", path, e);
                None
            }
        }
    }
}

/// `Authorization` header value for an access token.
pub fn authorization_header(access_token: &str) -> String {
    format!("Bearer {}", access_token)
}

fn streams_path(activity_id: &str, types: &[StreamType]) -> String {
    let names: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
    format!("/activities/{}/streams/{}", activity_id, names.join(","))
}
