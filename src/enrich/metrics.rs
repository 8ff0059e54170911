use std::time::Duration;

use reqwest::{Client, StatusCode, header::RETRY_AFTER};
use thiserror::Error;
use tokio::time::sleep;

use crate::{
    config::EnrichConfig,
    enrich::ledger::{LedgerError, UsageLedger},
    types::RawAnalysis,
};

#[derive(Debug, Error)]
#[error("analysis request for track {track_id} failed: {kind}")]
pub struct FetchError {
    pub track_id: String,
    #[source]
    pub kind: FetchErrorKind,
}

#[derive(Debug, Error)]
pub enum FetchErrorKind {
    #[error("rate limited by the analysis API")]
    RateLimited { retry_after: Option<u64> },

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("malformed response body: {0}")]
    Decode(#[source] serde_json::Error),
}

impl FetchError {
    fn new(track_id: &str, kind: FetchErrorKind) -> Self {
        Self {
            track_id: track_id.to_string(),
            kind,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self.kind, FetchErrorKind::RateLimited { .. })
    }
}

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("monthly limit of {limit} calls reached for {month} ({calls_made} made)")]
    QuotaExhausted {
        month: String,
        calls_made: u64,
        limit: u64,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Client for the track-analysis endpoint.
///
/// Every request is gated by the usage ledger, preceded by a fixed delay and
/// charged to the ledger once a 2xx response has been received in full.
pub struct MetricsClient {
    http: Client,
    api_url: String,
    api_key: String,
    api_host: String,
    throttle: Duration,
    monthly_limit: u64,
    ledger: UsageLedger,
}

impl MetricsClient {
    pub fn new(config: &EnrichConfig, ledger: UsageLedger) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_host: config.api_host.clone(),
            throttle: config.throttle,
            monthly_limit: config.monthly_limit,
            ledger,
        })
    }

    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    pub fn monthly_limit(&self) -> u64 {
        self.monthly_limit
    }

    pub fn endpoint(&self, track_id: &str) -> String {
        format!("{}/{}", self.api_url, track_id)
    }

    /// Fetches the raw analysis for one track.
    ///
    /// Nothing is sent when the month's quota is used up. Failed requests
    /// leave the ledger untouched.
    pub async fn fetch(&self, track_id: &str) -> Result<RawAnalysis, MetricsError> {
        let usage = self.ledger.read().await?;
        if !UsageLedger::has_quota(&usage, self.monthly_limit) {
            return Err(MetricsError::QuotaExhausted {
                month: usage.month,
                calls_made: usage.calls_made,
                limit: self.monthly_limit,
            });
        }

        if !self.throttle.is_zero() {
            sleep(self.throttle).await;
        }

        let body = self.request(track_id).await?;
        self.ledger.charge().await?;

        serde_json::from_slice::<RawAnalysis>(&body)
            .map_err(|e| FetchError::new(track_id, FetchErrorKind::Decode(e)).into())
    }

    async fn request(&self, track_id: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .http
            .get(self.endpoint(track_id))
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.api_host)
            .send()
            .await
            .map_err(|e| FetchError::new(track_id, FetchErrorKind::Transport(e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            return Err(FetchError::new(
                track_id,
                FetchErrorKind::RateLimited { retry_after },
            ));
        }
        if !status.is_success() {
            return Err(FetchError::new(
                track_id,
                FetchErrorKind::Status(status.as_u16()),
            ));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::new(track_id, FetchErrorKind::Transport(e)))
    }
}
