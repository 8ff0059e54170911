use std::fmt;

use crate::{
    enrich::{
        metrics::{MetricsClient, MetricsError},
        normalize::normalize,
    },
    management::TrackCacheManager,
    types::{TrackDescriptor, TrackRecord},
};

pub const ANALYSIS_VERSION: &str = "v1";

/// What happened to one track during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Enriched(String),
    AlreadyCached(String),
    QuotaExhausted(String),
    FetchFailed {
        track_id: String,
        reason: String,
        rate_limited: bool,
    },
    NormalizationFailed {
        track_id: String,
        reason: String,
    },
    StorageFailed {
        track_id: String,
        reason: String,
    },
    InvalidUri(String),
}

impl Outcome {
    /// Track id, or the offending URI for [`Outcome::InvalidUri`].
    pub fn track_id(&self) -> &str {
        match self {
            Outcome::Enriched(id)
            | Outcome::AlreadyCached(id)
            | Outcome::QuotaExhausted(id)
            | Outcome::InvalidUri(id) => id,
            Outcome::FetchFailed { track_id, .. }
            | Outcome::NormalizationFailed { track_id, .. }
            | Outcome::StorageFailed { track_id, .. } => track_id,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Enriched(_) => write!(f, "analyzed and stored"),
            Outcome::AlreadyCached(_) => write!(f, "already processed, skipping"),
            Outcome::QuotaExhausted(_) => write!(f, "monthly API limit reached, using cached data only"),
            Outcome::FetchFailed {
                rate_limited: true, ..
            } => write!(f, "analysis API is rate limiting, try again later"),
            Outcome::FetchFailed { reason, .. } => write!(f, "analysis request failed: {reason}"),
            Outcome::NormalizationFailed { reason, .. } => {
                write!(f, "analysis could not be normalized: {reason}")
            }
            Outcome::StorageFailed { reason, .. } => write!(f, "storage error: {reason}"),
            Outcome::InvalidUri(uri) => write!(f, "no usable track id in uri '{uri}'"),
        }
    }
}

/// Per-kind outcome counts for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub enriched: usize,
    pub already_cached: usize,
    pub quota_exhausted: usize,
    pub fetch_failed: usize,
    pub normalization_failed: usize,
    pub storage_failed: usize,
    pub invalid: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut s, outcome| {
            match outcome {
                Outcome::Enriched(_) => s.enriched += 1,
                Outcome::AlreadyCached(_) => s.already_cached += 1,
                Outcome::QuotaExhausted(_) => s.quota_exhausted += 1,
                Outcome::FetchFailed { .. } => s.fetch_failed += 1,
                Outcome::NormalizationFailed { .. } => s.normalization_failed += 1,
                Outcome::StorageFailed { .. } => s.storage_failed += 1,
                Outcome::InvalidUri(_) => s.invalid += 1,
            }
            s
        })
    }

    pub fn total(&self) -> usize {
        self.enriched
            + self.already_cached
            + self.quota_exhausted
            + self.fetch_failed
            + self.normalization_failed
            + self.storage_failed
            + self.invalid
    }

    pub fn failed(&self) -> usize {
        self.fetch_failed + self.normalization_failed + self.storage_failed + self.invalid
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tracks: {} enriched, {} already cached, {} over quota, {} failed",
            self.total(),
            self.enriched,
            self.already_cached,
            self.quota_exhausted,
            self.failed()
        )
    }
}

/// Final `:`-separated segment of a streaming URI.
pub fn track_id_from_uri(uri: &str) -> &str {
    match uri.rfind(':') {
        Some(pos) => &uri[pos + 1..],
        None => uri,
    }
}

/// Cache check, quota-gated fetch, normalization and write for each track,
/// strictly one track after the other.
pub struct EnrichmentPipeline {
    cache: TrackCacheManager,
    client: MetricsClient,
    source: String,
}

impl EnrichmentPipeline {
    pub fn new(cache: TrackCacheManager, client: MetricsClient, source: impl Into<String>) -> Self {
        Self {
            cache,
            client,
            source: source.into(),
        }
    }

    pub fn client(&self) -> &MetricsClient {
        &self.client
    }

    pub async fn process(&self, tracks: &[TrackDescriptor]) -> Vec<Outcome> {
        self.process_with(tracks, |_, _| {}).await
    }

    /// Like [`EnrichmentPipeline::process`], calling `observer` as soon as
    /// each track's outcome is known.
    pub async fn process_with<F>(&self, tracks: &[TrackDescriptor], mut observer: F) -> Vec<Outcome>
    where
        F: FnMut(&TrackDescriptor, &Outcome),
    {
        let mut outcomes = Vec::with_capacity(tracks.len());
        for track in tracks {
            let outcome = self.process_track(track).await;
            observer(track, &outcome);
            outcomes.push(outcome);
        }
        outcomes
    }

    pub async fn process_track(&self, track: &TrackDescriptor) -> Outcome {
        let track_id = track_id_from_uri(&track.uri);
        // The id becomes a single blob key segment.
        if track_id.is_empty() || track_id.contains('/') {
            return Outcome::InvalidUri(track.uri.clone());
        }
        let track_id = track_id.to_string();

        match self.cache.contains(&track_id).await {
            Ok(true) => return Outcome::AlreadyCached(track_id),
            Ok(false) => {}
            Err(e) => return storage_failed(track_id, e),
        }

        let raw = match self.client.fetch(&track_id).await {
            Ok(raw) => raw,
            Err(MetricsError::QuotaExhausted { .. }) => return Outcome::QuotaExhausted(track_id),
            Err(MetricsError::Fetch(e)) => {
                return Outcome::FetchFailed {
                    rate_limited: e.is_rate_limited(),
                    reason: e.kind.to_string(),
                    track_id,
                };
            }
            Err(MetricsError::Ledger(e)) => return storage_failed(track_id, e),
        };

        let audio_features = match normalize(&raw) {
            Ok(features) => features,
            Err(e) => {
                return Outcome::NormalizationFailed {
                    track_id,
                    reason: e.to_string(),
                };
            }
        };

        let record = TrackRecord {
            track_id: track_id.clone(),
            name: track.name.clone(),
            artist: track.artist.clone(),
            uri: track.uri.clone(),
            audio_features,
            source: self.source.clone(),
            analysis_version: ANALYSIS_VERSION.to_string(),
        };

        match self.cache.insert_new(&record).await {
            Ok(true) => Outcome::Enriched(track_id),
            Ok(false) => Outcome::AlreadyCached(track_id),
            Err(e) => storage_failed(track_id, e),
        }
    }
}

fn storage_failed(track_id: String, error: impl fmt::Display) -> Outcome {
    Outcome::StorageFailed {
        track_id,
        reason: error.to_string(),
    }
}
