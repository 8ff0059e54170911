mod common;

use std::sync::Arc;

use async_trait::async_trait;
use spotharvest::{
    enrich::{ANALYSIS_VERSION, BatchSummary, EnrichmentPipeline, Outcome},
    management::TrackCacheManager,
    store::{BlobStore, MemoryBlobStore, StoreError},
    types::{TrackRecord, UsageRecord},
};

const SOURCE: &str = "rapidapi-track-analysis";
const USAGE_KEY: &str = "api_usage/rapidapi.json";

struct Harness {
    api: common::MockAnalysisApi,
    tracks: Arc<MemoryBlobStore>,
    usage: Arc<MemoryBlobStore>,
    pipeline: EnrichmentPipeline,
}

async fn harness(monthly_limit: u64) -> Harness {
    let api = common::MockAnalysisApi::start().await;
    let tracks = Arc::new(MemoryBlobStore::new());
    let usage = Arc::new(MemoryBlobStore::new());
    let pipeline = EnrichmentPipeline::new(
        TrackCacheManager::new(tracks.clone()),
        common::client(&api.base_url, monthly_limit, usage.clone()),
        SOURCE,
    );

    Harness {
        api,
        tracks,
        usage,
        pipeline,
    }
}

async fn calls_made(store: &MemoryBlobStore) -> u64 {
    let record: UsageRecord = serde_json::from_str(&store.get(USAGE_KEY).await.unwrap()).unwrap();
    record.calls_made
}

async fn stored_record(store: &MemoryBlobStore, track_id: &str) -> Option<TrackRecord> {
    store
        .get(&TrackCacheManager::key_for(track_id))
        .await
        .map(|json| serde_json::from_str(&json).unwrap())
}

#[tokio::test]
async fn test_new_track_is_enriched_and_stored() {
    let h = harness(5000).await;
    let track = common::track("abc");

    let outcomes = h.pipeline.process(&[track.clone()]).await;

    assert_eq!(outcomes, vec![Outcome::Enriched("abc".to_string())]);
    assert_eq!(h.api.hits(), 1);
    assert_eq!(calls_made(&h.usage).await, 1);

    let record = stored_record(&h.tracks, "abc").await.unwrap();
    assert_eq!(record.track_id, "abc");
    assert_eq!(record.name, "Song abc");
    assert_eq!(record.artist, "Artist abc");
    assert_eq!(record.uri, "spotify:track:abc");
    assert_eq!(record.source, SOURCE);
    assert_eq!(record.analysis_version, ANALYSIS_VERSION);
    assert_eq!(record.audio_features.duration_seconds, 225);
    assert_eq!(record.audio_features.loudness_db, -7);
}

#[tokio::test]
async fn test_cached_track_touches_nothing() {
    let h = harness(5000).await;
    h.tracks
        .insert(TrackCacheManager::key_for("abc"), "{\"cached\":true}")
        .await;

    let outcomes = h.pipeline.process(&[common::track("abc")]).await;

    assert_eq!(outcomes, vec![Outcome::AlreadyCached("abc".to_string())]);
    assert_eq!(h.api.hits(), 0);
    assert_eq!(h.usage.get(USAGE_KEY).await, None);
    assert_eq!(h.tracks.write_count(), 0);
    assert_eq!(
        h.tracks.get(&TrackCacheManager::key_for("abc")).await.as_deref(),
        Some("{\"cached\":true}")
    );
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let h = harness(5000).await;
    let tracks = vec![common::track("a"), common::track("b")];

    h.pipeline.process(&tracks).await;
    let writes = h.tracks.write_count();
    let outcomes = h.pipeline.process(&tracks).await;

    assert_eq!(
        outcomes,
        vec![
            Outcome::AlreadyCached("a".to_string()),
            Outcome::AlreadyCached("b".to_string())
        ]
    );
    assert_eq!(h.tracks.write_count(), writes);
    assert_eq!(h.api.hits(), 2);
    assert_eq!(calls_made(&h.usage).await, 2);
}

#[tokio::test]
async fn test_incomplete_payload_is_charged_but_not_stored() {
    let h = harness(5000).await;
    h.api.respond("abc", 200, common::payload_without("abc", "tempo"));

    let outcomes = h.pipeline.process(&[common::track("abc")]).await;

    match &outcomes[..] {
        [Outcome::NormalizationFailed { track_id, reason }] => {
            assert_eq!(track_id, "abc");
            assert!(reason.contains("tempo"), "{reason}");
        }
        other => panic!("unexpected outcomes {other:?}"),
    }
    assert!(stored_record(&h.tracks, "abc").await.is_none());
    assert_eq!(calls_made(&h.usage).await, 1);
}

#[tokio::test]
async fn test_absurd_duration_fails_only_that_track() {
    let h = harness(5000).await;
    let mut payload = common::sample_payload("a");
    payload["duration"] = serde_json::json!("307445734561825861:00");
    h.api.respond("a", 200, payload.to_string());

    let outcomes = h
        .pipeline
        .process(&[common::track("a"), common::track("b")])
        .await;

    assert!(matches!(
        &outcomes[0],
        Outcome::NormalizationFailed { track_id, .. } if track_id == "a"
    ));
    assert_eq!(outcomes[1], Outcome::Enriched("b".to_string()));
    assert!(stored_record(&h.tracks, "a").await.is_none());
}

#[tokio::test]
async fn test_quota_runs_out_mid_batch() {
    let h = harness(1).await;
    let tracks = vec![common::track("a"), common::track("b"), common::track("c")];

    let outcomes = h.pipeline.process(&tracks).await;

    assert_eq!(
        outcomes,
        vec![
            Outcome::Enriched("a".to_string()),
            Outcome::QuotaExhausted("b".to_string()),
            Outcome::QuotaExhausted("c".to_string()),
        ]
    );
    assert_eq!(h.api.hits(), 1);
    assert_eq!(calls_made(&h.usage).await, 1);
    assert!(stored_record(&h.tracks, "b").await.is_none());
}

#[tokio::test]
async fn test_exhausted_quota_still_reports_cached_tracks() {
    let h = harness(5000).await;
    h.usage
        .insert(USAGE_KEY, common::usage_json(common::MONTH, 5000))
        .await;
    h.tracks
        .insert(TrackCacheManager::key_for("old"), "{}")
        .await;

    let outcomes = h
        .pipeline
        .process(&[common::track("old"), common::track("new")])
        .await;

    assert_eq!(
        outcomes,
        vec![
            Outcome::AlreadyCached("old".to_string()),
            Outcome::QuotaExhausted("new".to_string()),
        ]
    );
    assert_eq!(h.api.hits(), 0);
}

#[tokio::test]
async fn test_rate_limit_does_not_stop_the_batch() {
    let h = harness(5000).await;
    h.api
        .respond_with_headers("a", 429, &[("retry-after", "10")], "too many");

    let outcomes = h
        .pipeline
        .process(&[common::track("a"), common::track("b")])
        .await;

    match &outcomes[0] {
        Outcome::FetchFailed {
            track_id,
            rate_limited,
            ..
        } => {
            assert_eq!(track_id, "a");
            assert!(*rate_limited);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(outcomes[1], Outcome::Enriched("b".to_string()));
    assert_eq!(calls_made(&h.usage).await, 1);
}

#[tokio::test]
async fn test_server_error_is_a_plain_fetch_failure() {
    let h = harness(5000).await;
    h.api.respond("a", 503, "unavailable");

    let outcomes = h.pipeline.process(&[common::track("a")]).await;

    assert!(matches!(
        &outcomes[0],
        Outcome::FetchFailed {
            rate_limited: false,
            ..
        }
    ));
    assert!(stored_record(&h.tracks, "a").await.is_none());
}

#[tokio::test]
async fn test_outcomes_follow_input_order_and_reach_observer() {
    let h = harness(5000).await;
    h.tracks.insert(TrackCacheManager::key_for("b"), "{}").await;
    let tracks = vec![common::track("c"), common::track("b"), common::track("a")];

    let mut seen = Vec::new();
    let outcomes = h
        .pipeline
        .process_with(&tracks, |track, outcome| {
            seen.push((track.uri.clone(), outcome.track_id().to_string()));
        })
        .await;

    let ids: Vec<&str> = outcomes.iter().map(Outcome::track_id).collect();
    assert_eq!(ids, vec!["c", "b", "a"]);
    assert_eq!(
        seen,
        vec![
            ("spotify:track:c".to_string(), "c".to_string()),
            ("spotify:track:b".to_string(), "b".to_string()),
            ("spotify:track:a".to_string(), "a".to_string()),
        ]
    );

    let summary = BatchSummary::from_outcomes(&outcomes);
    assert_eq!(summary.enriched, 2);
    assert_eq!(summary.already_cached, 1);
    assert_eq!(summary.failed(), 0);
}

#[tokio::test]
async fn test_uri_without_id_is_rejected() {
    let h = harness(5000).await;
    let mut track = common::track("x");
    track.uri = "spotify:track:".to_string();

    let outcomes = h.pipeline.process(&[track]).await;

    assert_eq!(
        outcomes,
        vec![Outcome::InvalidUri("spotify:track:".to_string())]
    );
    assert_eq!(h.api.hits(), 0);
}

#[tokio::test]
async fn test_id_with_slash_is_rejected() {
    let h = harness(5000).await;
    let mut track = common::track("x");
    track.uri = "spotify:track:a/b".to_string();

    let outcomes = h.pipeline.process(&[track, common::track("c")]).await;

    assert_eq!(
        outcomes,
        vec![
            Outcome::InvalidUri("spotify:track:a/b".to_string()),
            Outcome::Enriched("c".to_string()),
        ]
    );
    assert_eq!(h.api.hits(), 1);
    assert_eq!(h.tracks.get("tracks/a/b.json").await, None);
    assert_eq!(
        TrackCacheManager::new(h.tracks.clone()).track_ids().await.unwrap(),
        vec!["c".to_string()]
    );
}

#[tokio::test]
async fn test_bare_id_is_accepted() {
    let h = harness(5000).await;
    let mut track = common::track("abc");
    track.uri = "abc".to_string();

    let outcomes = h.pipeline.process(&[track]).await;

    assert_eq!(outcomes, vec![Outcome::Enriched("abc".to_string())]);
}

#[tokio::test]
async fn test_empty_batch_does_nothing() {
    let h = harness(5000).await;

    assert!(h.pipeline.process(&[]).await.is_empty());
    assert_eq!(h.api.hits(), 0);
    assert_eq!(h.usage.write_count(), 0);
}

/// Track store whose writes always fail.
struct ReadOnlyStore(MemoryBlobStore);

#[async_trait]
impl BlobStore for ReadOnlyStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.0.exists(key).await
    }

    async fn read_text(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.0.read_text(key).await
    }

    async fn write_text(&self, key: &str, _body: &str) -> Result<(), StoreError> {
        Err(read_only(key))
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        _expected: Option<&str>,
        _body: &str,
    ) -> Result<bool, StoreError> {
        Err(read_only(key))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.0.list(prefix).await
    }
}

fn read_only(key: &str) -> StoreError {
    StoreError::Io {
        key: key.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
    }
}

#[tokio::test]
async fn test_storage_failure_skips_track_and_continues() {
    let api = common::MockAnalysisApi::start().await;
    let usage = Arc::new(MemoryBlobStore::new());
    let pipeline = EnrichmentPipeline::new(
        TrackCacheManager::new(Arc::new(ReadOnlyStore(MemoryBlobStore::new()))),
        common::client(&api.base_url, 5000, usage.clone()),
        SOURCE,
    );

    let outcomes = pipeline
        .process(&[common::track("a"), common::track("b")])
        .await;

    assert_eq!(outcomes.len(), 2);
    for (outcome, id) in outcomes.iter().zip(["a", "b"]) {
        assert!(
            matches!(outcome, Outcome::StorageFailed { track_id, .. } if track_id == id),
            "{outcome:?}"
        );
    }
    assert_eq!(calls_made(&usage).await, 2);
}
