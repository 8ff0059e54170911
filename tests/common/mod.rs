#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use spotharvest::{
    config::EnrichConfig,
    enrich::{Clock, MetricsClient, UsageLedger},
    store::BlobStore,
    types::{RawAnalysis, TrackDescriptor},
};

pub const API_KEY: &str = "test-key";
pub const MONTH: &str = "2024-02";

/// Track id for which the mock answers only after a long delay.
pub const SLOW_TRACK: &str = "slowtrack";

/// Clock pinned to one billing month.
pub struct FixedClock(pub String);

impl FixedClock {
    pub fn new(month: impl Into<String>) -> Self {
        Self(month.into())
    }
}

impl Clock for FixedClock {
    fn current_month(&self) -> String {
        self.0.clone()
    }
}

#[derive(Clone, Default)]
struct MockState {
    responses: Arc<Mutex<HashMap<String, (u16, Vec<(String, String)>, String)>>>,
    hits: Arc<AtomicUsize>,
    seen_keys: Arc<Mutex<Vec<String>>>,
}

/// In-process stand-in for the track analysis API.
pub struct MockAnalysisApi {
    pub base_url: String,
    state: MockState,
}

impl MockAnalysisApi {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new()
            .route("/pktx/spotify/{track_id}", get(analysis))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/pktx/spotify"),
            state,
        }
    }

    /// Overrides the reply for one track id.
    pub fn respond(&self, track_id: &str, status: u16, body: impl Into<String>) {
        self.respond_with_headers(track_id, status, &[], body);
    }

    pub fn respond_with_headers(
        &self,
        track_id: &str,
        status: u16,
        headers: &[(&str, &str)],
        body: impl Into<String>,
    ) {
        let headers = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(track_id.to_string(), (status, headers, body.into()));
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn seen_keys(&self) -> Vec<String> {
        self.state.seen_keys.lock().unwrap().clone()
    }
}

async fn analysis(
    Path(track_id): Path<String>,
    State(state): State<MockState>,
    headers: HeaderMap,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if let Some(key) = headers.get("x-rapidapi-key").and_then(|v| v.to_str().ok()) {
        state.seen_keys.lock().unwrap().push(key.to_string());
    }

    if track_id == SLOW_TRACK {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }

    let configured = state.responses.lock().unwrap().get(&track_id).cloned();
    match configured {
        Some((status, extra, body)) => {
            let mut response =
                (StatusCode::from_u16(status).unwrap(), body).into_response();
            for (k, v) in extra {
                response.headers_mut().insert(
                    axum::http::HeaderName::from_bytes(k.as_bytes()).unwrap(),
                    v.parse().unwrap(),
                );
            }
            response
        }
        None => axum::Json(sample_payload(&track_id)).into_response(),
    }
}

pub fn sample_payload(track_id: &str) -> Value {
    json!({
        "id": track_id,
        "key": 5,
        "mode": "major",
        "camelot": "7B",
        "tempo": 120,
        "duration": "3:45",
        "popularity": 70,
        "energy": 65,
        "danceability": 80,
        "happiness": 55,
        "acousticness": 10,
        "instrumentalness": 0,
        "liveness": 12,
        "speechiness": 4,
        "loudness": "-7 dB"
    })
}

pub fn sample_raw(track_id: &str) -> RawAnalysis {
    serde_json::from_value(sample_payload(track_id)).unwrap()
}

pub fn payload_without(track_id: &str, field: &str) -> String {
    let mut payload = sample_payload(track_id);
    payload.as_object_mut().unwrap().remove(field);
    payload.to_string()
}

pub fn test_config(base_url: &str, monthly_limit: u64) -> EnrichConfig {
    EnrichConfig {
        api_key: API_KEY.to_string(),
        api_url: base_url.to_string(),
        monthly_limit,
        request_timeout: Duration::from_secs(1),
        throttle: Duration::ZERO,
        ..EnrichConfig::default()
    }
}

pub fn ledger(usage: Arc<dyn BlobStore>) -> UsageLedger {
    UsageLedger::new(usage, "rapidapi").with_clock(Arc::new(FixedClock::new(MONTH)))
}

pub fn client(base_url: &str, monthly_limit: u64, usage: Arc<dyn BlobStore>) -> MetricsClient {
    MetricsClient::new(&test_config(base_url, monthly_limit), ledger(usage)).unwrap()
}

pub fn usage_json(month: &str, calls_made: u64) -> String {
    json!({ "month": month, "calls_made": calls_made }).to_string()
}

pub fn track(id: &str) -> TrackDescriptor {
    TrackDescriptor::new(
        format!("spotify:track:{id}"),
        format!("Song {id}"),
        format!("Artist {id}"),
    )
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
