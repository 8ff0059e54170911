use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tabled::Tabled;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

#[derive(Debug, Clone)]
pub struct PkceToken {
    pub code_verifier: String,
    pub token: Option<Token>,
}

/// A track as supplied by the caller of the enrichment pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    pub uri: String,
    pub name: String,
    pub artist: String,
}

impl TrackDescriptor {
    pub fn new(uri: impl Into<String>, name: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            artist: artist.into(),
        }
    }
}

/// Singleton monthly usage counter, stored as `api_usage/{provider}.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub month: String,
    pub calls_made: u64,
}

impl UsageRecord {
    pub fn fresh(month: impl Into<String>) -> Self {
        Self {
            month: month.into(),
            calls_made: 0,
        }
    }
}

/// Audio analysis payload exactly as the metrics API returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawAnalysis(pub Map<String, Value>);

impl RawAnalysis {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }
}

/// Canonical audio features.
///
/// Pass-through attributes keep whatever JSON value the metrics API sent;
/// only `duration_seconds` and `loudness_db` are derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub key: Value,
    pub mode: Value,
    pub camelot: Value,
    pub tempo: Value,
    pub duration_seconds: u64,
    pub popularity: Value,
    pub energy: Value,
    pub danceability: Value,
    pub happiness: Value,
    pub acousticness: Value,
    pub instrumentalness: Value,
    pub liveness: Value,
    pub speechiness: Value,
    pub loudness_db: i64,
}

/// The cached artifact, stored once per track under `tracks/{track_id}.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub track_id: String,
    pub name: String,
    pub artist: String,
    pub uri: String,
    pub audio_features: AudioFeatures,
    pub source: String,
    pub analysis_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl CurrentUser {
    /// Display name, or the account id when none is set.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopTracksResponse {
    pub items: Vec<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub artists: Vec<TrackArtist>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackArtist {
    pub id: String,
    pub name: String,
}

impl From<Track> for TrackDescriptor {
    fn from(track: Track) -> Self {
        let artist = track
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_default();
        TrackDescriptor {
            uri: track.uri,
            name: track.name,
            artist,
        }
    }
}

#[derive(Tabled)]
pub struct TopTrackTableRow {
    #[tabled(rename = "#")]
    pub rank: usize,
    pub name: String,
    pub artist: String,
    pub track_id: String,
    pub cached: String,
}

#[derive(Tabled)]
pub struct TrackRecordTableRow {
    pub track_id: String,
    pub name: String,
    pub artist: String,
    pub tempo: String,
    pub camelot: String,
    pub energy: String,
}

#[derive(Tabled)]
pub struct FeatureTableRow {
    pub feature: &'static str,
    pub value: String,
}

impl FeatureTableRow {
    pub fn new(feature: &'static str, value: String) -> Self {
        Self { feature, value }
    }
}
