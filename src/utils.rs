use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use reqwest::Url;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::{Res, types::TrackDescriptor};

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

pub fn build_authorize_url(
    auth_url: &str,
    client_id: &str,
    redirect_uri: &str,
    code_challenge: &str,
    scope: &str,
) -> Res<String> {
    let url = Url::parse_with_params(
        auth_url,
        &[
            ("client_id", client_id),
            ("response_type", "code"),
            ("redirect_uri", redirect_uri),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
            ("scope", scope),
        ],
    )?;
    Ok(url.into())
}

/// Reads a JSON array of `{uri, name, artist}` objects.
pub async fn load_track_descriptors(path: &str) -> Res<Vec<TrackDescriptor>> {
    let content = async_fs::read_to_string(path)
        .await
        .map_err(|e| format!("Cannot read {}: {}", path, e))?;
    let tracks = serde_json::from_str(&content)
        .map_err(|e| format!("Cannot parse {}: {}", path, e))?;
    Ok(tracks)
}

/// Renders a pass-through feature value for a table cell.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
