use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::time::sleep;

use crate::{
    Res, config,
    management::TokenManager,
    types::{TopTracksResponse, TrackDescriptor},
};

/// Spotify caps a single top-items page at 50.
pub const MAX_TOP_TRACKS: u32 = 50;

const VALID_TIME_RANGES: [&str; 3] = ["short_term", "medium_term", "long_term"];

/// Retrieves the user's top tracks, most listened first.
///
/// # Arguments
///
/// * `limit` - Number of tracks to request, clamped to 1..=50
/// * `time_range` - `short_term` (about 4 weeks), `medium_term` (6 months)
///   or `long_term` (about a year)
///
/// A 502 from Spotify is retried after 10 seconds, anything else is
/// returned as an error. Needs a token obtained with `spotharvest auth`.
pub async fn get_top_tracks(limit: u32, time_range: &str) -> Res<Vec<TrackDescriptor>> {
    if !VALID_TIME_RANGES.contains(&time_range) {
        return Err(format!(
            "Unknown time range '{}', expected one of {}",
            time_range,
            VALID_TIME_RANGES.join(", ")
        )
        .into());
    }

    let mut token_mgr = TokenManager::load()
        .await
        .map_err(|e| format!("Failed to load token. Please run spotharvest auth\n Error: {}", e))?;

    let api_url = format!(
        "{uri}/me/top/tracks?limit={limit}&time_range={time_range}",
        uri = config::spotify_apiurl()?,
        limit = limit.clamp(1, MAX_TOP_TRACKS),
        time_range = time_range
    );

    let client = Client::new();
    loop {
        let token = token_mgr.get_valid_token().await?;
        let response = client.get(&api_url).bearer_auth(token).send().await?;

        if response.status() == StatusCode::BAD_GATEWAY {
            sleep(Duration::from_secs(10)).await;
            continue;
        }

        let res = response
            .error_for_status()?
            .json::<TopTracksResponse>()
            .await?;
        return Ok(res.items.into_iter().map(TrackDescriptor::from).collect());
    }
}
