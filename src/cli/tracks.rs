use tabled::Table;

use crate::{
    cli, error,
    enrich::track_id_from_uri,
    info,
    management::TrackCacheManager,
    spotify,
    types::{TopTrackTableRow, TrackDescriptor},
    warning,
};

/// Lists the user's top tracks and whether each one is already enriched.
pub async fn list_tracks(limit: Option<u32>, time_range: Option<String>) {
    let cfg = cli::load_config();
    let limit = limit.unwrap_or(cfg.top_tracks_limit);
    let time_range = time_range.unwrap_or_else(|| cfg.top_tracks_time_range.clone());

    let tracks = fetch_top_tracks(limit, &time_range).await;
    if tracks.is_empty() {
        info!("No top tracks for time range {}.", time_range);
        return;
    }

    let (track_store, _) = cli::open_stores(&cfg);
    let cache = TrackCacheManager::new(track_store);

    let mut rows = Vec::with_capacity(tracks.len());
    for (idx, track) in tracks.into_iter().enumerate() {
        let track_id = track_id_from_uri(&track.uri).to_string();
        let cached = match cache.contains(&track_id).await {
            Ok(true) => "yes",
            Ok(false) => "no",
            Err(e) => {
                warning!("Cannot check cache for {}: {}", track_id, e);
                "?"
            }
        };

        rows.push(TopTrackTableRow {
            rank: idx + 1,
            name: track.name,
            artist: track.artist,
            track_id,
            cached: cached.to_string(),
        });
    }

    println!("{}", Table::new(rows));
}

pub(crate) async fn fetch_top_tracks(limit: u32, time_range: &str) -> Vec<TrackDescriptor> {
    let pb = cli::spinner("Fetching top tracks...");
    let result = spotify::tracks::get_top_tracks(limit, time_range).await;
    pb.finish_and_clear();

    match result {
        Ok(tracks) => tracks,
        Err(e) => error!("Failed to fetch top tracks: {}", e),
    }
}
