use tabled::Table;

use crate::{
    cli, error, info,
    management::TrackCacheManager,
    types::{FeatureTableRow, TrackRecord, TrackRecordTableRow},
    utils, warning,
};

/// Lists every enriched track in the store, optionally filtered by a
/// case-insensitive search on name or artist.
pub async fn list_cached(search: Option<String>) {
    let cfg = cli::load_config();
    let (track_store, _) = cli::open_stores(&cfg);
    let cache = TrackCacheManager::new(track_store);

    let mut records = match cache.load_all().await {
        Ok(records) => records,
        Err(e) => error!("Cannot read track cache: {}", e),
    };

    if let Some(term) = search {
        let term = term.to_lowercase();
        records.retain(|r| {
            r.name.to_lowercase().contains(&term) || r.artist.to_lowercase().contains(&term)
        });
    }

    if records.is_empty() {
        info!("No cached tracks.");
        return;
    }

    records.sort_by(|a, b| {
        a.artist
            .to_lowercase()
            .cmp(&b.artist.to_lowercase())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });

    let count = records.len();
    let rows: Vec<TrackRecordTableRow> = records
        .into_iter()
        .map(|r| TrackRecordTableRow {
            tempo: utils::display_value(&r.audio_features.tempo),
            camelot: utils::display_value(&r.audio_features.camelot),
            energy: utils::display_value(&r.audio_features.energy),
            track_id: r.track_id,
            name: r.name,
            artist: r.artist,
        })
        .collect();

    println!("{}", Table::new(rows));
    info!("{} cached tracks", count);
}

/// Prints one stored record in full.
pub async fn show_cached(track_id: String) {
    let cfg = cli::load_config();
    let (track_store, _) = cli::open_stores(&cfg);
    let cache = TrackCacheManager::new(track_store);

    match cache.load(&track_id).await {
        Ok(Some(record)) => print_record(&record),
        Ok(None) => warning!("Track {} has not been analyzed yet.", track_id),
        Err(e) => error!("Cannot read track {}: {}", track_id, e),
    }
}

fn print_record(record: &TrackRecord) {
    let f = &record.audio_features;
    info!("{} By: {}", record.name, record.artist);
    info!("Track: {} ({})", record.track_id, record.uri);
    info!(
        "Source: {} / analysis {}",
        record.source, record.analysis_version
    );

    let rows = [
        FeatureTableRow::new("key", utils::display_value(&f.key)),
        FeatureTableRow::new("mode", utils::display_value(&f.mode)),
        FeatureTableRow::new("camelot", utils::display_value(&f.camelot)),
        FeatureTableRow::new("tempo", utils::display_value(&f.tempo)),
        FeatureTableRow::new("duration", format!("{}:{:02}", f.duration_seconds / 60, f.duration_seconds % 60)),
        FeatureTableRow::new("loudness", format!("{} dB", f.loudness_db)),
        FeatureTableRow::new("popularity", utils::display_value(&f.popularity)),
        FeatureTableRow::new("energy", utils::display_value(&f.energy)),
        FeatureTableRow::new("danceability", utils::display_value(&f.danceability)),
        FeatureTableRow::new("happiness", utils::display_value(&f.happiness)),
        FeatureTableRow::new("acousticness", utils::display_value(&f.acousticness)),
        FeatureTableRow::new("instrumentalness", utils::display_value(&f.instrumentalness)),
        FeatureTableRow::new("liveness", utils::display_value(&f.liveness)),
        FeatureTableRow::new("speechiness", utils::display_value(&f.speechiness)),
    ];

    println!("{}", Table::new(rows));
}
