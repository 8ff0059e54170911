use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    cli, error,
    enrich::{BatchSummary, EnrichmentPipeline, MetricsClient, Outcome, UsageLedger},
    info,
    management::TrackCacheManager,
    success,
    types::TrackDescriptor,
    utils, warning,
};

/// Enriches the top tracks (or the tracks listed in `input`) and stores the
/// results, printing one line per track and a summary at the end.
pub async fn harvest(limit: Option<u32>, time_range: Option<String>, input: Option<String>) {
    let cfg = cli::load_config();
    if let Err(e) = cfg.require_api_key() {
        error!("Cannot call the analysis API: {}", e);
    }

    let tracks: Vec<TrackDescriptor> = match input {
        Some(path) => match utils::load_track_descriptors(&path).await {
            Ok(tracks) => tracks,
            Err(e) => error!("{}", e),
        },
        None => {
            let limit = limit.unwrap_or(cfg.top_tracks_limit);
            let time_range = time_range.unwrap_or_else(|| cfg.top_tracks_time_range.clone());
            cli::tracks::fetch_top_tracks(limit, &time_range).await
        }
    };

    if tracks.is_empty() {
        success!("Nothing to harvest.");
        return;
    }

    let (track_store, usage_store) = cli::open_stores(&cfg);
    let ledger = UsageLedger::new(Arc::clone(&usage_store), &cfg.provider);
    let client = match MetricsClient::new(&cfg, ledger) {
        Ok(client) => client,
        Err(e) => error!("Cannot build HTTP client: {}", e),
    };
    let pipeline = EnrichmentPipeline::new(
        TrackCacheManager::new(track_store),
        client,
        cfg.provider.clone(),
    );

    let pb = ProgressBar::new(tracks.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.set_message("Analyzing tracks...");

    let outcomes = pipeline
        .process_with(&tracks, |track, outcome| {
            pb.suspend(|| report(track, outcome));
            pb.inc(1);
        })
        .await;
    pb.finish_and_clear();

    let summary = BatchSummary::from_outcomes(&outcomes);
    if summary.failed() == 0 && summary.quota_exhausted == 0 {
        success!("{}", summary);
    } else {
        warning!("{}", summary);
    }

    if let Ok(usage) = pipeline.client().ledger().read().await {
        info!(
            "API usage for {}: {}/{} calls",
            usage.month,
            usage.calls_made,
            pipeline.client().monthly_limit()
        );
    }
}

fn report(track: &TrackDescriptor, outcome: &Outcome) {
    let label = format!("{} By: {}", track.name, track.artist);
    match outcome {
        Outcome::Enriched(_) => success!("{} - {}", label, outcome),
        Outcome::AlreadyCached(_) => info!("{} - {}", label, outcome),
        _ => warning!("{} - {}", label, outcome),
    }
}
