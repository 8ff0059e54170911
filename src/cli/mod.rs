//! # CLI Module
//!
//! User-facing commands of spotharvest. Each command loads its settings,
//! delegates the actual work to the [`crate::spotify`], [`crate::enrich`]
//! and [`crate::management`] layers, and turns the results into coloured
//! output lines, tables and progress spinners.
//!
//! ```text
//! CLI Layer (this module: presentation)
//!     ↓
//! Enrichment Pipeline (cache check, quota, fetch, normalize, store)
//!     ↓
//! Spotify API / Analysis API / Blob Store
//! ```
//!
//! ## Commands
//!
//! - [`auth`] - Spotify login (OAuth 2.0 PKCE)
//! - [`list_tracks`] - top tracks with their cache state
//! - [`harvest`] - run the enrichment pipeline over the top tracks or a
//!   JSON track list
//! - [`usage`] - analysis API calls made this month against the limit
//! - [`list_cached`] / [`show_cached`] - inspect stored track records
//!
//! Fatal problems (missing configuration, no token, unreadable store)
//! end the command via the `error!` macro. Problems with a single track
//! never do: they become a warning line and the batch carries on.
//!
//! ## Usage
//!
//! ```bash
//! spotharvest auth
//! spotharvest tracks --limit 10
//! spotharvest harvest --time-range medium_term
//! spotharvest usage
//! spotharvest cache show 4uLU6hMCjMI75M1A2tKUQC
//! ```

mod auth;
mod cache;
mod harvest;
mod tracks;
mod usage;

use std::{sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};

pub use auth::auth;
pub use cache::list_cached;
pub use cache::show_cached;
pub use harvest::harvest;
pub use tracks::list_tracks;
pub use usage::usage;

use crate::{
    config::EnrichConfig,
    error,
    store::{BlobStore, FsBlobStore},
};

fn load_config() -> EnrichConfig {
    match EnrichConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => error!("Invalid configuration: {}", e),
    }
}

/// Track bucket and usage bucket, in that order.
fn open_stores(cfg: &EnrichConfig) -> (Arc<dyn BlobStore>, Arc<dyn BlobStore>) {
    let tracks: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(&cfg.store_root, &cfg.track_bucket));
    let usage: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(&cfg.store_root, &cfg.usage_bucket));
    (tracks, usage)
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}
