//! # Enrichment
//!
//! Turns a list of tracks into stored, enriched [`TrackRecord`]s:
//!
//! ```text
//! TrackDescriptor
//!     ↓ track id = last ':' segment of the uri
//! TrackCacheManager::contains ── hit ──→ Outcome::AlreadyCached
//!     ↓ miss
//! UsageLedger::read ── limit reached ──→ Outcome::QuotaExhausted
//!     ↓
//! MetricsClient: throttle, GET, charge ledger ── error ──→ Outcome::FetchFailed
//!     ↓
//! normalize ── missing/malformed field ──→ Outcome::NormalizationFailed
//!     ↓
//! TrackCacheManager::insert_new ──→ Outcome::Enriched
//! ```
//!
//! Tracks are handled one at a time in the given order, and every per-track
//! failure becomes an [`Outcome`] so a batch always runs to the end.
//!
//! A call is charged to the ledger as soon as the analysis API answers with
//! a 2xx, so a payload that later fails normalization still uses quota.
//!
//! [`TrackRecord`]: crate::types::TrackRecord

pub mod ledger;
pub mod metrics;
pub mod normalize;
pub mod pipeline;

pub use ledger::{Clock, LedgerError, SystemClock, UsageLedger};
pub use metrics::{FetchError, FetchErrorKind, MetricsClient, MetricsError};
pub use normalize::{NormalizationError, normalize};
pub use pipeline::{ANALYSIS_VERSION, BatchSummary, EnrichmentPipeline, Outcome, track_id_from_uri};
