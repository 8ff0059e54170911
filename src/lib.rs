//! spotharvest library
//!
//! Fetches a user's top tracks from Spotify, enriches each one with audio
//! analysis from a third-party metrics API and stores the result as one
//! JSON blob per track, while keeping the metrics API calls under a monthly
//! quota. Tracks that were enriched before are never fetched again.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints for the local OAuth callback server
//! - `cli` - Command implementations and output formatting
//! - `config` - Environment-based configuration
//! - `enrich` - Usage ledger, metrics client, normalizer and pipeline
//! - `management` - Token cache and enriched track cache
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Spotify Web API client (auth, top tracks)
//! - `store` - Key-value blob storage backends
//! - `types` - Data structures shared across modules
//! - `utils` - Small helpers

pub mod api;
pub mod cli;
pub mod config;
pub mod enrich;
pub mod management;
pub mod server;
pub mod spotify;
pub mod store;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used by the command-line glue where errors only need to be shown to the
/// user. The enrichment core uses typed errors instead.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// ```
/// info!("Fetching top tracks...");
/// info!("{} tracks cached", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for fatal errors: the process terminates with exit code 1 right
/// after printing, so code after the macro never runs.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// For recoverable issues the user should notice, such as a track that
/// could not be enriched in this run.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
