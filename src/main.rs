use std::sync::Arc;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spotharvest::{cli, config, types::PkceToken, warning};
use tokio::sync::Mutex;

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth,

    /// Show your top tracks
    Tracks(TopTracksOptions),

    /// Analyze top tracks and store the results
    Harvest(HarvestOptions),

    /// Show analysis API usage for this month
    Usage,

    /// Inspect stored track analyses
    Cache(CacheOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct TopTracksOptions {
    /// Number of top tracks (1-50)
    #[clap(long)]
    pub limit: Option<u32>,

    /// short_term, medium_term or long_term
    #[clap(long)]
    pub time_range: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct HarvestOptions {
    /// Number of top tracks (1-50)
    #[clap(long)]
    pub limit: Option<u32>,

    /// short_term, medium_term or long_term
    #[clap(long)]
    pub time_range: Option<String>,

    /// Read tracks from a JSON file ([{"uri", "name", "artist"}]) instead of Spotify
    #[clap(long, conflicts_with_all = ["limit", "time_range"])]
    pub input: Option<String>,
}

#[derive(Parser, Debug, Clone)]
#[command(
    about = "Inspect stored track analyses",
    args_conflicts_with_subcommands = true
)]
pub struct CacheOptions {
    /// Search cached tracks by name or artist
    #[clap(long)]
    pub search: Option<String>,

    #[command(subcommand)]
    pub command: Option<CacheSubcommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CacheSubcommand {
    /// Show every stored feature of one track
    Show(CacheShowOpts),
}

#[derive(Parser, Debug, Clone)]
pub struct CacheShowOpts {
    /// Spotify track id
    pub track_id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        warning!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Auth => {
            let oauth_result: Arc<Mutex<Option<PkceToken>>> = Arc::new(Mutex::new(None));
            cli::auth(Arc::clone(&oauth_result)).await;
        }
        Command::Tracks(opt) => cli::list_tracks(opt.limit, opt.time_range).await,
        Command::Harvest(opt) => cli::harvest(opt.limit, opt.time_range, opt.input).await,
        Command::Usage => cli::usage().await,
        Command::Cache(opt) => match opt.command {
            Some(CacheSubcommand::Show(s)) => cli::show_cached(s.track_id).await,
            None => cli::list_cached(opt.search).await,
        },
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
