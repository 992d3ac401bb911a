//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use subgrab_core::DEFAULT_MAX_RETRIES;

/// Download and organize subtitles for a show, one episode at a time.
///
/// Subgrab watches a downloads directory while a subtitle page serves
/// files into it, weeds out error pages and undersized junk, and renames
/// each survivor to `{Show}.S{season}E{episode}.srt`.
#[derive(Parser, Debug)]
#[command(name = "subgrab")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Downloads directory the browser saves into
    #[arg(short = 'd', long, default_value = ".")]
    pub dir: PathBuf,

    /// Show name used in the canonical filename
    #[arg(short = 's', long)]
    pub show: String,

    /// Season number (1-9999)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=9999))]
    pub season: u32,

    /// Reconcile a single episode's download (1-9999)
    #[arg(short = 'e', long, conflicts_with = "episodes", value_parser = clap::value_parser!(u32).range(1..=9999))]
    pub episode: Option<u32>,

    /// Sweep a whole season of this many episodes (1-999)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=999))]
    pub episodes: Option<u32>,

    /// Maximum download attempts per episode (1-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_RETRIES, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_retries: u32,

    /// Seconds between directory polls while waiting for a download (1-60)
    #[arg(short = 'p', long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..=60))]
    pub poll_interval: u64,

    /// Print the outcome as JSON (episode outcome or season report)
    #[arg(long)]
    pub json: bool,
}
