//! CLI entry point for the subgrab tool.

use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use subgrab_core::{
    DEFAULT_POLL_ITERATIONS, EpisodeOutcome, EpisodeStatus, EpisodeTarget, ManualDriver,
    PageDriver, ReconcilePolicy, Reconciler, SeasonDownloader, SeasonReport,
};
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    info!("Subgrab starting");

    let policy = ReconcilePolicy::with_max_retries(args.max_retries).with_polling(
        DEFAULT_POLL_ITERATIONS,
        Duration::from_secs(args.poll_interval),
    );
    let reconciler = Reconciler::new(policy);

    match (args.episode, args.episodes) {
        (Some(episode), _) => run_single(&args, reconciler, episode).await,
        (None, Some(count)) => run_season(&args, reconciler, count).await,
        (None, None) => {
            bail!("nothing to do: pass --episode N for one episode or --episodes N for a season sweep")
        }
    }
}

/// Reconciles one download: trigger the episode in the browser, then run
/// subgrab and let it pick the file up as it lands.
async fn run_single(args: &Args, reconciler: Reconciler, episode: u32) -> Result<()> {
    let target = EpisodeTarget::new(&args.show, args.season, episode);
    let window_secs = reconciler.policy().total_poll_budget().as_secs();
    info!(target = %target, window_secs, "watching for the episode download");

    let path = reconciler.reconcile(&args.dir, &target).await?;

    info!(file = %path.display(), "subtitle in place");
    if args.json {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let outcome = EpisodeOutcome::downloaded(episode, file);
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", path.display());
    }
    Ok(())
}

/// Sweeps a season: one trigger-and-reconcile cycle per episode, strictly
/// in order. Failed episodes land in the report rather than aborting the
/// sweep.
async fn run_season(args: &Args, reconciler: Reconciler, count: u32) -> Result<()> {
    let engine = SeasonDownloader::new(ManualDriver::new(count), reconciler);
    let episodes = engine.driver().episodes().await?;
    info!(
        count = episodes.len(),
        season = args.season,
        "starting season sweep"
    );

    let progress = season_progress(args, episodes.len() as u64);
    let mut report = SeasonReport::new(&args.show, args.season);

    for (index, episode) in episodes.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(engine.episode_pause()).await;
        }
        if let Some(bar) = &progress {
            bar.set_message(episode.label.clone());
        }

        let outcome = engine
            .download_episode(&args.dir, &args.show, args.season, episode)
            .await?;

        if let Some(bar) = &progress {
            bar.inc(1);
        }
        report.push(outcome);
    }

    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }

    for outcome in &report.episodes {
        if let EpisodeStatus::Failed { reason } = &outcome.status {
            warn!(episode = outcome.episode, reason = %reason, "episode did not download");
        }
    }
    info!(
        downloaded = report.downloaded(),
        failed = report.failed(),
        "season sweep complete"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

/// Builds the sweep progress bar, unless quiet or JSON output suppresses it.
fn season_progress(args: &Args, total: u64) -> Option<ProgressBar> {
    if args.quiet || args.json {
        return None;
    }
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    Some(bar)
}
