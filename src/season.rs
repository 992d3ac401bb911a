//! Sequential season orchestration over a page driver.
//!
//! This module provides the [`SeasonDownloader`], which walks a season's
//! episodes one at a time: select the episode through the
//! [`PageDriver`], snapshot the downloads directory, fire the trigger,
//! and hand the aftermath to the [`Reconciler`]. Each episode gets a
//! bounded number of trigger+reconcile rounds, and failures stay
//! isolated to their episode — the sweep continues and the final
//! [`SeasonReport`] says exactly what landed and what did not.
//!
//! One download is in flight at a time by construction: the next
//! episode's round starts only after the previous one finalized or gave
//! up, which is what keeps the snapshot/diff detection unambiguous.
//!
//! # Example
//!
//! ```no_run
//! use subgrab_core::driver::ManualDriver;
//! use subgrab_core::reconcile::{ReconcilePolicy, Reconciler};
//! use subgrab_core::season::SeasonDownloader;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reconciler = Reconciler::new(ReconcilePolicy::new());
//! let engine = SeasonDownloader::new(ManualDriver::new(8), reconciler);
//! let report = engine
//!     .download_season(Path::new("./downloads"), "The Office", 2)
//!     .await?;
//! println!("{} downloaded, {} failed", report.downloaded(), report.failed());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::driver::{DriverError, EpisodeRef, PageDriver};
use crate::naming::{EpisodeTarget, sanitize_show_name};
use crate::reconcile::{DirectorySnapshot, ReconcileError, Reconciler};

/// Default trigger+reconcile rounds per episode.
pub const DEFAULT_EPISODE_ATTEMPTS: u32 = 3;

/// Default wait between failed rounds (2 seconds).
const DEFAULT_ROUND_BACKOFF: Duration = Duration::from_secs(2);

/// Default pause between episodes (1 second).
const DEFAULT_EPISODE_PAUSE: Duration = Duration::from_secs(1);

/// Errors that abort a season sweep.
///
/// Per-episode failures do NOT abort the sweep; they land in the report.
#[derive(Debug, thiserror::Error)]
pub enum SeasonError {
    /// The driver could not read the season page.
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    /// The downloads directory is unusable. Configuration problem, so
    /// pressing on with the remaining episodes would only repeat it.
    #[error("season aborted: {0}")]
    Fatal(#[source] ReconcileError),
}

/// Terminal status of one episode within a season sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum EpisodeStatus {
    /// Finalized under the canonical filename.
    Downloaded {
        /// The canonical filename (not the full path).
        file: String,
    },
    /// All rounds exhausted.
    Failed {
        /// The last round's terminal reason.
        reason: String,
    },
}

/// One episode's entry in the season report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpisodeOutcome {
    /// Episode ordinal within the season.
    pub episode: u32,
    /// What happened.
    #[serde(flatten)]
    pub status: EpisodeStatus,
}

impl EpisodeOutcome {
    /// Creates a downloaded outcome.
    #[must_use]
    pub fn downloaded(episode: u32, file: impl Into<String>) -> Self {
        Self {
            episode,
            status: EpisodeStatus::Downloaded { file: file.into() },
        }
    }

    /// Creates a failed outcome.
    #[must_use]
    pub fn failed(episode: u32, reason: impl Into<String>) -> Self {
        Self {
            episode,
            status: EpisodeStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    /// Whether the episode finalized successfully.
    #[must_use]
    pub fn is_downloaded(&self) -> bool {
        matches!(self.status, EpisodeStatus::Downloaded { .. })
    }
}

/// Everything a season sweep produced, episode by episode.
#[derive(Debug, Clone, Serialize)]
pub struct SeasonReport {
    /// Sanitized show name the canonical filenames carry.
    pub show: String,
    /// Season ordinal.
    pub season: u32,
    /// Outcomes in sweep order.
    pub episodes: Vec<EpisodeOutcome>,
}

impl SeasonReport {
    /// Creates an empty report for a show and season.
    #[must_use]
    pub fn new(show: impl AsRef<str>, season: u32) -> Self {
        Self {
            show: sanitize_show_name(show.as_ref()),
            season,
            episodes: Vec::new(),
        }
    }

    /// Appends an episode outcome.
    pub fn push(&mut self, outcome: EpisodeOutcome) {
        self.episodes.push(outcome);
    }

    /// Number of episodes that finalized.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.episodes.iter().filter(|e| e.is_downloaded()).count()
    }

    /// Number of episodes that gave up.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.episodes.len() - self.downloaded()
    }

    /// Whether every attempted episode finalized.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }
}

/// How one trigger+reconcile round ended.
#[derive(Debug)]
enum RoundFailure {
    /// Worth another round: driver hiccup, banner, exhausted polls.
    Transient(String),
    /// Aborts the season: the downloads directory is unusable.
    Fatal(ReconcileError),
}

/// Walks a season's episodes through a [`PageDriver`], reconciling each
/// download as it lands.
///
/// # Round Model
///
/// Per episode, up to `episode_attempts` rounds of:
/// select → snapshot → trigger → banner check → reconcile.
/// A failed round backs off `round_backoff` before the next; exhausted
/// rounds record the episode as failed and the sweep moves on after an
/// `episode_pause`.
pub struct SeasonDownloader<D> {
    /// The page being driven.
    driver: D,
    /// Filesystem half of every round.
    reconciler: Reconciler,
    /// Rounds per episode.
    episode_attempts: u32,
    /// Wait between failed rounds.
    round_backoff: Duration,
    /// Pause between episodes.
    episode_pause: Duration,
}

impl<D: PageDriver> SeasonDownloader<D> {
    /// Creates an engine with the default round pacing.
    #[must_use]
    pub fn new(driver: D, reconciler: Reconciler) -> Self {
        Self {
            driver,
            reconciler,
            episode_attempts: DEFAULT_EPISODE_ATTEMPTS,
            round_backoff: DEFAULT_ROUND_BACKOFF,
            episode_pause: DEFAULT_EPISODE_PAUSE,
        }
    }

    /// Overrides the rounds per episode. Values below 1 clamp to 1.
    #[must_use]
    pub fn with_episode_attempts(mut self, episode_attempts: u32) -> Self {
        self.episode_attempts = episode_attempts.max(1);
        self
    }

    /// Overrides the waits between rounds and between episodes.
    #[must_use]
    pub fn with_pacing(mut self, round_backoff: Duration, episode_pause: Duration) -> Self {
        self.round_backoff = round_backoff;
        self.episode_pause = episode_pause;
        self
    }

    /// The driver being driven.
    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Pause inserted between episodes of a sweep.
    #[must_use]
    pub fn episode_pause(&self) -> Duration {
        self.episode_pause
    }

    /// Lists the season's episodes and downloads them in order.
    ///
    /// Sequential by construction: one download in flight at a time. An
    /// empty listing yields an empty (complete) report.
    ///
    /// # Errors
    ///
    /// [`SeasonError::Driver`] when the listing fails;
    /// [`SeasonError::Fatal`] when the downloads directory is unusable.
    #[instrument(skip(self, dir, show), fields(dir = %dir.display(), show, driver = self.driver.name()))]
    pub async fn download_season(
        &self,
        dir: &Path,
        show: &str,
        season: u32,
    ) -> Result<SeasonReport, SeasonError> {
        let episodes = self.driver.episodes().await?;
        info!(count = episodes.len(), "season page listed episodes");

        let mut report = SeasonReport::new(show, season);
        for (index, episode) in episodes.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.episode_pause).await;
            }
            let outcome = self.download_episode(dir, show, season, episode).await?;
            report.push(outcome);
        }

        info!(
            downloaded = report.downloaded(),
            failed = report.failed(),
            "season sweep complete"
        );
        Ok(report)
    }

    /// Runs the trigger+reconcile rounds for a single episode.
    ///
    /// # Errors
    ///
    /// [`SeasonError::Fatal`] when the downloads directory is unusable;
    /// everything else becomes a [`EpisodeStatus::Failed`] outcome.
    #[instrument(skip(self, dir, show, episode), fields(episode = episode.number, label = %episode.label))]
    pub async fn download_episode(
        &self,
        dir: &Path,
        show: &str,
        season: u32,
        episode: &EpisodeRef,
    ) -> Result<EpisodeOutcome, SeasonError> {
        let target = EpisodeTarget::new(show, season, episode.number);
        let mut last_reason = String::from("no rounds ran");

        for round in 1..=self.episode_attempts {
            debug!(round, rounds = self.episode_attempts, "starting download round");

            match self.run_round(dir, &target).await {
                Ok(path) => {
                    let file = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    info!(round, file = %file, "episode downloaded");
                    return Ok(EpisodeOutcome::downloaded(episode.number, file));
                }
                Err(RoundFailure::Fatal(e)) => return Err(SeasonError::Fatal(e)),
                Err(RoundFailure::Transient(reason)) => {
                    warn!(round, reason = %reason, "download round failed");
                    last_reason = reason;
                }
            }

            if round < self.episode_attempts {
                tokio::time::sleep(self.round_backoff).await;
            }
        }

        Ok(EpisodeOutcome::failed(episode.number, last_reason))
    }

    /// One round: select → snapshot → trigger → banner check → reconcile.
    async fn run_round(
        &self,
        dir: &Path,
        target: &EpisodeTarget,
    ) -> Result<PathBuf, RoundFailure> {
        if let Err(e) = self.driver.select_episode(target.episode()).await {
            return Err(RoundFailure::Transient(e.to_string()));
        }

        // Snapshot strictly before the trigger, so the diff owns
        // everything the click produces.
        let snapshot = match DirectorySnapshot::capture(dir).await {
            Ok(snapshot) => snapshot,
            Err(e) => return Err(RoundFailure::Fatal(ReconcileError::directory(dir, e))),
        };

        if let Err(e) = self.driver.trigger_download().await {
            return Err(RoundFailure::Transient(e.to_string()));
        }

        // Advisory fast-fail: skip the poll budget when the page already
        // admits the failure. A banner-check error means "can't see the
        // page", not "failed" - the filesystem verdict decides then.
        match self.driver.has_error_banner().await {
            Ok(true) => {
                debug!("page shows a failure banner, skipping the poll wait");
                return Err(RoundFailure::Transient(
                    "page reported download failure".to_string(),
                ));
            }
            Ok(false) => {}
            Err(e) => debug!(error = %e, "banner check unavailable"),
        }

        match self.reconciler.reconcile_from(dir, &snapshot, target).await {
            Ok(path) => Ok(path),
            Err(e) if e.is_configuration() => Err(RoundFailure::Fatal(e)),
            Err(e) => Err(RoundFailure::Transient(e.to_string())),
        }
    }
}
