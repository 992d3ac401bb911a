//! The reconciliation engine: poll, classify, finalize, retry.
//!
//! This module provides the [`Reconciler`], which owns the full cycle
//! for one episode: wait for a new file to land in the downloads
//! directory, decide what it is, throw it away or rename it to the
//! canonical episode filename, and try again within a bounded budget
//! when the outcome was junk.
//!
//! # Overview
//!
//! The reconciler never talks to the network and never triggers
//! anything. The trigger (a browser click, an automation layer) happens
//! elsewhere; the contract is only that the [`DirectorySnapshot`] was
//! captured before the trigger fired, so the diff cleanly separates the
//! download from whatever else the directory holds.
//!
//! Detection is poll-based on purpose. The event of interest is download
//! *completion*, not file creation: browsers create placeholder names
//! first and a watch API would fire on those. A paced diff against the
//! snapshot, with the candidate re-checked after the rename, is the
//! robust version.
//!
//! # Example
//!
//! ```no_run
//! use subgrab_core::naming::EpisodeTarget;
//! use subgrab_core::reconcile::{ReconcilePolicy, Reconciler};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reconciler = Reconciler::new(ReconcilePolicy::new());
//! let target = EpisodeTarget::new("The Office", 1, 2);
//! let finalized = reconciler
//!     .reconcile(Path::new("./downloads"), &target)
//!     .await?;
//! println!("subtitle ready: {}", finalized.display());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::classify::{CandidateClassifier, Classification, SUBTITLE_EXTENSION, SubtitleHeuristics};
use super::error::ReconcileError;
use super::policy::ReconcilePolicy;
use super::snapshot::{CandidateFile, DirectorySnapshot};
use crate::naming::EpisodeTarget;

/// How a single attempt ended without a finalized subtitle.
///
/// Logged per attempt and folded into [`ReconcileError::Exhausted`] at
/// the end; never surfaced individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptFailure {
    /// The poll budget elapsed without a new file.
    NoNewFile,
    /// The newest candidate was a served error page.
    ErrorPage,
    /// The newest candidate was not a plausible subtitle.
    InvalidArtifact,
    /// The rename or the post-rename check lost a race with the file.
    FinalizationRace,
}

impl AttemptFailure {
    /// Whether the next attempt should wait before starting.
    ///
    /// Junk candidates were just deleted and a replacement download may
    /// already be in flight, so those paths go straight to the next
    /// attempt; the other paths are paced with a jittered backoff.
    fn wants_backoff(self) -> bool {
        matches!(self, Self::NoNewFile | Self::FinalizationRace)
    }
}

/// Drives one episode's download from trigger aftermath to canonical file.
///
/// # Attempt Model
///
/// - Up to `max_retries` attempts per reconciliation
/// - Each attempt polls the directory up to `poll_iterations` times,
///   sleeping `poll_interval` before each poll
/// - Every diff compares against the ORIGINAL snapshot; the baseline
///   never advances between polls or attempts
/// - The newest new file per attempt is the only one examined; rejected
///   candidates are deleted best-effort
/// - A valid candidate is renamed over the canonical name and then
///   re-checked at its final path before being reported
///
/// # Failure Model
///
/// An unusable downloads directory fails immediately without consuming
/// attempts ([`ReconcileError::Directory`]). Everything transient folds
/// into [`ReconcileError::Exhausted`] once the budget is spent.
pub struct Reconciler {
    /// Timing and retry budget.
    policy: ReconcilePolicy,
    /// Verdict rule for candidates.
    classifier: Box<dyn CandidateClassifier>,
}

impl Reconciler {
    /// Creates a reconciler with the stock subtitle heuristics.
    #[must_use]
    pub fn new(policy: ReconcilePolicy) -> Self {
        Self {
            policy,
            classifier: Box::new(SubtitleHeuristics::new()),
        }
    }

    /// Creates a reconciler with a custom classification rule.
    #[must_use]
    pub fn with_classifier(
        policy: ReconcilePolicy,
        classifier: Box<dyn CandidateClassifier>,
    ) -> Self {
        Self { policy, classifier }
    }

    /// Returns the configured policy.
    #[must_use]
    pub fn policy(&self) -> &ReconcilePolicy {
        &self.policy
    }

    /// Captures a snapshot of `dir` and reconciles against it.
    ///
    /// For callers whose trigger is external and imminent (or already
    /// fired): anything appearing in `dir` after this call counts as a
    /// candidate. When you control the trigger, capture the snapshot
    /// yourself, fire, and call [`Reconciler::reconcile_from`].
    ///
    /// # Errors
    ///
    /// [`ReconcileError::Directory`] when `dir` is missing, not a
    /// directory, or unreadable; [`ReconcileError::Exhausted`] when
    /// every attempt ended without a finalized subtitle.
    #[instrument(skip(self, dir, target), fields(dir = %dir.display(), target = %target))]
    pub async fn reconcile(
        &self,
        dir: &Path,
        target: &EpisodeTarget,
    ) -> Result<PathBuf, ReconcileError> {
        let snapshot = DirectorySnapshot::capture(dir)
            .await
            .map_err(|e| ReconcileError::directory(dir, e))?;
        self.reconcile_from(dir, &snapshot, target).await
    }

    /// Reconciles against a snapshot the caller captured before firing
    /// the trigger. Returns the path of the finalized canonical file.
    ///
    /// # Errors
    ///
    /// [`ReconcileError::Directory`] when `dir` is missing, not a
    /// directory, or unreadable; [`ReconcileError::Exhausted`] when
    /// every attempt ended without a finalized subtitle.
    #[instrument(
        skip(self, dir, snapshot, target),
        fields(dir = %dir.display(), target = %target, max_retries = self.policy.max_retries())
    )]
    pub async fn reconcile_from(
        &self,
        dir: &Path,
        snapshot: &DirectorySnapshot,
        target: &EpisodeTarget,
    ) -> Result<PathBuf, ReconcileError> {
        validate_directory(dir).await?;

        let max_retries = self.policy.max_retries();
        for attempt in 1..=max_retries {
            debug!(attempt, max_retries, "starting reconciliation attempt");

            let failure = match self.run_attempt(dir, snapshot, target).await {
                Ok(path) => {
                    info!(attempt, path = %path.display(), "subtitle finalized");
                    return Ok(path);
                }
                Err(failure) => failure,
            };

            warn!(attempt, max_retries, reason = ?failure, "attempt ended without a subtitle");

            if failure.wants_backoff() && attempt < max_retries {
                let wait = self.policy.backoff_with_jitter();
                debug!(wait_ms = wait.as_millis(), "backing off before next attempt");
                tokio::time::sleep(wait).await;
            }
        }

        Err(ReconcileError::exhausted(target.to_string(), max_retries))
    }

    /// One attempt: poll, pick the newest candidate, classify, finalize.
    async fn run_attempt(
        &self,
        dir: &Path,
        snapshot: &DirectorySnapshot,
        target: &EpisodeTarget,
    ) -> Result<PathBuf, AttemptFailure> {
        let Some(candidate) = self.poll_for_candidate(dir, snapshot).await else {
            return Err(AttemptFailure::NoNewFile);
        };

        match self.classifier.classify(&candidate) {
            Classification::Valid => self.finalize(dir, &candidate, target).await,
            Classification::ErrorPage => {
                debug!(
                    file = %candidate.file_name(),
                    len = candidate.len(),
                    "candidate is a served error page, discarding"
                );
                discard(&candidate).await;
                Err(AttemptFailure::ErrorPage)
            }
            Classification::Invalid => {
                debug!(
                    file = %candidate.file_name(),
                    len = candidate.len(),
                    "candidate is not a plausible subtitle, discarding"
                );
                discard(&candidate).await;
                Err(AttemptFailure::InvalidArtifact)
            }
        }
    }

    /// Polls until the diff against `snapshot` is non-empty or the
    /// per-attempt budget runs out.
    ///
    /// Sleeps before each poll: the interesting event is download
    /// completion and the file needs time to arrive, so an immediate
    /// first listing would only burn the budget.
    async fn poll_for_candidate(
        &self,
        dir: &Path,
        snapshot: &DirectorySnapshot,
    ) -> Option<CandidateFile> {
        for poll in 1..=self.policy.poll_iterations() {
            tokio::time::sleep(self.policy.poll_interval()).await;

            let new_files = match snapshot.new_files(dir).await {
                Ok(files) => files,
                Err(e) => {
                    // Transient listing trouble mid-poll; the budget
                    // bounds how long this can go on.
                    warn!(poll, error = %e, "directory listing failed mid-poll");
                    continue;
                }
            };

            if let Some(candidate) = CandidateFile::newest(new_files) {
                debug!(
                    poll,
                    file = %candidate.file_name(),
                    len = candidate.len(),
                    "picked newest new file"
                );
                return Some(candidate);
            }
        }
        None
    }

    /// Moves a valid candidate onto its canonical name and re-checks it.
    ///
    /// The re-check re-stats the file at its final path and runs the
    /// classifier verdict again, so a file that was still growing (or a
    /// placeholder the browser swapped out mid-rename) is never reported
    /// as done. A re-check failure leaves the renamed file in place: it
    /// already carries the canonical name, and the next attempt's
    /// collision handling replaces it.
    async fn finalize(
        &self,
        dir: &Path,
        candidate: &CandidateFile,
        target: &EpisodeTarget,
    ) -> Result<PathBuf, AttemptFailure> {
        let extension = candidate
            .extension()
            .unwrap_or_else(|| SUBTITLE_EXTENSION.to_string());
        let final_name = target.canonical_filename(&extension);
        let final_path = dir.join(&final_name);

        if let Err(e) = clear_existing(&final_path).await {
            warn!(path = %final_path.display(), error = %e, "could not clear existing canonical file");
            return Err(AttemptFailure::FinalizationRace);
        }

        if let Err(e) = tokio::fs::rename(candidate.path(), &final_path).await {
            warn!(
                from = %candidate.path().display(),
                to = %final_path.display(),
                error = %e,
                "rename failed, candidate may still be in flight"
            );
            return Err(AttemptFailure::FinalizationRace);
        }

        match CandidateFile::probe(&final_path).await {
            Ok(finalized) if self.classifier.classify(&finalized) == Classification::Valid => {
                debug!(file = %final_name, len = finalized.len(), "post-rename check passed");
                Ok(final_path)
            }
            Ok(finalized) => {
                warn!(file = %final_name, len = finalized.len(), "post-rename check failed");
                Err(AttemptFailure::FinalizationRace)
            }
            Err(e) => {
                warn!(file = %final_name, error = %e, "post-rename stat failed");
                Err(AttemptFailure::FinalizationRace)
            }
        }
    }
}

/// Fails fast when the downloads directory is unusable.
async fn validate_directory(dir: &Path) -> Result<(), ReconcileError> {
    match tokio::fs::metadata(dir).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(ReconcileError::directory(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
        )),
        Err(e) => Err(ReconcileError::directory(dir, e)),
    }
}

/// Deletes a rejected candidate. Best-effort by contract: the only cost
/// of a survivor is that the next attempt's diff sees it again and
/// re-deletes it.
async fn discard(candidate: &CandidateFile) {
    if let Err(e) = tokio::fs::remove_file(candidate.path()).await {
        debug!(
            file = %candidate.file_name(),
            error = %e,
            "could not delete rejected candidate"
        );
    }
}

/// Clears a pre-existing file at the canonical path so a re-download
/// replaces the previous pick.
async fn clear_existing(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "replaced existing canonical file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
