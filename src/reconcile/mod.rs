//! Download reconciliation: detect, classify and finalize arrived files.
//!
//! This module watches a downloads directory the way a human would:
//! remember what was there before the download was triggered, poll until
//! something new shows up, throw away obvious junk (error pages, partial
//! or truncated files), and rename the real subtitle to its canonical
//! episode filename.
//!
//! # Features
//!
//! - Snapshot/diff detection (poll-based on purpose: completion, not
//!   creation, is the event of interest, and browsers create temporary
//!   names first)
//! - Pluggable candidate classification with subtitle heuristics built in
//! - Bounded retries with jittered backoff
//! - Collision-safe finalization (re-download replaces the old file)
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
//! let path = reconciler
//!     .reconcile(Path::new("./downloads"), &target)
//!     .await?;
//! println!("Finalized: {}", path.display());
//! # Ok(())
//! # }
//! ```

mod classify;
mod error;
mod policy;
mod reconciler;
mod snapshot;

pub use classify::{
    CandidateClassifier, Classification, ERROR_PAGE_MAX_BYTES, MIN_SUBTITLE_BYTES,
    SUBTITLE_EXTENSION, SubtitleHeuristics,
};
pub use error::ReconcileError;
pub use policy::{DEFAULT_MAX_RETRIES, DEFAULT_POLL_ITERATIONS, ReconcilePolicy};
pub use reconciler::Reconciler;
pub use snapshot::{CandidateFile, DirectorySnapshot};

// Note: no module-local Result aliases. Use `Result<T, ReconcileError>`
// explicitly in function signatures.
