//! Subgrab Core Library
//!
//! This library provides the core functionality for the subgrab tool,
//! which turns browser-triggered subtitle downloads into canonically
//! named per-episode files: it detects the newly arrived file in a
//! downloads directory, weeds out error pages and partial artifacts,
//! and renames the survivor to `{Show}.S{ss}E{ee}.{ext}`.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`reconcile`] - Snapshot/diff detection, candidate classification
//!   and the bounded-retry reconciliation engine
//! - [`naming`] - Show-name sanitization and canonical episode filenames
//! - [`driver`] - The page-driver boundary onto whatever triggers the
//!   actual downloads (browser automation, or a human)
//! - [`season`] - Sequential per-season orchestration over a page driver

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod driver;
pub mod naming;
pub mod reconcile;
pub mod season;

// Re-export commonly used types
pub use driver::{DriverError, EpisodeRef, ManualDriver, PageDriver};
pub use naming::{EpisodeTarget, sanitize_show_name};
pub use reconcile::{
    CandidateClassifier, CandidateFile, Classification, DEFAULT_MAX_RETRIES,
    DEFAULT_POLL_ITERATIONS, DirectorySnapshot, ReconcileError, ReconcilePolicy, Reconciler,
    SubtitleHeuristics,
};
pub use season::{EpisodeOutcome, EpisodeStatus, SeasonDownloader, SeasonError, SeasonReport};
