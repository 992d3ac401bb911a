//! Error types for the reconcile module.
//!
//! Only two things can terminate a reconciliation: a downloads directory
//! that is unusable (configuration, fails fast) and an exhausted attempt
//! budget (everything transient folds into this one). Per-attempt causes
//! are logged, not surfaced.

use std::path::PathBuf;

use thiserror::Error;

/// Terminal errors of a reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The downloads directory is missing, not a directory, or unreadable.
    ///
    /// A configuration problem: retrying cannot fix it, so the
    /// reconciler fails immediately without consuming any attempts.
    #[error("downloads directory {path} is unusable: {source}")]
    Directory {
        /// The directory that failed validation.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Every attempt ended without a finalized subtitle.
    ///
    /// Covers all transient outcomes: no file ever appeared, only error
    /// pages or invalid artifacts showed up, or finalization kept losing
    /// races. The per-attempt detail is in the log.
    #[error("download failed for {target} after {attempts} attempts")]
    Exhausted {
        /// Canonical description of what was being reconciled.
        target: String,
        /// Attempts consumed before giving up.
        attempts: u32,
    },
}

impl ReconcileError {
    /// Creates a directory validation error.
    pub fn directory(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Directory {
            path: path.into(),
            source,
        }
    }

    /// Creates an exhausted-attempts error.
    pub fn exhausted(target: impl Into<String>, attempts: u32) -> Self {
        Self::Exhausted {
            target: target.into(),
            attempts,
        }
    }

    /// Whether the error is the fail-fast configuration kind.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }
}

// Note on From trait implementations:
// We intentionally do NOT implement `From<std::io::Error>` because the
// Directory variant requires the path for context, which the source
// error does not carry. The helper constructors are the pattern here.
