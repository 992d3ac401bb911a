//! The page-driver boundary: whatever actually triggers the downloads.
//!
//! The reconciler only watches the filesystem; something else clicks the
//! download button. That something implements [`PageDriver`] — a browser
//! automation layer in a full deployment, a scripted double in tests, or
//! [`ManualDriver`] when the human at the keyboard is the automation.
//!
//! # Architecture
//!
//! - [`PageDriver`] - Async trait the season engine drives episodes through
//! - [`EpisodeRef`] - One selectable episode, with its on-page label
//! - [`ManualDriver`] - Built-in driver for the human-in-a-browser workflow
//!
//! The error banner is an advisory signal: a driver that can see the
//! page may report a visible failure message so a round can fail fast,
//! but the filesystem classification stays authoritative either way.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;

/// Regex pattern for the episode ordinal inside a localized label.
/// Matches the first decimal run ("פרק 7" and "Episode 7" both yield 7).
#[allow(clippy::expect_used)]
static ORDINAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+").expect("ordinal regex is valid") // Static pattern, safe to panic
});

/// Errors surfaced by a page driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The download trigger could not be fired (element missing, click
    /// rejected, navigation dead).
    #[error("download trigger failed: {message}")]
    Trigger {
        /// Driver-specific description of what went wrong.
        message: String,
    },

    /// The page state could not be read (listing episodes, selecting,
    /// checking the banner).
    #[error("page state unavailable: {message}")]
    Page {
        /// Driver-specific description of what went wrong.
        message: String,
    },
}

impl DriverError {
    /// Creates a trigger failure.
    pub fn trigger(message: impl Into<String>) -> Self {
        Self::Trigger {
            message: message.into(),
        }
    }

    /// Creates a page-state failure.
    pub fn page(message: impl Into<String>) -> Self {
        Self::Page {
            message: message.into(),
        }
    }
}

/// One selectable episode on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRef {
    /// Episode ordinal within the season.
    pub number: u32,
    /// The label as it appears on the page (kept for logs).
    pub label: String,
}

impl EpisodeRef {
    /// Creates an episode reference.
    #[must_use]
    pub fn new(number: u32, label: impl Into<String>) -> Self {
        Self {
            number,
            label: label.into(),
        }
    }

    /// Parses the ordinal out of a localized on-page label.
    ///
    /// Returns `None` when the label carries no number, or the number
    /// does not fit in `u32`.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let ordinal = ORDINAL_PATTERN.find(label)?;
        let number = ordinal.as_str().parse::<u32>().ok()?;
        Some(Self::new(number, label))
    }
}

/// Trait the season engine drives downloads through.
///
/// Implementations wrap whatever controls the page: a headless browser,
/// a remote-control protocol, or nothing at all when a human does the
/// clicking. All calls are made sequentially by the engine; drivers do
/// not need interior queuing.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via
/// `Box<dyn PageDriver>`. Rust 2024 native async traits are not
/// object-safe, so `async_trait` is required for driver injection.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Returns the driver's name (e.g., "manual", "headless"), for logs.
    fn name(&self) -> &str;

    /// Lists the episodes selectable on the current season page.
    async fn episodes(&self) -> Result<Vec<EpisodeRef>, DriverError>;

    /// Brings the given episode's page into a downloadable state.
    async fn select_episode(&self, episode: u32) -> Result<(), DriverError>;

    /// Fires the download for the currently selected episode.
    async fn trigger_download(&self) -> Result<(), DriverError>;

    /// Whether the page currently shows a download-failure banner.
    ///
    /// Advisory: drivers that cannot see the page should return
    /// `Ok(false)` and let the filesystem classification decide.
    async fn has_error_banner(&self) -> Result<bool, DriverError>;
}

/// Driver for the human-in-a-browser workflow.
///
/// The operator keeps a real browser open next to the tool and performs
/// the clicks; the driver's job reduces to synthesizing the episode list
/// so the engine can pace the season. Selection and triggering are
/// no-ops (the human is ahead of us) and the banner is never visible
/// from here.
#[derive(Debug, Clone)]
pub struct ManualDriver {
    episode_count: u32,
}

impl ManualDriver {
    /// Creates a manual driver expecting `episode_count` downloads.
    #[must_use]
    pub fn new(episode_count: u32) -> Self {
        Self { episode_count }
    }
}

#[async_trait]
impl PageDriver for ManualDriver {
    fn name(&self) -> &str {
        "manual"
    }

    async fn episodes(&self) -> Result<Vec<EpisodeRef>, DriverError> {
        Ok((1..=self.episode_count)
            .map(|n| EpisodeRef::new(n, format!("Episode {n}")))
            .collect())
    }

    async fn select_episode(&self, _episode: u32) -> Result<(), DriverError> {
        Ok(())
    }

    async fn trigger_download(&self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn has_error_banner(&self) -> Result<bool, DriverError> {
        Ok(false)
    }
}
