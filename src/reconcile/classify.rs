//! Candidate classification: real subtitle, junk artifact, or error page.

use tracing::trace;

use super::snapshot::CandidateFile;

/// Smallest size a plausible subtitle file can have, in bytes.
///
/// A real per-episode SRT runs tens of kilobytes; anything smaller is a
/// truncated artifact or a wrapped server response.
pub const MIN_SUBTITLE_BYTES: u64 = 10_000;

/// Largest size a served error page is expected to have, in bytes.
pub const ERROR_PAGE_MAX_BYTES: u64 = 100;

/// Extension a finalized subtitle is expected to carry, without the dot.
pub const SUBTITLE_EXTENSION: &str = "srt";

/// Filename fragments that mark a served error document.
///
/// The Hebrew tokens are the upstream site's "failed" and "error"
/// strings as they end up in generated filenames.
const ERROR_NAME_TOKENS: &[&str] = &["נכשלה", "שגיאה", "error"];

/// Verdict on a single download candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Plausible subtitle; safe to finalize.
    Valid,
    /// Wrong shape for a subtitle (extension or size); delete and retry.
    Invalid,
    /// Server error page dressed up as a download; delete and retry.
    ErrorPage,
}

/// Capability interface deciding what a download candidate is.
///
/// The reconciler holds the classifier as a trait object, so the rule
/// set can be swapped without touching the detection loop: a stricter
/// rule for archival use, a permissive one in tests.
///
/// Classification works from stat data and the filename alone; file
/// contents are never read. Implementations must be `Send + Sync`
/// because the classifier is held across await points.
pub trait CandidateClassifier: Send + Sync {
    /// Classifies `candidate`.
    fn classify(&self, candidate: &CandidateFile) -> Classification;
}

/// Default classifier: size thresholds plus error-token name matching.
///
/// The error check runs before the validity check, so a 50-byte `.srt`
/// is an [`Classification::ErrorPage`], not merely invalid.
#[derive(Debug, Clone)]
pub struct SubtitleHeuristics {
    error_page_max_bytes: u64,
    min_subtitle_bytes: u64,
    extension: String,
    error_tokens: Vec<String>,
}

impl SubtitleHeuristics {
    /// Creates the heuristics with the stock thresholds and tokens.
    #[must_use]
    pub fn new() -> Self {
        Self {
            error_page_max_bytes: ERROR_PAGE_MAX_BYTES,
            min_subtitle_bytes: MIN_SUBTITLE_BYTES,
            extension: SUBTITLE_EXTENSION.to_string(),
            error_tokens: ERROR_NAME_TOKENS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Overrides both size thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, error_page_max_bytes: u64, min_subtitle_bytes: u64) -> Self {
        self.error_page_max_bytes = error_page_max_bytes;
        self.min_subtitle_bytes = min_subtitle_bytes;
        self
    }

    /// Overrides the accepted extension (compared case-insensitively,
    /// supplied without the dot).
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().to_lowercase();
        self
    }

    /// Overrides the error-token list. Matching stays case-insensitive.
    #[must_use]
    pub fn with_error_tokens(mut self, tokens: Vec<String>) -> Self {
        self.error_tokens = tokens.into_iter().map(|t| t.to_lowercase()).collect();
        self
    }

    /// Whether the candidate looks like a served error page: tiny, or
    /// named after a failure message.
    fn is_error_page(&self, candidate: &CandidateFile) -> bool {
        if candidate.len() < self.error_page_max_bytes {
            return true;
        }
        let name = candidate.file_name().to_lowercase();
        self.error_tokens.iter().any(|token| name.contains(token.as_str()))
    }

    /// Whether the candidate has the right extension and enough bytes to
    /// plausibly hold an episode's worth of subtitles.
    fn is_plausible_subtitle(&self, candidate: &CandidateFile) -> bool {
        let extension_ok = candidate
            .extension()
            .is_some_and(|ext| ext == self.extension);
        extension_ok && candidate.len() >= self.min_subtitle_bytes
    }
}

impl Default for SubtitleHeuristics {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateClassifier for SubtitleHeuristics {
    fn classify(&self, candidate: &CandidateFile) -> Classification {
        let verdict = if self.is_error_page(candidate) {
            Classification::ErrorPage
        } else if self.is_plausible_subtitle(candidate) {
            Classification::Valid
        } else {
            Classification::Invalid
        };
        trace!(
            file = %candidate.file_name(),
            len = candidate.len(),
            ?verdict,
            "classified candidate"
        );
        verdict
    }
}
