//! Show-name sanitization and canonical episode filenames.
//!
//! A finalized subtitle is named `{Show}.S{ss}E{ee}.{ext}`: the show
//! words joined with dots, season and episode zero-padded to at least
//! two digits. The canonical name is what media players and library
//! managers match subtitles against, so it is deterministic for a given
//! target regardless of what the server called the download.

use std::fmt;

/// Replaces filesystem-hostile characters and joins the show's words
/// with dots (`"The Office"` → `"The.Office"`).
///
/// Idempotent: an already-sanitized name passes through unchanged.
/// An empty or all-junk name collapses to `"_"` so the result is always
/// a usable filename component.
#[must_use]
pub fn sanitize_show_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let joined = cleaned.split_whitespace().collect::<Vec<_>>().join(".");
    if joined.is_empty() {
        return "_".to_string();
    }
    joined
}

/// The episode a reconciliation is finalizing toward.
///
/// Carries the sanitized show name and the season/episode ordinals;
/// formatting into the canonical filename happens here so every caller
/// produces the identical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeTarget {
    show: String,
    season: u32,
    episode: u32,
}

impl EpisodeTarget {
    /// Creates a target, sanitizing `show` on the way in.
    #[must_use]
    pub fn new(show: impl AsRef<str>, season: u32, episode: u32) -> Self {
        Self {
            show: sanitize_show_name(show.as_ref()),
            season,
            episode,
        }
    }

    /// Sanitized show name.
    #[must_use]
    pub fn show(&self) -> &str {
        &self.show
    }

    /// Season ordinal.
    #[must_use]
    pub fn season(&self) -> u32 {
        self.season
    }

    /// Episode ordinal.
    #[must_use]
    pub fn episode(&self) -> u32 {
        self.episode
    }

    /// Canonical filename for this target with the given extension
    /// (supplied without the dot).
    ///
    /// Zero-padding is a minimum width: ordinals of 100 and above render
    /// in full (`S100E101`), never truncated.
    #[must_use]
    pub fn canonical_filename(&self, extension: &str) -> String {
        format!(
            "{}.S{:02}E{:02}.{}",
            self.show, self.season, self.episode, extension
        )
    }
}

impl fmt::Display for EpisodeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.S{:02}E{:02}", self.show, self.season, self.episode)
    }
}
