//! Directory snapshots and the candidate files their diffs produce.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, trace};

/// A point-in-time set of entry names in the downloads directory.
///
/// Captured immediately before a download is triggered; anything the
/// directory later contains that is absent from the snapshot is a
/// download candidate. The snapshot is immutable once captured: every
/// re-diff compares against the original capture, so a candidate that
/// appeared during one attempt and survived deletion shows up again in
/// the next attempt and gets re-examined.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    names: HashSet<OsString>,
}

impl DirectorySnapshot {
    /// Captures the current entry names of `dir`.
    ///
    /// Only names are recorded; sizes and timestamps of pre-existing
    /// files are irrelevant because they can never become candidates.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when `dir` cannot be read.
    pub async fn capture(dir: &Path) -> io::Result<Self> {
        let mut names = HashSet::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            names.insert(entry.file_name());
        }
        trace!(dir = %dir.display(), entries = names.len(), "captured directory snapshot");
        Ok(Self { names })
    }

    /// Whether `name` was present at capture time.
    #[must_use]
    pub fn contains(&self, name: &OsStr) -> bool {
        self.names.contains(name)
    }

    /// Number of entries recorded at capture time.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the directory was empty at capture time.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Diffs the live directory against this snapshot.
    ///
    /// Every entry not present at capture time is stat'ed and returned.
    /// Entries that vanish between listing and stat are skipped without
    /// error (browsers rename their temporary files mid-download), as
    /// are non-file entries.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when `dir` cannot be listed.
    pub async fn new_files(&self, dir: &Path) -> io::Result<Vec<CandidateFile>> {
        let mut found = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if self.names.contains(&name) {
                continue;
            }
            match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => {
                    found.push(CandidateFile::from_metadata(entry.path(), &metadata));
                }
                Ok(_) => {
                    trace!(name = ?name, "ignoring new non-file entry");
                }
                Err(e) => {
                    trace!(name = ?name, error = %e, "new entry vanished before stat, skipping");
                }
            }
        }
        if !found.is_empty() {
            debug!(dir = %dir.display(), new_files = found.len(), "found entries not in snapshot");
        }
        Ok(found)
    }
}

/// A file that appeared in the downloads directory after the snapshot.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    path: PathBuf,
    len: u64,
    created: SystemTime,
}

impl CandidateFile {
    /// Builds a candidate from explicit stat data.
    ///
    /// Useful for exercising [`CandidateClassifier`] implementations
    /// without touching the filesystem.
    ///
    /// [`CandidateClassifier`]: super::CandidateClassifier
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, len: u64, created: SystemTime) -> Self {
        Self {
            path: path.into(),
            len,
            created,
        }
    }

    /// Builds a candidate from an already-fetched stat result.
    ///
    /// Creation time is unavailable on some filesystems; modification
    /// time stands in for it there, and orders same-burst arrivals just
    /// as well.
    pub(crate) fn from_metadata(path: PathBuf, metadata: &std::fs::Metadata) -> Self {
        let created = metadata
            .created()
            .or_else(|_| metadata.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        Self {
            path,
            len: metadata.len(),
            created,
        }
    }

    /// Stats `path` and builds a candidate from the result.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when `path` cannot be stat'ed.
    pub async fn probe(path: &Path) -> io::Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        Ok(Self::from_metadata(path.to_path_buf(), &metadata))
    }

    /// Location of the candidate.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes at stat time.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the file was empty at stat time.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Creation (or fallback modification) timestamp.
    #[must_use]
    pub fn created(&self) -> SystemTime {
        self.created
    }

    /// File name as lossy UTF-8, for token matching and logging.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Lowercased extension without the leading dot, when present.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    /// Picks the most recently created of `candidates`.
    ///
    /// Ties are broken arbitrarily; in practice a single download burst
    /// produces distinct timestamps.
    #[must_use]
    pub fn newest(candidates: Vec<CandidateFile>) -> Option<CandidateFile> {
        candidates.into_iter().max_by_key(|c| c.created)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn candidate(name: &str, created_offset_secs: u64) -> CandidateFile {
        CandidateFile::new(
            name,
            0,
            SystemTime::UNIX_EPOCH + Duration::from_secs(created_offset_secs),
        )
    }

    // ==================== Snapshot Capture Tests ====================

    #[tokio::test]
    async fn test_capture_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = DirectorySnapshot::capture(dir.path()).await.unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.len(), 0);
    }

    #[tokio::test]
    async fn test_capture_records_existing_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("already-here.srt"), b"x").unwrap();
        std::fs::write(dir.path().join("other.txt"), b"y").unwrap();

        let snapshot = DirectorySnapshot::capture(dir.path()).await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains(OsStr::new("already-here.srt")));
        assert!(snapshot.contains(OsStr::new("other.txt")));
        assert!(!snapshot.contains(OsStr::new("missing.srt")));
    }

    #[tokio::test]
    async fn test_capture_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("nope");
        let result = DirectorySnapshot::capture(&gone).await;
        assert!(result.is_err());
    }

    // ==================== Diff Tests ====================

    #[tokio::test]
    async fn test_new_files_empty_when_nothing_changed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stale.srt"), b"x").unwrap();

        let snapshot = DirectorySnapshot::capture(dir.path()).await.unwrap();
        let new = snapshot.new_files(dir.path()).await.unwrap();
        assert!(new.is_empty());
    }

    #[tokio::test]
    async fn test_new_files_reports_only_additions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stale.srt"), b"x").unwrap();

        let snapshot = DirectorySnapshot::capture(dir.path()).await.unwrap();
        std::fs::write(dir.path().join("fresh.srt"), b"hello").unwrap();

        let new = snapshot.new_files(dir.path()).await.unwrap();
        assert_eq!(new.len(), 1);
        assert_eq!(new[0].file_name(), "fresh.srt");
        assert_eq!(new[0].len(), 5);
    }

    #[tokio::test]
    async fn test_new_files_ignores_new_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = DirectorySnapshot::capture(dir.path()).await.unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let new = snapshot.new_files(dir.path()).await.unwrap();
        assert!(new.is_empty());
    }

    #[tokio::test]
    async fn test_new_files_repeated_diff_uses_original_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = DirectorySnapshot::capture(dir.path()).await.unwrap();

        std::fs::write(dir.path().join("first.srt"), b"a").unwrap();
        let new = snapshot.new_files(dir.path()).await.unwrap();
        assert_eq!(new.len(), 1);

        // Same baseline on the second diff: first.srt is still reported.
        std::fs::write(dir.path().join("second.srt"), b"b").unwrap();
        let new = snapshot.new_files(dir.path()).await.unwrap();
        assert_eq!(new.len(), 2);
    }

    // ==================== Candidate Tests ====================

    #[tokio::test]
    async fn test_probe_reads_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe-me.srt");
        std::fs::write(&path, vec![0u8; 1234]).unwrap();

        let candidate = CandidateFile::probe(&path).await.unwrap();
        assert_eq!(candidate.len(), 1234);
        assert!(!candidate.is_empty());
        assert_eq!(candidate.file_name(), "probe-me.srt");
    }

    #[test]
    fn test_extension_is_lowercased() {
        let c = CandidateFile::new("Episode.SRT", 0, SystemTime::UNIX_EPOCH);
        assert_eq!(c.extension().as_deref(), Some("srt"));
    }

    #[test]
    fn test_extension_absent() {
        let c = CandidateFile::new("no-extension", 0, SystemTime::UNIX_EPOCH);
        assert_eq!(c.extension(), None);
    }

    // ==================== Newest Selection Tests ====================

    #[test]
    fn test_newest_of_none() {
        assert!(CandidateFile::newest(Vec::new()).is_none());
    }

    #[test]
    fn test_newest_picks_latest_created() {
        let picked = CandidateFile::newest(vec![
            candidate("old.srt", 10),
            candidate("newest.srt", 30),
            candidate("middle.srt", 20),
        ])
        .unwrap();
        assert_eq!(picked.file_name(), "newest.srt");
    }

    #[test]
    fn test_newest_single_candidate() {
        let picked = CandidateFile::newest(vec![candidate("only.srt", 5)]).unwrap();
        assert_eq!(picked.file_name(), "only.srt");
    }
}
