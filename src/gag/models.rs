use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Prefix of the public page of a post, used when reporting failures.
const POST_URL_PREFIX: &str = "https://9gag.com/gag/";

/// The export table a post was listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceCategory {
    Upvoted,
    Saved,
}

impl SourceCategory {
    /// The `<h3>` text that introduces this category's table in the export.
    pub fn heading(self) -> &'static str {
        match self {
            SourceCategory::Upvoted => "Upvotes",
            SourceCategory::Saved => "Saved",
        }
    }
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceCategory::Upvoted => write!(f, "upvoted"),
            SourceCategory::Saved => write!(f, "saved"),
        }
    }
}

/// A single post read from the export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    id: String,
    title: String,
    source_category: SourceCategory,
}

impl PostRecord {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        source_category: SourceCategory,
    ) -> Self {
        PostRecord {
            id: id.into(),
            title: title.into(),
            source_category,
        }
    }

    /// The opaque identifier the host assigned to the post.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn source_category(&self) -> SourceCategory {
        self.source_category
    }

    /// Public page of the post on 9GAG.
    pub fn post_url(&self) -> String {
        format!("{}{}", POST_URL_PREFIX, self.id)
    }
}

/// Kind of media a post resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// Kinds in the order the resolver tries them.
    pub const RESOLUTION_ORDER: [MediaKind; 2] = [MediaKind::Video, MediaKind::Image];

    /// Name of the folder under `gags/` that holds this kind.
    pub fn directory_name(self) -> &'static str {
        match self {
            MediaKind::Video => "videos",
            MediaKind::Image => "images",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Video => write!(f, "Video"),
            MediaKind::Image => write!(f, "Image"),
        }
    }
}

/// How a single record ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    Downloaded,
    AlreadyCached,
    Failed,
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadStatus::Downloaded => write!(f, "downloaded"),
            DownloadStatus::AlreadyCached => write!(f, "already downloaded"),
            DownloadStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Result of resolving one [PostRecord].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub record: PostRecord,
    /// `None` when nothing could be downloaded.
    pub media_kind: Option<MediaKind>,
    pub status: DownloadStatus,
    pub stored_path: Option<PathBuf>,
}

impl DownloadOutcome {
    pub fn downloaded(record: PostRecord, kind: MediaKind, path: PathBuf) -> Self {
        DownloadOutcome {
            record,
            media_kind: Some(kind),
            status: DownloadStatus::Downloaded,
            stored_path: Some(path),
        }
    }

    pub fn cached(record: PostRecord, kind: MediaKind, path: PathBuf) -> Self {
        DownloadOutcome {
            record,
            media_kind: Some(kind),
            status: DownloadStatus::AlreadyCached,
            stored_path: Some(path),
        }
    }

    pub fn failed(record: PostRecord) -> Self {
        DownloadOutcome {
            record,
            media_kind: None,
            status: DownloadStatus::Failed,
            stored_path: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == DownloadStatus::Failed
    }
}

/// Whether a run went through every record or was stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    Completed,
    Cancelled,
}

/// Per media kind tally of successful outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KindCounts {
    pub video: usize,
    pub image: usize,
}

impl KindCounts {
    pub fn get(&self, kind: MediaKind) -> usize {
        match kind {
            MediaKind::Video => self.video,
            MediaKind::Image => self.image,
        }
    }

    fn increment(&mut self, kind: MediaKind) {
        match kind {
            MediaKind::Video => self.video += 1,
            MediaKind::Image => self.image += 1,
        }
    }
}

/// Aggregated counts of a download run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Statistics {
    /// Number of records handed to the run.
    pub total: usize,
    /// Number of records actually resolved before the run ended.
    pub processed: usize,
    pub succeeded: usize,
    pub cached: usize,
    pub failed: usize,
    /// Downloaded and cached outcomes by media kind.
    pub by_kind: KindCounts,
    pub status: RunStatus,
}

impl Statistics {
    pub fn new(total: usize) -> Self {
        Statistics {
            total,
            ..Default::default()
        }
    }

    /// Adds a single outcome to the tallies.
    pub fn record(&mut self, outcome: &DownloadOutcome) {
        self.processed += 1;
        match outcome.status {
            DownloadStatus::Downloaded => self.succeeded += 1,
            DownloadStatus::AlreadyCached => self.cached += 1,
            DownloadStatus::Failed => self.failed += 1,
        }
        if let Some(kind) = outcome.media_kind {
            self.by_kind.increment(kind);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == RunStatus::Cancelled
    }

    /// The single end-of-run message shown to the user.
    pub fn summary(&self) -> String {
        let prefix = if self.is_cancelled() {
            format!(
                "Download cancelled after {} of {} gags. ",
                self.processed, self.total
            )
        } else {
            String::new()
        };

        if self.failed == 0 {
            format!(
                "{}All {} gags downloaded successfully!",
                prefix,
                self.succeeded + self.cached
            )
        } else {
            format!(
                "{}Download finished: {} successful, {} cached, {} failed",
                prefix, self.succeeded, self.cached, self.failed
            )
        }
    }
}

/// Emitted by the orchestrator after each record is resolved.
#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent<'a> {
    /// Zero-based position of the record in the run.
    pub index: usize,
    pub total: usize,
    pub title: &'a str,
    pub outcome: &'a DownloadOutcome,
}

impl ProgressEvent<'_> {
    /// Fraction of the run completed once this record is counted.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.index + 1) as f64 / self.total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> PostRecord {
        PostRecord::new(id, "Title", SourceCategory::Upvoted)
    }

    #[test]
    fn test_post_url() {
        assert_eq!(record("aW4nMjA").post_url(), "https://9gag.com/gag/aW4nMjA");
    }

    #[test]
    fn test_statistics_tally() {
        let mut stats = Statistics::new(4);
        stats.record(&DownloadOutcome::downloaded(record("a"), MediaKind::Video, PathBuf::from("a.mp4")));
        stats.record(&DownloadOutcome::cached(record("b"), MediaKind::Image, PathBuf::from("b.jpg")));
        stats.record(&DownloadOutcome::downloaded(record("c"), MediaKind::Image, PathBuf::from("c.jpg")));
        stats.record(&DownloadOutcome::failed(record("d")));

        assert_eq!(stats.processed, 4);
        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.cached, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.by_kind.get(MediaKind::Video), 1);
        assert_eq!(stats.by_kind.get(MediaKind::Image), 2);
    }

    #[test]
    fn test_summary_messages() {
        let mut stats = Statistics::new(3);
        stats.succeeded = 2;
        stats.cached = 1;
        stats.processed = 3;
        assert_eq!(stats.summary(), "All 3 gags downloaded successfully!");

        stats.failed = 1;
        stats.cached = 0;
        assert_eq!(stats.summary(), "Download finished: 2 successful, 0 cached, 1 failed");

        stats.status = RunStatus::Cancelled;
        stats.processed = 2;
        assert_eq!(
            stats.summary(),
            "Download cancelled after 2 of 3 gags. Download finished: 2 successful, 0 cached, 1 failed"
        );
    }

    #[test]
    fn test_progress_fraction() {
        let outcome = DownloadOutcome::failed(record("a"));
        let event = ProgressEvent { index: 1, total: 4, title: "Title", outcome: &outcome };
        assert_eq!(event.fraction(), 0.5);
    }
}
