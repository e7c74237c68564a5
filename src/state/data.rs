/// Shared data structures for the catalog
///
/// These structs represent the data model that flows between
/// the pipeline, the coordinator, and the database layer.
/// Timestamps are unix seconds (UTC), durations are milliseconds.

use std::path::PathBuf;

/// Asset category derived from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    Image,
    Audio,
    Model,
    Config,
    Script,
    Other,
}

impl AssetCategory {
    /// String form stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Image => "image",
            AssetCategory::Audio => "audio",
            AssetCategory::Model => "model",
            AssetCategory::Config => "config",
            AssetCategory::Script => "script",
            AssetCategory::Other => "other",
        }
    }

    /// Parse the stored string form; unknown values fall back to Other
    pub fn parse(s: &str) -> Self {
        match s {
            "image" => AssetCategory::Image,
            "audio" => AssetCategory::Audio,
            "model" => AssetCategory::Model,
            "config" => AssetCategory::Config,
            "script" => AssetCategory::Script,
            _ => AssetCategory::Other,
        }
    }

    /// All categories, in display order
    pub fn all() -> [AssetCategory; 6] {
        [
            AssetCategory::Image,
            AssetCategory::Audio,
            AssetCategory::Model,
            AssetCategory::Config,
            AssetCategory::Script,
            AssetCategory::Other,
        ]
    }
}

/// Processing status of an asset
///
/// Closed set - the database stores the string form, but nothing outside
/// this enum can ever round-trip through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Skipped,
}

impl AssetStatus {
    /// String form stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Pending => "pending",
            AssetStatus::Processing => "processing",
            AssetStatus::Completed => "completed",
            AssetStatus::Failed => "failed",
            AssetStatus::Skipped => "skipped",
        }
    }

    /// Parse the stored string form; unknown values fall back to Pending
    pub fn parse(s: &str) -> Self {
        match s {
            "processing" => AssetStatus::Processing,
            "completed" => AssetStatus::Completed,
            "failed" => AssetStatus::Failed,
            "skipped" => AssetStatus::Skipped,
            _ => AssetStatus::Pending,
        }
    }
}

/// Kind of an event log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    FileDiscovered,
    FileUpdated,
    FileRenamed,
    FileDeleted,
}

impl EventKind {
    /// String form stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::FileDiscovered => "file_discovered",
            EventKind::FileUpdated => "file_updated",
            EventKind::FileRenamed => "file_renamed",
            EventKind::FileDeleted => "file_deleted",
        }
    }

    /// Parse the stored string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "file_discovered" => Some(EventKind::FileDiscovered),
            "file_updated" => Some(EventKind::FileUpdated),
            "file_renamed" => Some(EventKind::FileRenamed),
            "file_deleted" => Some(EventKind::FileDeleted),
            _ => None,
        }
    }
}

/// Represents a single asset in the catalog
///
/// Exactly one record exists per absolute path. The path is the identity
/// key (stable across reprocessing), the fingerprint is the change-detection
/// key - the two are never conflated.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRecord {
    /// Unique database ID
    pub id: i64,
    /// Absolute path - the identity key
    pub path: String,
    /// Filename only (e.g., "hero.png")
    pub filename: String,
    /// Category derived from the extension
    pub category: AssetCategory,
    /// Current processing status
    pub status: AssetStatus,
    /// File size in bytes at last processing
    pub size: i64,
    /// Content fingerprint (None until hashing succeeded at least once)
    pub fingerprint: Option<String>,
    /// MIME hint from the classifier
    pub mime_hint: String,
    /// Filesystem creation time
    pub created_at: i64,
    /// Filesystem modification time at last processing
    pub modified_at: i64,
    /// When this path first entered the catalog - never changes afterwards
    pub discovered_at: i64,
    /// When the last processing pass finished
    pub processed_at: Option<i64>,
    /// Wall-clock duration of the last processing pass
    pub elapsed_ms: Option<i64>,
    /// Error detail captured from the last failed pass
    pub error: Option<String>,
    /// Image width in pixels (images only, 0 when the header was unreadable)
    pub width: Option<u32>,
    /// Image height in pixels (images only)
    pub height: Option<u32>,
    /// Reserved thumbnail cache path (nothing renders it yet)
    pub thumbnail_path: Option<String>,
}

/// One append-only entry in the event log
///
/// Entries are written once by the coordinator and never updated or
/// deleted. They exist for audit/monitoring, not catalog reconstruction.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetEvent {
    /// Unique database ID
    pub id: i64,
    /// What happened
    pub kind: EventKind,
    /// Path the event refers to
    pub path: String,
    /// Human-readable detail
    pub message: String,
    /// When the event was recorded
    pub timestamp: i64,
}

/// In-memory working record for a single pass through the orchestrator
///
/// Becomes (or updates) an AssetRecord only after the coordinator accepts it.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    pub path: PathBuf,
    pub filename: String,
    pub category: AssetCategory,
    pub mime_hint: String,
    pub status: AssetStatus,
    pub size: i64,
    pub fingerprint: Option<String>,
    pub created_at: i64,
    pub modified_at: i64,
    pub discovered_at: i64,
    pub processed_at: Option<i64>,
    pub elapsed_ms: i64,
    pub error: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Aggregate statistics over the whole catalog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryStats {
    pub total: i64,
    pub completed: i64,
    pub failed: i64,
    pub pending: i64,
    pub total_size: i64,
    pub avg_elapsed_ms: f64,
    /// Record counts grouped by category
    pub by_category: Vec<(AssetCategory, i64)>,
    /// Record counts grouped by status
    pub by_status: Vec<(AssetStatus, i64)>,
    /// Per-category size and timing breakdowns
    pub categories: Vec<CategoryStats>,
}

/// Size and timing breakdown for one category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    pub category: AssetCategory,
    pub count: i64,
    pub total_size: i64,
    pub avg_elapsed_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            AssetStatus::Pending,
            AssetStatus::Processing,
            AssetStatus::Completed,
            AssetStatus::Failed,
            AssetStatus::Skipped,
        ] {
            assert_eq!(AssetStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn test_unknown_strings_fall_back() {
        assert_eq!(AssetStatus::parse("garbage"), AssetStatus::Pending);
        assert_eq!(AssetCategory::parse("garbage"), AssetCategory::Other);
        assert_eq!(EventKind::parse("garbage"), None);
    }

    #[test]
    fn test_category_round_trip() {
        for category in AssetCategory::all() {
            assert_eq!(AssetCategory::parse(category.as_str()), category);
        }
    }
}
