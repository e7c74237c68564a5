use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use super::data::{
    AssetCategory, AssetEvent, AssetRecord, AssetStatus, CategoryStats, EventKind, LibraryStats,
    PipelineRun,
};
use crate::error::Result;

/// The Library manages the SQLite catalog database.
/// It stores one record per asset path plus the append-only event log.
///
/// The connection is deliberately not shared: all mutation goes through
/// the coordinator, which owns the single Library doing writes.
pub struct Library {
    conn: Connection,
    db_path: PathBuf,
}

impl Library {
    /// Create a new Library instance at the default location and
    /// initialize the database.
    ///
    /// The database file is created in the user's data directory:
    /// - Linux: ~/.local/share/asset-pipeline/catalog.db
    /// - macOS: ~/Library/Application Support/asset-pipeline/catalog.db
    /// - Windows: %APPDATA%\asset-pipeline\catalog.db
    pub fn new() -> Result<Self> {
        Self::open(&Self::default_db_path())
    }

    /// Open (or create) the catalog database at an explicit path
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;

        let mut library = Library {
            conn,
            db_path: db_path.to_path_buf(),
        };
        library.init_schema()?;

        Ok(library)
    }

    /// Open an in-memory catalog (used by tests)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut library = Library {
            conn,
            db_path: PathBuf::from(":memory:"),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Get the default path for the database file
    pub fn default_db_path() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("asset-pipeline");
        path.push("catalog.db");
        path
    }

    /// Initialize the database schema.
    /// Creates all necessary tables and indexes if they don't exist.
    fn init_schema(&mut self) -> Result<()> {
        // One record per asset path. The UNIQUE path column is the
        // identity key; the fingerprint column is the change key.
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS assets (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                path            TEXT NOT NULL UNIQUE,
                filename        TEXT NOT NULL,
                category        TEXT NOT NULL,
                status          TEXT NOT NULL,
                size            INTEGER NOT NULL DEFAULT 0,
                fingerprint     TEXT,
                mime_hint       TEXT NOT NULL DEFAULT '',
                created_at      INTEGER NOT NULL DEFAULT 0,
                modified_at     INTEGER NOT NULL DEFAULT 0,
                discovered_at   INTEGER NOT NULL,
                processed_at    INTEGER,
                elapsed_ms      INTEGER,
                error           TEXT,
                width           INTEGER,
                height          INTEGER,
                thumbnail_path  TEXT
            )",
            [],
        )?;

        // Append-only event log. Rows are inserted by the coordinator
        // and never updated or deleted.
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS events (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                kind            TEXT NOT NULL,
                path            TEXT NOT NULL,
                message         TEXT NOT NULL,
                timestamp       INTEGER NOT NULL
            )",
            [],
        )?;

        // Indexes for the query/reporting side
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_assets_discovered_at
             ON assets(discovered_at DESC)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_assets_status
             ON assets(status)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_assets_category
             ON assets(category)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_events_id
             ON events(id DESC)",
            [],
        )?;

        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Get a count of assets in the catalog
    pub fn asset_count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM assets", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Look up a single asset by its identity key
    pub fn get_asset(&self, path: &str) -> Result<Option<AssetRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {} FROM assets WHERE path = ?1", RECORD_COLUMNS),
                params![path],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Get all assets, newest-discovered first
    pub fn get_all_assets(&self) -> Result<Vec<AssetRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM assets ORDER BY discovered_at DESC, id DESC",
            RECORD_COLUMNS
        ))?;

        let rows = stmt.query_map([], row_to_record)?;

        let mut assets = Vec::new();
        for record in rows {
            assets.push(record?);
        }

        Ok(assets)
    }

    /// Insert a brand-new asset record from a terminal pipeline run.
    /// Returns the new record ID.
    pub fn insert_asset(&self, run: &PipelineRun) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO assets (path, filename, category, status, size, fingerprint,
                                 mime_hint, created_at, modified_at, discovered_at,
                                 processed_at, elapsed_ms, error, width, height)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                run.path.to_string_lossy(),
                run.filename,
                run.category.as_str(),
                run.status.as_str(),
                run.size,
                run.fingerprint,
                run.mime_hint,
                run.created_at,
                run.modified_at,
                run.discovered_at,
                run.processed_at,
                run.elapsed_ms,
                run.error,
                run.width,
                run.height,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Update an existing record in place after a content change.
    ///
    /// The identity key and the original discovered_at are untouchable -
    /// only the mutable processing fields are rewritten.
    pub fn update_asset(&self, run: &PipelineRun) -> Result<()> {
        self.conn.execute(
            "UPDATE assets
             SET status = ?2, size = ?3, fingerprint = ?4, modified_at = ?5,
                 processed_at = ?6, elapsed_ms = ?7, error = ?8,
                 width = ?9, height = ?10
             WHERE path = ?1",
            params![
                run.path.to_string_lossy(),
                run.status.as_str(),
                run.size,
                run.fingerprint,
                run.modified_at,
                run.processed_at,
                run.elapsed_ms,
                run.error,
                run.width,
                run.height,
            ],
        )?;
        Ok(())
    }

    /// Append one entry to the event log
    pub fn append_event(&self, kind: EventKind, path: &str, message: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO events (kind, path, message, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![kind.as_str(), path, message, chrono::Utc::now().timestamp()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get the most recent event log entries, newest first
    pub fn recent_events(&self, limit: usize) -> Result<Vec<AssetEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, path, message, timestamp
             FROM events ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map([limit], |row| {
            let kind: String = row.get(1)?;
            Ok(AssetEvent {
                id: row.get(0)?,
                // Unknown kinds cannot appear: the column is only ever
                // written from EventKind::as_str
                kind: EventKind::parse(&kind).unwrap_or(EventKind::FileDiscovered),
                path: row.get(2)?,
                message: row.get(3)?,
                timestamp: row.get(4)?,
            })
        })?;

        let mut events = Vec::new();
        for event in rows {
            events.push(event?);
        }

        Ok(events)
    }

    /// Get a count of event log entries
    pub fn event_count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Aggregate statistics for the reporting side: totals, averages,
    /// and per-category / per-status breakdowns
    pub fn stats(&self) -> Result<LibraryStats> {
        let (total, total_size): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(size), 0) FROM assets",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let avg_elapsed_ms: f64 = self.conn.query_row(
            "SELECT COALESCE(AVG(elapsed_ms), 0.0) FROM assets WHERE elapsed_ms IS NOT NULL",
            [],
            |row| row.get(0),
        )?;

        let mut by_status = Vec::new();
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM assets GROUP BY status ORDER BY status")?;
        let rows = stmt.query_map([], |row| {
            let status: String = row.get(0)?;
            Ok((AssetStatus::parse(&status), row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            by_status.push(row?);
        }

        let mut by_category = Vec::new();
        let mut categories = Vec::new();
        let mut stmt = self.conn.prepare(
            "SELECT category, COUNT(*), COALESCE(SUM(size), 0),
                    COALESCE(AVG(elapsed_ms), 0.0)
             FROM assets GROUP BY category ORDER BY category",
        )?;
        let rows = stmt.query_map([], |row| {
            let category: String = row.get(0)?;
            Ok(CategoryStats {
                category: AssetCategory::parse(&category),
                count: row.get(1)?,
                total_size: row.get(2)?,
                avg_elapsed_ms: row.get(3)?,
            })
        })?;
        for row in rows {
            let breakdown = row?;
            by_category.push((breakdown.category, breakdown.count));
            categories.push(breakdown);
        }

        let count_for = |status: AssetStatus| {
            by_status
                .iter()
                .find(|(s, _)| *s == status)
                .map(|(_, n)| *n)
                .unwrap_or(0)
        };

        Ok(LibraryStats {
            total,
            completed: count_for(AssetStatus::Completed),
            failed: count_for(AssetStatus::Failed),
            pending: count_for(AssetStatus::Pending) + count_for(AssetStatus::Processing),
            total_size,
            avg_elapsed_ms,
            by_category,
            by_status,
            categories,
        })
    }
}

/// Column list shared by every record SELECT
const RECORD_COLUMNS: &str = "id, path, filename, category, status, size, fingerprint, \
                              mime_hint, created_at, modified_at, discovered_at, \
                              processed_at, elapsed_ms, error, width, height, thumbnail_path";

/// Map one SELECT row to an AssetRecord
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<AssetRecord> {
    let category: String = row.get(3)?;
    let status: String = row.get(4)?;
    Ok(AssetRecord {
        id: row.get(0)?,
        path: row.get(1)?,
        filename: row.get(2)?,
        category: AssetCategory::parse(&category),
        status: AssetStatus::parse(&status),
        size: row.get(5)?,
        fingerprint: row.get(6)?,
        mime_hint: row.get(7)?,
        created_at: row.get(8)?,
        modified_at: row.get(9)?,
        discovered_at: row.get(10)?,
        processed_at: row.get(11)?,
        elapsed_ms: row.get(12)?,
        error: row.get(13)?,
        width: row.get(14)?,
        height: row.get(15)?,
        thumbnail_path: row.get(16)?,
    })
}

/// Reserved thumbnail cache path for a fingerprint
///
/// Nothing renders thumbnails yet - this only fixes the naming scheme so
/// a future generator and the catalog agree on where they would live.
/// Returns ~/.cache/asset-pipeline/thumbnails/<fingerprint>.jpg on Linux.
pub fn thumbnail_slot(fingerprint: &str) -> PathBuf {
    let mut path = dirs::cache_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    path.push("asset-pipeline");
    path.push("thumbnails");
    path.push(format!("{}.jpg", fingerprint));
    path
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}
