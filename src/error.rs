/// Error types for catalog setup and storage
///
/// Per-asset stage failures are not errors in this sense - they are
/// captured as message strings on the asset record and never abort
/// anything. These variants cover the genuinely fallible plumbing:
/// the database, the filesystem watcher, and startup I/O.

use thiserror::Error;

/// Errors from the catalog and its supporting services
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("coordinator unavailable: {0}")]
    Coordinator(String),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, CatalogError>;
