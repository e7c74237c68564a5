/// Change-detection / upsert coordinator
///
/// The catalog's single writer. Pipeline workers never touch the
/// database: they send terminal runs over a channel, and one dedicated
/// blocking task owning the Library applies the insert / no-op / update
/// decision and appends event log entries. Callers may assume
/// read-own-writes only after their acknowledgement arrives.
///
/// Bulk scans and watcher reprocessing share this exact code path -
/// there is no separate "one file" variant.

use tokio::sync::{mpsc, oneshot};

use super::data::{AssetEvent, AssetRecord, AssetStatus, EventKind, LibraryStats, PipelineRun};
use super::library::Library;
use crate::error::{CatalogError, Result};

/// Outcome of reconciling one pipeline run against the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First time this path was seen - record inserted, FileDiscovered logged
    Inserted,
    /// Fingerprint identical - nothing written, nothing logged
    Unchanged,
    /// Fingerprint differs - record updated in place, FileUpdated logged
    Updated,
    /// Unsupported extension - no catalog write at all
    Skipped,
}

/// Commands consumed by the coordinator task
enum Command {
    Reconcile {
        run: PipelineRun,
        reply: oneshot::Sender<Result<UpsertOutcome>>,
    },
    LogEvent {
        kind: EventKind,
        path: String,
        message: String,
        reply: oneshot::Sender<Result<()>>,
    },
    GetAsset {
        path: String,
        reply: oneshot::Sender<Result<Option<AssetRecord>>>,
    },
    RecentEvents {
        limit: usize,
        reply: oneshot::Sender<Result<Vec<AssetEvent>>>,
    },
    Stats {
        reply: oneshot::Sender<Result<LibraryStats>>,
    },
}

/// Cloneable handle to the coordinator task
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<Command>,
}

/// Spawn the coordinator task that owns the Library.
///
/// The task drains its channel until every handle is dropped, then
/// closes the database with it.
pub fn spawn(library: Library) -> CoordinatorHandle {
    let (tx, mut rx) = mpsc::channel::<Command>(256);

    tokio::task::spawn_blocking(move || {
        while let Some(command) = rx.blocking_recv() {
            match command {
                Command::Reconcile { run, reply } => {
                    let _ = reply.send(reconcile(&library, &run));
                }
                Command::LogEvent {
                    kind,
                    path,
                    message,
                    reply,
                } => {
                    let result = library.append_event(kind, &path, &message).map(|_| ());
                    let _ = reply.send(result);
                }
                Command::GetAsset { path, reply } => {
                    let _ = reply.send(library.get_asset(&path));
                }
                Command::RecentEvents { limit, reply } => {
                    let _ = reply.send(library.recent_events(limit));
                }
                Command::Stats { reply } => {
                    let _ = reply.send(library.stats());
                }
            }
        }
    });

    CoordinatorHandle { tx }
}

/// Decide and apply the catalog outcome for one terminal pipeline run.
///
/// Lookup is by path (identity key); the comparison is by fingerprint
/// (content key). The two are never conflated: a path collision means
/// the same logical asset, a fingerprint difference means new content.
pub fn reconcile(library: &Library, run: &PipelineRun) -> Result<UpsertOutcome> {
    // An intentional skip leaves no trace beyond the run itself
    if run.status == AssetStatus::Skipped {
        return Ok(UpsertOutcome::Skipped);
    }

    let path = run.path.to_string_lossy().to_string();

    match library.get_asset(&path)? {
        None => {
            library.insert_asset(run)?;
            library.append_event(
                EventKind::FileDiscovered,
                &path,
                &format!("Discovered new {} asset", run.category.as_str()),
            )?;
            Ok(UpsertOutcome::Inserted)
        }
        Some(existing) => {
            if existing.fingerprint == run.fingerprint {
                // Unchanged content is never rewritten or re-logged
                Ok(UpsertOutcome::Unchanged)
            } else {
                library.update_asset(run)?;
                library.append_event(
                    EventKind::FileUpdated,
                    &path,
                    &format!("Content changed ({} bytes)", run.size),
                )?;
                Ok(UpsertOutcome::Updated)
            }
        }
    }
}

impl CoordinatorHandle {
    /// Reconcile a terminal pipeline run into the catalog.
    /// Resolves once the write (if any) has been applied.
    pub async fn reconcile(&self, run: PipelineRun) -> Result<UpsertOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Reconcile { run, reply }).await?;
        self.receive(rx).await?
    }

    /// Append an informational entry to the event log.
    /// Used for rename/delete notifications, which never touch records.
    pub async fn log_event(&self, kind: EventKind, path: &str, message: &str) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::LogEvent {
            kind,
            path: path.to_string(),
            message: message.to_string(),
            reply,
        })
        .await?;
        self.receive(rx).await?
    }

    /// Look up one catalog record by path
    pub async fn get_asset(&self, path: &str) -> Result<Option<AssetRecord>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::GetAsset {
            path: path.to_string(),
            reply,
        })
        .await?;
        self.receive(rx).await?
    }

    /// Most recent event log entries, newest first
    pub async fn recent_events(&self, limit: usize) -> Result<Vec<AssetEvent>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::RecentEvents { limit, reply }).await?;
        self.receive(rx).await?
    }

    /// Aggregate catalog statistics
    pub async fn stats(&self) -> Result<LibraryStats> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Stats { reply }).await?;
        self.receive(rx).await?
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| CatalogError::Coordinator("channel closed".to_string()))
    }

    async fn receive<T>(&self, rx: oneshot::Receiver<T>) -> Result<T> {
        rx.await
            .map_err(|_| CatalogError::Coordinator("task exited".to_string()))
    }
}
