/// Live filesystem watcher
///
/// Subscribes to OS notifications under the watched root and re-runs
/// the pipeline for affected paths. The notify callback never blocks:
/// it filters, collapses paths that are already pending, and pushes
/// work items onto a bounded queue drained by a pool of workers. Each
/// worker waits out the settle delay before reading, so a storm of
/// notifications for one path costs exactly one reprocessing pass.
///
/// Renames and deletions are logged to the event log and nothing else -
/// catalog records are never reconciled against them, so entries for
/// vanished files go stale on purpose.

pub mod path_locks;

use notify::event::ModifyKind;
use notify::{
    Config, Event, EventKind as NotifyEventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::pipeline::{self, PipelineContext};
use crate::state::coordinator::UpsertOutcome;
use crate::state::data::{AssetStatus, EventKind};

/// Work queue capacity. The pending set admits one queued item per
/// distinct path, so overflow needs this many paths in flight at once.
const QUEUE_CAPACITY: usize = 512;

/// One queued unit of watcher work
#[derive(Debug, PartialEq, Eq)]
enum WorkItem {
    /// Re-run the full pipeline for this path after the settle delay
    Reprocess(PathBuf),
    /// Append an informational event log entry, nothing else
    LogOnly(EventKind, PathBuf),
}

/// State shared between the notify callback and the worker pool
struct WatchShared {
    ctx: PipelineContext,
    /// Paths with a queued-but-not-yet-started reprocess - the debounce set
    pending: Mutex<HashSet<PathBuf>>,
    settle: Duration,
}

/// A running filesystem subscription.
///
/// Dropping it tears the subscription down; the workers drain the
/// queue and exit once the callback's sender goes with it.
pub struct LiveWatcher {
    _watcher: RecommendedWatcher,
}

impl LiveWatcher {
    /// Subscribe to the root and start the worker pool
    pub fn start(
        ctx: PipelineContext,
        root: &Path,
        settle: Duration,
        workers: usize,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<WorkItem>(QUEUE_CAPACITY);
        let shared = Arc::new(WatchShared {
            ctx,
            pending: Mutex::new(HashSet::new()),
            settle,
        });

        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        for _ in 0..workers.max(1) {
            tokio::spawn(worker_loop(shared.clone(), rx.clone()));
        }

        let callback_shared = shared.clone();
        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| match result {
                Ok(event) => dispatch_event(&callback_shared, &tx, &event),
                Err(e) => callback_shared
                    .ctx
                    .console
                    .error(&format!("Watch error: {}", e)),
            },
            Config::default(),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;

        shared
            .ctx
            .console
            .info(&format!("👀 Watching folder: {}", root.display()));

        Ok(LiveWatcher { _watcher: watcher })
    }
}

/// Translate one notification into queued work. Runs on the notifier's
/// thread, so everything here is non-blocking: set lookups and try_send.
fn dispatch_event(shared: &WatchShared, tx: &mpsc::Sender<WorkItem>, event: &Event) {
    #[derive(Clone, Copy)]
    enum Action {
        Reprocess,
        Log(EventKind),
    }

    let action = match event.kind {
        NotifyEventKind::Create(_) => Action::Reprocess,
        // Renames arrive as Modify(Name) and never trigger reprocessing
        NotifyEventKind::Modify(ModifyKind::Name(_)) => Action::Log(EventKind::FileRenamed),
        NotifyEventKind::Modify(_) => Action::Reprocess,
        NotifyEventKind::Remove(_) => Action::Log(EventKind::FileDeleted),
        _ => return,
    };

    for path in &event.paths {
        let supported = path
            .extension()
            .map(|ext| shared.ctx.classifier.is_supported(&ext.to_string_lossy()))
            .unwrap_or(false);
        if !supported {
            continue;
        }

        let item = match action {
            Action::Reprocess => {
                // Collapse: a path already waiting for its settle delay
                // absorbs every further notification
                let mut pending = shared.pending.lock().unwrap_or_else(|e| e.into_inner());
                if !pending.insert(path.clone()) {
                    continue;
                }
                WorkItem::Reprocess(path.clone())
            }
            Action::Log(kind) => WorkItem::LogOnly(kind, path.clone()),
        };

        if tx.try_send(item).is_err() {
            // Queue full or shutting down - drop the notification, a
            // forced rescan recovers anything missed
            if matches!(action, Action::Reprocess) {
                shared
                    .pending
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(path);
            }
            shared
                .ctx
                .console
                .warn(&format!("Watcher queue full, dropping {}", path.display()));
        }
    }
}

/// Worker: pull items off the shared queue until it closes
async fn worker_loop(
    shared: Arc<WatchShared>,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<WorkItem>>>,
) {
    loop {
        let item = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        match item {
            Some(item) => handle_item(&shared, item).await,
            None => break,
        }
    }
}

/// Apply one unit of watcher work
async fn handle_item(shared: &WatchShared, item: WorkItem) {
    match item {
        WorkItem::Reprocess(path) => {
            // Let the writer finish flushing before reading
            tokio::time::sleep(shared.settle).await;

            // Clear the pending mark first: notifications arriving while
            // we process must queue a fresh pass, which the path lock
            // then serializes behind this one
            shared
                .pending
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&path);

            match pipeline::process_path(&shared.ctx, &path).await {
                Ok(report) => match report.status {
                    AssetStatus::Failed => shared.ctx.console.warn(&format!(
                        "Error processing {}: {}",
                        path.display(),
                        report.error.as_deref().unwrap_or("unknown")
                    )),
                    AssetStatus::Skipped => {}
                    _ => match report.outcome {
                        UpsertOutcome::Inserted => shared
                            .ctx
                            .console
                            .info(&format!("📁 Catalogued {}", path.display())),
                        UpsertOutcome::Updated => shared
                            .ctx
                            .console
                            .info(&format!("🔄 Updated {}", path.display())),
                        UpsertOutcome::Unchanged | UpsertOutcome::Skipped => {}
                    },
                },
                Err(e) => shared
                    .ctx
                    .console
                    .error(&format!("Catalog error for {}: {}", path.display(), e)),
            }
        }
        WorkItem::LogOnly(kind, path) => {
            let message = match kind {
                EventKind::FileDeleted => "File deleted",
                EventKind::FileRenamed => "File renamed",
                _ => "File event",
            };
            let path_str = path.to_string_lossy();
            match shared.ctx.coordinator.log_event(kind, &path_str, message).await {
                Ok(()) => shared
                    .ctx
                    .console
                    .info(&format!("🔔 {}: {}", message, path.display())),
                Err(e) => shared
                    .ctx
                    .console
                    .error(&format!("Failed to log event for {}: {}", path.display(), e)),
            }
        }
    }
}
