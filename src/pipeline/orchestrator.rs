/// Per-asset pipeline orchestrator
///
/// Runs a single asset through the stage sequence
/// Discovered → Validating → {Skipped | Failed | Hashing} →
/// MetadataExtraction → Completed and returns the terminal run record.
/// Failure is always local to the asset: every terminal state still
/// carries full timestamp and elapsed-time bookkeeping.

use crate::pipeline::classifier::Classifier;
use crate::pipeline::{fingerprint, metadata};
use crate::state::data::{AssetCategory, AssetStatus, PipelineRun};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Process one asset on the blocking pool
///
/// File reads and hashing are blocking work, so the whole pass runs
/// under spawn_blocking (one unit of work per asset - a slow file only
/// ever blocks itself).
pub async fn process_asset(classifier: &Classifier, path: PathBuf) -> PipelineRun {
    let classifier = classifier.clone();
    let fallback_path = path.clone();

    match tokio::task::spawn_blocking(move || process_asset_blocking(&classifier, &path)).await {
        Ok(run) => run,
        Err(e) => {
            // Worker panicked or was cancelled - surface it as a normal
            // per-asset failure rather than taking the caller down
            let mut run = PipelineRun::discovered(&fallback_path);
            run.status = AssetStatus::Failed;
            run.error = Some(format!("Task join error: {}", e));
            run.processed_at = Some(Utc::now().timestamp());
            run
        }
    }
}

/// Blocking implementation of the per-asset pipeline
pub fn process_asset_blocking(classifier: &Classifier, path: &Path) -> PipelineRun {
    let started = Instant::now();

    // Discovered
    let mut run = PipelineRun::discovered(path);

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let classification = classifier.classify(&extension);
    run.category = classification.category;
    run.mime_hint = classification.mime_hint.to_string();

    // Validating
    run.status = AssetStatus::Processing;

    if !classification.supported {
        // Intentional skip, not an error - no fingerprint, no event
        run.status = AssetStatus::Skipped;
        run.elapsed_ms = started.elapsed().as_millis() as i64;
        return run;
    }

    if !path.exists() {
        return fail(run, "File not found".to_string(), started);
    }

    match std::fs::metadata(path) {
        Ok(meta) => {
            run.size = meta.len() as i64;
            run.modified_at = meta
                .modified()
                .map(system_time_secs)
                .unwrap_or(run.discovered_at);
            run.created_at = meta
                .created()
                .map(system_time_secs)
                .unwrap_or(run.modified_at);
        }
        Err(e) => return fail(run, e.to_string(), started),
    }

    // Hashing
    match fingerprint::fingerprint_file(path) {
        Ok(fp) => run.fingerprint = Some(fp),
        Err(message) => return fail(run, message, started),
    }

    // MetadataExtraction - images only, and it can never fail the asset:
    // an unreadable header just leaves the dimensions unset
    if run.category == AssetCategory::Image {
        if let Some((width, height)) =
            metadata::read_image_dimensions_from_file(path, &extension)
        {
            run.width = Some(width);
            run.height = Some(height);
        }
    }

    // Completed
    run.status = AssetStatus::Completed;
    run.processed_at = Some(Utc::now().timestamp());
    run.elapsed_ms = started.elapsed().as_millis() as i64;
    run
}

/// Terminate a run as Failed, keeping the timestamp bookkeeping intact
fn fail(mut run: PipelineRun, message: String, started: Instant) -> PipelineRun {
    run.status = AssetStatus::Failed;
    run.error = Some(message);
    run.processed_at = Some(Utc::now().timestamp());
    run.elapsed_ms = started.elapsed().as_millis() as i64;
    run
}

/// Unix seconds from a filesystem timestamp
fn system_time_secs(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(_) => 0,
    }
}

impl PipelineRun {
    /// Fresh run in the Discovered state for a path
    pub fn discovered(path: &Path) -> Self {
        PipelineRun {
            path: path.to_path_buf(),
            filename: path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            category: AssetCategory::Other,
            mime_hint: String::new(),
            status: AssetStatus::Pending,
            size: 0,
            fingerprint: None,
            created_at: 0,
            modified_at: 0,
            discovered_at: Utc::now().timestamp(),
            processed_at: None,
            elapsed_ms: 0,
            error: None,
            width: None,
            height: None,
        }
    }
}
