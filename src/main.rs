use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

// Declare the application modules
mod config;
mod console;
mod error;
mod pipeline;
mod scanner;
mod state;
mod watcher;

use config::PipelineConfig;
use console::ConsoleSink;
use pipeline::classifier::Classifier;
use pipeline::PipelineContext;
use scanner::DirectoryScanner;
use state::coordinator;
use state::library::Library;
use watcher::path_locks::PathLocks;
use watcher::LiveWatcher;

/// Interactive commands read from stdin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Force a full rescan of the watched root
    Rescan,
    /// Print aggregate catalog statistics and recent events
    Stats,
    /// Graceful shutdown
    Quit,
}

#[tokio::main]
async fn main() {
    let console = Arc::new(ConsoleSink::new());
    let config = PipelineConfig::load();

    // Resolve the watch root from the CLI argument or a prompt.
    // A bad root is the only condition that aborts the process.
    let root = match resolve_root() {
        Some(root) if root.is_dir() => root.canonicalize().unwrap_or(root),
        Some(root) => {
            eprintln!("❌ Not a directory: {}", root.display());
            std::process::exit(1);
        }
        None => {
            eprintln!("❌ No folder given. Usage: asset-pipeline <folder>");
            std::process::exit(1);
        }
    };

    // Open the catalog. The app cannot function without its database.
    let db_path = config
        .database_path
        .clone()
        .unwrap_or_else(Library::default_db_path);
    let library = match Library::open(&db_path) {
        Ok(library) => library,
        Err(e) => {
            eprintln!("❌ Failed to open catalog {}: {}", db_path.display(), e);
            std::process::exit(1);
        }
    };
    console.info(&format!("📁 Catalog database: {}", db_path.display()));

    let asset_count = library.asset_count().unwrap_or(0);
    console.info(&format!(
        "🎨 Asset pipeline initialized with {} assets",
        asset_count
    ));

    // Everything downstream shares one context so the bulk scan and
    // the watcher run the identical pipeline
    let ctx = PipelineContext {
        classifier: Classifier::new(&config),
        coordinator: coordinator::spawn(library),
        console: console.clone(),
        locks: Arc::new(PathLocks::new()),
    };
    let scanner = DirectoryScanner::new(ctx.classifier.clone());
    let stop = Arc::new(AtomicBool::new(false));

    // One full pass over the tree before going live
    pipeline::run_scan(&ctx, &scanner, &root, &stop).await;

    // Live watcher for the process lifetime. Losing it is degraded
    // service, not a fatal error - rescans still work.
    let settle = Duration::from_millis(config.settle_delay_ms);
    let _watcher = match LiveWatcher::start(ctx.clone(), &root, settle, config.worker_count) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            console.error(&format!("Could not start the folder watcher: {}", e));
            None
        }
    };

    console.info("Commands: [r]escan  [s]tats  [q]uit");

    // Read stdin on its own thread so the runtime never blocks on a TTY
    let mut commands = spawn_command_reader();

    while let Some(command) = commands.recv().await {
        match command {
            Command::Rescan => {
                pipeline::run_scan(&ctx, &scanner, &root, &stop).await;
            }
            Command::Stats => print_stats(&ctx).await,
            Command::Quit => break,
        }
    }

    console.info("👋 Shutting down");
}

/// Get the watch root from the first CLI argument, or prompt for one
fn resolve_root() -> Option<PathBuf> {
    if let Some(arg) = std::env::args().nth(1) {
        return Some(PathBuf::from(arg));
    }

    print!("Folder to watch: ");
    std::io::stdout().flush().ok()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line).ok()?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

/// Spawn the blocking stdin reader feeding the command channel.
/// EOF produces a final Quit so piped input shuts down cleanly.
fn spawn_command_reader() -> tokio::sync::mpsc::Receiver<Command> {
    let (tx, rx) = tokio::sync::mpsc::channel(8);

    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => {
                    let _ = tx.blocking_send(Command::Quit);
                    break;
                }
                Ok(_) => {
                    let command = match line.trim().to_lowercase().as_str() {
                        "r" | "rescan" => Some(Command::Rescan),
                        "s" | "stats" => Some(Command::Stats),
                        "q" | "quit" | "exit" => Some(Command::Quit),
                        "" => None,
                        other => {
                            eprintln!("Unknown command '{}'. Try r, s or q.", other);
                            None
                        }
                    };
                    if let Some(command) = command {
                        if tx.blocking_send(command).is_err() {
                            break;
                        }
                    }
                }
            }
        }
    });

    rx
}

/// Print the aggregate catalog report and the latest events
async fn print_stats(ctx: &PipelineContext) {
    let stats = match ctx.coordinator.stats().await {
        Ok(stats) => stats,
        Err(e) => {
            ctx.console.error(&format!("Could not read stats: {}", e));
            return;
        }
    };

    ctx.console.info(&format!(
        "📊 Catalog: {} assets ({} completed, {} failed, {} pending)",
        stats.total, stats.completed, stats.failed, stats.pending
    ));
    ctx.console.info(&format!(
        "   Total size: {} bytes, average processing {:.1} ms",
        stats.total_size, stats.avg_elapsed_ms
    ));
    for breakdown in &stats.categories {
        ctx.console.info(&format!(
            "   {}: {} assets, {} bytes, avg {:.1} ms",
            breakdown.category.as_str(),
            breakdown.count,
            breakdown.total_size,
            breakdown.avg_elapsed_ms
        ));
    }

    match ctx.coordinator.recent_events(5).await {
        Ok(events) => {
            if !events.is_empty() {
                ctx.console.info("🕒 Recent events:");
                for event in events {
                    ctx.console.info(&format!(
                        "   {} {} - {}",
                        event.kind.as_str(),
                        event.path,
                        event.message
                    ));
                }
            }
        }
        Err(e) => ctx.console.error(&format!("Could not read events: {}", e)),
    }
}
