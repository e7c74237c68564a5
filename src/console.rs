/// Shared console output sink
///
/// Every operator-facing line goes through one sink so concurrent workers
/// never interleave partial output. The mutex scope is strictly the write
/// itself - no pipeline logic ever runs while it is held.

use std::sync::Mutex;

/// Serialized console output for all pipeline components
#[derive(Debug, Default)]
pub struct ConsoleSink {
    lock: Mutex<()>,
}

impl ConsoleSink {
    /// Create a new console sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Print an informational line to stdout
    pub fn info(&self, message: &str) {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        println!("{}", message);
    }

    /// Print a warning line to stderr
    pub fn warn(&self, message: &str) {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        eprintln!("⚠️  {}", message);
    }

    /// Print an error line to stderr
    pub fn error(&self, message: &str) {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        eprintln!("❌ {}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_concurrent_writers_do_not_poison() {
        let sink = Arc::new(ConsoleSink::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let sink = sink.clone();
                std::thread::spawn(move || {
                    for n in 0..10 {
                        sink.info(&format!("writer {} line {}", i, n));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // Survivability is the contract: a poisoned mutex must not take
        // the console down with it.
        sink.info("still alive");
    }
}
