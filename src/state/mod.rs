/// Catalog state module
///
/// This module handles everything that persists, including:
/// - Database schema and queries (library.rs)
/// - Shared data structures (data.rs)
/// - The change-detection/upsert coordinator (coordinator.rs)

pub mod coordinator;
pub mod data;
pub mod library;
