//! Shared test utilities for the security-group draft engine
//!
//! ## Modules
//!
//! - [`fixtures`]: Reference data for the standard two-region scenario
//! - [`fake`]: In-memory collaborators, including a cache with gated lookups

pub mod fake;
pub mod fixtures;

// Re-export commonly used items
pub use fake::{CountingRefresher, GatedCache, Gate, MemoryDirectory, RecordingMonitor};
pub use fixtures::{scenario_catalog, scenario_draft, scenario_vpcs};
