//! secgroup-common - Shared types for security-group drafts
//!
//! This crate holds the data model used by the resolution engine and its
//! front ends, without any async or I/O dependencies.
//!
//! ## Modules
//!
//! - [`catalog`]: Security-group catalog snapshot and availability index
//! - [`defaults`]: Default configuration values
//! - [`ledger`]: Removed-rules ledger
//! - [`model`]: Drafts, ingress rules, VPC records and availability sets
//! - [`naming`]: Name patterns and cluster name construction
//! - [`settings`]: Provider settings and application context

pub mod catalog;
pub mod defaults;
pub mod ledger;
pub mod model;
pub mod naming;
pub mod settings;

// Re-export commonly used types
pub use catalog::{AvailabilityIndex, SecurityGroupCatalog, SecurityGroupSummary};
pub use ledger::RemovedRules;
pub use model::{Availability, AvailabilitySet, Draft, Rule, VpcId, VpcRecord};
pub use naming::{NamePattern, cluster_name};
pub use settings::{ApplicationContext, ProviderSettings, SettingsError};

/// Current time in milliseconds since the UNIX epoch
#[inline]
pub fn timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
