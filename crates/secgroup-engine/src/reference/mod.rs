//! Collaborators the draft engine depends on
//!
//! These traits are the only way the engine reaches the outside world:
//! - [`ReferenceCache`]: VPC and security-group directories behind a cache
//! - [`AccountDirectory`]: accounts and their regions
//! - [`SubmissionMonitor`]: long-running upsert tasks
//! - [`ApplicationRefresher`]: application-level reload after a write
//!
//! [`snapshot::SnapshotSource`] implements the first two over a JSON file.

pub mod snapshot;

use anyhow::Result;
use chrono::{DateTime, Utc};
use secgroup_common::{Draft, SecurityGroupCatalog, VpcRecord};
use serde::{Deserialize, Serialize};

pub use snapshot::SnapshotSource;

/// Cache namespaces the engine reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Vpcs,
    SecurityGroups,
}

impl CacheKey {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheKey::Vpcs => "vpcs",
            CacheKey::SecurityGroups => "securityGroups",
        }
    }
}

/// Freshness metadata for one cache namespace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// When the oldest entry in the namespace was fetched
    pub age_max: Option<DateTime<Utc>>,
}

/// An account known to the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
}

/// A region an account may deploy into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
}

/// Payload handed to the submission monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpsertRequest {
    pub application: String,
    /// Task description, e.g. "Create" or "Update"
    pub descriptor: String,
    pub draft: Draft,
}

/// Read-through cache over the VPC and security-group directories.
///
/// Note: the engine never retries; retry and timeout policy belong to the
/// implementation.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait ReferenceCache: Send + Sync {
    /// All VPC records across accounts and regions
    async fn list_vpcs(&self) -> Result<Vec<VpcRecord>>;

    /// Snapshot of every known security group
    async fn all_security_groups(&self) -> Result<SecurityGroupCatalog>;

    /// Invalidate a namespace and refetch it
    async fn refresh(&self, key: CacheKey) -> Result<()>;

    /// Freshness metadata for a namespace
    fn stats(&self, key: CacheKey) -> CacheStats;
}

/// Account and region lookups
#[allow(async_fn_in_trait)]
#[cfg_attr(test, mockall::automock)]
pub trait AccountDirectory: Send + Sync {
    async fn list_accounts(&self, provider: &str) -> Result<Vec<Account>>;

    async fn regions_for_account(&self, account: &str) -> Result<Vec<Region>>;
}

/// Runs an upsert as a long-running task.
///
/// Resolves once the task completes; an error carries the task failure.
#[allow(async_fn_in_trait)]
#[cfg_attr(test, mockall::automock)]
pub trait SubmissionMonitor: Send + Sync {
    async fn submit(&self, request: UpsertRequest) -> Result<()>;
}

/// Application-level reload triggered after a successful write
#[allow(async_fn_in_trait)]
#[cfg_attr(test, mockall::automock)]
pub trait ApplicationRefresher: Send + Sync {
    /// Start a refresh and resolve when the next refresh completes
    async fn refresh_security_groups(&self) -> Result<()>;
}
