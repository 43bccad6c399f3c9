//! File-backed reference data
//!
//! A snapshot file carries everything the engine would otherwise fetch:
//!
//! ```json
//! {
//!   "accounts": ["prod"],
//!   "regions": { "prod": ["us-east-1", "us-west-2"] },
//!   "vpcs": [{ "id": "vpc-1", "label": "main", "account": "prod", "region": "us-east-1" }],
//!   "security_groups": { "prod": { "aws": { "us-east-1": [{ "name": "web", "vpc_id": "vpc-1" }] } } }
//! }
//! ```
//!
//! Every read goes back to the file, so `refresh` only records the fetch time.

use super::{Account, AccountDirectory, CacheKey, CacheStats, ReferenceCache, Region};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use secgroup_common::{SecurityGroupCatalog, VpcRecord, timestamp_millis};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;

/// Deserialized contents of a snapshot file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub accounts: Vec<String>,
    pub regions: BTreeMap<String, Vec<String>>,
    pub vpcs: Vec<VpcRecord>,
    pub security_groups: SecurityGroupCatalog,
}

impl Snapshot {
    /// Load a snapshot from a JSON file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot file: {}", path.display()))
    }
}

/// [`ReferenceCache`] and [`AccountDirectory`] backed by a snapshot file
#[derive(Debug)]
pub struct SnapshotSource {
    path: PathBuf,
    vpcs_fetched_at: AtomicI64,
    security_groups_fetched_at: AtomicI64,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            vpcs_fetched_at: AtomicI64::new(0),
            security_groups_fetched_at: AtomicI64::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn fetched_at(&self, key: CacheKey) -> &AtomicI64 {
        match key {
            CacheKey::Vpcs => &self.vpcs_fetched_at,
            CacheKey::SecurityGroups => &self.security_groups_fetched_at,
        }
    }

    async fn load(&self, key: CacheKey) -> Result<Snapshot> {
        let snapshot = Snapshot::load(&self.path).await?;
        self.fetched_at(key)
            .store(timestamp_millis(), Ordering::Relaxed);
        Ok(snapshot)
    }
}

impl ReferenceCache for SnapshotSource {
    async fn list_vpcs(&self) -> Result<Vec<VpcRecord>> {
        Ok(self.load(CacheKey::Vpcs).await?.vpcs)
    }

    async fn all_security_groups(&self) -> Result<SecurityGroupCatalog> {
        Ok(self.load(CacheKey::SecurityGroups).await?.security_groups)
    }

    async fn refresh(&self, key: CacheKey) -> Result<()> {
        debug!(key = key.as_str(), path = %self.path.display(), "Refreshing snapshot namespace");
        self.load(key).await.map(|_| ())
    }

    fn stats(&self, key: CacheKey) -> CacheStats {
        let millis = self.fetched_at(key).load(Ordering::Relaxed);
        CacheStats {
            age_max: (millis > 0)
                .then(|| DateTime::<Utc>::from_timestamp_millis(millis))
                .flatten(),
        }
    }
}

impl AccountDirectory for SnapshotSource {
    async fn list_accounts(&self, _provider: &str) -> Result<Vec<Account>> {
        let snapshot = Snapshot::load(&self.path).await?;
        Ok(snapshot
            .accounts
            .into_iter()
            .map(|name| Account { name })
            .collect())
    }

    async fn regions_for_account(&self, account: &str) -> Result<Vec<Region>> {
        let snapshot = Snapshot::load(&self.path).await?;
        let regions = snapshot
            .regions
            .get(account)
            .with_context(|| format!("Unknown account '{account}' in snapshot"))?;
        Ok(regions
            .iter()
            .map(|name| Region { name: name.clone() })
            .collect())
    }
}
