//! In-memory collaborators for controller tests
//!
//! [`GatedCache`] lets a test hold individual lookups open and release them
//! in any order, which is how overlapping cascades are exercised.

use crate::fixtures;
use anyhow::{Result, bail};
use secgroup_common::{SecurityGroupCatalog, VpcRecord};
use secgroup_engine::reference::{
    Account, AccountDirectory, ApplicationRefresher, CacheKey, CacheStats, ReferenceCache,
    Region, SubmissionMonitor, UpsertRequest,
};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Handle to a held lookup; dropping it releases the lookup too
#[derive(Debug)]
pub struct Gate(oneshot::Sender<()>);

impl Gate {
    pub fn release(self) {
        let _ = self.0.send(());
    }
}

#[derive(Debug, Default)]
struct GatedInner {
    vpcs: Mutex<Vec<VpcRecord>>,
    catalog: Mutex<SecurityGroupCatalog>,
    vpc_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    refresh_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    vpc_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
}

/// [`ReferenceCache`] over in-memory data with per-call gates
///
/// Clones share state, so a test can keep one while the controller owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct GatedCache {
    inner: Arc<GatedInner>,
}

impl GatedCache {
    pub fn new(vpcs: Vec<VpcRecord>, catalog: SecurityGroupCatalog) -> Self {
        let cache = Self::default();
        cache.set_vpcs(vpcs);
        cache.set_catalog(catalog);
        cache
    }

    /// Cache preloaded with the standard scenario
    pub fn scenario() -> Self {
        Self::new(fixtures::scenario_vpcs(), fixtures::scenario_catalog())
    }

    pub fn set_vpcs(&self, vpcs: Vec<VpcRecord>) {
        *lock(&self.inner.vpcs) = vpcs;
    }

    pub fn set_catalog(&self, catalog: SecurityGroupCatalog) {
        *lock(&self.inner.catalog) = catalog;
    }

    /// Hold the next un-gated `list_vpcs` call until the gate is released
    pub fn hold_next_vpcs(&self) -> Gate {
        hold(&self.inner.vpc_gates)
    }

    /// Hold the next un-gated `refresh` call until the gate is released
    pub fn hold_next_refresh(&self) -> Gate {
        hold(&self.inner.refresh_gates)
    }

    pub fn vpc_calls(&self) -> usize {
        self.inner.vpc_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.inner.refresh_calls.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn hold(gates: &Mutex<VecDeque<oneshot::Receiver<()>>>) -> Gate {
    let (tx, rx) = oneshot::channel();
    lock(gates).push_back(rx);
    Gate(tx)
}

async fn pass(gates: &Mutex<VecDeque<oneshot::Receiver<()>>>) {
    let gate = lock(gates).pop_front();
    if let Some(gate) = gate {
        // A dropped sender releases the gate as well
        let _ = gate.await;
    }
}

impl ReferenceCache for GatedCache {
    async fn list_vpcs(&self) -> Result<Vec<VpcRecord>> {
        self.inner.vpc_calls.fetch_add(1, Ordering::SeqCst);
        pass(&self.inner.vpc_gates).await;
        Ok(lock(&self.inner.vpcs).clone())
    }

    async fn all_security_groups(&self) -> Result<SecurityGroupCatalog> {
        Ok(lock(&self.inner.catalog).clone())
    }

    async fn refresh(&self, _key: CacheKey) -> Result<()> {
        self.inner.refresh_calls.fetch_add(1, Ordering::SeqCst);
        pass(&self.inner.refresh_gates).await;
        Ok(())
    }

    fn stats(&self, _key: CacheKey) -> CacheStats {
        CacheStats::default()
    }
}

/// [`AccountDirectory`] over fixed accounts and regions
///
/// Region lookups can be held like [`GatedCache`] lookups; clones share the
/// gates.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    accounts: Vec<String>,
    regions: BTreeMap<String, Vec<String>>,
    region_gates: Arc<Mutex<VecDeque<oneshot::Receiver<()>>>>,
}

impl MemoryDirectory {
    pub fn new(accounts: Vec<String>, regions: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            accounts,
            regions,
            region_gates: Arc::default(),
        }
    }

    pub fn scenario() -> Self {
        Self::new(fixtures::scenario_accounts(), fixtures::scenario_regions())
    }

    /// Hold the next un-gated `regions_for_account` call
    pub fn hold_next_regions(&self) -> Gate {
        hold(&self.region_gates)
    }
}

impl AccountDirectory for MemoryDirectory {
    async fn list_accounts(&self, _provider: &str) -> Result<Vec<Account>> {
        Ok(self
            .accounts
            .iter()
            .map(|name| Account { name: name.clone() })
            .collect())
    }

    async fn regions_for_account(&self, account: &str) -> Result<Vec<Region>> {
        pass(&self.region_gates).await;
        let Some(regions) = self.regions.get(account) else {
            bail!("Unknown account '{account}'");
        };
        Ok(regions
            .iter()
            .map(|name| Region { name: name.clone() })
            .collect())
    }
}

/// [`SubmissionMonitor`] that records requests and optionally fails them
#[derive(Debug, Default)]
pub struct RecordingMonitor {
    requests: Mutex<Vec<UpsertRequest>>,
    failure: Option<String>,
}

impl RecordingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monitor whose tasks all fail with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            requests: Mutex::default(),
            failure: Some(message.into()),
        }
    }

    pub fn requests(&self) -> Vec<UpsertRequest> {
        lock(&self.requests).clone()
    }
}

impl SubmissionMonitor for RecordingMonitor {
    async fn submit(&self, request: UpsertRequest) -> Result<()> {
        lock(&self.requests).push(request);
        match &self.failure {
            Some(message) => bail!("{message}"),
            None => Ok(()),
        }
    }
}

/// [`ApplicationRefresher`] that counts refreshes
#[derive(Debug, Default)]
pub struct CountingRefresher {
    calls: AtomicUsize,
}

impl CountingRefresher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ApplicationRefresher for CountingRefresher {
    async fn refresh_security_groups(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(())
    }
}
