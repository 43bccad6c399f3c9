//! Session state owned by the draft controller

use super::cascade::Generation;
use crate::reference::Account;
use chrono::{DateTime, Utc};
use secgroup_common::{
    Availability, AvailabilityIndex, Draft, RemovedRules, SecurityGroupCatalog, VpcRecord,
};
use std::sync::Arc;

/// Dirty/complete flags of one wizard step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStatus {
    pub dirty: bool,
    pub complete: bool,
}

impl StepStatus {
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn mark_complete(&mut self) {
        self.complete = true;
    }
}

/// Everything the controller knows about one edit session.
///
/// Readers get a clone via [`super::DraftController::session`]; only the
/// controller writes.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub draft: Draft,

    // Directory data
    pub accounts: Vec<Account>,
    pub regions: Vec<String>,

    // Reference snapshots
    pub vpcs: Vec<VpcRecord>,
    pub catalog: Arc<SecurityGroupCatalog>,
    pub security_groups_loaded: bool,
    pub refreshing_security_groups: bool,
    pub refresh_time: Option<DateTime<Utc>>,

    // Cascade results
    pub availability: Availability,
    pub index: AvailabilityIndex,
    pub hide_classic: bool,
    pub last_committed: Option<Generation>,

    // Rule bookkeeping
    pub removed_rules: RemovedRules,
    pub ingress_step: StepStatus,

    // Lifecycle
    pub name_preview: Option<String>,
    pub submitting: bool,
    pub closed: bool,
}

impl SessionState {
    pub fn new(draft: Draft) -> Self {
        Self {
            draft,
            ..Default::default()
        }
    }
}
