//! Cascade planning
//!
//! A cascade captures its inputs, awaits its lookups, and then computes a
//! [`CascadeOutcome`] from immutable data. The outcome is tagged with the
//! [`Generation`] issued when the cascade started; the controller applies it
//! only if no newer cascade has been issued since.

use super::state::SessionState;
use crate::error::DraftError;
use crate::resolve::{self, IndexQuery};
use secgroup_common::{Availability, AvailabilityIndex, SecurityGroupCatalog, VpcId, VpcRecord};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic token identifying one cascade invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Issues generations and answers whether one is still the latest
#[derive(Debug, Default)]
pub struct GenerationCounter(AtomicU64);

impl GenerationCounter {
    pub fn issue(&self) -> Generation {
        Generation(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn latest(&self) -> Generation {
        Generation(self.0.load(Ordering::SeqCst))
    }

    pub fn is_latest(&self, generation: Generation) -> bool {
        self.latest() == generation
    }
}

/// Default-VPC policy for the session
#[derive(Debug, Clone, Default)]
pub struct VpcPolicy {
    /// Classic networking is unavailable; a VPC is picked when none is set
    pub classic_locked_out: bool,
    pub default_label: Option<String>,
}

/// Draft coordinates captured when a cascade starts
#[derive(Debug, Clone)]
pub struct CascadeInput {
    pub generation: Generation,
    pub provider: String,
    pub account: String,
    pub regions: Vec<String>,
    pub vpc_id: Option<VpcId>,
    pub catalog: Arc<SecurityGroupCatalog>,
}

impl CascadeInput {
    pub fn capture(generation: Generation, provider: &str, state: &SessionState) -> Self {
        Self {
            generation,
            provider: provider.to_string(),
            account: state.draft.account_name.clone(),
            regions: state.draft.regions.clone(),
            vpc_id: state.draft.vpc_id.clone(),
            catalog: Arc::clone(&state.catalog),
        }
    }

    fn has_coordinates(&self) -> bool {
        !self.account.is_empty() && !self.regions.is_empty()
    }
}

/// Immutable result of one cascade
#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    pub generation: Generation,
    pub vpcs: Vec<VpcRecord>,
    pub availability: Availability,
    pub vpc_id: Option<VpcId>,
    pub hide_classic: bool,
    /// `None` when the draft lacks an account or regions
    pub index: Option<AvailabilityIndex>,
}

/// Pick the VPC the draft should carry after a resolution.
///
/// Under a classic lockout an unset VPC gets a default: the configured label,
/// else the first active set, else the first set. A VPC that is part of some
/// available set is normalized to that set's primary id; anything else
/// becomes `None`.
pub fn select_vpc(
    availability: &Availability,
    current: Option<&VpcId>,
    policy: &VpcPolicy,
) -> Option<VpcId> {
    let mut candidate = current.cloned();

    if policy.classic_locked_out && candidate.is_none() && !availability.is_empty() {
        candidate = policy
            .default_label
            .as_deref()
            .and_then(|label| availability.by_label(label))
            .and_then(|set| set.primary_id())
            .or_else(|| availability.active.first().and_then(|set| set.primary_id()))
            .or_else(|| availability.all.first().and_then(|set| set.primary_id()))
            .cloned();
    }

    candidate
        .and_then(|id| availability.containing(&id))
        .and_then(|set| set.primary_id())
        .cloned()
}

fn index_for(
    input: &CascadeInput,
    vpcs: &[VpcRecord],
    vpc_id: Option<&VpcId>,
) -> Result<Option<AvailabilityIndex>, DraftError> {
    if !input.has_coordinates() {
        return Ok(None);
    }
    resolve::index(
        vpcs,
        &input.catalog,
        IndexQuery {
            provider: &input.provider,
            account: &input.account,
            regions: &input.regions,
            vpc_id,
        },
    )
    .map(Some)
}

/// Full cascade: resolve VPCs, settle the VPC choice, index security groups
pub fn plan_full(
    input: &CascadeInput,
    vpcs: Vec<VpcRecord>,
    policy: &VpcPolicy,
) -> Result<CascadeOutcome, DraftError> {
    let availability = resolve::resolve(&vpcs, &input.account, &input.regions);
    let vpc_id = select_vpc(&availability, input.vpc_id.as_ref(), policy);
    let index = index_for(input, &vpcs, vpc_id.as_ref())?;

    Ok(CascadeOutcome {
        generation: input.generation,
        vpcs,
        availability,
        vpc_id,
        hide_classic: policy.classic_locked_out,
        index,
    })
}
