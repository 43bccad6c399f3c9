//! Draft state controller
//!
//! `DraftController` owns the draft for one edit session and re-runs the
//! cascade (VPC resolution → security-group index → rule enforcement) on
//! every upstream change. Cascades may overlap when edits arrive faster than
//! lookups settle; each one is tagged with a [`Generation`] and only the most
//! recently issued one is applied.

pub mod cascade;
pub mod events;
mod refresh;
pub mod state;
mod submit;

pub use cascade::{CascadeOutcome, Generation, VpcPolicy};
pub use events::{DetailsTarget, DraftEvent, DraftEvents};
pub use refresh::RefreshOutcome;
pub use state::{SessionState, StepStatus};

use crate::error::DraftError;
use crate::reference::{AccountDirectory, ReferenceCache};
use crate::resolve::{RuleScope, enforce};
use cascade::{CascadeInput, GenerationCounter};
use secgroup_common::defaults::INGRESS_STEP;
use secgroup_common::{
    ApplicationContext, Draft, NamePattern, ProviderSettings, Rule, VpcId, cluster_name,
};
use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Whether a cascade's result was applied to the draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeStatus {
    /// Applied; lists the rule sources removed by enforcement
    Committed { removed: Vec<String> },
    /// A newer cascade was issued before this one settled
    Superseded,
}

impl CascadeStatus {
    pub fn is_committed(&self) -> bool {
        matches!(self, CascadeStatus::Committed { .. })
    }
}

/// Orchestrates one security-group edit session
pub struct DraftController<C, D> {
    cache: C,
    directory: D,
    settings: ProviderSettings,
    application: ApplicationContext,

    state: Mutex<SessionState>,
    generations: GenerationCounter,
    events: DraftEvents,
    refresh_token: Mutex<Option<CancellationToken>>,
}

impl<C, D> std::fmt::Debug for DraftController<C, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftController")
            .field("application", &self.application.name)
            .field("generation", &self.generations.latest())
            .finish_non_exhaustive()
    }
}

impl<C: ReferenceCache, D: AccountDirectory> DraftController<C, D> {
    /// Open a session for `draft`
    pub fn new(
        cache: C,
        directory: D,
        settings: ProviderSettings,
        application: ApplicationContext,
        draft: Draft,
    ) -> Self {
        let events = DraftEvents::new(settings.event_capacity);
        Self {
            cache,
            directory,
            settings,
            application,
            state: Mutex::new(SessionState::new(draft)),
            generations: GenerationCounter::default(),
            events,
            refresh_token: Mutex::new(None),
        }
    }

    // ── Read-only accessors ─────────────────────────────────────────────

    pub fn subscribe(&self) -> broadcast::Receiver<DraftEvent> {
        self.events.subscribe()
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    pub fn application(&self) -> &ApplicationContext {
        &self.application
    }

    /// Clone of the current session state
    pub async fn session(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    pub async fn draft(&self) -> Draft {
        self.state.lock().await.draft.clone()
    }

    /// The name pattern that applies to the draft right now
    pub async fn current_name_pattern(&self) -> NamePattern {
        NamePattern::for_vpc(self.state.lock().await.draft.vpc_id.as_ref())
    }

    pub async fn is_name_valid(&self, name: &str) -> bool {
        self.current_name_pattern().await.matches(name)
    }

    // ── Upstream edits ──────────────────────────────────────────────────

    /// Load the provider's accounts, then cascade from the draft's account
    pub async fn initialize_accounts(&self) -> Result<CascadeStatus, DraftError> {
        let accounts = self.directory.list_accounts(&self.settings.provider).await?;
        info!(
            provider = %self.settings.provider,
            count = accounts.len(),
            "Loaded accounts"
        );
        self.state.lock().await.accounts = accounts;
        self.account_updated().await
    }

    pub async fn set_account(&self, account: &str) -> Result<CascadeStatus, DraftError> {
        self.state.lock().await.draft.account_name = account.to_string();
        self.account_updated().await
    }

    pub async fn set_regions(&self, regions: Vec<String>) -> Result<CascadeStatus, DraftError> {
        self.run_cascade(|draft| draft.regions = regions).await
    }

    /// Select a VPC. The choice is only kept once a cascade has resolved it;
    /// if that cascade fails the previous VPC is restored.
    pub async fn set_vpc(&self, vpc_id: Option<VpcId>) -> Result<CascadeStatus, DraftError> {
        self.run_cascade(|draft| draft.vpc_id = vpc_id).await
    }

    /// Refresh the region options for the draft's account and cascade
    pub async fn account_updated(&self) -> Result<CascadeStatus, DraftError> {
        let account = self.state.lock().await.draft.account_name.clone();

        let regions = self.directory.regions_for_account(&account).await?;

        {
            let mut state = self.state.lock().await;
            // Another account was selected while regions were loading
            if state.draft.account_name != account {
                debug!(account = %account, "Discarding stale region list");
                return Ok(CascadeStatus::Superseded);
            }
            state.regions = regions.into_iter().map(|r| r.name).collect();
            state.index = Default::default();
        }

        let status = self.region_updated().await?;
        if status.is_committed() && self.state.lock().await.draft.is_new() {
            self.update_name().await;
        }
        Ok(status)
    }

    /// Run the full cascade for the draft's account and regions
    pub async fn region_updated(&self) -> Result<CascadeStatus, DraftError> {
        self.run_cascade(|_| {}).await
    }

    /// Re-resolve and re-index for the draft's VPC
    pub async fn vpc_updated(&self) -> Result<CascadeStatus, DraftError> {
        self.run_cascade(|_| {}).await
    }

    fn vpc_policy(&self, draft: &Draft) -> VpcPolicy {
        VpcPolicy {
            classic_locked_out: draft.is_new()
                && self.settings.classic_locked_out(self.application.create_ts),
            default_label: self.settings.default_vpc_label.clone(),
        }
    }

    /// Apply `edit` to the draft, then resolve, index and enforce from the
    /// edited coordinates.
    ///
    /// The edit and the generation are taken under one lock, so a cascade
    /// that is still the latest when it fails knows no later edit has
    /// happened and can put the VPC back.
    async fn run_cascade(
        &self,
        edit: impl FnOnce(&mut Draft),
    ) -> Result<CascadeStatus, DraftError> {
        let (input, policy, previous_vpc) = {
            let mut state = self.state.lock().await;
            let previous_vpc = state.draft.vpc_id.clone();
            edit(&mut state.draft);
            let generation = self.generations.issue();
            (
                CascadeInput::capture(generation, &self.settings.provider, &state),
                self.vpc_policy(&state.draft),
                previous_vpc,
            )
        };

        let planned = match self.cache.list_vpcs().await {
            Ok(vpcs) => cascade::plan_full(&input, vpcs, &policy),
            Err(e) => Err(e.into()),
        };

        let error = match planned {
            Ok(outcome) => return self.commit(outcome).await,
            Err(e) => e,
        };

        let mut state = self.state.lock().await;
        if !self.generations.is_latest(input.generation) {
            debug!(
                generation = input.generation.value(),
                error = %error,
                "Superseded cascade failed"
            );
            return Ok(CascadeStatus::Superseded);
        }
        state.draft.vpc_id = previous_vpc;
        Err(error)
    }

    async fn commit(&self, outcome: CascadeOutcome) -> Result<CascadeStatus, DraftError> {
        let mut state = self.state.lock().await;
        if !self.generations.is_latest(outcome.generation) {
            debug!(
                generation = outcome.generation.value(),
                latest = self.generations.latest().value(),
                "Discarding superseded cascade"
            );
            return Ok(CascadeStatus::Superseded);
        }

        let state = &mut *state;
        state.vpcs = outcome.vpcs;
        state.availability = outcome.availability;
        state.hide_classic = outcome.hide_classic;
        state.draft.vpc_id = outcome.vpc_id;
        state.last_committed = Some(outcome.generation);

        let removed = match outcome.index {
            Some(index) => {
                state.index = index;
                let enforcement = enforce(
                    &state.draft.ingress_rules,
                    RuleScope {
                        account: &state.draft.account_name,
                        vpc_id: state.draft.vpc_id.as_ref(),
                    },
                    &state.index,
                    &mut state.removed_rules,
                );
                if enforcement.removed_any() {
                    debug!(step = INGRESS_STEP, removed = ?enforcement.removed, "Marking step dirty");
                    state.ingress_step.mark_dirty();
                }
                state.draft.ingress_rules = enforcement.rules;
                enforcement.removed
            }
            None => {
                state.index = Default::default();
                Vec::new()
            }
        };

        debug!(
            generation = outcome.generation.value(),
            vpc_id = ?state.draft.vpc_id,
            vpcs_available = state.availability.all.len(),
            groups_available = state.index.available_names.len(),
            removed = removed.len(),
            "Cascade committed"
        );

        self.events.emit(DraftEvent::CoordinatesChanged);
        Ok(CascadeStatus::Committed { removed })
    }

    // ── Rules and naming ────────────────────────────────────────────────

    /// Append the default rule (tcp 7001)
    pub async fn add_rule(&self) {
        self.state.lock().await.draft.ingress_rules.push(Rule::default());
    }

    /// Remove the rule at `index`; out-of-range indices are ignored
    pub async fn remove_rule(&self, index: usize) -> Option<Rule> {
        let mut state = self.state.lock().await;
        (index < state.draft.ingress_rules.len()).then(|| state.draft.ingress_rules.remove(index))
    }

    /// Acknowledge removed rules: clear the ledger and settle the Ingress step
    pub async fn dismiss_removed_rules(&self) {
        let mut state = self.state.lock().await;
        state.removed_rules.clear();
        state.ingress_step.mark_clean();
        state.ingress_step.mark_complete();
    }

    /// Set the stack/detail name parts and regenerate the name
    pub async fn set_name_parts(&self, stack: Option<String>, detail: Option<String>) -> String {
        {
            let mut state = self.state.lock().await;
            state.draft.stack = stack;
            state.draft.detail = detail;
        }
        self.update_name().await
    }

    /// Regenerate the draft name from the application, stack and detail
    pub async fn update_name(&self) -> String {
        let mut state = self.state.lock().await;
        let name = cluster_name(
            &self.application.name,
            state.draft.stack.as_deref(),
            state.draft.detail.as_deref(),
        );
        state.draft.name = name.clone();
        state.name_preview = Some(name.clone());
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{
        Account, CacheStats, MockAccountDirectory, MockReferenceCache, Region,
    };
    use secgroup_common::{SecurityGroupCatalog, SecurityGroupSummary, VpcRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn vpcs() -> Vec<VpcRecord> {
        vec![
            VpcRecord::new("vpc-1", "main", "prod", "us-east-1"),
            VpcRecord::new("vpc-2", "main", "prod", "us-west-2"),
            VpcRecord::new("vpc-3", "other", "prod", "us-east-1"),
            VpcRecord::new("vpc-4", "legacy", "prod", "us-east-1").deprecated(),
            VpcRecord::new("vpc-5", "legacy", "prod", "us-west-2").deprecated(),
            VpcRecord::new("vpc-6", "shared", "test", "us-east-1"),
        ]
    }

    fn catalog() -> SecurityGroupCatalog {
        let mut catalog = SecurityGroupCatalog::new();
        for (region, name, vpc) in [
            ("us-east-1", "web", "vpc-1"),
            ("us-east-1", "legacy-sg", "vpc-4"),
            ("us-west-2", "web", "vpc-2"),
            ("us-west-2", "legacy-sg", "vpc-5"),
        ] {
            catalog.insert("prod", "aws", region, SecurityGroupSummary::new(name, Some(vpc)));
        }
        catalog
    }

    fn cache() -> MockReferenceCache {
        let mut cache = MockReferenceCache::new();
        cache.expect_list_vpcs().returning(|| Ok(vpcs()));
        cache
            .expect_all_security_groups()
            .returning(|| Ok(catalog()));
        cache.expect_refresh().returning(|_| Ok(()));
        cache.expect_stats().returning(|_| CacheStats::default());
        cache
    }

    fn directory() -> MockAccountDirectory {
        let mut directory = MockAccountDirectory::new();
        directory.expect_list_accounts().returning(|_| {
            Ok(vec![
                Account { name: "prod".into() },
                Account { name: "test".into() },
            ])
        });
        directory.expect_regions_for_account().returning(|_| {
            Ok(vec![
                Region { name: "us-east-1".into() },
                Region { name: "us-west-2".into() },
            ])
        });
        directory
    }

    fn controller(
        settings: ProviderSettings,
        create_ts: i64,
        draft: Draft,
    ) -> DraftController<MockReferenceCache, MockAccountDirectory> {
        DraftController::new(
            cache(),
            directory(),
            settings,
            ApplicationContext::new("app", create_ts),
            draft,
        )
    }

    fn lockout_at(ts: i64) -> ProviderSettings {
        ProviderSettings {
            classic_launch_lockout: Some(ts),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_region_cascade_resolves_and_notifies_once() {
        let ctrl = controller(
            ProviderSettings::default(),
            0,
            Draft::new("prod", &["us-east-1", "us-west-2"]).with_vpc("vpc-2"),
        );
        ctrl.initialize_security_groups().await.unwrap();
        let mut events = ctrl.subscribe();

        let status = ctrl.region_updated().await.unwrap();
        assert_eq!(status, CascadeStatus::Committed { removed: vec![] });

        let session = ctrl.session().await;
        let labels: Vec<_> = session.availability.all.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["main", "legacy"]);
        assert_eq!(session.availability.active.len(), 1);
        assert_eq!(session.availability.deprecated.len(), 1);
        // Normalized to the logical VPC's primary id
        assert_eq!(session.draft.vpc_id, Some(VpcId::from("vpc-1")));
        assert!(session.index.is_available("web"));

        assert_eq!(events.recv().await.unwrap(), DraftEvent::CoordinatesChanged);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_vpc_reset_when_no_longer_available() {
        let ctrl = controller(
            ProviderSettings::default(),
            0,
            Draft::new("prod", &["us-east-1"]).with_vpc("vpc-3"),
        );
        ctrl.region_updated().await.unwrap();
        assert_eq!(ctrl.draft().await.vpc_id, Some(VpcId::from("vpc-3")));

        // "other" exists only in us-east-1
        ctrl.set_regions(vec!["us-east-1".into(), "us-west-2".into()])
            .await
            .unwrap();
        assert_eq!(ctrl.draft().await.vpc_id, None);
    }

    #[tokio::test]
    async fn test_account_switch_resets_vpc() {
        let ctrl = controller(
            ProviderSettings::default(),
            0,
            Draft::new("prod", &["us-east-1"]).with_vpc("vpc-1"),
        );
        ctrl.region_updated().await.unwrap();
        assert!(ctrl.draft().await.vpc_id.is_some());

        ctrl.set_account("test").await.unwrap();
        let session = ctrl.session().await;
        assert_eq!(session.draft.vpc_id, None);
        assert_eq!(session.regions, vec!["us-east-1", "us-west-2"]);
    }

    #[tokio::test]
    async fn test_vpc_switch_removes_unavailable_rules() {
        let ctrl = controller(
            ProviderSettings::default(),
            0,
            Draft::new("prod", &["us-east-1", "us-west-2"])
                .with_vpc("vpc-4")
                .with_rules(vec![
                    Rule::from_group("legacy-sg", "prod", 8080),
                    Rule::tcp(22, 22),
                ]),
        );
        ctrl.initialize_security_groups().await.unwrap();
        ctrl.region_updated().await.unwrap();
        assert_eq!(ctrl.draft().await.ingress_rules.len(), 2);

        let status = ctrl.set_vpc(Some("vpc-1".into())).await.unwrap();
        assert_eq!(
            status,
            CascadeStatus::Committed {
                removed: vec!["legacy-sg".to_string()]
            }
        );

        let session = ctrl.session().await;
        assert_eq!(session.draft.ingress_rules, vec![Rule::tcp(22, 22)]);
        assert_eq!(session.removed_rules.names(), ["legacy-sg"]);
        assert!(session.ingress_step.dirty);

        ctrl.dismiss_removed_rules().await;
        let session = ctrl.session().await;
        assert!(session.removed_rules.is_empty());
        assert!(!session.ingress_step.dirty);
        assert!(session.ingress_step.complete);
    }

    #[tokio::test]
    async fn test_created_before_lockout_keeps_classic() {
        let ctrl = controller(lockout_at(1_000), 999, Draft::new("prod", &["us-east-1"]));
        ctrl.region_updated().await.unwrap();

        let session = ctrl.session().await;
        assert_eq!(session.draft.vpc_id, None);
        assert!(!session.hide_classic);
    }

    #[tokio::test]
    async fn test_created_after_lockout_assigns_default() {
        let ctrl = controller(lockout_at(1_000), 1_000, Draft::new("prod", &["us-east-1"]));
        ctrl.region_updated().await.unwrap();

        let session = ctrl.session().await;
        assert_eq!(session.draft.vpc_id, Some(VpcId::from("vpc-1")));
        assert!(session.hide_classic);
    }

    #[tokio::test]
    async fn test_lockout_prefers_configured_label() {
        let settings = ProviderSettings {
            default_vpc_label: Some("other".to_string()),
            ..lockout_at(1_000)
        };
        let ctrl = controller(settings, 2_000, Draft::new("prod", &["us-east-1"]));
        ctrl.region_updated().await.unwrap();
        assert_eq!(ctrl.draft().await.vpc_id, Some(VpcId::from("vpc-3")));
    }

    #[tokio::test]
    async fn test_lockout_ignored_for_existing_groups() {
        let draft = Draft {
            id: Some("sg-123".to_string()),
            ..Draft::new("prod", &["us-east-1"])
        };
        let ctrl = controller(lockout_at(1_000), 2_000, draft);
        ctrl.region_updated().await.unwrap();
        assert_eq!(ctrl.draft().await.vpc_id, None);
    }

    #[tokio::test]
    async fn test_no_regions_clears_index() {
        let ctrl = controller(
            ProviderSettings::default(),
            0,
            Draft::new("prod", &["us-east-1"]).with_vpc("vpc-1"),
        );
        ctrl.initialize_security_groups().await.unwrap();
        ctrl.region_updated().await.unwrap();
        assert!(!ctrl.session().await.index.available_names.is_empty());

        ctrl.set_regions(vec![]).await.unwrap();
        let session = ctrl.session().await;
        assert!(session.index.available_names.is_empty());
        assert!(session.index.existing_names.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_vpc_is_not_kept() {
        let ctrl = controller(
            ProviderSettings::default(),
            0,
            Draft::new("prod", &["us-east-1"]).with_vpc("vpc-1"),
        );
        ctrl.region_updated().await.unwrap();

        // vpc-6 belongs to another account
        let status = ctrl.set_vpc(Some("vpc-6".into())).await.unwrap();
        assert!(status.is_committed());
        let session = ctrl.session().await;
        assert_eq!(session.draft.vpc_id, None);
        assert!(session.availability.containing(&VpcId::from("vpc-6")).is_none());
    }

    #[tokio::test]
    async fn test_failed_vpc_cascade_restores_previous_vpc() {
        let calls = AtomicUsize::new(0);
        let mut cache = MockReferenceCache::new();
        cache.expect_list_vpcs().returning(move || {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(vpcs())
            } else {
                Err(anyhow::anyhow!("vpc directory unavailable"))
            }
        });
        let ctrl = DraftController::new(
            cache,
            directory(),
            ProviderSettings::default(),
            ApplicationContext::new("app", 0),
            Draft::new("prod", &["us-east-1"]).with_vpc("vpc-1"),
        );
        ctrl.region_updated().await.unwrap();
        let mut events = ctrl.subscribe();

        let err = ctrl.set_vpc(Some("vpc-3".into())).await.unwrap_err();
        assert!(matches!(err, DraftError::Fetch(_)));
        assert_eq!(ctrl.draft().await.vpc_id, Some(VpcId::from("vpc-1")));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let mut cache = MockReferenceCache::new();
        cache
            .expect_list_vpcs()
            .returning(|| Err(anyhow::anyhow!("vpc directory unavailable")));
        let ctrl = DraftController::new(
            cache,
            directory(),
            ProviderSettings::default(),
            ApplicationContext::new("app", 0),
            Draft::new("prod", &["us-east-1"]),
        );
        let mut events = ctrl.subscribe();

        let err = ctrl.region_updated().await.unwrap_err();
        assert!(matches!(err, DraftError::Fetch(_)));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_initialize_accounts_updates_name_for_new_drafts() {
        let ctrl = controller(ProviderSettings::default(), 0, Draft::new("prod", &["us-east-1"]));
        ctrl.set_name_parts(Some("web".into()), None).await;

        let status = ctrl.initialize_accounts().await.unwrap();
        assert!(status.is_committed());

        let session = ctrl.session().await;
        assert_eq!(session.accounts.len(), 2);
        assert_eq!(session.draft.name, "app-web");
        assert_eq!(session.name_preview.as_deref(), Some("app-web"));
    }

    #[tokio::test]
    async fn test_rule_editing() {
        let ctrl = controller(ProviderSettings::default(), 0, Draft::new("prod", &["us-east-1"]));
        ctrl.add_rule().await;
        ctrl.add_rule().await;
        assert_eq!(ctrl.draft().await.ingress_rules.len(), 2);

        assert_eq!(ctrl.remove_rule(5).await, None);
        assert_eq!(ctrl.remove_rule(0).await, Some(Rule::default()));
        assert_eq!(ctrl.draft().await.ingress_rules.len(), 1);
    }

    #[tokio::test]
    async fn test_name_pattern_follows_vpc() {
        let ctrl = controller(ProviderSettings::default(), 0, Draft::new("prod", &["us-east-1"]));
        assert_eq!(ctrl.current_name_pattern().await, NamePattern::Classic);
        assert!(ctrl.is_name_valid("100% classic").await);

        ctrl.region_updated().await.unwrap();
        ctrl.set_vpc(Some("vpc-1".into())).await.unwrap();
        assert_eq!(ctrl.current_name_pattern().await, NamePattern::Vpc);
        assert!(!ctrl.is_name_valid("100% classic").await);
    }
}
