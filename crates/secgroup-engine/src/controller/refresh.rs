//! Security-group catalog loading and user-triggered refresh

use super::{DraftController, DraftEvent};
use crate::error::DraftError;
use crate::reference::{AccountDirectory, CacheKey, ReferenceCache};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How a catalog refresh ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Cache refreshed, catalog reloaded and the cascade re-run
    Completed,
    /// A later refresh (or `close`) cancelled this one
    Superseded,
}

impl<C: ReferenceCache, D: AccountDirectory> DraftController<C, D> {
    /// Load the security-group catalog into the session.
    ///
    /// Until the first cascade commits, `available_names` is seeded from the
    /// first region so rule editors have something to offer.
    pub async fn initialize_security_groups(&self) -> Result<(), DraftError> {
        let catalog = self.cache.all_security_groups().await?;
        let refresh_time = self.cache.stats(CacheKey::SecurityGroups).age_max;

        {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            if state.last_committed.is_none() {
                if let Some(region) = state.draft.regions.first() {
                    state.index.available_names = catalog.names_in_vpc(
                        &state.draft.account_name,
                        &self.settings.provider,
                        region,
                        state.draft.vpc_id.as_ref(),
                    );
                }
            }
            state.catalog = Arc::new(catalog);
            state.security_groups_loaded = true;
            state.refresh_time = refresh_time;
            debug!(
                empty = state.catalog.is_empty(),
                seeded = state.index.available_names.len(),
                "Security groups loaded"
            );
        }

        self.events.emit(DraftEvent::AllSecurityGroupsUpdated);
        Ok(())
    }

    /// Refresh the security-group cache, reload the catalog and re-run the
    /// cascade. A second call cancels the first.
    pub async fn refresh_security_groups(&self) -> Result<RefreshOutcome, DraftError> {
        let token = CancellationToken::new();
        if let Some(previous) = self.refresh_token.lock().await.replace(token.clone()) {
            debug!("Cancelling in-flight security group refresh");
            previous.cancel();
        }
        self.state.lock().await.refreshing_security_groups = true;
        info!("Refreshing security groups");

        let work = async {
            self.cache.refresh(CacheKey::SecurityGroups).await?;
            self.initialize_security_groups().await?;
            self.region_updated().await
        };

        let result = tokio::select! {
            _ = token.cancelled() => return Ok(RefreshOutcome::Superseded),
            result = work => result,
        };

        let mut slot = self.refresh_token.lock().await;
        if token.is_cancelled() {
            return Ok(RefreshOutcome::Superseded);
        }
        *slot = None;

        let mut state = self.state.lock().await;
        state.refreshing_security_groups = false;
        match result {
            Ok(status) => {
                state.refresh_time = self.cache.stats(CacheKey::SecurityGroups).age_max;
                info!(
                    committed = status.is_committed(),
                    refresh_time = ?state.refresh_time,
                    "Security groups refreshed"
                );
                Ok(RefreshOutcome::Completed)
            }
            Err(e) => {
                warn!(error = %e, "Security group refresh failed");
                Err(e)
            }
        }
    }
}
