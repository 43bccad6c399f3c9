//! Submission and session lifecycle

use super::{DetailsTarget, DraftController, DraftEvent};
use crate::error::DraftError;
use crate::reference::{
    AccountDirectory, ApplicationRefresher, ReferenceCache, SubmissionMonitor, UpsertRequest,
};
use secgroup_common::NamePattern;
use tracing::{info, warn};

impl<C: ReferenceCache, D: AccountDirectory> DraftController<C, D> {
    /// Submit the draft as an upsert task.
    ///
    /// Returns the details target once the task completes and the
    /// application has picked up the change, or `None` if the session was
    /// closed in the meantime.
    pub async fn upsert<M, A>(
        &self,
        monitor: &M,
        refresher: &A,
        descriptor: &str,
    ) -> Result<Option<DetailsTarget>, DraftError>
    where
        M: SubmissionMonitor,
        A: ApplicationRefresher,
    {
        let request = {
            let mut state = self.state.lock().await;
            let pattern = NamePattern::for_vpc(state.draft.vpc_id.as_ref());
            if !pattern.matches(&state.draft.name) {
                return Err(DraftError::InvalidName {
                    name: state.draft.name.clone(),
                    pattern: pattern.as_str(),
                });
            }
            state.submitting = true;
            UpsertRequest {
                application: self.application.name.clone(),
                descriptor: descriptor.to_string(),
                draft: state.draft.clone(),
            }
        };

        info!(
            application = %request.application,
            name = %request.draft.name,
            descriptor,
            "Submitting security group"
        );
        if let Err(e) = monitor.submit(request).await {
            self.state.lock().await.submitting = false;
            warn!(error = %e, "Security group task failed");
            return Err(e.into());
        }

        self.on_task_complete(refresher).await
    }

    async fn on_task_complete<A: ApplicationRefresher>(
        &self,
        refresher: &A,
    ) -> Result<Option<DetailsTarget>, DraftError> {
        let refreshed = refresher.refresh_security_groups().await;

        let mut state = self.state.lock().await;
        state.submitting = false;
        refreshed?;

        if state.closed {
            info!(name = %state.draft.name, "Session closed before task completed");
            return Ok(None);
        }
        state.closed = true;

        let target = DetailsTarget {
            name: state.draft.name.clone(),
            account_id: state.draft.account_name.clone(),
            region: state.draft.regions.first().cloned(),
            vpc_id: state.draft.vpc_id.clone(),
            provider: self.settings.provider.clone(),
        };
        info!(name = %target.name, account = %target.account_id, "Security group ready");
        self.events.emit(DraftEvent::DetailsReady(target.clone()));
        Ok(Some(target))
    }

    /// End the session; in-flight refreshes are cancelled and later task
    /// completions do not navigate
    pub async fn close(&self) {
        if let Some(token) = self.refresh_token.lock().await.take() {
            token.cancel();
        }
        let mut state = self.state.lock().await;
        state.closed = true;
        state.refreshing_security_groups = false;
        info!(application = %self.application.name, "Session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{
        MockAccountDirectory, MockApplicationRefresher, MockReferenceCache,
        MockSubmissionMonitor,
    };
    use secgroup_common::{ApplicationContext, Draft, ProviderSettings};

    fn controller(draft: Draft) -> DraftController<MockReferenceCache, MockAccountDirectory> {
        DraftController::new(
            MockReferenceCache::new(),
            MockAccountDirectory::new(),
            ProviderSettings::default(),
            ApplicationContext::new("app", 0),
            draft,
        )
    }

    fn named(name: &str) -> Draft {
        Draft {
            name: name.to_string(),
            ..Draft::new("prod", &["us-east-1", "us-west-2"]).with_vpc("vpc-1")
        }
    }

    fn refresher() -> MockApplicationRefresher {
        let mut refresher = MockApplicationRefresher::new();
        refresher
            .expect_refresh_security_groups()
            .times(1)
            .returning(|| Ok(()));
        refresher
    }

    #[tokio::test]
    async fn test_upsert_emits_details_ready() {
        let ctrl = controller(named("app-web"));
        let mut events = ctrl.subscribe();

        let mut monitor = MockSubmissionMonitor::new();
        monitor
            .expect_submit()
            .withf(|req| req.descriptor == "Create" && req.application == "app")
            .times(1)
            .returning(|_| Ok(()));

        let target = ctrl
            .upsert(&monitor, &refresher(), "Create")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(target.name, "app-web");
        assert_eq!(target.region.as_deref(), Some("us-east-1"));
        assert_eq!(target.provider, "aws");

        assert_eq!(events.recv().await.unwrap(), DraftEvent::DetailsReady(target));
        let session = ctrl.session().await;
        assert!(session.closed);
        assert!(!session.submitting);
    }

    #[tokio::test]
    async fn test_invalid_name_blocks_submit() {
        let ctrl = controller(named("app~web"));
        let monitor = MockSubmissionMonitor::new();
        let refresher = MockApplicationRefresher::new();

        let err = ctrl.upsert(&monitor, &refresher, "Create").await.unwrap_err();
        assert!(matches!(err, DraftError::InvalidName { .. }));
        assert!(!ctrl.session().await.submitting);
    }

    #[tokio::test]
    async fn test_task_failure_surfaces() {
        let ctrl = controller(named("app-web"));
        let mut monitor = MockSubmissionMonitor::new();
        monitor
            .expect_submit()
            .returning(|_| Err(anyhow::anyhow!("task failed: quota exceeded")));
        let refresher = MockApplicationRefresher::new();

        let err = ctrl.upsert(&monitor, &refresher, "Create").await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
        assert!(!ctrl.session().await.submitting);
    }

    #[tokio::test]
    async fn test_closed_session_does_not_navigate() {
        let ctrl = controller(named("app-web"));
        let mut events = ctrl.subscribe();
        ctrl.close().await;

        let mut monitor = MockSubmissionMonitor::new();
        monitor.expect_submit().returning(|_| Ok(()));

        let target = ctrl.upsert(&monitor, &refresher(), "Update").await.unwrap();
        assert!(target.is_none());
        assert!(events.try_recv().is_err());
    }
}
