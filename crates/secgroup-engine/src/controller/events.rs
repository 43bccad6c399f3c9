//! Notifications emitted by `DraftController`
//!
//! Events carry no state beyond "something changed"; consumers re-read the
//! session after receiving one.

use secgroup_common::VpcId;
use serde::Serialize;
use tokio::sync::broadcast;

/// Where to navigate once a submitted group shows up in the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailsTarget {
    pub name: String,
    pub account_id: String,
    pub region: Option<String>,
    pub vpc_id: Option<VpcId>,
    pub provider: String,
}

/// Event emitted by `DraftController`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftEvent {
    /// An account/region/VPC cascade settled and was applied
    CoordinatesChanged,
    /// The security-group catalog was (re)loaded
    AllSecurityGroupsUpdated,
    /// A submission completed and the application picked it up
    DetailsReady(DetailsTarget),
}

/// Fire-and-forget fan-out of [`DraftEvent`]s
#[derive(Debug)]
pub struct DraftEvents {
    sender: broadcast::Sender<DraftEvent>,
}

impl DraftEvents {
    /// Create a new broadcaster with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn emit(&self, event: DraftEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DraftEvent> {
        self.sender.subscribe()
    }
}
