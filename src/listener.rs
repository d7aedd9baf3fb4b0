use crate::baseline::BaselineTopology;
use async_trait::async_trait;

/// Receives cluster transitions after they have been committed.
///
/// Implemented by the persistence and rebalancing subsystems. Notifications
/// are fire-and-forget: they cannot fail or veto a transition, and they are
/// delivered in commit order.
#[async_trait]
pub trait TopologyListener: Send + Sync {
    /// The cluster became active (`true`) or inactive (`false`).
    async fn on_activation_changed(&self, _active: bool) {}

    /// A new baseline version was committed.
    async fn on_baseline_changed(&self, _baseline: &BaselineTopology) {}
}

/// A committed transition, queued for delivery to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyEvent {
    ActivationChanged(bool),
    BaselineChanged(BaselineTopology),
}

impl TopologyEvent {
    pub async fn deliver(&self, listener: &dyn TopologyListener) {
        match self {
            TopologyEvent::ActivationChanged(active) => listener.on_activation_changed(*active).await,
            TopologyEvent::BaselineChanged(baseline) => listener.on_baseline_changed(baseline).await,
        }
    }
}
