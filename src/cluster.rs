use crate::activation::{ActivationOutcome, ClusterStateSnapshot};
use crate::baseline::{
    BaselineChange, BaselineMutationEngine, BaselineReport, BaselineTopology, MutationOutcome,
};
use crate::config::ControlConfig;
use crate::core::{ControlError, NodeIdentity, Result};
use crate::listener::{TopologyEvent, TopologyListener};
use crate::metastore::{ClusterMetastate, Metastore};
use crate::registry::NodeState;
use log::{debug, info};
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

/// The single commit point for cluster activation and baseline state.
///
/// Every transition locks the metastate, applies the change to a copy,
/// persists the copy and only then publishes it. A failed transition leaves
/// the published image untouched, and readers never observe a half-applied
/// change. Transitions serialize on the lock, so versions follow commit order.
///
/// Listeners are notified while the lock is held and must not call back
/// into mutating operations.
pub struct GridCluster {
    state: Mutex<ClusterMetastate>,
    metastore: Metastore,
    listeners: RwLock<Vec<Arc<dyn TopologyListener>>>,
}

impl Default for GridCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl GridCluster {
    /// Creates an in-memory cluster with default settings.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ClusterMetastate::default()),
            metastore: Metastore::in_memory(),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Opens a cluster, restoring the metastate from the work directory if present.
    pub async fn open(config: ControlConfig) -> Result<Self> {
        config.validate().map_err(ControlError::Validation)?;

        let metastore = Metastore::new(config.metastore_path());
        let mut state = match metastore.load().await? {
            Some(state) => {
                info!(
                    "Restored cluster metastate from {:?}: active={}, baseline version={}",
                    metastore.path(),
                    state.activation.is_active(),
                    state.baseline.version()
                );
                state
            }
            None => ClusterMetastate::default(),
        };
        state.baseline.set_history_size(config.history_size);

        Ok(Self {
            state: Mutex::new(state),
            metastore,
            listeners: RwLock::new(Vec::new()),
        })
    }

    pub fn add_listener(&self, listener: Arc<dyn TopologyListener>) -> Result<()> {
        self.listeners.write()?.push(listener);
        Ok(())
    }

    async fn transition<T>(
        &self,
        apply: impl FnOnce(&mut ClusterMetastate, &mut Vec<TopologyEvent>) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.state.lock().await;
        let mut next = guard.clone();
        let mut events = Vec::new();

        let value = apply(&mut next, &mut events)?;
        if next != *guard {
            self.metastore.save(&next).await?;
            *guard = next;
        }

        if !events.is_empty() {
            let listeners = self.listeners.read()?.clone();
            for event in &events {
                for listener in &listeners {
                    event.deliver(listener.as_ref()).await;
                }
            }
        }
        Ok(value)
    }

    // ==================== Discovery ====================

    /// Registers a node as online, remembering it if it is new.
    pub async fn node_joined(&self, identity: NodeIdentity) -> Result<()> {
        debug!("Node joined: {}", identity);
        self.transition(|state, _| {
            state.registry.register(identity);
            Ok(())
        })
        .await
    }

    /// Marks a known node offline. It stays remembered.
    pub async fn node_left(&self, identity: &NodeIdentity) -> Result<()> {
        debug!("Node left: {}", identity);
        self.transition(|state, _| state.registry.mark_offline(identity).map(|_| ()))
            .await
    }

    /// Replaces the online set with a discovery snapshot.
    pub async fn apply_discovery(&self, online: BTreeSet<NodeIdentity>) -> Result<()> {
        self.transition(|state, _| {
            state.registry.apply_discovery(&online);
            Ok(())
        })
        .await
    }

    pub async fn resolve(&self, text: &str) -> Result<NodeIdentity> {
        self.state.lock().await.registry.resolve(text)
    }

    pub async fn node_states(&self) -> Vec<NodeState> {
        self.state.lock().await.registry.states()
    }

    // ==================== Activation ====================

    pub async fn activate(&self) -> Result<ActivationOutcome> {
        let outcome = self
            .transition(|state, events| {
                let outcome = state
                    .activation
                    .activate(&state.registry, &mut state.baseline)?;
                if let ActivationOutcome::Activated { seeded } = &outcome {
                    if let Some(baseline) = seeded {
                        events.push(TopologyEvent::BaselineChanged(baseline.clone()));
                    }
                    events.push(TopologyEvent::ActivationChanged(true));
                }
                Ok(outcome)
            })
            .await?;

        match &outcome {
            ActivationOutcome::AlreadyActive => debug!("Cluster is already active"),
            ActivationOutcome::Activated { seeded: Some(baseline) } => info!(
                "Cluster activated with new baseline version {} ({} nodes)",
                baseline.version,
                baseline.size()
            ),
            ActivationOutcome::Activated { seeded: None } => info!("Cluster activated"),
        }
        Ok(outcome)
    }

    /// Deactivates the cluster. Returns true if it was active.
    pub async fn deactivate(&self) -> Result<bool> {
        let changed = self
            .transition(|state, events| {
                let changed = state.activation.deactivate();
                if changed {
                    events.push(TopologyEvent::ActivationChanged(false));
                }
                Ok(changed)
            })
            .await?;

        if changed {
            info!("Cluster deactivated");
        } else {
            debug!("Cluster is already inactive");
        }
        Ok(changed)
    }

    pub async fn state(&self) -> ClusterStateSnapshot {
        let state = self.state.lock().await;
        state
            .activation
            .current_state(&state.registry, &state.baseline)
    }

    // ==================== Baseline ====================

    pub async fn collect(&self) -> BaselineReport {
        let state = self.state.lock().await;
        BaselineReport::build(
            state.activation.is_active(),
            &state.baseline,
            &state.registry,
        )
    }

    pub async fn current_baseline(&self) -> Option<BaselineTopology> {
        self.state.lock().await.baseline.current().cloned()
    }

    /// Retained baseline versions, oldest first.
    pub async fn baseline_history(&self) -> Vec<BaselineTopology> {
        self.state.lock().await.baseline.history()
    }

    /// Applies a baseline change as one atomic transition.
    pub async fn change_baseline(&self, change: BaselineChange) -> Result<BaselineReport> {
        let report = self
            .transition(|state, events| {
                let active = state.activation.is_active();
                let outcome =
                    BaselineMutationEngine::new(&mut state.baseline, &state.registry, active)
                        .apply(&change)?;
                if let MutationOutcome::Committed(baseline) = &outcome {
                    events.push(TopologyEvent::BaselineChanged(baseline.clone()));
                }
                Ok(BaselineReport::build(active, &state.baseline, &state.registry)
                    .with_change(change.clone(), &outcome))
            })
            .await?;

        match &report.change {
            Some((change, true)) => info!(
                "Baseline {} committed version {} ({} nodes)",
                change.name(),
                report.baseline.as_ref().map(|b| b.version).unwrap_or_default(),
                report.size()
            ),
            Some((change, false)) => debug!("Baseline {} left membership unchanged", change),
            None => {}
        }
        Ok(report)
    }

    pub async fn add_to_baseline(&self, tokens: Vec<String>) -> Result<BaselineReport> {
        self.change_baseline(BaselineChange::Add(tokens)).await
    }

    pub async fn remove_from_baseline(&self, tokens: Vec<String>) -> Result<BaselineReport> {
        self.change_baseline(BaselineChange::Remove(tokens)).await
    }

    pub async fn set_baseline(&self, tokens: Vec<String>) -> Result<BaselineReport> {
        self.change_baseline(BaselineChange::Set(tokens)).await
    }

    pub async fn set_baseline_version(&self, version: u64) -> Result<BaselineReport> {
        self.change_baseline(BaselineChange::Version(version)).await
    }
}
