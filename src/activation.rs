use crate::baseline::{BaselineStore, BaselineTopology};
use crate::core::{ControlError, NodeIdentity, Result};
use crate::registry::NodeRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Read-only view of the cluster state reported by `state`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterStateSnapshot {
    pub active: bool,
    pub baseline_size: usize,
    pub baseline_version: Option<u64>,
    pub online_nodes: usize,
}

/// What an activation request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    AlreadyActive,
    /// The cluster went active; carries the baseline seeded on first activation.
    Activated { seeded: Option<BaselineTopology> },
}

/// Default baseline policy for the first activation: every node that is
/// online at that moment.
pub fn seed_from_online(registry: &NodeRegistry) -> Result<BTreeSet<NodeIdentity>> {
    let online = registry.online_identities();
    if online.is_empty() {
        return Err(ControlError::Activation(
            "no server nodes are online".to_string(),
        ));
    }
    Ok(online)
}

/// INACTIVE (initial) / ACTIVE toggle gating persistence-backed operations.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivationStateMachine {
    active: bool,
}

impl ActivationStateMachine {
    pub fn new(active: bool) -> Self {
        Self { active }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Activates the cluster, seeding the baseline if none exists yet.
    pub fn activate(
        &mut self,
        registry: &NodeRegistry,
        store: &mut BaselineStore,
    ) -> Result<ActivationOutcome> {
        if self.active {
            return Ok(ActivationOutcome::AlreadyActive);
        }

        let online = seed_from_online(registry)?;
        let seeded = if store.current().is_none() {
            Some(store.commit(online))
        } else {
            None
        };

        self.active = true;
        Ok(ActivationOutcome::Activated { seeded })
    }

    /// Deactivates the cluster. Returns true if the state changed.
    ///
    /// The baseline is kept so the next activation reuses it.
    pub fn deactivate(&mut self) -> bool {
        std::mem::replace(&mut self.active, false)
    }

    pub fn current_state(
        &self,
        registry: &NodeRegistry,
        store: &BaselineStore,
    ) -> ClusterStateSnapshot {
        ClusterStateSnapshot {
            active: self.active,
            baseline_size: store.current().map(|b| b.size()).unwrap_or_default(),
            baseline_version: store.current().map(|b| b.version),
            online_nodes: registry.online_identities().len(),
        }
    }
}
