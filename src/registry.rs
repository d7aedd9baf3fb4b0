use crate::core::{ControlError, NodeIdentity, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Status of a server node remembered by the cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeState {
    pub identity: NodeIdentity,
    pub online: bool,
}

/// Tracks every server node the cluster has seen and whether it is online.
///
/// Nodes are never forgotten: a node that leaves stays registered as offline
/// so that it can still be named in baseline commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeRegistry {
    nodes: BTreeMap<NodeIdentity, NodeState>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a registry from persisted node states.
    pub fn from_states(states: impl IntoIterator<Item = NodeState>) -> Self {
        let nodes = states
            .into_iter()
            .map(|state| (state.identity.clone(), state))
            .collect();
        Self { nodes }
    }

    /// Marks the node known and online. Idempotent.
    pub fn register(&mut self, identity: NodeIdentity) {
        self.nodes
            .entry(identity.clone())
            .and_modify(|state| state.online = true)
            .or_insert(NodeState {
                identity,
                online: true,
            });
    }

    /// Marks a known node offline.
    ///
    /// Returns true if the status changed.
    pub fn mark_offline(&mut self, identity: &NodeIdentity) -> Result<bool> {
        self.set_online(identity, false)
    }

    /// Marks a known node online.
    ///
    /// Returns true if the status changed.
    pub fn mark_online(&mut self, identity: &NodeIdentity) -> Result<bool> {
        self.set_online(identity, true)
    }

    fn set_online(&mut self, identity: &NodeIdentity, online: bool) -> Result<bool> {
        let state = self.nodes.get_mut(identity).ok_or_else(|| {
            ControlError::NotFound(format!("node with consistent ID '{}'", identity))
        })?;
        let changed = state.online != online;
        state.online = online;
        Ok(changed)
    }

    /// Applies a discovery snapshot: listed nodes become known and online,
    /// every other remembered node goes offline.
    pub fn apply_discovery(&mut self, online: &BTreeSet<NodeIdentity>) {
        for state in self.nodes.values_mut() {
            state.online = online.contains(&state.identity);
        }
        for identity in online {
            self.register(identity.clone());
        }
    }

    /// Resolves the printable form of a consistent ID to a registered identity.
    pub fn resolve(&self, text: &str) -> Result<NodeIdentity> {
        let identity = NodeIdentity::parse(text)?;
        if self.nodes.contains_key(&identity) {
            Ok(identity)
        } else {
            Err(ControlError::NotFound(format!(
                "node with consistent ID '{}'",
                identity
            )))
        }
    }

    pub fn is_online(&self, identity: &NodeIdentity) -> bool {
        self.nodes.get(identity).is_some_and(|state| state.online)
    }

    pub fn online_identities(&self) -> BTreeSet<NodeIdentity> {
        self.nodes
            .values()
            .filter(|state| state.online)
            .map(|state| state.identity.clone())
            .collect()
    }

    pub fn known_identities(&self) -> BTreeSet<NodeIdentity> {
        self.nodes.keys().cloned().collect()
    }

    /// Node states ordered by identity.
    pub fn states(&self) -> Vec<NodeState> {
        self.nodes.values().cloned().collect()
    }
}
