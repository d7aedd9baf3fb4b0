use super::mutation::{BaselineChange, MutationOutcome};
use super::store::{BaselineStore, BaselineTopology};
use crate::core::NodeIdentity;
use crate::registry::{NodeRegistry, NodeState};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Baseline view printed by the `baseline` verbs.
///
/// Built from a single consistent image of the registry and the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BaselineReport {
    pub active: bool,
    pub baseline: Option<BaselineTopology>,
    /// Baseline members with their current status.
    pub members: Vec<NodeState>,
    /// Online nodes that are not part of the baseline.
    pub other_nodes: Vec<NodeIdentity>,
    /// The change that produced this report, if any, and whether it committed.
    pub change: Option<(BaselineChange, bool)>,
}

impl BaselineReport {
    pub fn build(active: bool, store: &BaselineStore, registry: &NodeRegistry) -> Self {
        let baseline = store.current().cloned();
        let members = baseline
            .iter()
            .flat_map(|b| b.members.iter())
            .map(|identity| NodeState {
                identity: identity.clone(),
                online: registry.is_online(identity),
            })
            .collect();
        let other_nodes = registry
            .online_identities()
            .into_iter()
            .filter(|identity| !baseline.as_ref().is_some_and(|b| b.contains(identity)))
            .collect();

        Self {
            active,
            baseline,
            members,
            other_nodes,
            change: None,
        }
    }

    pub fn with_change(mut self, change: BaselineChange, outcome: &MutationOutcome) -> Self {
        self.change = Some((change, outcome.is_committed()));
        self
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }
}

impl fmt::Display for BaselineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some((change, committed)) = &self.change {
            if *committed {
                writeln!(f, "Baseline {} applied.", change.name())?;
            } else {
                writeln!(f, "Baseline {}: no changes.", change.name())?;
            }
        }

        writeln!(
            f,
            "Cluster state: {}",
            if self.active { "active" } else { "inactive" }
        )?;

        let Some(baseline) = &self.baseline else {
            return writeln!(f, "Baseline nodes not found.");
        };

        writeln!(f, "Current baseline version: {}", baseline.version)?;
        writeln!(f)?;
        writeln!(f, "Baseline nodes:")?;
        for member in &self.members {
            writeln!(
                f,
                "    ConsistentID={}, STATE={}",
                member.identity,
                if member.online { "ONLINE" } else { "OFFLINE" }
            )?;
        }
        writeln!(f, "{}", "-".repeat(80))?;
        writeln!(f, "Number of baseline nodes: {}", self.size())?;

        if !self.other_nodes.is_empty() {
            writeln!(f)?;
            writeln!(f, "Other nodes:")?;
            for identity in &self.other_nodes {
                writeln!(f, "    ConsistentID={}", identity)?;
            }
        }
        Ok(())
    }
}
