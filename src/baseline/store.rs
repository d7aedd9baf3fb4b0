use crate::core::{ControlError, NodeIdentity, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Number of prior baseline versions retained for restore-by-version.
pub const DEFAULT_HISTORY_SIZE: usize = 16;

/// A committed baseline: the durable set of nodes partitions are assigned to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BaselineTopology {
    pub version: u64,
    pub members: BTreeSet<NodeIdentity>,
    pub created_at_ms: i64,
}

impl BaselineTopology {
    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, identity: &NodeIdentity) -> bool {
        self.members.contains(identity)
    }
}

/// Holds the current baseline plus a bounded history of the versions it replaced.
///
/// Versions start at 0 (no baseline) and every commit takes the next number.
/// This is a pure data structure; callers validate before committing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BaselineStore {
    last_version: u64,
    current: Option<BaselineTopology>,
    #[serde(default)]
    history: BTreeMap<u64, BaselineTopology>,
    history_size: usize,
}

impl Default for BaselineStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

impl BaselineStore {
    pub fn new(history_size: usize) -> Self {
        Self {
            last_version: 0,
            current: None,
            history: BTreeMap::new(),
            history_size,
        }
    }

    pub fn current(&self) -> Option<&BaselineTopology> {
        self.current.as_ref()
    }

    pub fn version(&self) -> u64 {
        self.last_version
    }

    /// Looks up a baseline by version, the current one included.
    pub fn history_at(&self, version: u64) -> Result<&BaselineTopology> {
        if let Some(current) = self.current.as_ref().filter(|c| c.version == version) {
            return Ok(current);
        }
        self.history.get(&version).ok_or_else(|| {
            ControlError::NotFound(format!("baseline topology version {}", version))
        })
    }

    /// Retained baselines in ascending version order, the current one last.
    pub fn history(&self) -> Vec<BaselineTopology> {
        self.history
            .values()
            .chain(self.current.iter())
            .cloned()
            .collect()
    }

    /// Commits `members` as the next version and archives the previous one.
    pub fn commit(&mut self, members: BTreeSet<NodeIdentity>) -> BaselineTopology {
        self.last_version = self.last_version.saturating_add(1);
        let next = BaselineTopology {
            version: self.last_version,
            members,
            created_at_ms: Utc::now().timestamp_millis(),
        };

        if let Some(previous) = self.current.replace(next.clone()) {
            self.history.insert(previous.version, previous);
        }
        while self.history.len() > self.history_size {
            self.history.pop_first();
        }
        next
    }

    /// Changes the retention bound, evicting the oldest entries if needed.
    pub fn set_history_size(&mut self, history_size: usize) {
        self.history_size = history_size;
        while self.history.len() > self.history_size {
            self.history.pop_first();
        }
    }
}
