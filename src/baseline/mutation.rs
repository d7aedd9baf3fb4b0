use super::store::{BaselineStore, BaselineTopology};
use crate::core::{ControlError, NodeIdentity, Result};
use crate::registry::NodeRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A requested change of the baseline, with identities still in printable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaselineChange {
    Add(Vec<String>),
    Remove(Vec<String>),
    Set(Vec<String>),
    Version(u64),
}

impl BaselineChange {
    pub fn name(&self) -> &'static str {
        match self {
            BaselineChange::Add(_) => "add",
            BaselineChange::Remove(_) => "remove",
            BaselineChange::Set(_) => "set",
            BaselineChange::Version(_) => "version",
        }
    }
}

impl fmt::Display for BaselineChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaselineChange::Version(version) => write!(f, "version {}", version),
            BaselineChange::Add(tokens)
            | BaselineChange::Remove(tokens)
            | BaselineChange::Set(tokens) => write!(f, "{} {}", self.name(), tokens.join(",")),
        }
    }
}

/// Result of a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationOutcome {
    /// A new baseline version was committed.
    Committed(BaselineTopology),
    /// The request did not change membership; nothing was committed.
    Unchanged(BaselineTopology),
}

impl MutationOutcome {
    pub fn baseline(&self) -> &BaselineTopology {
        match self {
            MutationOutcome::Committed(baseline) | MutationOutcome::Unchanged(baseline) => baseline,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, MutationOutcome::Committed(_))
    }
}

/// Validates baseline changes against the registry and commits them to the store.
///
/// Every operation validates completely before touching the store, so a
/// rejected request never leaves a partial change behind.
pub struct BaselineMutationEngine<'a> {
    store: &'a mut BaselineStore,
    registry: &'a NodeRegistry,
    active: bool,
}

impl<'a> BaselineMutationEngine<'a> {
    pub fn new(store: &'a mut BaselineStore, registry: &'a NodeRegistry, active: bool) -> Self {
        Self {
            store,
            registry,
            active,
        }
    }

    /// Current baseline; allowed in any cluster state.
    pub fn collect(&self) -> Option<&BaselineTopology> {
        self.store.current()
    }

    pub fn apply(&mut self, change: &BaselineChange) -> Result<MutationOutcome> {
        match change {
            BaselineChange::Add(tokens) => self.add(tokens),
            BaselineChange::Remove(tokens) => self.remove(tokens),
            BaselineChange::Set(tokens) => self.set(tokens),
            BaselineChange::Version(version) => self.set_by_version(*version),
        }
    }

    /// Adds online nodes to the baseline. Adding existing members is a no-op.
    pub fn add(&mut self, tokens: &[String]) -> Result<MutationOutcome> {
        let current = self.require_active("add")?;
        let identities = self.resolve_all(tokens)?;

        if let Some(offline) = identities.iter().find(|id| !self.registry.is_online(id)) {
            return Err(ControlError::Validation(format!(
                "node '{}' is offline and cannot be added to the baseline",
                offline
            )));
        }

        let mut next = current.members.clone();
        next.extend(identities);
        self.commit_if_changed(current, next)
    }

    /// Removes nodes, online or not, from the baseline.
    pub fn remove(&mut self, tokens: &[String]) -> Result<MutationOutcome> {
        let current = self.require_active("remove")?;
        let identities = self.resolve_all(tokens)?;

        let next: BTreeSet<_> = current.members.difference(&identities).cloned().collect();
        if next.is_empty() {
            return Err(ControlError::Validation(
                "removing these nodes would leave the baseline empty".to_string(),
            ));
        }
        self.commit_if_changed(current, next)
    }

    /// Replaces the baseline wholesale as a new version, even when the
    /// membership is unchanged. One unresolved token rejects the batch.
    pub fn set(&mut self, tokens: &[String]) -> Result<MutationOutcome> {
        self.require_active("set")?;
        let identities = self.resolve_all(tokens).map_err(|err| match err {
            ControlError::NotFound(what) => {
                ControlError::Validation(format!("baseline set rejected, unknown {}", what))
            }
            other => other,
        })?;
        Ok(MutationOutcome::Committed(self.store.commit(identities)))
    }

    /// Restores the membership of a retained version as a new version.
    pub fn set_by_version(&mut self, version: u64) -> Result<MutationOutcome> {
        self.require_active("version")?;
        let members = self.store.history_at(version)?.members.clone();
        Ok(MutationOutcome::Committed(self.store.commit(members)))
    }

    fn require_active(&self, operation: &str) -> Result<BaselineTopology> {
        if !self.active {
            return Err(ControlError::IllegalState(format!(
                "cannot {} baseline nodes while the cluster is inactive",
                operation
            )));
        }
        self.store.current().cloned().ok_or_else(|| {
            ControlError::IllegalState("baseline topology is not established".to_string())
        })
    }

    fn resolve_all(&self, tokens: &[String]) -> Result<BTreeSet<NodeIdentity>> {
        if tokens.is_empty() {
            return Err(ControlError::Validation(
                "expected at least one consistent ID".to_string(),
            ));
        }
        tokens
            .iter()
            .map(|token| self.registry.resolve(token))
            .collect()
    }

    fn commit_if_changed(
        &mut self,
        current: BaselineTopology,
        next: BTreeSet<NodeIdentity>,
    ) -> Result<MutationOutcome> {
        if next == current.members {
            return Ok(MutationOutcome::Unchanged(current));
        }
        Ok(MutationOutcome::Committed(self.store.commit(next)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(text: &str) -> NodeIdentity {
        NodeIdentity::parse(text).unwrap()
    }

    fn tokens(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn fixture() -> (BaselineStore, NodeRegistry) {
        let mut registry = NodeRegistry::new();
        registry.register(id("a"));
        registry.register(id("b"));
        registry.register(id("c"));
        registry.mark_offline(&id("c")).unwrap();

        let mut store = BaselineStore::default();
        store.commit([id("a")].into_iter().collect());
        (store, registry)
    }

    #[test]
    fn test_add_is_idempotent() {
        let (mut store, registry) = fixture();
        let mut engine = BaselineMutationEngine::new(&mut store, &registry, true);

        let first = engine.add(&tokens(&["b"])).unwrap();
        let second = engine.add(&tokens(&["b"])).unwrap();

        assert!(first.is_committed());
        assert!(!second.is_committed());
        assert_eq!(second.baseline().size(), 2);
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn test_add_rejects_offline_and_unknown() {
        let (mut store, registry) = fixture();
        let mut engine = BaselineMutationEngine::new(&mut store, &registry, true);

        assert!(matches!(
            engine.add(&tokens(&["c"])),
            Err(ControlError::Validation(_))
        ));
        assert!(matches!(
            engine.add(&tokens(&["b", "ghost"])),
            Err(ControlError::NotFound(_))
        ));
        assert_eq!(engine.collect().unwrap().size(), 1);
    }

    #[test]
    fn test_remove_offline_member() {
        let (mut store, mut registry) = fixture();
        registry.mark_online(&id("c")).unwrap();
        {
            let mut engine = BaselineMutationEngine::new(&mut store, &registry, true);
            engine.add(&tokens(&["c"])).unwrap();
        }
        registry.mark_offline(&id("c")).unwrap();

        let mut engine = BaselineMutationEngine::new(&mut store, &registry, true);
        let outcome = engine.remove(&tokens(&["c"])).unwrap();
        assert!(outcome.is_committed());
        assert_eq!(outcome.baseline().members, [id("a")].into_iter().collect());
    }

    #[test]
    fn test_remove_never_empties_baseline() {
        let (mut store, registry) = fixture();
        let mut engine = BaselineMutationEngine::new(&mut store, &registry, true);

        assert!(matches!(
            engine.remove(&tokens(&["a"])),
            Err(ControlError::Validation(_))
        ));
        let unchanged = engine.remove(&tokens(&["b"])).unwrap();
        assert!(!unchanged.is_committed());
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_set_is_all_or_nothing() {
        let (mut store, registry) = fixture();
        let mut engine = BaselineMutationEngine::new(&mut store, &registry, true);

        let err = engine.set(&tokens(&["b", "garbage"])).unwrap_err();
        assert!(matches!(err, ControlError::Validation(_)));
        assert!(err.to_string().contains("garbage"));
        assert_eq!(engine.collect().unwrap().members, [id("a")].into_iter().collect());

        let outcome = engine.set(&tokens(&["b", "c"])).unwrap();
        assert_eq!(outcome.baseline().members, [id("b"), id("c")].into_iter().collect());
    }

    #[test]
    fn test_set_with_same_membership_commits_new_version() {
        let (mut store, registry) = fixture();
        let mut engine = BaselineMutationEngine::new(&mut store, &registry, true);

        let outcome = engine.set(&tokens(&["a"])).unwrap();
        assert!(outcome.is_committed());
        assert_eq!(outcome.baseline().version, 2);
        assert_eq!(outcome.baseline().members, [id("a")].into_iter().collect());
    }

    #[test]
    fn test_set_by_version_advances_version() {
        let (mut store, registry) = fixture();
        let mut engine = BaselineMutationEngine::new(&mut store, &registry, true);
        engine.add(&tokens(&["b"])).unwrap();

        let restored = engine.set_by_version(1).unwrap();
        assert_eq!(restored.baseline().version, 3);
        assert_eq!(restored.baseline().members, [id("a")].into_iter().collect());

        assert!(matches!(
            engine.apply(&BaselineChange::Version(42)),
            Err(ControlError::NotFound(_))
        ));
    }

    #[test]
    fn test_mutations_require_active_cluster() {
        let (mut store, registry) = fixture();
        let mut engine = BaselineMutationEngine::new(&mut store, &registry, false);

        for change in [
            BaselineChange::Add(tokens(&["b"])),
            BaselineChange::Remove(tokens(&["a"])),
            BaselineChange::Set(tokens(&["b"])),
            BaselineChange::Version(1),
        ] {
            assert!(matches!(
                engine.apply(&change),
                Err(ControlError::IllegalState(_))
            ));
        }
        assert_eq!(engine.collect().unwrap().version, 1);
    }

    #[test]
    fn test_empty_token_list_is_rejected() {
        let (mut store, registry) = fixture();
        let mut engine = BaselineMutationEngine::new(&mut store, &registry, true);
        assert!(matches!(engine.add(&[]), Err(ControlError::Validation(_))));
    }
}
