//! Durable snapshot of the cluster metastate.
//!
//! The snapshot is rewritten on every transition: serialized to a temporary
//! file next to the target and atomically renamed over it, so a crash leaves
//! either the old or the new image on disk.

use crate::activation::ActivationStateMachine;
use crate::baseline::BaselineStore;
use crate::core::{ControlError, Result};
use crate::registry::{NodeRegistry, NodeState};
use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

const METASTORE_FORMAT_VERSION: u16 = 1;

/// Complete cluster metastate: activation flag, remembered nodes and baselines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterMetastate {
    pub activation: ActivationStateMachine,
    pub registry: NodeRegistry,
    pub baseline: BaselineStore,
}

#[derive(Debug, Serialize, Deserialize)]
struct MetastoreFile {
    format_version: u16,
    written_at_ms: i64,
    active: bool,
    #[serde(default)]
    nodes: Vec<NodeState>,
    baseline: BaselineStore,
}

/// Reads and writes the metastore file. Without a path it is a no-op.
#[derive(Debug, Clone, Default)]
pub struct Metastore {
    path: Option<PathBuf>,
}

impl Metastore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn load(&self) -> Result<Option<ClusterMetastate>> {
        let Some(path) = self.path.as_ref() else {
            return Ok(None);
        };
        if !fs::try_exists(path).await? {
            return Ok(None);
        }

        let bytes = fs::read(path).await?;
        let file = serde_json::from_slice::<MetastoreFile>(&bytes).map_err(|err| {
            ControlError::Internal(format!("parse metastore '{}': {}", path.display(), err))
        })?;
        if file.format_version > METASTORE_FORMAT_VERSION {
            return Err(ControlError::Internal(format!(
                "metastore '{}' has format version {}, newest supported is {}",
                path.display(),
                file.format_version,
                METASTORE_FORMAT_VERSION
            )));
        }

        debug!(
            "Loaded metastore '{}' written at {} ms",
            path.display(),
            file.written_at_ms
        );
        Ok(Some(ClusterMetastate {
            activation: ActivationStateMachine::new(file.active),
            registry: NodeRegistry::from_states(file.nodes),
            baseline: file.baseline,
        }))
    }

    pub async fn save(&self, state: &ClusterMetastate) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };

        let file = MetastoreFile {
            format_version: METASTORE_FORMAT_VERSION,
            written_at_ms: Utc::now().timestamp_millis(),
            active: state.activation.is_active(),
            nodes: state.registry.states(),
            baseline: state.baseline.clone(),
        };
        let json = serde_json::to_vec_pretty(&file)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, json).await?;
        fs::rename(&tmp_path, path).await?;
        Ok(())
    }
}
