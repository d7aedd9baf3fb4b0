// ============================================================================
// gridctl: cluster activation and baseline topology control
// ============================================================================

pub mod activation;
pub mod baseline;
pub mod cluster;
pub mod command;
pub mod config;
pub mod connection;
pub mod core;
pub mod listener;
pub mod metastore;
pub mod registry;

// Re-export main types for convenience
pub use activation::{ActivationOutcome, ActivationStateMachine, ClusterStateSnapshot, seed_from_online};
pub use baseline::{
    BaselineChange, BaselineMutationEngine, BaselineReport, BaselineStore, BaselineTopology,
    MutationOutcome,
};
pub use cluster::GridCluster;
pub use command::{
    CommandHandler, CommandReport, ControlCommand, EXIT_CODE_OK, EXIT_CODE_UNEXPECTED_ERROR,
};
pub use config::ControlConfig;
pub use connection::ClusterConnection;
pub use crate::core::{ControlError, NodeIdentity, Result};
pub use listener::{TopologyEvent, TopologyListener};
pub use registry::{NodeRegistry, NodeState};

// ============================================================================
// High-level entry point
// ============================================================================

/// Opens a cluster from `config` and returns a command handler bound to it.
///
/// # Examples
///
/// ```
/// use gridctl::{ControlConfig, EXIT_CODE_OK, NodeIdentity, open_control};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> gridctl::Result<()> {
/// let (cluster, handler) = open_control(ControlConfig::new()).await?;
/// cluster.node_joined(NodeIdentity::parse("node-1")?).await?;
///
/// assert_eq!(handler.execute(&["--activate"]).await, EXIT_CODE_OK);
/// assert!(cluster.state().await.active);
/// # Ok(())
/// # }
/// ```
pub async fn open_control(
    config: ControlConfig,
) -> Result<(std::sync::Arc<GridCluster>, CommandHandler)> {
    let cluster = std::sync::Arc::new(GridCluster::open(config).await?);
    let handler = CommandHandler::new(cluster.clone());
    Ok((cluster, handler))
}

/// Parses the `online` consistent IDs, opens the cluster and applies the
/// discovery snapshot. An invalid ID fails before the metastore is touched.
pub async fn start_control(
    config: ControlConfig,
    online: Option<&[String]>,
) -> Result<(std::sync::Arc<GridCluster>, CommandHandler)> {
    let online = online
        .map(|ids| {
            ids.iter()
                .map(|id| NodeIdentity::parse(id))
                .collect::<Result<std::collections::BTreeSet<_>>>()
        })
        .transpose()?;

    let (cluster, handler) = open_control(config).await?;
    if let Some(online) = online {
        cluster.apply_discovery(online).await?;
    }
    Ok((cluster, handler))
}
