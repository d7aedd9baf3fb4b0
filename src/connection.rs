//! Transport seam between the command handler and a live cluster.

use crate::activation::{ActivationOutcome, ClusterStateSnapshot};
use crate::baseline::{BaselineChange, BaselineReport};
use crate::cluster::GridCluster;
use crate::core::Result;
use async_trait::async_trait;

/// A connection to a running cluster, able to execute control requests.
///
/// Each call is a single request/response; implementations must not retry.
/// Transport failures are reported as `ControlError::Internal`.
#[async_trait]
pub trait ClusterConnection: Send + Sync {
    async fn activate(&self) -> Result<ActivationOutcome>;

    /// Returns true if the cluster was active before the call.
    async fn deactivate(&self) -> Result<bool>;

    async fn state(&self) -> Result<ClusterStateSnapshot>;

    async fn collect_baseline(&self) -> Result<BaselineReport>;

    async fn change_baseline(&self, change: BaselineChange) -> Result<BaselineReport>;
}

#[async_trait]
impl ClusterConnection for GridCluster {
    async fn activate(&self) -> Result<ActivationOutcome> {
        GridCluster::activate(self).await
    }

    async fn deactivate(&self) -> Result<bool> {
        GridCluster::deactivate(self).await
    }

    async fn state(&self) -> Result<ClusterStateSnapshot> {
        Ok(GridCluster::state(self).await)
    }

    async fn collect_baseline(&self) -> Result<BaselineReport> {
        Ok(self.collect().await)
    }

    async fn change_baseline(&self, change: BaselineChange) -> Result<BaselineReport> {
        GridCluster::change_baseline(self, change).await
    }
}
