use futures::future::join_all;
use gridctl::{
    ClusterStateSnapshot, ControlConfig, ControlError, EXIT_CODE_OK, GridCluster, NodeIdentity,
    open_control, start_control,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tempfile::tempdir;

fn id(text: &str) -> NodeIdentity {
    NodeIdentity::parse(text).unwrap()
}

#[tokio::test]
async fn metastate_survives_reopen() {
    let dir = tempdir().unwrap();
    let config = ControlConfig::new().work_dir(dir.path());

    {
        let (cluster, cmd) = open_control(config.clone()).await.unwrap();
        cluster.node_joined(id("node-a")).await.unwrap();
        cluster.node_joined(id("node-b")).await.unwrap();
        assert_eq!(cmd.execute(&["--activate"]).await, EXIT_CODE_OK);
        cluster.node_left(&id("node-b")).await.unwrap();
        assert_eq!(
            cmd.execute(&["--baseline", "remove", "node-b"]).await,
            EXIT_CODE_OK
        );
    }

    let cluster = GridCluster::open(config).await.unwrap();
    assert_eq!(
        cluster.state().await,
        ClusterStateSnapshot {
            active: true,
            baseline_size: 1,
            baseline_version: Some(2),
            online_nodes: 1,
        }
    );
    // The departed node is still remembered and can be restored by version.
    assert_eq!(cluster.resolve("node-b").await.unwrap(), id("node-b"));
    let report = cluster.set_baseline_version(1).await.unwrap();
    assert_eq!(report.baseline.unwrap().version, 3);
    assert_eq!(report.members.iter().filter(|m| !m.online).count(), 1);
}

#[tokio::test]
async fn history_size_is_applied_on_open() {
    let dir = tempdir().unwrap();
    let cluster = GridCluster::open(ControlConfig::new().work_dir(dir.path()).history_size(2))
        .await
        .unwrap();
    cluster.node_joined(id("a")).await.unwrap();
    cluster.node_joined(id("b")).await.unwrap();
    cluster.activate().await.unwrap();

    for _ in 0..3 {
        cluster.remove_from_baseline(vec!["b".into()]).await.unwrap();
        cluster.add_to_baseline(vec!["b".into()]).await.unwrap();
    }
    let versions: Vec<_> = cluster
        .baseline_history()
        .await
        .iter()
        .map(|b| b.version)
        .collect();
    assert_eq!(versions, vec![5, 6, 7]);
    assert!(matches!(
        cluster.set_baseline_version(1).await,
        Err(ControlError::NotFound(_))
    ));
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    assert!(matches!(
        GridCluster::open(ControlConfig::new().history_size(0)).await,
        Err(ControlError::Validation(_))
    ));
}

#[tokio::test]
async fn start_control_rejects_corrupt_metastore() {
    let dir = tempdir().unwrap();
    let config = ControlConfig::new().work_dir(dir.path());
    std::fs::write(config.metastore_path().unwrap(), b"{ broken").unwrap();

    let online = vec!["n1".to_string()];
    assert!(matches!(
        start_control(config, Some(&online[..])).await,
        Err(ControlError::Internal(_))
    ));
}

#[tokio::test]
async fn start_control_rejects_blank_online_id_before_opening() {
    let dir = tempdir().unwrap();
    let config = ControlConfig::new().work_dir(dir.path());
    let metastore = config.metastore_path().unwrap();

    let online = vec!["n1".to_string(), String::new(), "x".to_string()];
    assert!(matches!(
        start_control(config.clone(), Some(&online[..])).await,
        Err(ControlError::Validation(_))
    ));
    assert!(!metastore.exists());

    let online = vec!["n1".to_string(), "x".to_string()];
    let (cluster, _) = start_control(config, Some(&online[..])).await.unwrap();
    assert_eq!(cluster.state().await.online_nodes, 2);
}

#[tokio::test]
async fn discovery_snapshot_marks_missing_nodes_offline() {
    let cluster = GridCluster::new();
    cluster.node_joined(id("a")).await.unwrap();
    cluster.node_joined(id("b")).await.unwrap();

    let online: BTreeSet<_> = [id("b"), id("c")].into_iter().collect();
    cluster.apply_discovery(online).await.unwrap();

    let states = cluster.node_states().await;
    let online: Vec<_> = states
        .iter()
        .filter(|s| s.online)
        .map(|s| s.identity.to_string())
        .collect();
    assert_eq!(states.len(), 3);
    assert_eq!(online, vec!["b", "c"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mutations_serialize() {
    let cluster = Arc::new(GridCluster::new());
    cluster.node_joined(id("seed")).await.unwrap();
    cluster.activate().await.unwrap();

    let nodes: Vec<_> = (0..8).map(|i| id(&format!("node-{}", i))).collect();
    for node in &nodes {
        cluster.node_joined(node.clone()).await.unwrap();
    }

    let tasks = nodes.iter().map(|node| {
        let cluster = Arc::clone(&cluster);
        let token = node.to_string();
        tokio::spawn(async move { cluster.add_to_baseline(vec![token]).await })
    });
    let results = join_all(tasks).await;

    let mut committed_versions = Vec::new();
    for result in results {
        let report = result.unwrap().unwrap();
        committed_versions.push(report.baseline.unwrap().version);
    }
    committed_versions.sort();
    assert_eq!(committed_versions, (2..=9).collect::<Vec<u64>>());

    let history = cluster.baseline_history().await;
    for pair in history.windows(2) {
        assert_eq!(pair[1].version, pair[0].version + 1);
        assert_eq!(pair[1].size(), pair[0].size() + 1);
    }
    assert_eq!(cluster.current_baseline().await.unwrap().size(), 9);
}
