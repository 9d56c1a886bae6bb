//! 服务发现测试

mod common;

use common::{service_component, status_error, transport_error, ScriptedSnapshot};
use stackstate_extension::discovery::{DiscoveryCache, ServiceDiscovery, SERVICE_TARGET_TYPE};
use stackstate_extension::snapshot::{Component, HealthState, SnapshotApi};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

fn discovery(snapshot: ScriptedSnapshot, excludes: &[&str]) -> ServiceDiscovery {
    let client: Arc<dyn SnapshotApi> = Arc::new(snapshot);
    ServiceDiscovery::new(client, excludes.iter().map(|e| e.to_string()).collect())
}

fn eins_elf() -> Component {
    let mut component = service_component(
        111,
        "eins-oelf",
        "cluster-eins-elf",
        "namespace-eins-elf",
        HealthState::Clear,
    );
    component.identifiers = vec!["namespace-eins-elf/111".to_string()];
    component
}

#[tokio::test]
async fn test_discover_maps_service_components() {
    let snapshot = ScriptedSnapshot::new(HealthState::Clear).then_all(Ok(vec![eins_elf()]));

    let targets = discovery(snapshot, &[]).discover().await;

    assert_eq!(targets.len(), 1);
    let target = &targets[0];
    assert_eq!(target.id, "111");
    assert_eq!(target.label, "eins-oelf");
    assert_eq!(target.target_type, SERVICE_TARGET_TYPE);
    assert_eq!(target.attributes.len(), 4);
    assert_eq!(target.attribute("k8s.cluster-name"), Some("cluster-eins-elf"));
    assert_eq!(target.attribute("k8s.namespace"), Some("namespace-eins-elf"));
    assert_eq!(target.attribute("k8s.service.name"), Some("eins-oelf"));
    assert_eq!(target.attribute("stackstate.service.id"), Some("111"));
}

#[tokio::test]
async fn test_discover_skips_malformed_components() {
    let mut foreign_cluster = service_component(2, "b", "x", "y", HealthState::Clear);
    foreign_cluster.properties.cluster_name_identifier = "urn:cluster:/openshift:x".to_string();

    let mut wrong_namespace = service_component(3, "c", "x", "y", HealthState::Clear);
    wrong_namespace.properties.namespace_identifier =
        "urn:kubernetes:/other:namespace/y".to_string();

    let snapshot = ScriptedSnapshot::new(HealthState::Clear).then_all(Ok(vec![
        foreign_cluster,
        eins_elf(),
        wrong_namespace,
    ]));

    let targets = discovery(snapshot, &[]).discover().await;

    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].id, "111");
}

#[tokio::test]
async fn test_discover_applies_attribute_excludes() {
    let snapshot = ScriptedSnapshot::new(HealthState::Clear).then_all(Ok(vec![eins_elf()]));

    let targets = discovery(snapshot, &["k8s.namespace", "stackstate.*"])
        .discover()
        .await;

    let attributes: Vec<_> = targets[0].attributes.keys().map(String::as_str).collect();
    assert_eq!(attributes, vec!["k8s.cluster-name", "k8s.service.name"]);
}

#[tokio::test]
async fn test_discover_upstream_failure_returns_empty() {
    let snapshot = ScriptedSnapshot::new(HealthState::Clear)
        .then_all(Err(status_error(502)))
        .then_all(Err(transport_error().await));
    let discovery = discovery(snapshot, &[]);

    assert!(discovery.discover().await.is_empty());
    assert!(discovery.discover().await.is_empty());
}

#[tokio::test]
async fn test_cache_refresh_and_shutdown() {
    let snapshot = ScriptedSnapshot::new(HealthState::Clear).then_all(Ok(vec![eins_elf()]));
    let cache = DiscoveryCache::new(Arc::new(discovery(snapshot, &[])));
    assert!(cache.targets().await.is_empty());
    assert!(cache.refreshed_at().await.is_none());

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = cache.spawn_refresh_task(Duration::from_secs(3600), shutdown_rx);

    // 第一次刷新在任务启动时立即执行
    for _ in 0..50 {
        if cache.refreshed_at().await.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(cache.targets().await.len(), 1);

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
}
