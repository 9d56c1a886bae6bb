//! 服务发现映射
//!
//! 查询所有 service 组件并转换为服务发现目标

use crate::discovery::target::{
    Target, ATTRIBUTE_K8S_CLUSTER_NAME, ATTRIBUTE_K8S_NAMESPACE, ATTRIBUTE_K8S_SERVICE_NAME,
    ATTRIBUTE_SERVICE_ID, SERVICE_TARGET_TYPE,
};
use crate::snapshot::{Component, SnapshotApi};
use crate::error::MappingError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

const CLUSTER_PREFIX: &str = "urn:cluster:/kubernetes:";

/// 把组件转换为服务发现目标
///
/// 集群名从 `urn:cluster:/kubernetes:<cluster>` 中提取，
/// 命名空间从 `urn:kubernetes:/<cluster>:namespace/<namespace>` 中提取
pub fn to_target(component: &Component) -> Result<Target, MappingError> {
    let properties = &component.properties;

    let cluster_name = properties
        .cluster_name_identifier
        .strip_prefix(CLUSTER_PREFIX)
        .ok_or_else(|| MappingError::ClusterIdentifier(properties.cluster_name_identifier.clone()))?;

    let namespace_prefix = format!("urn:kubernetes:/{}:namespace/", cluster_name);
    let namespace = properties
        .namespace_identifier
        .strip_prefix(namespace_prefix.as_str())
        .ok_or_else(|| MappingError::NamespaceIdentifier(properties.namespace_identifier.clone()))?;

    let id = component.id.to_string();

    Ok(Target {
        id: id.clone(),
        label: component.name.clone(),
        target_type: SERVICE_TARGET_TYPE.to_string(),
        attributes: BTreeMap::from([
            (
                ATTRIBUTE_K8S_SERVICE_NAME.to_string(),
                vec![component.name.clone()],
            ),
            (ATTRIBUTE_SERVICE_ID.to_string(), vec![id]),
            (ATTRIBUTE_K8S_NAMESPACE.to_string(), vec![namespace.to_string()]),
            (
                ATTRIBUTE_K8S_CLUSTER_NAME.to_string(),
                vec![cluster_name.to_string()],
            ),
        ]),
    })
}

/// 服务发现
///
/// 不保存任何状态，可与检查评估并发调用
pub struct ServiceDiscovery {
    client: Arc<dyn SnapshotApi>,
    attribute_excludes: Vec<String>,
}

impl ServiceDiscovery {
    /// 创建新的服务发现
    ///
    /// # 参数
    /// * `client` - 快照查询客户端
    /// * `attribute_excludes` - 需要从目标中移除的属性
    pub fn new(client: Arc<dyn SnapshotApi>, attribute_excludes: Vec<String>) -> Self {
        Self {
            client,
            attribute_excludes,
        }
    }

    /// 发现所有服务
    ///
    /// 查询失败时记录日志并返回空列表，标识符格式异常的组件会被跳过
    pub async fn discover(&self) -> Vec<Target> {
        let components = match self.client.query_all().await {
            Ok(components) => components,
            Err(e) => {
                error!("从StackState获取服务列表失败: {}", e);
                return Vec::new();
            }
        };

        debug!("StackState返回 {} 个服务组件", components.len());

        components
            .iter()
            .filter_map(|component| match to_target(component) {
                Ok(mut target) => {
                    target.exclude_attributes(&self.attribute_excludes);
                    Some(target)
                }
                Err(e) => {
                    warn!(
                        "跳过服务 {} (id {}): {}",
                        component.name, component.id, e
                    );
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Properties;

    fn component(cluster: &str, namespace: &str) -> Component {
        Component {
            id: 111,
            name: "eins-oelf".to_string(),
            state: Default::default(),
            properties: Properties {
                cluster_name_identifier: cluster.to_string(),
                namespace_identifier: namespace.to_string(),
            },
            identifiers: vec!["namespace-eins-elf/111".to_string()],
        }
    }

    #[test]
    fn test_to_target() {
        let target = to_target(&component(
            "urn:cluster:/kubernetes:cluster-eins-elf",
            "urn:kubernetes:/cluster-eins-elf:namespace/namespace-eins-elf",
        ))
        .unwrap();

        assert_eq!(target.id, "111");
        assert_eq!(target.label, "eins-oelf");
        assert_eq!(target.target_type, SERVICE_TARGET_TYPE);
        assert_eq!(target.attribute(ATTRIBUTE_K8S_CLUSTER_NAME), Some("cluster-eins-elf"));
        assert_eq!(target.attribute(ATTRIBUTE_K8S_NAMESPACE), Some("namespace-eins-elf"));
        assert_eq!(target.attribute(ATTRIBUTE_K8S_SERVICE_NAME), Some("eins-oelf"));
        assert_eq!(target.attribute(ATTRIBUTE_SERVICE_ID), Some("111"));
    }

    #[test]
    fn test_to_target_malformed_cluster() {
        let result = to_target(&component("urn:cluster:/openshift:c", ""));
        assert_eq!(
            result,
            Err(MappingError::ClusterIdentifier("urn:cluster:/openshift:c".to_string()))
        );
    }

    #[test]
    fn test_to_target_namespace_of_other_cluster() {
        let result = to_target(&component(
            "urn:cluster:/kubernetes:a",
            "urn:kubernetes:/b:namespace/ns",
        ));
        assert!(matches!(result, Err(MappingError::NamespaceIdentifier(_))));
    }
}
