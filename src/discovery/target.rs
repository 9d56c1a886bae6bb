//! 服务发现目标数据结构

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 目标类型
pub const SERVICE_TARGET_TYPE: &str = "com.steadybit.extension_stackstate.service";

pub const ATTRIBUTE_SERVICE_ID: &str = "stackstate.service.id";
pub const ATTRIBUTE_K8S_SERVICE_NAME: &str = "k8s.service.name";
pub const ATTRIBUTE_K8S_CLUSTER_NAME: &str = "k8s.cluster-name";
pub const ATTRIBUTE_K8S_NAMESPACE: &str = "k8s.namespace";

/// 服务发现目标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    /// StackState 组件ID（字符串形式）
    pub id: String,
    /// 服务名称
    pub label: String,
    pub target_type: String,
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl Target {
    /// 属性的第一个值
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// 移除匹配的属性，以 `*` 结尾的条目按前缀匹配
    pub fn exclude_attributes(&mut self, excludes: &[String]) {
        if excludes.is_empty() {
            return;
        }
        self.attributes.retain(|key, _| {
            !excludes.iter().any(|exclude| match exclude.strip_suffix('*') {
                Some(prefix) => key.starts_with(prefix),
                None => key == exclude,
            })
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Target {
        Target {
            id: "1".to_string(),
            label: "svc".to_string(),
            target_type: SERVICE_TARGET_TYPE.to_string(),
            attributes: BTreeMap::from([
                (ATTRIBUTE_SERVICE_ID.to_string(), vec!["1".to_string()]),
                (ATTRIBUTE_K8S_SERVICE_NAME.to_string(), vec!["svc".to_string()]),
                (ATTRIBUTE_K8S_NAMESPACE.to_string(), vec!["ns".to_string()]),
                (ATTRIBUTE_K8S_CLUSTER_NAME.to_string(), vec!["c".to_string()]),
            ]),
        }
    }

    #[test]
    fn test_exclude_exact_attribute() {
        let mut target = target();
        target.exclude_attributes(&[ATTRIBUTE_K8S_NAMESPACE.to_string()]);

        assert!(target.attribute(ATTRIBUTE_K8S_NAMESPACE).is_none());
        assert_eq!(target.attributes.len(), 3);
    }

    #[test]
    fn test_exclude_wildcard_attribute() {
        let mut target = target();
        target.exclude_attributes(&["k8s.*".to_string()]);

        assert_eq!(target.attributes.len(), 1);
        assert_eq!(target.attribute(ATTRIBUTE_SERVICE_ID), Some("1"));
    }
}
