//! StackState 快照数据结构
//!
//! 定义快照请求体、响应信封以及组件记录

use serde::{Deserialize, Serialize};
use std::fmt;

/// 组件健康状态
///
/// StackState 可能返回四种已知值以外的状态，这些值原样保留
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HealthState {
    Clear,
    Deviating,
    Critical,
    #[default]
    Unknown,
    /// 未识别的上游状态
    Other(String),
}

impl HealthState {
    pub fn as_str(&self) -> &str {
        match self {
            HealthState::Clear => "CLEAR",
            HealthState::Deviating => "DEVIATING",
            HealthState::Critical => "CRITICAL",
            HealthState::Unknown => "UNKNOWN",
            HealthState::Other(value) => value,
        }
    }
}

impl From<String> for HealthState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "CLEAR" => HealthState::Clear,
            "DEVIATING" => HealthState::Deviating,
            "CRITICAL" => HealthState::Critical,
            "UNKNOWN" => HealthState::Unknown,
            _ => HealthState::Other(value),
        }
    }
}

impl From<&str> for HealthState {
    fn from(value: &str) -> Self {
        HealthState::from(value.to_string())
    }
}

impl From<HealthState> for String {
    fn from(state: HealthState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 快照响应外层信封
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshotResponseWrapper {
    pub view_snapshot_response: ViewSnapshotResponse,
}

/// 快照响应
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewSnapshotResponse {
    #[serde(default)]
    pub components: Vec<Component>,
}

/// StackState 组件记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: ComponentState,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub identifiers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentState {
    #[serde(default)]
    pub health_state: HealthState,
}

/// 组件属性，集群和命名空间嵌在 URN 中
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Properties {
    #[serde(default)]
    pub namespace_identifier: String,
    #[serde(default)]
    pub cluster_name_identifier: String,
}

impl Component {
    pub fn health_state(&self) -> &HealthState {
        &self.state.health_state
    }
}

/// 快照查询请求体
#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshotRequest {
    #[serde(rename = "_type")]
    pub kind: &'static str,
    pub query: String,
    #[serde(rename = "queryVersion")]
    pub query_version: &'static str,
    pub metadata: QueryMetadata,
}

impl ViewSnapshotRequest {
    pub fn new(query: impl Into<String>, metadata: QueryMetadata) -> Self {
        Self {
            kind: "ViewSnapshotRequest",
            query: query.into(),
            query_version: "0.0.1",
            metadata,
        }
    }

    /// 按组件ID查询
    pub fn by_id(service_id: &str) -> Self {
        Self::new(
            format!("(id = \"{}\")", service_id),
            QueryMetadata::default(),
        )
    }

    /// 查询所有 service 类型组件
    pub fn all_services() -> Self {
        Self::new("(type = \"service\")", QueryMetadata::with_expansion_disabled())
    }
}

/// 查询元数据，所有分组选项均关闭
///
/// 服务发现查询额外显式关闭组件扩展选项，单个服务查询不发送这些字段
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetadata {
    #[serde(rename = "_type")]
    pub kind: &'static str,
    pub grouping_enabled: bool,
    pub show_indirect_relations: bool,
    pub min_group_size: u32,
    pub grouped_by_layer: bool,
    pub grouped_by_domain: bool,
    pub grouped_by_relation: bool,
    pub show_cause: &'static str,
    pub auto_grouping: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_components: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighboring_components: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_full_component: Option<bool>,
}

impl QueryMetadata {
    pub fn with_expansion_disabled() -> Self {
        Self {
            connected_components: Some(false),
            neighboring_components: Some(false),
            show_full_component: Some(false),
            ..Self::default()
        }
    }
}

impl Default for QueryMetadata {
    fn default() -> Self {
        Self {
            kind: "QueryMetadata",
            grouping_enabled: false,
            show_indirect_relations: false,
            min_group_size: 0,
            grouped_by_layer: false,
            grouped_by_domain: false,
            grouped_by_relation: false,
            show_cause: "NONE",
            auto_grouping: false,
            connected_components: None,
            neighboring_components: None,
            show_full_component: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_state_passthrough() {
        assert_eq!(HealthState::from("CLEAR"), HealthState::Clear);
        assert_eq!(
            HealthState::from("FLAPPING"),
            HealthState::Other("FLAPPING".to_string())
        );
        assert_eq!(HealthState::from("FLAPPING").to_string(), "FLAPPING");
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(ViewSnapshotRequest::by_id("123")).unwrap();

        assert_eq!(body["_type"], "ViewSnapshotRequest");
        assert_eq!(body["query"], "(id = \"123\")");
        assert_eq!(body["queryVersion"], "0.0.1");
        assert_eq!(body["metadata"]["_type"], "QueryMetadata");
        assert_eq!(body["metadata"]["showCause"], "NONE");
        assert_eq!(body["metadata"]["minGroupSize"], 0);
        assert_eq!(body["metadata"]["groupingEnabled"], false);
        assert_eq!(body["metadata"]["autoGrouping"], false);

        let metadata = body["metadata"].as_object().unwrap();
        assert_eq!(metadata.len(), 9);
        assert!(!metadata.contains_key("connectedComponents"));
        assert!(!metadata.contains_key("neighboringComponents"));
        assert!(!metadata.contains_key("showFullComponent"));
    }

    #[test]
    fn test_discovery_request_disables_expansion() {
        let body = serde_json::to_value(ViewSnapshotRequest::all_services()).unwrap();

        assert_eq!(body["query"], "(type = \"service\")");
        let metadata = body["metadata"].as_object().unwrap();
        assert_eq!(metadata.len(), 12);
        assert_eq!(metadata["connectedComponents"], false);
        assert_eq!(metadata["neighboringComponents"], false);
        assert_eq!(metadata["showFullComponent"], false);
    }

    #[test]
    fn test_response_decoding() {
        let json = r#"{
            "viewSnapshotResponse": {
                "components": [{
                    "id": 111,
                    "name": "eins-oelf",
                    "state": {"healthState": "DEVIATING"},
                    "properties": {
                        "clusterNameIdentifier": "urn:cluster:/kubernetes:cluster-eins-elf",
                        "namespaceIdentifier": "urn:kubernetes:/cluster-eins-elf:namespace/namespace-eins-elf"
                    },
                    "identifiers": ["namespace-eins-elf/111"]
                }]
            }
        }"#;

        let wrapper: ViewSnapshotResponseWrapper = serde_json::from_str(json).unwrap();
        let component = &wrapper.view_snapshot_response.components[0];
        assert_eq!(component.id, 111);
        assert_eq!(component.health_state(), &HealthState::Deviating);
        assert_eq!(
            component.properties.cluster_name_identifier,
            "urn:cluster:/kubernetes:cluster-eins-elf"
        );
    }
}
