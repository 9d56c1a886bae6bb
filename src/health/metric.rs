//! 服务状态指标
//!
//! 每次评估都会输出一个 `stackstate_service_status` 指标，供状态时间线展示

use crate::discovery::target::{ATTRIBUTE_K8S_SERVICE_NAME, ATTRIBUTE_SERVICE_ID};
use crate::snapshot::{Component, HealthState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 指标名称
pub const SERVICE_STATUS_METRIC: &str = "stackstate_service_status";

pub const LABEL_STATE: &str = "state";
pub const LABEL_TOOLTIP: &str = "tooltip";
pub const LABEL_URL: &str = "url";

/// 指标严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricState {
    Success,
    Warn,
    Danger,
}

impl From<&HealthState> for MetricState {
    fn from(state: &HealthState) -> Self {
        match state {
            HealthState::Clear => MetricState::Success,
            HealthState::Critical => MetricState::Danger,
            HealthState::Deviating | HealthState::Unknown | HealthState::Other(_) => {
                MetricState::Warn
            }
        }
    }
}

impl fmt::Display for MetricState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricState::Success => write!(f, "success"),
            MetricState::Warn => write!(f, "warn"),
            MetricState::Danger => write!(f, "danger"),
        }
    }
}

/// 检查指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub metric: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Metric {
    /// 根据组件当前状态构建服务状态指标
    ///
    /// # 参数
    /// * `component` - 观察到的组件（可能是降级组件）
    /// * `ui_base_url` - StackState UI 地址
    /// * `now` - 评估时间
    pub fn service_status(component: &Component, ui_base_url: &str, now: DateTime<Utc>) -> Self {
        let health_state = component.health_state();
        let identifier = component
            .identifiers
            .first()
            .map(String::as_str)
            .unwrap_or_default();

        let metric = BTreeMap::from([
            (ATTRIBUTE_SERVICE_ID.to_string(), component.id.to_string()),
            (ATTRIBUTE_K8S_SERVICE_NAME.to_string(), component.name.clone()),
            (
                LABEL_STATE.to_string(),
                MetricState::from(health_state).to_string(),
            ),
            (
                LABEL_TOOLTIP.to_string(),
                format!("Service status is: {}", health_state),
            ),
            (
                LABEL_URL.to_string(),
                format!(
                    "{}/#/components/{}",
                    ui_base_url,
                    query_escape(identifier)
                ),
            ),
        ]);

        Self {
            name: SERVICE_STATUS_METRIC.to_string(),
            metric,
            timestamp: now,
            value: 0.0,
        }
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.metric.get(key).map(String::as_str)
    }
}

/// 查询参数风格的转义，空格编码为 `+`
fn query_escape(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}
