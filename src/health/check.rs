//! 服务状态检查
//!
//! 一个检查在有限时间窗口内观察单个服务的健康状态，并按检查模式给出通过/失败结论

use crate::discovery::target::{
    ATTRIBUTE_K8S_CLUSTER_NAME, ATTRIBUTE_K8S_SERVICE_NAME, ATTRIBUTE_SERVICE_ID,
};
use crate::error::CheckError;
use crate::health::result::CheckFailure;
use crate::snapshot::{Component, ComponentState, HealthState};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// 检查模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckMode {
    /// 整个检查期间都必须处于期望状态
    #[default]
    #[serde(rename = "allTheTime")]
    AllTheTime,
    /// 检查期间至少出现一次期望状态
    #[serde(rename = "atLeastOnce")]
    AtLeastOnce,
}

impl CheckMode {
    /// `success_seen` 的初始值
    fn initial_success_seen(self) -> bool {
        matches!(self, CheckMode::AllTheTime)
    }
}

impl fmt::Display for CheckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckMode::AllTheTime => write!(f, "allTheTime"),
            CheckMode::AtLeastOnce => write!(f, "atLeastOnce"),
        }
    }
}

impl FromStr for CheckMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allTheTime" => Ok(CheckMode::AllTheTime),
            "atLeastOnce" => Ok(CheckMode::AtLeastOnce),
            other => Err(format!(
                "无效的检查模式: {}，支持的模式: allTheTime, atLeastOnce",
                other
            )),
        }
    }
}

/// 检查参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckConfig {
    /// 检查时长（毫秒）
    pub duration: u64,
    /// 期望状态，空字符串等同于不设置
    #[serde(default)]
    pub expected_status: Option<String>,
    /// 检查模式
    #[serde(default)]
    pub status_check_mode: CheckMode,
}

impl CheckConfig {
    fn expected_health_state(&self) -> Option<HealthState> {
        self.expected_status
            .as_deref()
            .map(str::trim)
            .filter(|status| !status.is_empty())
            .map(HealthState::from)
    }
}

/// 检查目标的身份信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckTarget {
    pub service_id: String,
    pub service_name: String,
    pub cluster_name: String,
}

impl CheckTarget {
    /// 从服务发现产生的目标属性中提取身份信息
    pub fn from_attributes(attributes: &HashMap<String, Vec<String>>) -> Result<Self, CheckError> {
        let first = |key: &str| {
            attributes
                .get(key)
                .and_then(|values| values.first())
                .filter(|value| !value.is_empty())
                .cloned()
                .ok_or_else(|| CheckError::MissingAttribute(key.to_string()))
        };

        Ok(Self {
            service_id: first(ATTRIBUTE_SERVICE_ID)?,
            service_name: first(ATTRIBUTE_K8S_SERVICE_NAME)?,
            cluster_name: first(ATTRIBUTE_K8S_CLUSTER_NAME)?,
        })
    }
}

/// 目标引用（检查准备请求中的 target 部分）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetRef {
    #[serde(default)]
    pub attributes: HashMap<String, Vec<String>>,
}

/// 检查准备请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepareRequest {
    pub target: TargetRef,
    pub config: CheckConfig,
}

/// 运行中的服务检查状态
///
/// 身份字段在创建后不可变，只有 `success_seen` 会随每次评估变化
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceCheck {
    target: CheckTarget,
    component_id: i64,
    end: DateTime<Utc>,
    expected_status: Option<HealthState>,
    mode: CheckMode,
    success_seen: bool,
}

impl ServiceCheck {
    /// 创建新的检查，截止时间为 `now + duration`
    pub fn new(
        target: CheckTarget,
        config: &CheckConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, CheckError> {
        let component_id = target
            .service_id
            .parse::<i64>()
            .map_err(|_| CheckError::InvalidServiceId(target.service_id.clone()))?;

        if config.duration == 0 {
            return Err(CheckError::InvalidDuration(config.duration));
        }
        let end = i64::try_from(config.duration)
            .ok()
            .and_then(TimeDelta::try_milliseconds)
            .and_then(|delta| now.checked_add_signed(delta))
            .ok_or(CheckError::InvalidDuration(config.duration))?;

        let mode = config.status_check_mode;

        Ok(Self {
            target,
            component_id,
            end,
            expected_status: config.expected_health_state(),
            mode,
            success_seen: mode.initial_success_seen(),
        })
    }

    /// 根据准备请求创建检查
    pub fn prepare(request: &PrepareRequest, now: DateTime<Utc>) -> Result<Self, CheckError> {
        let target = CheckTarget::from_attributes(&request.target.attributes)?;
        Self::new(target, &request.config, now)
    }

    pub fn service_id(&self) -> &str {
        &self.target.service_id
    }

    pub fn service_name(&self) -> &str {
        &self.target.service_name
    }

    pub fn cluster_name(&self) -> &str {
        &self.target.cluster_name
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn expected_status(&self) -> Option<&HealthState> {
        self.expected_status.as_ref()
    }

    pub fn mode(&self) -> CheckMode {
        self.mode
    }

    pub fn success_seen(&self) -> bool {
        self.success_seen
    }

    /// 当前时间是否已超过截止时间
    pub fn is_completed_at(&self, now: DateTime<Utc>) -> bool {
        now > self.end
    }

    /// StackState 返回错误状态码时使用的降级组件，健康状态为 UNKNOWN
    pub fn degraded_component(&self) -> Component {
        Component {
            id: self.component_id,
            name: self.target.service_name.clone(),
            state: ComponentState {
                health_state: HealthState::Unknown,
            },
            properties: Default::default(),
            identifiers: vec![format!(
                "urn:service:/{}:{}:{}",
                self.target.cluster_name, self.target.service_name, self.target.service_id
            )],
        }
    }

    /// 按检查模式处理一次观察结果
    ///
    /// # 参数
    /// * `component_name` - 观察到的组件名称，用于失败信息
    /// * `observed` - 观察到的健康状态
    /// * `completed` - 本次评估时检查是否已到期
    ///
    /// # 返回
    /// * `Option<CheckFailure>` - 本次评估的失败结论
    pub fn observe(
        &mut self,
        component_name: &str,
        observed: &HealthState,
        completed: bool,
    ) -> Option<CheckFailure> {
        let expected = self.expected_status.as_ref()?;

        match self.mode {
            CheckMode::AllTheTime => (observed != expected).then(|| {
                CheckFailure::failed(format!(
                    "Service '{}' (id {}) has status '{}' whereas '{}' is expected.",
                    component_name, self.target.service_id, observed, expected
                ))
            }),
            CheckMode::AtLeastOnce => {
                if observed == expected {
                    self.success_seen = true;
                }
                (completed && !self.success_seen).then(|| {
                    CheckFailure::failed(format!(
                        "Service '{}' (id {}) didn't have status '{}' at least once.",
                        component_name, self.target.service_id, expected
                    ))
                })
            }
        }
    }
}
