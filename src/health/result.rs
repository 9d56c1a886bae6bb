//! 检查评估结果数据结构
//!
//! 定义单次评估返回的完成标记、失败结论和指标

use crate::health::metric::Metric;
use serde::{Deserialize, Serialize};

/// 失败结论的状态标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStatus {
    /// 期望未满足
    Failed,
}

/// 检查失败结论
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFailure {
    /// 面向用户的失败标题
    pub title: String,
    /// 状态标记
    pub status: FailureStatus,
}

impl CheckFailure {
    pub fn failed(title: String) -> Self {
        Self {
            title,
            status: FailureStatus::Failed,
        }
    }
}

/// 单次评估结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResult {
    /// 检查是否已到期
    pub completed: bool,
    /// 失败结论（如果有）
    pub error: Option<CheckFailure>,
    /// 描述当前观察状态的指标
    pub metrics: Vec<Metric>,
}

impl StatusResult {
    /// 是否带有失败结论
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// 第一个指标的 `state` 标签
    pub fn metric_state(&self) -> Option<&str> {
        self.metrics.first().and_then(|metric| metric.label("state"))
    }

    /// 转换为JSON字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
