//! 检查评估器
//!
//! 每次评估查询一次目标服务的当前状态，并把结果归约为 完成/失败/继续 的结论

use crate::error::CheckError;
use crate::health::check::ServiceCheck;
use crate::health::metric::Metric;
use crate::health::result::StatusResult;
use crate::snapshot::SnapshotApi;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error};

/// 检查评估器
pub struct CheckEvaluator {
    /// 快照查询客户端
    client: Arc<dyn SnapshotApi>,
    /// StackState UI 地址，用于指标中的深链接
    ui_base_url: String,
}

impl CheckEvaluator {
    /// 创建新的检查评估器
    ///
    /// # 参数
    /// * `client` - 快照查询客户端
    /// * `ui_base_url` - StackState UI 地址
    pub fn new(client: Arc<dyn SnapshotApi>, ui_base_url: impl Into<String>) -> Self {
        Self {
            client,
            ui_base_url: ui_base_url.into(),
        }
    }

    /// 执行一次评估
    ///
    /// StackState 返回错误状态码时按 UNKNOWN 状态继续评估；
    /// 传输错误、响应无法解析或组件不存在时返回错误，检查保持运行，由调用方在下次调度时重试
    ///
    /// # 参数
    /// * `check` - 检查状态
    /// * `now` - 评估时间
    ///
    /// # 返回
    /// * `Result<StatusResult, CheckError>` - 评估结果
    pub async fn evaluate(
        &self,
        check: &mut ServiceCheck,
        now: DateTime<Utc>,
    ) -> Result<StatusResult, CheckError> {
        let component = match self.client.query_one(check.service_id()).await {
            Ok(component) => component,
            Err(e) if e.is_status() => {
                error!(
                    "获取服务ID {} 的状态时StackState返回错误，按UNKNOWN处理: {}",
                    check.service_id(),
                    e
                );
                check.degraded_component()
            }
            Err(e) => {
                error!("获取服务ID {} 的状态失败: {}", check.service_id(), e);
                return Err(e.into());
            }
        };

        let completed = check.is_completed_at(now);
        let error = check.observe(&component.name, component.health_state(), completed);

        debug!(
            "服务 {} (id {}) 当前状态: {}, 已完成: {}, 失败: {}",
            component.name,
            check.service_id(),
            component.health_state(),
            completed,
            error.is_some()
        );

        Ok(StatusResult {
            completed,
            error,
            metrics: vec![Metric::service_status(&component, &self.ui_base_url, now)],
        })
    }
}
