//! StackState 快照查询客户端
//!
//! 通过 `/snapshot` 端点查询单个服务或全部服务的组件快照

use crate::config::StackStateConfig;
use crate::error::SnapshotError;
use crate::snapshot::types::{Component, ViewSnapshotRequest, ViewSnapshotResponseWrapper};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, trace};

/// 快照查询接口，检查器和服务发现都只依赖这个接口
#[async_trait]
pub trait SnapshotApi: Send + Sync {
    /// 按ID查询单个服务组件
    ///
    /// # 参数
    /// * `service_id` - StackState 组件ID，不能为空
    ///
    /// # 返回
    /// * `Result<Component, SnapshotError>` - 第一个匹配的组件
    async fn query_one(&self, service_id: &str) -> Result<Component, SnapshotError>;

    /// 查询所有 service 类型的组件
    async fn query_all(&self) -> Result<Vec<Component>, SnapshotError>;
}

/// 基于 reqwest 的 StackState 客户端
///
/// 内部的 `reqwest::Client` 持有连接池，可在多个检查和服务发现之间共享
#[derive(Debug, Clone)]
pub struct StackStateClient {
    client: Client,
    snapshot_url: String,
}

impl StackStateClient {
    /// 创建新的 StackState 客户端
    ///
    /// # 参数
    /// * `config` - StackState 连接配置
    /// * `timeout` - 单次请求超时时间
    pub fn new(config: &StackStateConfig, timeout: Duration) -> Result<Self, SnapshotError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let token = HeaderValue::from_str(&config.service_token)
            .map_err(|_| SnapshotError::InvalidToken)?;
        headers.insert("X-API-Key", token);

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            snapshot_url: format!(
                "{}/snapshot",
                config.api_base_url.trim_end_matches('/')
            ),
        })
    }

    /// 执行快照查询
    async fn execute_snapshot_query(
        &self,
        request: &ViewSnapshotRequest,
    ) -> Result<Vec<Component>, SnapshotError> {
        debug!("执行StackState快照查询: {}", request.query);

        let response = self
            .client
            .post(&self.snapshot_url)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SnapshotError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let wrapper: ViewSnapshotResponseWrapper = serde_json::from_str(&body)?;
        trace!(
            "StackState响应: {:?}",
            wrapper.view_snapshot_response.components
        );

        Ok(wrapper.view_snapshot_response.components)
    }
}

#[async_trait]
impl SnapshotApi for StackStateClient {
    async fn query_one(&self, service_id: &str) -> Result<Component, SnapshotError> {
        if service_id.is_empty() {
            return Err(SnapshotError::EmptyServiceId);
        }

        let components = self
            .execute_snapshot_query(&ViewSnapshotRequest::by_id(service_id))
            .await?;

        components
            .into_iter()
            .next()
            .ok_or_else(|| SnapshotError::ComponentNotFound {
                service_id: service_id.to_string(),
            })
    }

    async fn query_all(&self) -> Result<Vec<Component>, SnapshotError> {
        self.execute_snapshot_query(&ViewSnapshotRequest::all_services())
            .await
    }
}
