//! Web API模块
//!
//! 提供服务发现和服务检查的HTTP接口

use crate::discovery::DiscoveryCache;
use crate::error::CheckError;
use crate::health::CheckRegistry;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

pub mod api;
pub mod server;

pub use server::WebServer;

/// Web服务器共享状态
#[derive(Clone)]
pub struct AppState {
    /// 运行中的检查
    pub registry: Arc<CheckRegistry>,
    /// 服务发现缓存
    pub discovery: DiscoveryCache,
}

impl AppState {
    pub fn new(registry: Arc<CheckRegistry>, discovery: DiscoveryCache) -> Self {
        Self {
            registry,
            discovery,
        }
    }
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// 面向用户的错误标题
    pub title: String,
    /// 详细信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// API错误类型
#[derive(Debug)]
pub struct ApiError {
    /// HTTP状态码
    pub status: StatusCode,
    /// 错误标题
    pub title: String,
    /// 详细信息
    pub detail: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, title: impl Into<String>) -> Self {
        Self {
            status,
            title: title.into(),
            detail: None,
        }
    }

    /// 添加详细信息
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl From<CheckError> for ApiError {
    fn from(error: CheckError) -> Self {
        match &error {
            CheckError::MissingAttribute(_)
            | CheckError::InvalidServiceId(_)
            | CheckError::InvalidDuration(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, error.to_string())
            }
            CheckError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, error.to_string()),
            CheckError::Snapshot(e) => ApiError::new(
                StatusCode::BAD_GATEWAY,
                "Failed to get service status from StackState.",
            )
            .with_detail(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("API错误 {}: {} {:?}", self.status, self.title, self.detail);
        }

        let body = ErrorBody {
            title: self.title,
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}
