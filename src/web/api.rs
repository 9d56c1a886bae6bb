//! API路由实现
//!
//! 提供服务发现目标查询和服务检查的 准备/状态/停止 接口

use super::{ApiError, AppState};
use crate::discovery::Target;
use crate::health::{PrepareRequest, ServiceCheck, StatusResult};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// 服务发现目标列表响应
#[derive(Debug, Serialize, Deserialize)]
pub struct TargetsResponse {
    pub targets: Vec<Target>,
}

/// 检查准备响应
#[derive(Debug, Serialize, Deserialize)]
pub struct PrepareResponse {
    /// 检查ID，用于后续状态查询
    pub id: Uuid,
    /// 截止时间
    pub end: DateTime<Utc>,
}

/// 创建所有API路由
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/discovery/targets", get(targets_handler))
        .route("/checks", post(prepare_handler))
        .route("/checks/{id}/status", post(status_handler))
        .route("/checks/{id}", axum::routing::delete(stop_handler))
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "ok"
}

/// 最近一次服务发现的结果
async fn targets_handler(State(state): State<AppState>) -> Json<TargetsResponse> {
    let targets = state.discovery.targets().await;
    debug!("返回 {} 个服务发现目标", targets.len());
    Json(TargetsResponse { targets })
}

/// 准备检查
async fn prepare_handler(
    State(state): State<AppState>,
    Json(request): Json<PrepareRequest>,
) -> Result<Json<PrepareResponse>, ApiError> {
    let check = ServiceCheck::prepare(&request, Utc::now())?;
    let end = check.end();
    let id = state.registry.register(check).await;

    Ok(Json(PrepareResponse { id, end }))
}

/// 评估一次检查
async fn status_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResult>, ApiError> {
    let result = state.registry.status(id).await?;
    Ok(Json(result))
}

/// 停止检查
async fn stop_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.registry.stop(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::new(
            StatusCode::NOT_FOUND,
            format!("检查不存在: {}", id),
        ))
    }
}
