//! StackState 快照查询模块
//!
//! 提供快照请求/响应数据结构和查询客户端

pub mod client;
pub mod types;

// 重新导出主要类型
pub use client::{SnapshotApi, StackStateClient};
pub use types::{Component, ComponentState, HealthState, Properties, ViewSnapshotRequest};
