//! StackState Extension - StackState 服务发现和服务状态检查扩展
//!
//! 这是一个用Rust编写的 StackState 扩展，支持：
//! - 通过快照查询接口获取服务组件状态
//! - 在时间窗口内按模式检查服务健康状态
//! - 把 StackState 服务映射为可选择的检查目标
//! - 结构化日志记录

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod health;
pub mod logging;
pub mod snapshot;
pub mod web;

// 重新导出主要类型
pub use config::{Config, GlobalConfig, StackStateConfig, WebConfig};
pub use discovery::{ServiceDiscovery, Target};
pub use error::ExtensionError;
pub use health::{CheckEvaluator, ServiceCheck, StatusResult};
pub use snapshot::{SnapshotApi, StackStateClient};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
