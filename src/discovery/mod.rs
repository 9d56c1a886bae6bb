//! 服务发现模块
//!
//! 把 StackState 中的 service 组件映射为可供检查选择的目标

pub mod cache;
pub mod mapper;
pub mod target;

// 重新导出主要类型
pub use cache::DiscoveryCache;
pub use mapper::{to_target, ServiceDiscovery};
pub use target::{Target, SERVICE_TARGET_TYPE};
