//! 服务状态检查模块
//!
//! 提供检查状态机、评估器、指标和调度功能

pub mod check;
pub mod evaluator;
pub mod metric;
pub mod result;
pub mod scheduler;

// 重新导出主要类型
pub use check::{CheckConfig, CheckMode, CheckTarget, PrepareRequest, ServiceCheck, TargetRef};
pub use evaluator::CheckEvaluator;
pub use metric::{Metric, MetricState};
pub use result::{CheckFailure, FailureStatus, StatusResult};
pub use scheduler::{CheckRegistry, CheckRunner};
