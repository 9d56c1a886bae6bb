//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// 扩展程序的主要错误类型
#[derive(Error, Debug)]
pub enum ExtensionError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// StackState 快照查询错误
    #[error("快照查询错误: {0}")]
    Snapshot(#[from] SnapshotError),

    /// 服务检查错误
    #[error("服务检查错误: {0}")]
    Check(#[from] CheckError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 快照查询错误类型
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// 服务ID为空
    #[error("服务ID不能为空")]
    EmptyServiceId,

    /// 服务令牌不能作为请求头发送
    #[error("StackState服务令牌包含非法字符")]
    InvalidToken,

    /// 网络传输错误（DNS、连接、超时）
    #[error("StackState请求失败: {0}")]
    Transport(#[from] reqwest::Error),

    /// StackState 返回非成功状态码
    #[error("StackState响应了非预期的状态码 {status}: {body}")]
    Status { status: u16, body: String },

    /// 成功响应但无法解析
    #[error("StackState响应解析失败: {0}")]
    Decode(#[from] serde_json::Error),

    /// 成功响应但没有匹配的组件
    #[error("StackState中不存在服务ID为 {service_id} 的组件")]
    ComponentNotFound { service_id: String },
}

impl SnapshotError {
    /// 是否为上游可达但返回错误状态码
    pub fn is_status(&self) -> bool {
        matches!(self, SnapshotError::Status { .. })
    }
}

/// 服务检查错误类型
#[derive(Error, Debug)]
pub enum CheckError {
    /// 目标缺少必要属性
    #[error("Target is missing the '{0}' attribute.")]
    MissingAttribute(String),

    /// 服务ID不是整数
    #[error("无效的服务ID: {0}")]
    InvalidServiceId(String),

    /// 检查时长无效
    #[error("无效的检查时长: {0}ms")]
    InvalidDuration(u64),

    /// 检查不存在或已结束
    #[error("检查不存在: {0}")]
    NotFound(uuid::Uuid),

    /// 查询失败（无法降级处理的错误）
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// 服务发现映射错误类型
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MappingError {
    /// 集群标识符缺少 `urn:cluster:/kubernetes:` 前缀
    #[error("集群标识符格式无效: '{0}'")]
    ClusterIdentifier(String),

    /// 命名空间标识符与集群不匹配
    #[error("命名空间标识符格式无效: '{0}'")]
    NamespaceIdentifier(String),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, ExtensionError>;
