//! 配置数据结构定义
//!
//! 定义扩展程序的配置结构体和验证逻辑

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// 主配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// 全局配置项
    #[serde(default)]
    pub global: GlobalConfig,
    /// StackState 连接配置
    pub stackstate: StackStateConfig,
    /// Web 服务器配置
    #[serde(default)]
    pub web: WebConfig,
}

/// 全局配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    /// 服务发现刷新间隔（秒）
    #[serde(default = "default_discovery_interval")]
    pub discovery_interval_seconds: u64,
    /// 检查状态轮询间隔（毫秒）
    #[serde(default = "default_check_interval")]
    pub check_interval_millis: u64,
}

/// StackState 连接配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StackStateConfig {
    /// API 基础地址，例如 `https://stackstate.example.com/api`
    pub api_base_url: String,
    /// 服务令牌（作为 X-API-Key 发送）
    pub service_token: String,
    /// 服务发现时需要排除的属性
    #[serde(default)]
    pub discovery_attribute_excludes: Vec<String>,
}

/// Web 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WebConfig {
    /// 绑定地址
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

// 默认值函数
fn default_log_level() -> String {
    "info".to_string()
}
fn default_timeout() -> u64 {
    10
}
fn default_discovery_interval() -> u64 {
    60
}
fn default_check_interval() -> u64 {
    1000
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8083
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            request_timeout_seconds: default_timeout(),
            discovery_interval_seconds: default_discovery_interval(),
            check_interval_millis: default_check_interval(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl GlobalConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn discovery_interval(&self) -> Duration {
        Duration::from_secs(self.discovery_interval_seconds)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_millis)
    }
}

impl StackStateConfig {
    /// StackState UI 地址：API 地址去掉末尾三个字符（即 `api`）
    pub fn ui_base_url(&self) -> &str {
        let cut = self
            .api_base_url
            .char_indices()
            .rev()
            .nth(2)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        &self.api_base_url[..cut]
    }
}

impl WebConfig {
    /// 解析监听地址
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| format!("无效的监听地址 {}:{}: {}", self.bind_address, self.port, e))
    }
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    if config.global.request_timeout_seconds == 0 {
        return Err("请求超时时间不能为0".to_string());
    }

    if config.global.discovery_interval_seconds == 0 {
        return Err("服务发现间隔不能为0".to_string());
    }

    if config.global.check_interval_millis == 0 {
        return Err("检查轮询间隔不能为0".to_string());
    }

    // 验证日志级别
    let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&config.global.log_level.as_str()) {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            config.global.log_level, valid_log_levels
        ));
    }

    let api_base_url = &config.stackstate.api_base_url;
    if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
        return Err(format!("StackState API地址格式无效: {}", api_base_url));
    }

    // UI 地址由 API 地址截去末尾三个字符得到
    if api_base_url.chars().count() < 3 {
        return Err("StackState API地址至少需要3个字符".to_string());
    }

    if config.stackstate.service_token.trim().is_empty() {
        return Err("StackState服务令牌不能为空".to_string());
    }

    if config
        .stackstate
        .discovery_attribute_excludes
        .iter()
        .any(|exclude| exclude.trim().is_empty())
    {
        return Err("服务发现排除属性不能为空字符串".to_string());
    }

    if config.web.bind_address.is_empty() {
        return Err("Web服务器绑定地址不能为空".to_string());
    }

    if config.web.port == 0 {
        return Err("Web服务器端口不能为0".to_string());
    }

    Ok(())
}
