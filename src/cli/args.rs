//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use crate::config::Config;
use crate::health::CheckMode;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// StackState 扩展 - 服务发现和服务状态检查
#[derive(Parser, Debug, Clone)]
#[command(
    name = "stackstate-extension",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 配置文件路径
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径",
        env = "STACKSTATE_EXTENSION_CONFIG",
        global = true
    )]
    pub config: Option<PathBuf>,

    /// 日志级别，未指定时使用配置文件中的 `global.log_level`
    #[arg(
        short,
        long,
        value_enum,
        help = "日志级别（默认取配置文件中的值）",
        env = "STACKSTATE_EXTENSION_LOG_LEVEL",
        global = true
    )]
    pub log_level: Option<LogLevel>,

    /// 以JSON格式输出日志
    #[arg(long, help = "以JSON格式输出日志", global = true)]
    pub log_json: bool,

    /// 子命令
    #[command(subcommand)]
    pub command: Commands,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum LogLevel {
    /// 跟踪级别
    Trace,
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// 子命令定义
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 启动扩展服务（HTTP接口和定时服务发现）
    Start,

    /// 在本地运行一次服务状态检查
    Check {
        /// StackState 服务ID
        #[arg(long, value_name = "ID", help = "StackState 服务ID")]
        service_id: String,

        /// 服务名称
        #[arg(long, value_name = "NAME", help = "服务名称")]
        service_name: String,

        /// 集群名称
        #[arg(long, value_name = "NAME", help = "集群名称")]
        cluster_name: String,

        /// 检查时长（毫秒）
        #[arg(
            long,
            value_name = "MILLIS",
            default_value = "30000",
            help = "检查时长（毫秒）"
        )]
        duration_ms: u64,

        /// 期望状态（CLEAR、DEVIATING、CRITICAL、UNKNOWN）
        #[arg(long, value_name = "STATUS", help = "期望状态")]
        expected_status: Option<String>,

        /// 检查模式
        #[arg(
            long,
            value_name = "MODE",
            default_value = "allTheTime",
            help = "检查模式（allTheTime 或 atLeastOnce）"
        )]
        mode: CheckMode,
    },

    /// 执行一次服务发现
    Discover {
        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
        format: OutputFormat,
    },

    /// 验证配置文件
    Validate,

    /// 显示版本信息
    Version {
        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
        format: OutputFormat,
    },
}

/// 输出格式枚举
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum OutputFormat {
    /// 文本格式
    Text,
    /// JSON格式
    Json,
}

impl Args {
    /// 获取配置文件路径
    pub fn get_config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::get_default_config_path)
    }

    /// 实际生效的日志级别
    ///
    /// 命令行（或环境变量）优先，其次是配置文件，都没有时为 info
    pub fn effective_log_level(&self, config: Option<&Config>) -> log::LevelFilter {
        match &self.log_level {
            Some(level) => level.clone().into(),
            None => config
                .and_then(|config| config.global.log_level.parse().ok())
                .unwrap_or(log::LevelFilter::Info),
        }
    }
}
