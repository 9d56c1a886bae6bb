//! 日志模块
//!
//! 基于 tracing 的结构化日志，`log` 宏通过 LogTracer 转发到同一个订阅者

use crate::health::{ServiceCheck, StatusResult};
use log::LevelFilter;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter, Layer};

/// 进程级别的日志初始化记录
#[derive(Debug, Default)]
struct InitRecord {
    /// 首次初始化的结果，`None` 表示尚未初始化
    outcome: Option<Result<(), String>>,
    /// 首次初始化使用的配置
    config: Option<LogConfig>,
}

static INIT_RECORD: OnceLock<Mutex<InitRecord>> = OnceLock::new();

/// 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 本扩展的日志级别
    pub level: LevelFilter,
    /// 输出JSON格式（便于日志采集）
    pub json_format: bool,
    /// 终端颜色
    pub ansi: bool,
    /// 依赖库的日志级别，默认压低 HTTP 栈的噪声
    pub dependency_levels: BTreeMap<String, LevelFilter>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            json_format: false,
            ansi: true,
            dependency_levels: BTreeMap::from([
                ("hyper".to_string(), LevelFilter::Warn),
                ("hyper_util".to_string(), LevelFilter::Warn),
                ("reqwest".to_string(), LevelFilter::Warn),
                ("tower_http".to_string(), LevelFilter::Info),
            ]),
        }
    }
}

impl LogConfig {
    /// 按级别和输出格式创建配置
    pub fn new(level: LevelFilter, json_format: bool) -> Self {
        Self {
            level,
            json_format,
            ansi: !json_format,
            ..Default::default()
        }
    }

    /// 构建 tracing 过滤器，`RUST_LOG` 中的指令优先生效
    fn env_filter(&self) -> anyhow::Result<EnvFilter> {
        let mut filter = EnvFilter::builder()
            .with_default_directive(parse_directive(level_name(self.level))?)
            .from_env_lossy();

        for (target, level) in &self.dependency_levels {
            filter = filter.add_directive(parse_directive(&format!(
                "{}={}",
                target,
                level_name(*level)
            ))?);
        }

        Ok(filter)
    }
}

/// 日志系统句柄
#[derive(Debug)]
pub struct LoggingSystem {
    config: LogConfig,
}

impl LoggingSystem {
    /// 初始化日志系统
    ///
    /// 只有第一次调用会安装全局订阅者，之后的调用复用第一次的结果
    pub fn setup_logging(config: LogConfig) -> anyhow::Result<Self> {
        let record = INIT_RECORD.get_or_init(|| Mutex::new(InitRecord::default()));
        let mut record = record
            .lock()
            .map_err(|_| anyhow::anyhow!("日志初始化记录锁已损坏"))?;

        let outcome = record
            .outcome
            .get_or_insert_with(|| install(&config).map_err(|e| e.to_string()))
            .clone();
        if record.config.is_none() {
            record.config = Some(config.clone());
        }

        outcome.map_err(|e| anyhow::anyhow!("日志系统初始化失败: {}", e))?;
        Ok(Self { config })
    }

    /// 日志系统是否已初始化
    pub fn is_initialized() -> bool {
        INIT_RECORD
            .get()
            .and_then(|record| record.lock().ok())
            .is_some_and(|record| record.outcome.is_some())
    }

    /// 首次初始化使用的配置
    pub fn current_config() -> Option<LogConfig> {
        INIT_RECORD
            .get()
            .and_then(|record| record.lock().ok())
            .and_then(|record| record.config.clone())
    }

    /// 记录一次检查评估结果
    pub fn log_check_result(&self, check: &ServiceCheck, result: &StatusResult) {
        let state = result.metric_state().unwrap_or("unknown");
        let failure = result.error.as_ref().map(|error| error.title.as_str());

        if self.config.json_format {
            let entry = json!({
                "type": "service_check",
                "service_id": check.service_id(),
                "service_name": check.service_name(),
                "cluster_name": check.cluster_name(),
                "state": state,
                "completed": result.completed,
                "failure": failure,
            });
            tracing::info!("{entry}");
            return;
        }

        match failure {
            Some(title) => tracing::warn!(
                "检查 {} (id {}) 状态 {}，失败: {}",
                check.service_name(),
                check.service_id(),
                state,
                title
            ),
            None => tracing::info!(
                "检查 {} (id {}) 状态 {}{}",
                check.service_name(),
                check.service_id(),
                state,
                if result.completed { "，已完成" } else { "" }
            ),
        }
    }
}

/// 安装 LogTracer 桥接和全局 tracing 订阅者
fn install(config: &LogConfig) -> anyhow::Result<()> {
    tracing_log::LogTracer::init().map_err(|e| anyhow::anyhow!("LogTracer初始化失败: {}", e))?;

    let timer = fmt::time::ChronoUtc::rfc_3339();
    let layer = if config.json_format {
        fmt::layer()
            .json()
            .with_timer(timer)
            .with_current_span(false)
            .boxed()
    } else {
        fmt::layer()
            .with_timer(timer)
            .with_ansi(config.ansi)
            .with_target(true)
            .boxed()
    };

    registry()
        .with(config.env_filter()?)
        .with(layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing订阅者初始化失败: {}", e))?;

    tracing::debug!("日志配置: {:?}", config);
    Ok(())
}

fn parse_directive(directive: &str) -> anyhow::Result<Directive> {
    directive
        .parse()
        .map_err(|e| anyhow::anyhow!("无效的日志指令 '{}': {}", directive, e))
}

fn level_name(level: LevelFilter) -> &'static str {
    match level {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
