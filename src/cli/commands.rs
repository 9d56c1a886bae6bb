//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::cli::args::{Args, Commands, OutputFormat};
use crate::config::{Config, ConfigLoader, TomlConfigLoader};
use crate::discovery::target::{ATTRIBUTE_K8S_CLUSTER_NAME, ATTRIBUTE_K8S_NAMESPACE};
use crate::discovery::{DiscoveryCache, ServiceDiscovery, Target};
use crate::error::Result;
use crate::health::{CheckConfig, CheckEvaluator, CheckRegistry, CheckRunner, CheckTarget, ServiceCheck};
use crate::logging::LoggingSystem;
use crate::snapshot::{SnapshotApi, StackStateClient};
use crate::web::{AppState, WebServer};
use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

/// 过期服务检查的清理间隔
const REGISTRY_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args) -> Result<()>;
}

/// 加载配置文件
async fn load_config(config_path: &Path) -> Result<Config> {
    let loader = TomlConfigLoader::new(true);
    loader.load_from_file(config_path).await
}

/// 根据配置创建 StackState 客户端
fn create_client(config: &Config) -> Result<Arc<dyn SnapshotApi>> {
    let client = StackStateClient::new(&config.stackstate, config.global.request_timeout())?;
    Ok(Arc::new(client))
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Version { format } = &args.command {
            match format {
                OutputFormat::Json => {
                    let version_info = serde_json::json!({
                        "name": crate::APP_NAME,
                        "version": crate::VERSION,
                        "description": crate::APP_DESCRIPTION
                    });
                    println!("{}", serde_json::to_string_pretty(&version_info)?);
                }
                OutputFormat::Text => {
                    println!("{} v{}", crate::APP_NAME, crate::VERSION);
                    println!("{}", crate::APP_DESCRIPTION);
                }
            }
        }
        Ok(())
    }
}

/// 验证命令
pub struct ValidateCommand;

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let config_path = args.get_config_path();
        println!("验证配置文件: {}", config_path.display());

        let config = load_config(&config_path).await?;

        println!("✓ 配置文件验证通过");
        println!("  StackState API: {}", config.stackstate.api_base_url);
        println!("  StackState UI: {}", config.stackstate.ui_base_url());
        println!("  请求超时: {}秒", config.global.request_timeout_seconds);
        println!("  服务发现间隔: {}秒", config.global.discovery_interval_seconds);
        println!("  检查间隔: {}毫秒", config.global.check_interval_millis);
        println!(
            "  Web监听地址: {}:{}",
            config.web.bind_address, config.web.port
        );
        if !config.stackstate.discovery_attribute_excludes.is_empty() {
            println!(
                "  排除属性: {}",
                config.stackstate.discovery_attribute_excludes.join(", ")
            );
        }

        Ok(())
    }
}

/// 服务发现命令
pub struct DiscoverCommand;

#[async_trait]
impl Command for DiscoverCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Discover { format } = &args.command {
            let config = load_config(&args.get_config_path()).await?;
            let discovery = ServiceDiscovery::new(
                create_client(&config)?,
                config.stackstate.discovery_attribute_excludes.clone(),
            );

            let targets = discovery.discover().await;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&targets)?);
                }
                OutputFormat::Text => self.print_text_targets(&targets),
            }
        }
        Ok(())
    }
}

impl DiscoverCommand {
    /// 打印文本格式结果
    fn print_text_targets(&self, targets: &[Target]) {
        if targets.is_empty() {
            println!("未发现任何服务");
            return;
        }

        println!(
            "{:<12} {:<30} {:<25} {:<25}",
            "ID", "服务名称", "命名空间", "集群"
        );
        println!("{}", "-".repeat(95));

        for target in targets {
            println!(
                "{:<12} {:<30} {:<25} {:<25}",
                target.id,
                target.label,
                target.attribute(ATTRIBUTE_K8S_NAMESPACE).unwrap_or("-"),
                target.attribute(ATTRIBUTE_K8S_CLUSTER_NAME).unwrap_or("-")
            );
        }
        println!("共 {} 个服务", targets.len());
    }
}

/// 本地服务检查命令
pub struct CheckCommand {
    logging: Arc<LoggingSystem>,
}

impl CheckCommand {
    pub fn new(logging: Arc<LoggingSystem>) -> Self {
        Self { logging }
    }
}

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let Commands::Check {
            service_id,
            service_name,
            cluster_name,
            duration_ms,
            expected_status,
            mode,
        } = &args.command
        else {
            return Ok(());
        };

        let config = load_config(&args.get_config_path()).await?;
        let evaluator = Arc::new(CheckEvaluator::new(
            create_client(&config)?,
            config.stackstate.ui_base_url(),
        ));

        let target = CheckTarget {
            service_id: service_id.clone(),
            service_name: service_name.clone(),
            cluster_name: cluster_name.clone(),
        };
        let check_config = CheckConfig {
            duration: *duration_ms,
            expected_status: expected_status.clone(),
            status_check_mode: *mode,
        };
        let mut check = ServiceCheck::new(target, &check_config, Utc::now())?;

        let runner = CheckRunner::new(evaluator, config.global.check_interval());
        let identity = check.clone();
        let logging = self.logging.clone();
        let result = runner
            .run(&mut check, |result| logging.log_check_result(&identity, result))
            .await
            .context("服务检查到期前未能获取服务状态")?;

        println!("{}", result.to_json()?);

        match result.error {
            Some(failure) => Err(anyhow::anyhow!("服务检查失败: {}", failure.title).into()),
            None => Ok(()),
        }
    }
}

/// 启动命令
pub struct StartCommand;

#[async_trait]
impl Command for StartCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let config = load_config(&args.get_config_path()).await?;
        let client = create_client(&config)?;

        let evaluator = Arc::new(CheckEvaluator::new(
            client.clone(),
            config.stackstate.ui_base_url(),
        ));
        let registry = Arc::new(CheckRegistry::new(evaluator));
        let discovery = DiscoveryCache::new(Arc::new(ServiceDiscovery::new(
            client,
            config.stackstate.discovery_attribute_excludes.clone(),
        )));

        let (shutdown_tx, _) = broadcast::channel(1);

        // 设置Ctrl+C信号处理
        let shutdown_tx_signal = shutdown_tx.clone();
        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("收到中断信号，正在停止服务...");
                    let _ = shutdown_tx_signal.send(());
                }
                Err(err) => {
                    error!("监听中断信号失败: {}", err);
                }
            }
        });

        let refresh_handle = discovery.spawn_refresh_task(
            config.global.discovery_interval(),
            shutdown_tx.subscribe(),
        );
        let eviction_handle =
            registry.spawn_eviction_task(REGISTRY_SWEEP_INTERVAL, shutdown_tx.subscribe());

        let server = WebServer::new(config.web.clone(), AppState::new(registry, discovery));
        let server_result = server.start(shutdown_tx.subscribe()).await;

        // Web服务器异常退出时也要停止后台任务
        let _ = shutdown_tx.send(());
        refresh_handle.await.context("等待服务发现任务结束失败")?;
        eviction_handle.await.context("等待服务检查清理任务结束失败")?;

        server_result?;
        info!("服务已停止");
        Ok(())
    }
}
