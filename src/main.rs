//! StackState Extension 主程序入口
//!
//! StackState 服务发现和服务状态检查扩展

use anyhow::{Context, Result};
use clap::Parser;
use stackstate_extension::cli::args::{Args, Commands};
use stackstate_extension::cli::commands::{
    CheckCommand, Command, DiscoverCommand, StartCommand, ValidateCommand, VersionCommand,
};
use stackstate_extension::config::{ConfigLoader, TomlConfigLoader};
use stackstate_extension::logging::{LogConfig, LoggingSystem};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse();

    // 初始化日志系统，配置文件不可用时由具体命令报告错误
    let config = TomlConfigLoader::new(true)
        .load_from_file(&args.get_config_path())
        .await
        .ok();
    let log_config = LogConfig::new(args.effective_log_level(config.as_ref()), args.log_json);

    let logging_system =
        Arc::new(LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?);

    info!("StackState Extension v{} 启动", stackstate_extension::VERSION);

    // 执行命令
    if let Err(e) = execute_command(&args, logging_system).await {
        error!("命令执行失败: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// 执行CLI命令
async fn execute_command(args: &Args, logging_system: Arc<LoggingSystem>) -> Result<()> {
    let command: Box<dyn Command> = match &args.command {
        Commands::Start => Box::new(StartCommand),
        Commands::Check { .. } => Box::new(CheckCommand::new(logging_system)),
        Commands::Discover { .. } => Box::new(DiscoverCommand),
        Commands::Validate => Box::new(ValidateCommand),
        Commands::Version { .. } => Box::new(VersionCommand),
    };

    command.execute(args).await.map_err(|e| anyhow::anyhow!(e))
}
