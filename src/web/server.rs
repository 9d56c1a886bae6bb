//! Web服务器实现
//!
//! 提供HTTP服务器启动和优雅关闭

use super::{api, AppState};
use crate::config::WebConfig;
use crate::error::{ConfigError, Result};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Web服务器
pub struct WebServer {
    /// 配置
    config: WebConfig,
    /// 共享状态
    state: AppState,
}

impl WebServer {
    /// 创建新的Web服务器
    pub fn new(config: WebConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// 启动Web服务器，直到收到关闭信号
    pub async fn start(self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let addr = self
            .config
            .socket_addr()
            .map_err(ConfigError::ValidationError)?;

        let listener = TcpListener::bind(addr).await?;
        info!("Web服务器已启动: http://{}", addr);

        let app = api::create_router(self.state).layer(TraceLayer::new_for_http());

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("接收到关闭信号，正在关闭Web服务器...");
            })
            .await?;

        info!("Web服务器已关闭");
        Ok(())
    }
}
