//! 服务发现缓存
//!
//! 启动时立即刷新一次，之后按固定间隔刷新，读取方总是拿到最近一次的结果

use crate::discovery::mapper::ServiceDiscovery;
use crate::discovery::target::Target;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// 缓存的目标列表及刷新时间
#[derive(Debug, Clone, Default)]
struct CachedTargets {
    targets: Vec<Target>,
    refreshed_at: Option<DateTime<Utc>>,
}

/// 服务发现缓存
#[derive(Clone)]
pub struct DiscoveryCache {
    discovery: Arc<ServiceDiscovery>,
    cached: Arc<RwLock<CachedTargets>>,
}

impl DiscoveryCache {
    pub fn new(discovery: Arc<ServiceDiscovery>) -> Self {
        Self {
            discovery,
            cached: Arc::new(RwLock::new(CachedTargets::default())),
        }
    }

    /// 立即刷新一次并返回目标数量
    pub async fn refresh(&self) -> usize {
        let targets = self.discovery.discover().await;
        let count = targets.len();

        let mut cached = self.cached.write().await;
        cached.targets = targets;
        cached.refreshed_at = Some(Utc::now());

        debug!("服务发现缓存已刷新，共 {} 个目标", count);
        count
    }

    /// 最近一次刷新的目标列表
    pub async fn targets(&self) -> Vec<Target> {
        self.cached.read().await.targets.clone()
    }

    /// 最近一次刷新时间
    pub async fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.cached.read().await.refreshed_at
    }

    /// 启动后台刷新任务，收到关闭信号后退出
    ///
    /// # 参数
    /// * `refresh_interval` - 刷新间隔
    /// * `shutdown_rx` - 关闭信号接收器
    pub fn spawn_refresh_task(
        &self,
        refresh_interval: Duration,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let cache = self.clone();

        tokio::spawn(async move {
            let mut ticker = interval(refresh_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!("服务发现刷新任务已启动，间隔 {:?}", refresh_interval);

            loop {
                tokio::select! {
                    // 第一次 tick 立即触发
                    _ = ticker.tick() => {
                        let count = cache.refresh().await;
                        info!("服务发现完成，共 {} 个目标", count);
                    }
                    _ = shutdown_rx.recv() => {
                        info!("服务发现刷新任务已停止");
                        break;
                    }
                }
            }
        })
    }
}
