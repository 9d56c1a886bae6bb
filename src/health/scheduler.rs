//! 检查调度模块
//!
//! `CheckRegistry` 保存通过HTTP准备的检查，按需评估；
//! `CheckRunner` 在本地按固定间隔评估单个检查直到得出结论

use crate::error::CheckError;
use crate::health::check::ServiceCheck;
use crate::health::evaluator::CheckEvaluator;
use crate::health::result::StatusResult;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 已到期检查在注册表中的默认保留时间
pub const DEFAULT_RETENTION: TimeDelta = TimeDelta::minutes(5);

/// 注册表条目，截止时间单独保存，清理时无需获取检查锁
struct RegisteredCheck {
    end: DateTime<Utc>,
    check: Arc<Mutex<ServiceCheck>>,
}

/// 运行中检查的注册表
///
/// 每个检查有独立的锁，同一检查的并发评估会串行执行，不同检查之间互不影响。
/// 超过截止时间加保留时间仍未被轮询完成的检查会被清理
pub struct CheckRegistry {
    evaluator: Arc<CheckEvaluator>,
    retention: TimeDelta,
    checks: RwLock<HashMap<Uuid, RegisteredCheck>>,
}

impl CheckRegistry {
    pub fn new(evaluator: Arc<CheckEvaluator>) -> Self {
        Self::with_retention(evaluator, DEFAULT_RETENTION)
    }

    /// 使用指定的保留时间创建注册表
    pub fn with_retention(evaluator: Arc<CheckEvaluator>, retention: TimeDelta) -> Self {
        Self {
            evaluator,
            retention,
            checks: RwLock::new(HashMap::new()),
        }
    }

    /// 注册检查并返回其ID，同时清理过期检查
    pub async fn register(&self, check: ServiceCheck) -> Uuid {
        let id = Uuid::new_v4();
        info!(
            "注册服务检查 {}: 服务 {} (id {}), 模式 {}, 截止时间 {}",
            id,
            check.service_name(),
            check.service_id(),
            check.mode(),
            check.end()
        );

        let mut checks = self.checks.write().await;
        Self::retain_unexpired(&mut checks, Utc::now() - self.retention);
        checks.insert(
            id,
            RegisteredCheck {
                end: check.end(),
                check: Arc::new(Mutex::new(check)),
            },
        );
        id
    }

    /// 评估一次检查，检查完成后从注册表移除
    pub async fn status(&self, id: Uuid) -> Result<StatusResult, CheckError> {
        let check = self
            .checks
            .read()
            .await
            .get(&id)
            .map(|entry| entry.check.clone())
            .ok_or(CheckError::NotFound(id))?;

        let result = {
            let mut check = check.lock().await;
            self.evaluator.evaluate(&mut check, Utc::now()).await?
        };

        if result.completed {
            self.checks.write().await.remove(&id);
            info!("服务检查 {} 已完成, 失败: {}", id, result.is_failed());
        }

        Ok(result)
    }

    /// 停止并移除检查
    pub async fn stop(&self, id: Uuid) -> bool {
        let removed = self.checks.write().await.remove(&id).is_some();
        if removed {
            info!("停止服务检查 {}", id);
        }
        removed
    }

    /// 移除截止时间早于 `now - retention` 的检查
    ///
    /// # 返回
    /// * `usize` - 移除的检查数量
    pub async fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let mut checks = self.checks.write().await;
        Self::retain_unexpired(&mut checks, now - self.retention)
    }

    fn retain_unexpired(
        checks: &mut HashMap<Uuid, RegisteredCheck>,
        cutoff: DateTime<Utc>,
    ) -> usize {
        let before = checks.len();
        checks.retain(|_, entry| entry.end >= cutoff);
        let evicted = before - checks.len();
        if evicted > 0 {
            debug!("清理 {} 个过期的服务检查", evicted);
        }
        evicted
    }

    /// 启动后台清理任务，收到关闭信号后退出
    ///
    /// # 参数
    /// * `sweep_interval` - 清理间隔
    /// * `shutdown_rx` - 关闭信号接收器
    pub fn spawn_eviction_task(
        self: &Arc<Self>,
        sweep_interval: Duration,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let registry = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = interval(sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        registry.evict_expired(Utc::now()).await;
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("服务检查清理任务已停止");
                        break;
                    }
                }
            }
        })
    }

    /// 当前运行中的检查数量
    pub async fn len(&self) -> usize {
        self.checks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.checks.read().await.is_empty()
    }
}

/// 本地检查运行器
pub struct CheckRunner {
    evaluator: Arc<CheckEvaluator>,
    tick_interval: Duration,
}

impl CheckRunner {
    /// 创建新的检查运行器
    ///
    /// # 参数
    /// * `evaluator` - 检查评估器
    /// * `tick_interval` - 评估间隔
    pub fn new(evaluator: Arc<CheckEvaluator>, tick_interval: Duration) -> Self {
        Self {
            evaluator,
            tick_interval,
        }
    }

    /// 按固定间隔评估检查，直到检查到期或出现失败结论
    ///
    /// 单次评估出错（例如网络不可达）时记录日志并在下一次调度时重试，
    /// 截止时间过后仍然出错则返回该错误
    ///
    /// # 参数
    /// * `check` - 检查状态
    /// * `on_tick` - 每次成功评估后的回调
    ///
    /// # 返回
    /// * `Result<StatusResult, CheckError>` - 最后一次评估结果，或截止后的评估错误
    pub async fn run<F>(
        &self,
        check: &mut ServiceCheck,
        mut on_tick: F,
    ) -> Result<StatusResult, CheckError>
    where
        F: FnMut(&StatusResult) + Send,
    {
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "开始检查服务 {} (id {}), 截止时间 {}",
            check.service_name(),
            check.service_id(),
            check.end()
        );

        loop {
            ticker.tick().await;

            let result = match self.evaluator.evaluate(check, Utc::now()).await {
                Ok(result) => result,
                Err(e) if check.is_completed_at(Utc::now()) => {
                    warn!("检查已到期，最后一次评估失败: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("本次评估失败，等待下次调度: {}", e);
                    continue;
                }
            };

            on_tick(&result);

            if result.completed || result.is_failed() {
                debug!("检查结束: 已完成 {}, 失败 {}", result.completed, result.is_failed());
                return Ok(result);
            }
        }
    }
}
