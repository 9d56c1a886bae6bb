//! 测试公共工具
//!
//! 提供可编排返回值的快照查询替身

#![allow(dead_code)]

use async_trait::async_trait;
use stackstate_extension::error::SnapshotError;
use stackstate_extension::snapshot::{
    Component, ComponentState, HealthState, Properties, SnapshotApi,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// 构建一个 kubernetes 服务组件
pub fn service_component(
    id: i64,
    name: &str,
    cluster: &str,
    namespace: &str,
    health_state: HealthState,
) -> Component {
    Component {
        id,
        name: name.to_string(),
        state: ComponentState { health_state },
        properties: Properties {
            cluster_name_identifier: format!("urn:cluster:/kubernetes:{}", cluster),
            namespace_identifier: format!("urn:kubernetes:/{}:namespace/{}", cluster, namespace),
        },
        identifiers: vec![format!("urn:service:/{}:{}:{}", cluster, namespace, name)],
    }
}

/// 按顺序返回预设结果的快照查询替身
///
/// 预设结果用完后，`query_one` 一直返回 `fallback` 状态的组件
pub struct ScriptedSnapshot {
    one: Mutex<VecDeque<Result<Component, SnapshotError>>>,
    all: Mutex<VecDeque<Result<Vec<Component>, SnapshotError>>>,
    fallback: HealthState,
    calls: AtomicUsize,
}

impl ScriptedSnapshot {
    pub fn new(fallback: HealthState) -> Self {
        Self {
            one: Mutex::new(VecDeque::new()),
            all: Mutex::new(VecDeque::new()),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn then_one(self, result: Result<Component, SnapshotError>) -> Self {
        self.one.lock().unwrap().push_back(result);
        self
    }

    pub fn then_state(self, health_state: HealthState) -> Self {
        let component = service_component(123, "test", "test-cluster", "default", health_state);
        self.then_one(Ok(component))
    }

    pub fn then_all(self, result: Result<Vec<Component>, SnapshotError>) -> Self {
        self.all.lock().unwrap().push_back(result);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotApi for ScriptedSnapshot {
    async fn query_one(&self, _service_id: &str) -> Result<Component, SnapshotError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.one.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Ok(service_component(
                123,
                "test",
                "test-cluster",
                "default",
                self.fallback.clone(),
            ))
        })
    }

    async fn query_all(&self) -> Result<Vec<Component>, SnapshotError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.all.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// 一个状态码错误
pub fn status_error(status: u16) -> SnapshotError {
    SnapshotError::Status {
        status,
        body: "upstream failure".to_string(),
    }
}

/// 一个真实的传输错误（连接被拒绝）
pub async fn transport_error() -> SnapshotError {
    let error = reqwest::Client::new()
        .post("http://127.0.0.1:1/snapshot")
        .send()
        .await
        .unwrap_err();
    SnapshotError::Transport(error)
}

/// 查询结果为空时的错误
pub fn not_found(service_id: &str) -> SnapshotError {
    SnapshotError::ComponentNotFound {
        service_id: service_id.to_string(),
    }
}
