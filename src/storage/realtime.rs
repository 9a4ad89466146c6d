//! 表变更订阅
//!
//! 每个订阅对应一个后台任务，任务把变更事件转发到 `mpsc` 通道。
//! `unsubscribe()` 或丢弃 [`Subscription`] 都会停止任务并释放监听。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::query::encode_value;
use crate::errors::{PortalError, Result};
use crate::utils::validate_identifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl FromStr for ChangeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INSERT" => Ok(ChangeKind::Insert),
            "UPDATE" => Ok(ChangeKind::Update),
            "DELETE" => Ok(ChangeKind::Delete),
            _ => Err(format!("Invalid change kind: {s}")),
        }
    }
}

/// 一条表变更
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub table: String,
    pub new: Option<Value>,
    pub old: Option<Value>,
    pub commit_timestamp: Option<DateTime<Utc>>,
}

impl ChangeEvent {
    /// 变更后的行；删除事件取变更前的行
    pub fn record(&self) -> Option<&Value> {
        self.new.as_ref().or(self.old.as_ref())
    }

    pub fn matches(&self, filter: &ChangeFilter) -> bool {
        match self.record().and_then(|row| row.get(&filter.column)) {
            Some(Value::Null) | None => false,
            Some(value) => encode_value(value) == filter.value,
        }
    }
}

/// 订阅过滤条件，形如 `recipient_id=eq.<uuid>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFilter {
    pub column: String,
    pub value: String,
}

impl ChangeFilter {
    pub fn eq(column: &str, value: impl ToString) -> Self {
        Self {
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_identifier(&self.column).map_err(PortalError::validation)
    }
}

impl fmt::Display for ChangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=eq.{}", self.column, self.value)
    }
}

impl FromStr for ChangeFilter {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self> {
        let (column, value) = s
            .split_once("=eq.")
            .ok_or_else(|| PortalError::validation(format!("Invalid change filter: {s}")))?;
        let filter = ChangeFilter::eq(column, value);
        filter.validate()?;
        Ok(filter)
    }
}

/// 活跃的订阅
pub struct Subscription {
    rx: mpsc::Receiver<ChangeEvent>,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(
        rx: mpsc::Receiver<ChangeEvent>,
        stop: oneshot::Sender<()>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            rx,
            stop: Some(stop),
            task: Some(task),
        }
    }

    /// 等待下一条变更；订阅结束后返回 `None`
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }

    /// 停止监听并等待后台任务退出
    pub async fn unsubscribe(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!("Realtime listener task failed: {}", e);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

/// 把进程内广播转为订阅（内存后端使用）
pub(crate) fn forward_broadcast(
    mut source: broadcast::Receiver<ChangeEvent>,
    filter: Option<ChangeFilter>,
    capacity: usize,
) -> Subscription {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = &mut stop_rx => break,
                received = source.recv() => match received {
                    Ok(event) => {
                        if filter.as_ref().is_some_and(|f| !event.matches(f)) {
                            continue;
                        }
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Realtime listener lagged, skipped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
        debug!("Realtime listener released");
    });

    Subscription::new(rx, stop_tx, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(row: Value) -> ChangeEvent {
        ChangeEvent {
            kind: ChangeKind::Insert,
            table: "notifications".to_string(),
            new: Some(row),
            old: None,
            commit_timestamp: None,
        }
    }

    #[test]
    fn test_filter_round_trip() {
        let filter: ChangeFilter = "recipient_id=eq.u-1".parse().expect("filter should parse");
        assert_eq!(filter, ChangeFilter::eq("recipient_id", "u-1"));
        assert_eq!(filter.to_string(), "recipient_id=eq.u-1");
        assert!("recipient_id=u-1".parse::<ChangeFilter>().is_err());
        assert!("bad col=eq.1".parse::<ChangeFilter>().is_err());
    }

    #[test]
    fn test_event_matching() {
        let filter = ChangeFilter::eq("recipient_id", "u-1");
        assert!(event(json!({"recipient_id": "u-1"})).matches(&filter));
        assert!(!event(json!({"recipient_id": "u-2"})).matches(&filter));
        assert!(!event(json!({"title": "x"})).matches(&filter));
        assert!(event(json!({"is_read": false})).matches(&ChangeFilter::eq("is_read", false)));
    }

    #[test]
    fn test_change_kind_parse() {
        assert_eq!("insert".parse::<ChangeKind>(), Ok(ChangeKind::Insert));
        assert_eq!("DELETE".parse::<ChangeKind>(), Ok(ChangeKind::Delete));
        assert!("TRUNCATE".parse::<ChangeKind>().is_err());
    }

    #[tokio::test]
    async fn test_forwarder_filters_and_stops() {
        let (sender, _) = broadcast::channel(16);
        let mut subscription = forward_broadcast(
            sender.subscribe(),
            Some(ChangeFilter::eq("recipient_id", "u-1")),
            8,
        );
        assert_eq!(sender.receiver_count(), 1);

        sender.send(event(json!({"recipient_id": "u-2"}))).ok();
        sender.send(event(json!({"recipient_id": "u-1", "title": "hi"}))).ok();

        let received = subscription.recv().await.expect("event should arrive");
        assert_eq!(received.new, Some(json!({"recipient_id": "u-1", "title": "hi"})));

        subscription.unsubscribe().await;
        assert_eq!(sender.receiver_count(), 0);
    }
}
