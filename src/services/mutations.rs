//! 写操作网关
//!
//! insert / update / delete / bulk_insert 都返回统一的 `{data, error}` 信封。
//! 网关自身记录进行中的调用数与最近一次错误，供界面展示加载与错误状态。

use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::auth::RequestContext;
use crate::errors::{PortalError, Result};
use crate::models::{DeleteOutcome, Envelope};
use crate::storage::RemoteStore;

/// 进行中计数的守卫，任何退出路径（含取消）都会归还计数
struct InFlight<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct MutationGateway {
    store: Arc<dyn RemoteStore>,
    in_flight: AtomicUsize,
    last_error: RwLock<Option<String>>,
}

impl MutationGateway {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            in_flight: AtomicUsize::new(0),
            last_error: RwLock::new(None),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// 最近一次失败的提示；新的调用开始时清空
    pub fn error(&self) -> Option<String> {
        self.last_error
            .read()
            .map(|e| e.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn set_error(&self, error: Option<String>) {
        let mut slot = self
            .last_error
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = error;
    }

    /// 执行任意写操作并收敛为信封
    pub async fn mutate<T, F, Fut>(&self, context: &str, operation: F) -> Envelope<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let _guard = InFlight::enter(&self.in_flight);
        self.set_error(None);

        match operation().await {
            Ok(data) => Envelope::success(data),
            Err(e) => {
                self.set_error(Some(e.user_message()));
                Envelope::from_error(context, &e)
            }
        }
    }

    pub async fn insert<T: Serialize + Sync>(
        &self,
        ctx: &RequestContext,
        table: &str,
        record: &T,
    ) -> Envelope<Value> {
        self.mutate(&format!("creating record in {table}"), || async {
            let row = serde_json::to_value(record)?;
            let mut rows = self.store.insert(ctx, table, vec![row]).await?;
            rows.pop().ok_or_else(|| {
                PortalError::not_found(format!("Insert into {table} returned no row"))
            })
        })
        .await
    }

    pub async fn update<P: Serialize + Sync>(
        &self,
        ctx: &RequestContext,
        table: &str,
        id: &str,
        patch: &P,
    ) -> Envelope<Value> {
        self.mutate(&format!("updating record in {table}"), || async {
            let patch = serde_json::to_value(patch)?;
            self.store.update(ctx, table, id, patch).await
        })
        .await
    }

    pub async fn delete(&self, ctx: &RequestContext, table: &str, id: &str) -> Envelope<DeleteOutcome> {
        self.mutate(&format!("deleting record from {table}"), || async {
            self.store.delete(ctx, table, id).await?;
            Ok::<_, PortalError>(DeleteOutcome { success: true })
        })
        .await
    }

    pub async fn bulk_insert<T: Serialize + Sync>(
        &self,
        ctx: &RequestContext,
        table: &str,
        records: &[T],
    ) -> Envelope<Vec<Value>> {
        self.mutate(&format!("bulk inserting into {table}"), || async {
            if records.is_empty() {
                debug!("Bulk insert into {} skipped: no records", table);
                return Ok(Vec::new());
            }
            let rows = records
                .iter()
                .map(serde_json::to_value)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            self.store.insert(ctx, table, rows).await
        })
        .await
    }
}
