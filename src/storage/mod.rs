//! 远端存储层
//!
//! [`RemoteStore`] 是数据访问层与后端之间唯一的接缝：
//! - `postgrest`: Supabase / PostgREST HTTP 接口 + Phoenix 实时通道
//! - `memory`: 进程内实现，用于测试与离线开发

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::auth::RequestContext;
use crate::config::AppConfig;
use crate::errors::{PortalError, Result};

pub mod memory_store;
pub mod postgrest_store;
pub mod query;
pub mod realtime;

pub use memory_store::MemoryStore;
pub use postgrest_store::PostgrestStore;
pub use query::{Filter, OrderBy, Query};
pub use realtime::{ChangeEvent, ChangeFilter, ChangeKind, Subscription};

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// 后端名称（用于日志）
    fn backend_name(&self) -> &'static str;

    // 查询行
    async fn select(&self, ctx: &RequestContext, table: &str, query: &Query) -> Result<Vec<Value>>;
    // 插入一行或多行，返回插入后的完整行
    async fn insert(&self, ctx: &RequestContext, table: &str, rows: Vec<Value>)
    -> Result<Vec<Value>>;
    // 按 id 更新单行
    async fn update(&self, ctx: &RequestContext, table: &str, id: &str, patch: Value)
    -> Result<Value>;
    // 按 id 删除
    async fn delete(&self, ctx: &RequestContext, table: &str, id: &str) -> Result<()>;
    // 订阅表变更
    async fn subscribe(
        &self,
        ctx: &RequestContext,
        table: &str,
        filter: Option<ChangeFilter>,
    ) -> Result<Subscription>;
}

/// 按配置创建存储后端
pub fn create_store(config: &AppConfig) -> Result<Arc<dyn RemoteStore>> {
    let store: Arc<dyn RemoteStore> = match config.backend.kind.as_str() {
        "memory" => Arc::new(MemoryStore::new().with_channel_capacity(config.realtime.channel_capacity)),
        "postgrest" => Arc::new(PostgrestStore::new(config)?),
        other => {
            return Err(PortalError::store_plugin_not_found(format!(
                "Store backend '{other}' not found (expected postgrest or memory)"
            )));
        }
    };
    info!("Remote store initialized: {}", store.backend_name());
    Ok(store)
}
