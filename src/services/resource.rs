//! 单个查询资源的状态与过期响应保护
//!
//! 每次发起请求都会领取一个递增的代号，只有代号仍是最新时结果才会被采用。
//! 依赖键未变化时 `load_if_changed` 不会重新发请求。

use std::future::Future;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::models::{Envelope, FetchResult, FetchState};

/// 可以落入资源状态的查询结果
pub trait Settle<T> {
    fn settle(self) -> (T, Option<String>);
}

impl<U> Settle<Vec<U>> for FetchResult<U> {
    fn settle(self) -> (Vec<U>, Option<String>) {
        (self.data, self.error)
    }
}

impl<U> Settle<Option<U>> for Envelope<U> {
    fn settle(self) -> (Option<U>, Option<String>) {
        (self.data, self.error)
    }
}

/// 请求代号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

struct ResourceState<K, T> {
    key: Option<K>,
    data: T,
    loading: bool,
    error: Option<String>,
}

pub struct Resource<K, T> {
    generation: AtomicU64,
    state: RwLock<ResourceState<K, T>>,
}

/// 进行中的请求；被丢弃时若代号仍为最新则退出加载状态
struct Pending<'a, K, T>
where
    K: Clone + PartialEq,
    T: Clone + Default,
{
    resource: &'a Resource<K, T>,
    ticket: Ticket,
}

impl<K, T> Drop for Pending<'_, K, T>
where
    K: Clone + PartialEq,
    T: Clone + Default,
{
    fn drop(&mut self) {
        self.resource.with_state(|state| {
            if state.loading && self.resource.is_current(self.ticket) {
                debug!("Request #{} dropped before settling", self.ticket.0);
                state.loading = false;
            }
        });
    }
}

impl<K, T> Default for Resource<K, T>
where
    K: Clone + PartialEq,
    T: Clone + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> Resource<K, T>
where
    K: Clone + PartialEq,
    T: Clone + Default,
{
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            state: RwLock::new(ResourceState {
                key: None,
                data: T::default(),
                loading: false,
                error: None,
            }),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ResourceState<K, T>) -> R) -> R {
        let mut guard = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    /// 开始一次请求：记录依赖键并进入加载状态
    pub fn begin(&self, key: K) -> Ticket {
        let ticket = Ticket(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
        self.with_state(|state| {
            state.key = Some(key);
            state.loading = true;
        });
        ticket
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// 采用结果；代号已过期时丢弃并返回 `false`
    pub fn settle(&self, ticket: Ticket, data: T, error: Option<String>) -> bool {
        self.with_state(|state| {
            if !self.is_current(ticket) {
                debug!("Discarding stale response for request #{}", ticket.0);
                return false;
            }
            state.data = data;
            state.error = error;
            state.loading = false;
            true
        })
    }

    /// 发起请求并在完成时采用结果（若仍为最新）
    pub async fn load<R, F, Fut>(&self, key: K, loader: F) -> bool
    where
        R: Settle<T>,
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = R>,
    {
        let ticket = self.begin(key.clone());
        let _pending = Pending {
            resource: self,
            ticket,
        };
        let (data, error) = loader(key).await.settle();
        self.settle(ticket, data, error)
    }

    /// 依赖键变化时才重新请求
    pub async fn load_if_changed<R, F, Fut>(&self, key: K, loader: F) -> bool
    where
        R: Settle<T>,
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = R>,
    {
        let unchanged = self.with_state(|state| state.key.as_ref() == Some(&key));
        if unchanged {
            return false;
        }
        self.load(key, loader).await
    }

    /// 用当前依赖键重新请求；从未加载过时不做任何事
    pub async fn refetch<R, F, Fut>(&self, loader: F) -> bool
    where
        R: Settle<T>,
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = R>,
    {
        let key = self.with_state(|state| state.key.clone());
        match key {
            Some(key) => self.load(key, loader).await,
            None => false,
        }
    }

    /// 作废所有进行中的请求（组件卸载时调用）
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.with_state(|state| {
            state.key = None;
            state.loading = false;
        });
    }

    pub fn key(&self) -> Option<K> {
        self.with_state(|state| state.key.clone())
    }

    pub fn snapshot(&self) -> FetchState<T> {
        self.with_state(|state| FetchState {
            data: state.data.clone(),
            loading: state.loading,
            error: state.error.clone(),
        })
    }
}
