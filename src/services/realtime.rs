//! 实时订阅
//!
//! 频道按表订阅，可选 `column=eq.value` 过滤；调用方负责在不再需要时
//! `unsubscribe`（或直接丢弃订阅）以释放监听。

use std::sync::Arc;
use tracing::info;

use super::notifications::NOTIFICATIONS;
use crate::auth::RequestContext;
use crate::errors::Result;
use crate::storage::{ChangeFilter, RemoteStore, Subscription};

pub struct RealtimeService {
    store: Arc<dyn RemoteStore>,
}

impl RealtimeService {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    pub async fn subscribe_to_table(
        &self,
        ctx: &RequestContext,
        table: &str,
        filter: Option<ChangeFilter>,
    ) -> Result<Subscription> {
        let subscription = self.store.subscribe(ctx, table, filter.clone()).await?;
        match filter {
            Some(filter) => info!("Subscribed to {}_changes ({})", table, filter),
            None => info!("Subscribed to {}_changes", table),
        }
        Ok(subscription)
    }

    /// 当前用户收到的通知
    pub async fn subscribe_to_notifications(&self, ctx: &RequestContext) -> Result<Subscription> {
        let user_id = ctx.require_user()?;
        self.subscribe_to_table(ctx, NOTIFICATIONS, Some(ChangeFilter::eq("recipient_id", user_id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::services::test_support::context_for;
    use crate::storage::{ChangeKind, MemoryStore};
    use serde_json::json;
    use std::time::Duration;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_notification_feed_is_filtered_to_recipient() {
        let me = Uuid::new_v4();
        let store = Arc::new(MemoryStore::new());
        let service = RealtimeService::new(store.clone());
        let ctx = context_for(me, UserRole::Student);

        let mut feed = service.subscribe_to_notifications(&ctx).await.expect("subscribe");
        assert_eq!(store.listener_count(NOTIFICATIONS), 1);

        store
            .insert(
                &ctx,
                NOTIFICATIONS,
                vec![
                    json!({"recipient_id": Uuid::new_v4().to_string(), "title": "other"}),
                    json!({"recipient_id": me.to_string(), "title": "mine"}),
                ],
            )
            .await
            .expect("insert");

        let event = tokio::time::timeout(Duration::from_secs(1), feed.recv())
            .await
            .expect("event in time")
            .expect("event");
        assert_eq!(event.kind, ChangeKind::Insert);
        assert_eq!(event.record().map(|r| r["title"].clone()), Some(json!("mine")));

        feed.unsubscribe().await;
        assert_eq!(store.listener_count(NOTIFICATIONS), 0);
    }

    #[tokio::test]
    async fn test_anonymous_cannot_subscribe_to_notifications() {
        let store = Arc::new(MemoryStore::new());
        let service = RealtimeService::new(store.clone());
        let result = service
            .subscribe_to_notifications(&RequestContext::anonymous())
            .await;
        assert!(result.is_err());
        assert_eq!(store.listener_count(NOTIFICATIONS), 0);
    }

    #[tokio::test]
    async fn test_invalid_table_rejected() {
        let service = RealtimeService::new(Arc::new(MemoryStore::new()));
        let ctx = context_for(Uuid::new_v4(), UserRole::Teacher);
        assert!(service.subscribe_to_table(&ctx, "marks; drop", None).await.is_err());
    }
}
