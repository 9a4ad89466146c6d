pub mod count;
pub mod list;
pub mod read;

use std::sync::Arc;
use uuid::Uuid;

use super::mutations::MutationGateway;
use crate::auth::RequestContext;
use crate::models::notifications::entities::Notification;
use crate::models::notifications::responses::{MarkAllReadResponse, UnreadCountResponse};
use crate::models::{Envelope, FetchResult};
use crate::storage::RemoteStore;

pub const NOTIFICATIONS: &str = "notifications";

pub const NOTIFICATION_SELECT: &str =
    "*, created_by_user:user_profiles!notifications_created_by_fkey(full_name, role)";

pub struct NotificationService {
    store: Arc<dyn RemoteStore>,
    gateway: MutationGateway,
}

impl NotificationService {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            gateway: MutationGateway::new(store.clone()),
            store,
        }
    }

    pub fn gateway(&self) -> &MutationGateway {
        &self.gateway
    }

    pub async fn list_notifications(
        &self,
        ctx: &RequestContext,
        unread_only: bool,
    ) -> FetchResult<Notification> {
        list::list_notifications(self, ctx, unread_only).await
    }

    pub async fn unread_count(&self, ctx: &RequestContext) -> Envelope<UnreadCountResponse> {
        count::get_unread_count(self, ctx).await
    }

    pub async fn mark_read(&self, ctx: &RequestContext, notification_id: Uuid) -> Envelope<Notification> {
        read::mark_read(self, ctx, notification_id).await
    }

    pub async fn mark_all_read(&self, ctx: &RequestContext) -> Envelope<MarkAllReadResponse> {
        read::mark_all_read(self, ctx).await
    }
}
