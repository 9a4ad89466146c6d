use super::{NOTIFICATION_SELECT, NOTIFICATIONS, NotificationService};
use crate::auth::RequestContext;
use crate::models::FetchResult;
use crate::models::notifications::entities::Notification;
use crate::services::fetch::fetch_as;
use crate::storage::Query;

pub(crate) fn recipient_query(ctx: &RequestContext, select: &str, unread_only: bool) -> Query {
    let query = Query::new()
        .select(select)
        .eq_opt("recipient_id", ctx.user_id().map(|id| id.to_string()));
    if unread_only {
        query.eq("is_read", false)
    } else {
        query
    }
}

pub async fn list_notifications(
    service: &NotificationService,
    ctx: &RequestContext,
    unread_only: bool,
) -> FetchResult<Notification> {
    let query = recipient_query(ctx, NOTIFICATION_SELECT, unread_only).order("created_at", false);
    fetch_as(service.store.as_ref(), ctx, NOTIFICATIONS, &query).await
}
