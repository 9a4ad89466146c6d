use futures_util::future::join_all;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::list::recipient_query;
use super::{NOTIFICATIONS, NotificationService};
use crate::auth::RequestContext;
use crate::errors::{PortalError, Result};
use crate::models::Envelope;
use crate::models::notifications::entities::Notification;
use crate::models::notifications::requests::NotificationReadPatch;
use crate::models::notifications::responses::MarkAllReadResponse;
use crate::services::fetch::{decode_rows, select_as};

#[derive(Deserialize)]
struct NotificationId {
    id: Uuid,
}

fn read_patch() -> Result<serde_json::Value> {
    Ok(serde_json::to_value(NotificationReadPatch { is_read: true })?)
}

pub async fn mark_read(
    service: &NotificationService,
    ctx: &RequestContext,
    notification_id: Uuid,
) -> Envelope<Notification> {
    service
        .gateway
        .mutate("marking notification as read", || async {
            ctx.require_user()?;
            let row = service
                .store
                .update(ctx, NOTIFICATIONS, &notification_id.to_string(), read_patch()?)
                .await?;
            let mut decoded: Vec<Notification> = decode_rows(NOTIFICATIONS, vec![row])?;
            decoded
                .pop()
                .ok_or_else(|| PortalError::not_found("Update of notifications returned no row"))
        })
        .await
}

/// 逐条标记当前用户全部未读通知
pub async fn mark_all_read(
    service: &NotificationService,
    ctx: &RequestContext,
) -> Envelope<MarkAllReadResponse> {
    service
        .gateway
        .mutate("marking all notifications as read", || async {
            ctx.require_user()?;
            let unread: Vec<NotificationId> = select_as(
                service.store.as_ref(),
                ctx,
                NOTIFICATIONS,
                &recipient_query(ctx, "id", true),
            )
            .await?;

            let patch = read_patch()?;
            let updates = unread.iter().map(|n| {
                let patch = patch.clone();
                async move {
                    service
                        .store
                        .update(ctx, NOTIFICATIONS, &n.id.to_string(), patch)
                        .await
                }
            });
            let results = join_all(updates).await;
            let marked = results.iter().filter(|r| r.is_ok()).count();
            if let Some(Err(e)) = results.into_iter().find(|r| r.is_err()) {
                warn!(
                    "Marked {} of {} notifications as read before failing: {}",
                    marked,
                    unread.len(),
                    e
                );
                return Err(e);
            }

            info!("Marked {} notifications as read", unread.len());
            Ok(MarkAllReadResponse {
                marked_count: unread.len(),
            })
        })
        .await
}
