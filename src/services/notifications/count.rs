use tracing::debug;

use super::list::recipient_query;
use super::{NOTIFICATIONS, NotificationService};
use crate::auth::RequestContext;
use crate::models::Envelope;
use crate::models::notifications::responses::UnreadCountResponse;

pub async fn get_unread_count(
    service: &NotificationService,
    ctx: &RequestContext,
) -> Envelope<UnreadCountResponse> {
    if ctx.user.is_none() {
        debug!("Skipping unread count without a signed-in user");
        return Envelope::none();
    }

    let query = recipient_query(ctx, "id", true);
    match service.store.select(ctx, NOTIFICATIONS, &query).await {
        Ok(rows) => Envelope::success(UnreadCountResponse {
            unread_count: rows.len(),
        }),
        Err(e) => Envelope::from_error("counting unread notifications", &e),
    }
}
