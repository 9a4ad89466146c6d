use tracing::debug;

use super::{MARKS_RECORDS, MARKS_SELECT, MarksService};
use crate::auth::RequestContext;
use crate::calc::summarize_marks;
use crate::models::marks::entities::MarksRecord;
use crate::models::marks::responses::MarksSummary;
use crate::models::{Envelope, FetchResult};
use crate::services::fetch::{StudentQuery, fetch_as, select_as};
use crate::storage::Query;

fn marks_query(ctx: &RequestContext, query: &StudentQuery) -> Query {
    query
        .apply(ctx, Query::new().select(MARKS_SELECT))
        .order("created_at", false)
}

pub async fn list_marks(
    service: &MarksService,
    ctx: &RequestContext,
    query: &StudentQuery,
) -> FetchResult<MarksRecord> {
    fetch_as(service.store.as_ref(), ctx, MARKS_RECORDS, &marks_query(ctx, query)).await
}

/// 单个学生的成绩汇总；未指定学生的教职工调用不发请求
pub async fn marks_summary(
    service: &MarksService,
    ctx: &RequestContext,
    query: &StudentQuery,
) -> Envelope<MarksSummary> {
    if ctx.user.is_none() {
        debug!("Skipping marks summary without a signed-in user");
        return Envelope::none();
    }
    if query.student_filter(ctx).is_none() {
        debug!("Skipping marks summary without a student");
        return Envelope::none();
    }

    let records =
        select_as::<MarksRecord>(service.store.as_ref(), ctx, MARKS_RECORDS, &marks_query(ctx, query))
            .await;
    match records {
        Ok(records) => Envelope::success(summarize_marks(records, &service.policy)),
        Err(e) => Envelope::from_error("fetching marks summary", &e),
    }
}
