use chrono::NaiveDate;
use uuid::Uuid;

use super::{ATTENDANCE_RECORDS, ATTENDANCE_SELECT, AttendanceService};
use crate::auth::RequestContext;
use crate::models::FetchResult;
use crate::models::attendance::entities::{AttendanceRecord, LectureType};
use crate::services::fetch::{StudentQuery, fetch_as};
use crate::storage::Query;

pub(crate) fn attendance_query(ctx: &RequestContext, query: &StudentQuery) -> Query {
    query
        .apply(ctx, Query::new().select(ATTENDANCE_SELECT))
        .order("attendance_date", false)
}

pub async fn list_attendance(
    service: &AttendanceService,
    ctx: &RequestContext,
    query: &StudentQuery,
) -> FetchResult<AttendanceRecord> {
    fetch_as(
        service.store.as_ref(),
        ctx,
        ATTENDANCE_RECORDS,
        &attendance_query(ctx, query),
    )
    .await
}

/// 某课程、课程类型、日期已有的点名记录，用于重复点名提醒
pub async fn session_attendance(
    service: &AttendanceService,
    ctx: &RequestContext,
    subject_id: Uuid,
    lecture_type: LectureType,
    date: NaiveDate,
) -> FetchResult<AttendanceRecord> {
    let query = Query::new()
        .eq("subject_id", subject_id.to_string())
        .eq("lecture_type", lecture_type.as_str())
        .eq("attendance_date", date.to_string());
    fetch_as(service.store.as_ref(), ctx, ATTENDANCE_RECORDS, &query).await
}
