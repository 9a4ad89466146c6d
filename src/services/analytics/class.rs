use futures_util::future::{join_all, try_join};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use super::AnalyticsService;
use crate::auth::RequestContext;
use crate::calc::{
    attendance_percentage_for, find_defaulters, marks_percentage, mean, round_one_decimal,
    subject_breakdown,
};
use crate::errors::Result;
use crate::models::analytics::responses::{ClassAnalytics, Defaulter};
use crate::models::attendance::entities::AttendanceStatus;
use crate::models::marks::entities::MarksRecord;
use crate::models::{Envelope, FetchResult};
use crate::services::attendance::ATTENDANCE_RECORDS;
use crate::services::fetch::select_as;
use crate::services::marks::MARKS_RECORDS;
use crate::services::roster::STUDENT_ENROLLMENTS;
use crate::storage::Query;

#[derive(Deserialize)]
struct EnrolledStudent {
    student_id: Uuid,
}

#[derive(Deserialize)]
struct StatusRow {
    status: AttendanceStatus,
}

/// 班级内每个学生的考勤状态与成绩
struct ClassData {
    total_students: usize,
    histories: HashMap<Uuid, Vec<AttendanceStatus>>,
    marks: HashMap<Uuid, Vec<MarksRecord>>,
}

async fn load_student(
    service: &AnalyticsService,
    ctx: &RequestContext,
    student_id: Uuid,
) -> Result<(Vec<AttendanceStatus>, Vec<MarksRecord>)> {
    let student = student_id.to_string();
    let attendance_query = Query::new().select("status").eq("student_id", student.clone());
    let marks_query = Query::new()
        .select("*, subject:subjects(subject_name, subject_code)")
        .eq("student_id", student);

    let attendance = select_as::<StatusRow>(
        service.store.as_ref(),
        ctx,
        ATTENDANCE_RECORDS,
        &attendance_query,
    );
    let marks = select_as::<MarksRecord>(service.store.as_ref(), ctx, MARKS_RECORDS, &marks_query);
    let (statuses, marks) = try_join(attendance, marks).await?;
    Ok((statuses.into_iter().map(|row| row.status).collect(), marks))
}

async fn load_class(
    service: &AnalyticsService,
    ctx: &RequestContext,
    class_id: Uuid,
) -> Result<ClassData> {
    let enrolled: Vec<EnrolledStudent> = select_as(
        service.store.as_ref(),
        ctx,
        STUDENT_ENROLLMENTS,
        &Query::new()
            .select("student_id")
            .eq("class_id", class_id.to_string()),
    )
    .await?;

    let mut student_ids: Vec<Uuid> = enrolled.into_iter().map(|e| e.student_id).collect();
    student_ids.sort();
    student_ids.dedup();

    let loads = student_ids
        .iter()
        .map(|student_id| load_student(service, ctx, *student_id));
    let mut data = ClassData {
        total_students: student_ids.len(),
        histories: HashMap::new(),
        marks: HashMap::new(),
    };
    for (student_id, loaded) in student_ids.iter().zip(join_all(loads).await) {
        let (statuses, marks) = loaded?;
        if !statuses.is_empty() {
            data.histories.insert(*student_id, statuses);
        }
        if !marks.is_empty() {
            data.marks.insert(*student_id, marks);
        }
    }
    Ok(data)
}

/// 汇总：各学生出勤率的平均值、各学生总得分率的平均值（无记录的学生不计入）
fn aggregate(service: &AnalyticsService, data: ClassData) -> ClassAnalytics {
    let attendance: Vec<f64> = data
        .histories
        .values()
        .map(|statuses| attendance_percentage_for(statuses.iter().copied(), &service.policy))
        .collect();
    let marks: Vec<f64> = data
        .marks
        .values()
        .map(|records| {
            let obtained: f64 = records.iter().map(|r| r.marks_obtained).sum();
            let possible: f64 = records.iter().map(|r| r.max_marks).sum();
            marks_percentage(obtained, possible)
        })
        .collect();

    let mut all_marks: Vec<MarksRecord> = data.marks.into_values().flatten().collect();
    all_marks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    ClassAnalytics {
        total_students: data.total_students,
        average_attendance: round_one_decimal(mean(&attendance).unwrap_or(0.0)),
        average_marks: round_one_decimal(mean(&marks).unwrap_or(0.0)),
        defaulter_count: find_defaulters(&data.histories, &service.policy).len(),
        subject_performance: subject_breakdown(&all_marks),
    }
}

pub async fn class_analytics(
    service: &AnalyticsService,
    ctx: &RequestContext,
    class_id: Option<Uuid>,
) -> Envelope<ClassAnalytics> {
    let Some(class_id) = class_id.filter(|_| ctx.is_staff()) else {
        debug!("Returning empty class analytics without a request");
        return Envelope::success(ClassAnalytics::default());
    };

    match load_class(service, ctx, class_id).await {
        Ok(data) => Envelope::success(aggregate(service, data)),
        Err(e) => Envelope::from_error("fetching class analytics", &e),
    }
}

/// 班级内出勤率不达标的学生，出勤率升序
pub async fn class_defaulters(
    service: &AnalyticsService,
    ctx: &RequestContext,
    class_id: Uuid,
) -> FetchResult<Defaulter> {
    if !ctx.is_staff() {
        debug!("Skipping defaulter list for a non-staff caller");
        return FetchResult::empty();
    }
    match load_class(service, ctx, class_id).await {
        Ok(data) => FetchResult::success(find_defaulters(&data.histories, &service.policy)),
        Err(e) => FetchResult::from_error("class defaulters", &e),
    }
}
