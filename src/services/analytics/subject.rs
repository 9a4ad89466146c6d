use tracing::debug;
use uuid::Uuid;

use super::AnalyticsService;
use crate::auth::RequestContext;
use crate::calc::{mean, round_whole};
use crate::models::Envelope;
use crate::models::analytics::responses::{ClassPerformance, SubjectAnalytics};
use crate::models::enrollments::entities::ClassMember;
use crate::models::marks::entities::MarksScore;
use crate::services::fetch::select_as;
use crate::services::marks::MARKS_RECORDS;
use crate::services::roster::STUDENT_ENROLLMENTS;
use crate::storage::Query;

/// 课程成绩统计：平均值取各记录的 `percentage`（缺失按 0 计），取整
pub async fn subject_analytics(
    service: &AnalyticsService,
    ctx: &RequestContext,
    subject_id: Uuid,
    class_id: Option<Uuid>,
) -> Envelope<SubjectAnalytics> {
    if ctx.user.is_none() {
        debug!("Skipping subject analytics without a signed-in user");
        return Envelope::none();
    }

    let query = Query::new()
        .select("marks_obtained, max_marks, percentage")
        .eq("subject_id", subject_id.to_string())
        .eq_opt("class_id", class_id.map(|id| id.to_string()));

    match select_as::<MarksScore>(service.store.as_ref(), ctx, MARKS_RECORDS, &query).await {
        Ok(marks) => {
            let percentages: Vec<f64> = marks.iter().map(|m| m.percentage.unwrap_or(0.0)).collect();
            Envelope::success(SubjectAnalytics {
                total_students: marks.len(),
                average_percentage: round_whole(mean(&percentages).unwrap_or(0.0)),
                marks,
            })
        }
        Err(e) => Envelope::from_error("fetching subject analytics", &e),
    }
}

pub async fn class_performance(
    service: &AnalyticsService,
    ctx: &RequestContext,
    class_id: Uuid,
) -> Envelope<ClassPerformance> {
    if ctx.user.is_none() {
        debug!("Skipping class performance without a signed-in user");
        return Envelope::none();
    }

    let query = Query::new()
        .select("student_id, student:user_profiles!student_enrollments_student_id_fkey(full_name, prn)")
        .eq("class_id", class_id.to_string());

    match select_as::<ClassMember>(service.store.as_ref(), ctx, STUDENT_ENROLLMENTS, &query).await {
        Ok(students) => Envelope::success(ClassPerformance {
            total_students: students.len(),
            students,
        }),
        Err(e) => Envelope::from_error("fetching class performance", &e),
    }
}
