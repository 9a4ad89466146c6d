use tracing::debug;

use super::list::attendance_query;
use super::{ATTENDANCE_RECORDS, AttendanceService};
use crate::auth::RequestContext;
use crate::calc::summarize_attendance;
use crate::models::Envelope;
use crate::models::attendance::entities::AttendanceRecord;
use crate::models::attendance::responses::AttendanceSummary;
use crate::services::fetch::{StudentQuery, select_as};

/// 学生考勤汇总（可按课程过滤）
/// 未登录或无法确定学生时返回空信封且不发请求
pub async fn attendance_summary(
    service: &AttendanceService,
    ctx: &RequestContext,
    query: &StudentQuery,
) -> Envelope<AttendanceSummary> {
    if ctx.user.is_none() {
        debug!("Skipping attendance summary without a signed-in user");
        return Envelope::none();
    }
    if query.student_filter(ctx).is_none() {
        debug!("Skipping attendance summary without a student");
        return Envelope::none();
    }

    let records = select_as::<AttendanceRecord>(
        service.store.as_ref(),
        ctx,
        ATTENDANCE_RECORDS,
        &attendance_query(ctx, query),
    )
    .await;

    match records {
        Ok(records) => Envelope::success(summarize_attendance(records, &service.policy)),
        Err(e) => Envelope::from_error("fetching attendance summary", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::RequestContext;
    use crate::calc::{AcademicPolicy, AttendanceStanding};
    use crate::errors::RemoteError;
    use crate::models::users::entities::UserRole;
    use crate::services::test_support::context_for;
    use crate::storage::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;
    use uuid::Uuid;

    fn seeded(student: Uuid, subject: Uuid, statuses: &[&str]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let rows = statuses
            .iter()
            .enumerate()
            .map(|(day, status)| {
                json!({
                    "student_id": student.to_string(),
                    "subject_id": subject.to_string(),
                    "attendance_date": format!("2024-09-{:02}", day + 1),
                    "status": status
                })
            })
            .collect();
        store.seed(ATTENDANCE_RECORDS, rows);
        store
    }

    #[tokio::test]
    async fn test_summary_for_own_records() {
        let (student, subject) = (Uuid::new_v4(), Uuid::new_v4());
        let store = seeded(student, subject, &["present", "present", "absent", "late"]);
        let service = AttendanceService::new(store, AcademicPolicy::default());

        let summary = service
            .attendance_summary(&context_for(student, UserRole::Student), &StudentQuery::default())
            .await
            .data
            .expect("summary");
        assert_eq!(summary.total_classes, 4);
        assert_eq!(summary.attended_classes, 3);
        assert_eq!(summary.absent_classes, 1);
        assert_eq!(summary.attendance_percentage, 75.0);
        assert!(!summary.is_defaulter);
        assert_eq!(summary.standing, AttendanceStanding::Good);
        assert_eq!(summary.counts.late, 1);
    }

    #[tokio::test]
    async fn test_summary_defaulter_and_subject_filter() {
        let (student, subject) = (Uuid::new_v4(), Uuid::new_v4());
        let store = seeded(student, subject, &["present", "absent", "absent", "od"]);
        let service = AttendanceService::new(store, AcademicPolicy::default());
        let teacher = context_for(Uuid::new_v4(), UserRole::Teacher);

        let summary = service
            .attendance_summary(&teacher, &StudentQuery::for_student(student).with_subject(subject))
            .await
            .data
            .expect("summary");
        assert_eq!(summary.attendance_percentage, 25.0);
        assert!(summary.is_defaulter);
        assert_eq!(summary.standing, AttendanceStanding::Critical);

        let other_subject = service
            .attendance_summary(
                &teacher,
                &StudentQuery::for_student(student).with_subject(Uuid::new_v4()),
            )
            .await
            .data
            .expect("summary");
        assert_eq!(other_subject.total_classes, 0);
        assert_eq!(other_subject.attendance_percentage, 0.0);
    }

    #[tokio::test]
    async fn test_staff_summary_requires_a_student() {
        let subject = Uuid::new_v4();
        let store = seeded(Uuid::new_v4(), subject, &["present"]);
        store.seed(
            ATTENDANCE_RECORDS,
            vec![json!({
                "student_id": Uuid::new_v4().to_string(),
                "subject_id": subject.to_string(),
                "attendance_date": "2024-09-01",
                "status": "absent"
            })],
        );
        let service = AttendanceService::new(store.clone(), AcademicPolicy::default());
        let teacher = context_for(Uuid::new_v4(), UserRole::Teacher);

        let summary = service
            .attendance_summary(&teacher, &StudentQuery::default())
            .await;
        assert!(summary.data.is_none());
        assert!(summary.error.is_none());
        assert_eq!(store.request_count(), 0);
    }

    #[tokio::test]
    async fn test_summary_without_user_or_with_error() {
        let store = Arc::new(MemoryStore::new());
        let service = AttendanceService::new(store.clone(), AcademicPolicy::default());

        let anonymous = service
            .attendance_summary(&RequestContext::anonymous(), &StudentQuery::default())
            .await;
        assert_eq!(anonymous.data.map(|s| s.total_classes), None);
        assert_eq!(store.request_count(), 0);

        store.inject_error(RemoteError::new("42501", "permission denied"));
        let denied = service
            .attendance_summary(
                &context_for(Uuid::new_v4(), UserRole::Student),
                &StudentQuery::default(),
            )
            .await;
        assert_eq!(
            denied.error.as_deref(),
            Some("Access denied. Please check your permissions.")
        );
    }
}
