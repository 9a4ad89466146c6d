use tracing::info;

use super::{ATTENDANCE_RECORDS, AttendanceService};
use crate::auth::RequestContext;
use crate::calc::session_summary;
use crate::errors::PortalError;
use crate::models::Envelope;
use crate::models::attendance::entities::AttendanceRecord;
use crate::models::attendance::requests::AttendanceSession;
use crate::models::attendance::responses::MarkedSession;
use crate::services::fetch::decode_rows;

/// 批量写入一次点名，`marked_by` 为当前教职工
///
/// 重复点名不在这里拦截，由远端唯一约束决定（23505 → "This record already exists."）。
pub async fn mark_session(
    service: &AttendanceService,
    ctx: &RequestContext,
    session: &AttendanceSession,
) -> Envelope<MarkedSession> {
    service
        .gateway
        .mutate("marking attendance", || async {
            let marker = ctx.require_staff()?;
            if session.entries.is_empty() {
                return Err(PortalError::validation(
                    "Attendance session has no students to mark",
                ));
            }

            let rows = session
                .to_records(Some(marker))
                .iter()
                .map(serde_json::to_value)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let inserted = service.store.insert(ctx, ATTENDANCE_RECORDS, rows).await?;
            let records: Vec<AttendanceRecord> = decode_rows(ATTENDANCE_RECORDS, inserted)?;
            let summary = session_summary(records.iter().map(|r| r.status), &service.policy);

            info!(
                "Marked {} attendance records for subject {} on {}",
                records.len(),
                session.subject_id,
                session.attendance_date
            );
            Ok(MarkedSession { records, summary })
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::AcademicPolicy;
    use crate::models::attendance::entities::{AttendanceStatus, LectureType};
    use crate::models::attendance::requests::AttendanceEntry;
    use crate::models::users::entities::UserRole;
    use crate::services::test_support::context_as;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use uuid::Uuid;

    fn session(statuses: &[AttendanceStatus]) -> AttendanceSession {
        AttendanceSession {
            subject_id: Uuid::new_v4(),
            attendance_date: NaiveDate::from_ymd_opt(2024, 9, 2).expect("date"),
            lecture_type: LectureType::Theory,
            entries: statuses
                .iter()
                .map(|status| AttendanceEntry {
                    student_id: Uuid::new_v4(),
                    status: *status,
                })
                .collect(),
        }
    }

    fn service() -> (Arc<MemoryStore>, AttendanceService) {
        let store = Arc::new(MemoryStore::new().with_unique(
            ATTENDANCE_RECORDS,
            &["student_id", "subject_id", "lecture_type", "attendance_date"],
        ));
        (store.clone(), AttendanceService::new(store, AcademicPolicy::default()))
    }

    #[tokio::test]
    async fn test_mark_session_stamps_marker() {
        use AttendanceStatus::*;
        let (store, service) = service();
        let teacher = context_as(UserRole::Teacher);
        let session = session(&[Present, Absent, Late, Present]);

        let marked = service.mark_session(&teacher, &session).await.data.expect("marked");
        assert_eq!(marked.records.len(), 4);
        assert!(marked.records.iter().all(|r| r.marked_by == teacher.user_id()));
        assert_eq!(marked.summary.total_students, 4);
        assert_eq!(marked.summary.attendance_percentage, 75.0);
        assert_eq!(store.rows(ATTENDANCE_RECORDS).len(), 4);
        assert!(!service.gateway().is_loading());
    }

    #[tokio::test]
    async fn test_duplicate_session_rejected_by_store() {
        let (store, service) = service();
        let teacher = context_as(UserRole::Teacher);
        let mut session = session(&[AttendanceStatus::Present, AttendanceStatus::Absent]);
        assert!(service.mark_session(&teacher, &session).await.is_ok());

        session.mark_all(AttendanceStatus::Present);
        let again = service.mark_session(&teacher, &session).await;
        assert_eq!(again.error.as_deref(), Some("This record already exists."));
        assert_eq!(service.gateway().error().as_deref(), Some("This record already exists."));
        assert_eq!(store.rows(ATTENDANCE_RECORDS).len(), 2);
    }

    #[tokio::test]
    async fn test_students_and_empty_sessions_rejected() {
        let (store, service) = service();
        let denied = service
            .mark_session(&context_as(UserRole::Student), &session(&[AttendanceStatus::Present]))
            .await;
        assert!(denied.error.is_some());

        let empty = service
            .mark_session(&context_as(UserRole::Admin), &session(&[]))
            .await;
        assert_eq!(
            empty.error.as_deref(),
            Some("Attendance session has no students to mark")
        );
        assert_eq!(store.request_count(), 0);
    }
}
