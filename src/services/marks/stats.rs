use tracing::debug;
use uuid::Uuid;

use super::{MARKS_RECORDS, MarksService};
use crate::auth::RequestContext;
use crate::calc::assessment_stats;
use crate::models::Envelope;
use crate::models::marks::entities::MarksScore;
use crate::models::marks::responses::AssessmentStats;
use crate::services::fetch::select_as;
use crate::storage::Query;

/// 某课程某次考核的分数统计，仅教职工可见
pub async fn exam_statistics(
    service: &MarksService,
    ctx: &RequestContext,
    subject_id: Uuid,
    exam_type_id: Uuid,
    class_id: Option<Uuid>,
) -> Envelope<AssessmentStats> {
    if !ctx.is_staff() {
        debug!("Skipping exam statistics for a non-staff caller");
        return Envelope::none();
    }

    let query = Query::new()
        .select("marks_obtained, max_marks, percentage")
        .eq("subject_id", subject_id.to_string())
        .eq("exam_type_id", exam_type_id.to_string())
        .eq_opt("class_id", class_id.map(|id| id.to_string()));

    match select_as::<MarksScore>(service.store.as_ref(), ctx, MARKS_RECORDS, &query).await {
        Ok(rows) => Envelope::success(assessment_stats(&rows, &service.policy)),
        Err(e) => Envelope::from_error("fetching exam statistics", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::{AcademicPolicy, Grade};
    use crate::models::users::entities::UserRole;
    use crate::services::test_support::context_as;
    use crate::storage::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_exam_statistics() {
        let (subject, exam, class) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let store = Arc::new(MemoryStore::new());
        let rows = [18.0, 12.0, 7.0, 15.0]
            .iter()
            .map(|obtained| {
                json!({
                    "student_id": Uuid::new_v4().to_string(),
                    "subject_id": subject.to_string(),
                    "exam_type_id": exam.to_string(),
                    "class_id": class.to_string(),
                    "marks_obtained": obtained,
                    "max_marks": 20.0
                })
            })
            .collect();
        store.seed(MARKS_RECORDS, rows);
        let service = MarksService::new(store.clone(), AcademicPolicy::default());

        let stats = service
            .exam_statistics(&context_as(UserRole::Teacher), subject, exam, Some(class))
            .await
            .data
            .expect("stats");
        assert_eq!(stats.count, 4);
        assert_eq!(stats.average, 13.0);
        assert_eq!(stats.highest, 18.0);
        assert_eq!(stats.lowest, 7.0);
        let count_of = |grade: Grade| {
            stats
                .distribution
                .iter()
                .find(|c| c.grade == grade)
                .map(|c| c.count)
        };
        assert_eq!(count_of(Grade::APlus), Some(1));
        assert_eq!(count_of(Grade::F), Some(1));

        let requests = store.request_count();
        let hidden = service
            .exam_statistics(&context_as(UserRole::Student), subject, exam, None)
            .await;
        assert!(hidden.data.is_none());
        assert_eq!(store.request_count(), requests);
    }

    #[tokio::test]
    async fn test_exam_statistics_across_classes_with_different_max() {
        let (subject, exam) = (Uuid::new_v4(), Uuid::new_v4());
        let store = Arc::new(MemoryStore::new());
        let row = |obtained: f64, max: f64| {
            json!({
                "student_id": Uuid::new_v4().to_string(),
                "subject_id": subject.to_string(),
                "exam_type_id": exam.to_string(),
                "class_id": Uuid::new_v4().to_string(),
                "marks_obtained": obtained,
                "max_marks": max
            })
        };
        store.seed(MARKS_RECORDS, vec![row(45.0, 50.0), row(18.0, 20.0)]);
        let service = MarksService::new(store, AcademicPolicy::default());

        let stats = service
            .exam_statistics(&context_as(UserRole::Hod), subject, exam, None)
            .await
            .data
            .expect("stats");
        let a_plus = stats
            .distribution
            .iter()
            .find(|c| c.grade == Grade::APlus)
            .map(|c| c.count);
        assert_eq!(a_plus, Some(2));
    }
}
