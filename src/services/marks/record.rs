use tracing::info;
use uuid::Uuid;

use super::{MARKS_RECORDS, MarksService};
use crate::auth::RequestContext;
use crate::calc::{grade_for, marks_percentage, round_one_decimal, validate_marks};
use crate::errors::{PortalError, Result};
use crate::models::Envelope;
use crate::models::marks::entities::MarksRecord;
use crate::models::marks::requests::{MarksEntry, NewMarksRecord};
use crate::services::fetch::decode_rows;

/// 校验并派生百分比与等级
fn prepare(service: &MarksService, entry: &MarksEntry, marked_by: Uuid) -> Result<NewMarksRecord> {
    validate_marks(entry.marks_obtained, entry.max_marks)?;
    let percentage = marks_percentage(entry.marks_obtained, entry.max_marks);
    Ok(NewMarksRecord {
        student_id: entry.student_id,
        subject_id: entry.subject_id,
        exam_type_id: entry.exam_type_id,
        class_id: entry.class_id,
        marks_obtained: entry.marks_obtained,
        max_marks: entry.max_marks,
        percentage: round_one_decimal(percentage),
        grade: grade_for(percentage, &service.policy).as_str().to_string(),
        marked_by: Some(marked_by),
    })
}

async fn insert_records(
    service: &MarksService,
    ctx: &RequestContext,
    entries: &[MarksEntry],
) -> Result<Vec<MarksRecord>> {
    let marker = ctx.require_staff()?;
    // 任意一条不合法则整批不写入
    let records = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            prepare(service, entry, marker).map_err(|e| {
                PortalError::validation(format!("Entry {}: {}", index + 1, e.message()))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let rows = records
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let inserted = service.store.insert(ctx, MARKS_RECORDS, rows).await?;
    info!("Recorded {} marks entries", inserted.len());
    decode_rows(MARKS_RECORDS, inserted)
}

pub async fn record_marks(
    service: &MarksService,
    ctx: &RequestContext,
    entry: &MarksEntry,
) -> Envelope<MarksRecord> {
    service
        .gateway
        .mutate("recording marks", || async {
            let marker = ctx.require_staff()?;
            let record = prepare(service, entry, marker)?;
            let row = serde_json::to_value(&record)?;
            let mut inserted = service.store.insert(ctx, MARKS_RECORDS, vec![row]).await?;
            let row = inserted
                .pop()
                .ok_or_else(|| PortalError::not_found("Insert into marks_records returned no row"))?;
            let mut records: Vec<MarksRecord> = decode_rows(MARKS_RECORDS, vec![row])?;
            records
                .pop()
                .ok_or_else(|| PortalError::not_found("Insert into marks_records returned no row"))
        })
        .await
}

pub async fn record_marks_bulk(
    service: &MarksService,
    ctx: &RequestContext,
    entries: &[MarksEntry],
) -> Envelope<Vec<MarksRecord>> {
    service
        .gateway
        .mutate("recording marks", || insert_records(service, ctx, entries))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::AcademicPolicy;
    use crate::models::users::entities::UserRole;
    use crate::services::test_support::context_as;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    fn entry(obtained: f64, max: f64) -> MarksEntry {
        MarksEntry {
            student_id: Uuid::new_v4(),
            subject_id: Uuid::new_v4(),
            exam_type_id: Uuid::new_v4(),
            class_id: None,
            marks_obtained: obtained,
            max_marks: max,
        }
    }

    fn service() -> (Arc<MemoryStore>, MarksService) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), MarksService::new(store, AcademicPolicy::default()))
    }

    #[tokio::test]
    async fn test_record_derives_percentage_and_grade() {
        let (_store, service) = service();
        let teacher = context_as(UserRole::Teacher);

        let record = service
            .record_marks(&teacher, &entry(17.0, 20.0))
            .await
            .data
            .expect("record");
        assert_eq!(record.percentage, Some(85.0));
        assert_eq!(record.grade.as_deref(), Some("A"));
        assert_eq!(record.marked_by, teacher.user_id());

        let zero = service
            .record_marks(&teacher, &entry(0.0, 20.0))
            .await
            .data
            .expect("record");
        assert_eq!(zero.percentage, Some(0.0));
        assert_eq!(zero.grade.as_deref(), Some("F"));
    }

    #[tokio::test]
    async fn test_out_of_range_marks_rejected() {
        let (store, service) = service();
        let teacher = context_as(UserRole::Teacher);

        let over = service.record_marks(&teacher, &entry(21.0, 20.0)).await;
        assert_eq!(
            over.error.as_deref(),
            Some("marks obtained must be between 0 and 20, got 21")
        );
        let no_max = service.record_marks(&teacher, &entry(0.0, 0.0)).await;
        assert!(no_max.error.is_some());
        assert_eq!(store.request_count(), 0);
        assert!(!service.gateway().is_loading());
    }

    #[tokio::test]
    async fn test_bulk_is_all_or_nothing() {
        let (store, service) = service();
        let hod = context_as(UserRole::Hod);

        let bad = service
            .record_marks_bulk(&hod, &[entry(10.0, 20.0), entry(-1.0, 20.0)])
            .await;
        assert_eq!(
            bad.error.as_deref(),
            Some("Entry 2: marks obtained must be between 0 and 20, got -1")
        );
        assert!(store.rows(MARKS_RECORDS).is_empty());

        let good = service
            .record_marks_bulk(&hod, &[entry(10.0, 20.0), entry(19.0, 20.0)])
            .await
            .data
            .expect("records");
        let grades: Vec<Option<String>> = good.into_iter().map(|r| r.grade).collect();
        assert_eq!(grades, vec![Some("C+".to_string()), Some("A+".to_string())]);
    }

    #[tokio::test]
    async fn test_students_cannot_record() {
        let (store, service) = service();
        let result = service
            .record_marks(&context_as(UserRole::Student), &entry(10.0, 20.0))
            .await;
        assert_eq!(
            result.error.as_deref(),
            Some("Only teachers, HODs and admins can perform this action")
        );
        assert_eq!(store.request_count(), 0);
    }
}
