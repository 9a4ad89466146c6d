pub mod list;
pub mod record;
pub mod stats;

use std::sync::Arc;
use uuid::Uuid;

use super::fetch::StudentQuery;
use super::mutations::MutationGateway;
use crate::auth::RequestContext;
use crate::calc::AcademicPolicy;
use crate::models::marks::entities::MarksRecord;
use crate::models::marks::requests::MarksEntry;
use crate::models::marks::responses::{AssessmentStats, MarksSummary};
use crate::models::{Envelope, FetchResult};
use crate::storage::RemoteStore;

pub const MARKS_RECORDS: &str = "marks_records";

/// 成绩记录默认投影：嵌入课程、考试类型与录入人姓名
pub const MARKS_SELECT: &str = "*, subject:subjects(subject_name, subject_code), \
     exam_type:exam_types(exam_name, max_marks), \
     marked_by_user:user_profiles!marks_records_marked_by_fkey(full_name)";

pub struct MarksService {
    store: Arc<dyn RemoteStore>,
    gateway: MutationGateway,
    policy: AcademicPolicy,
}

impl MarksService {
    pub fn new(store: Arc<dyn RemoteStore>, policy: AcademicPolicy) -> Self {
        Self {
            gateway: MutationGateway::new(store.clone()),
            store,
            policy,
        }
    }

    pub fn gateway(&self) -> &MutationGateway {
        &self.gateway
    }

    pub async fn list_marks(&self, ctx: &RequestContext, query: &StudentQuery) -> FetchResult<MarksRecord> {
        list::list_marks(self, ctx, query).await
    }

    pub async fn marks_summary(&self, ctx: &RequestContext, query: &StudentQuery) -> Envelope<MarksSummary> {
        list::marks_summary(self, ctx, query).await
    }

    pub async fn record_marks(&self, ctx: &RequestContext, entry: &MarksEntry) -> Envelope<MarksRecord> {
        record::record_marks(self, ctx, entry).await
    }

    pub async fn record_marks_bulk(
        &self,
        ctx: &RequestContext,
        entries: &[MarksEntry],
    ) -> Envelope<Vec<MarksRecord>> {
        record::record_marks_bulk(self, ctx, entries).await
    }

    pub async fn exam_statistics(
        &self,
        ctx: &RequestContext,
        subject_id: Uuid,
        exam_type_id: Uuid,
        class_id: Option<Uuid>,
    ) -> Envelope<AssessmentStats> {
        stats::exam_statistics(self, ctx, subject_id, exam_type_id, class_id).await
    }
}
