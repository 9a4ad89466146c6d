pub mod list;
pub mod mark;
pub mod summary;

use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use super::fetch::StudentQuery;
use super::mutations::MutationGateway;
use crate::auth::RequestContext;
use crate::calc::AcademicPolicy;
use crate::models::attendance::entities::{AttendanceRecord, LectureType};
use crate::models::attendance::requests::AttendanceSession;
use crate::models::attendance::responses::{AttendanceSummary, MarkedSession};
use crate::models::{Envelope, FetchResult};
use crate::storage::RemoteStore;

pub const ATTENDANCE_RECORDS: &str = "attendance_records";

/// 考勤记录默认投影：嵌入课程与点名人姓名
pub const ATTENDANCE_SELECT: &str = "*, subject:subjects(subject_name, subject_code), \
     marked_by_user:user_profiles!attendance_records_marked_by_fkey(full_name)";

pub struct AttendanceService {
    store: Arc<dyn RemoteStore>,
    gateway: MutationGateway,
    policy: AcademicPolicy,
}

impl AttendanceService {
    pub fn new(store: Arc<dyn RemoteStore>, policy: AcademicPolicy) -> Self {
        Self {
            gateway: MutationGateway::new(store.clone()),
            store,
            policy,
        }
    }

    /// 点名写入的加载 / 错误状态
    pub fn gateway(&self) -> &MutationGateway {
        &self.gateway
    }

    pub async fn list_attendance(
        &self,
        ctx: &RequestContext,
        query: &StudentQuery,
    ) -> FetchResult<AttendanceRecord> {
        list::list_attendance(self, ctx, query).await
    }

    pub async fn session_attendance(
        &self,
        ctx: &RequestContext,
        subject_id: Uuid,
        lecture_type: LectureType,
        date: NaiveDate,
    ) -> FetchResult<AttendanceRecord> {
        list::session_attendance(self, ctx, subject_id, lecture_type, date).await
    }

    pub async fn attendance_summary(
        &self,
        ctx: &RequestContext,
        query: &StudentQuery,
    ) -> Envelope<AttendanceSummary> {
        summary::attendance_summary(self, ctx, query).await
    }

    pub async fn mark_session(
        &self,
        ctx: &RequestContext,
        session: &AttendanceSession,
    ) -> Envelope<MarkedSession> {
        mark::mark_session(self, ctx, session).await
    }
}
