//! 班级与课程统计
//!
//! 班级统计只对教职工开放，其他角色直接得到全零的默认值且不发请求。

pub mod class;
pub mod subject;

use std::sync::Arc;
use uuid::Uuid;

use crate::auth::RequestContext;
use crate::calc::AcademicPolicy;
use crate::models::analytics::responses::{
    ClassAnalytics, ClassPerformance, Defaulter, SubjectAnalytics,
};
use crate::models::{Envelope, FetchResult};
use crate::storage::RemoteStore;

pub struct AnalyticsService {
    store: Arc<dyn RemoteStore>,
    policy: AcademicPolicy,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn RemoteStore>, policy: AcademicPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn class_analytics(
        &self,
        ctx: &RequestContext,
        class_id: Option<Uuid>,
    ) -> Envelope<ClassAnalytics> {
        class::class_analytics(self, ctx, class_id).await
    }

    pub async fn class_defaulters(&self, ctx: &RequestContext, class_id: Uuid) -> FetchResult<Defaulter> {
        class::class_defaulters(self, ctx, class_id).await
    }

    pub async fn class_performance(
        &self,
        ctx: &RequestContext,
        class_id: Uuid,
    ) -> Envelope<ClassPerformance> {
        subject::class_performance(self, ctx, class_id).await
    }

    pub async fn subject_analytics(
        &self,
        ctx: &RequestContext,
        subject_id: Uuid,
        class_id: Option<Uuid>,
    ) -> Envelope<SubjectAnalytics> {
        subject::subject_analytics(self, ctx, subject_id, class_id).await
    }
}
