//! 通用查询适配器
//!
//! 所有领域查询都经由这里发出：未登录直接返回空结果（不发请求），
//! 行在边界处反序列化为类型化投影，任何错误都收敛为 `{data: [], error}`。

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::auth::RequestContext;
use crate::errors::{PortalError, Result};
use crate::models::FetchResult;
use crate::storage::{Query, RemoteStore};

/// 按学生（可选课程）过滤的查询条件
///
/// 未显式指定学生时，学生角色只能看到自己的记录，教职工不加学生过滤。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StudentQuery {
    pub student_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
}

impl StudentQuery {
    pub fn for_student(student_id: Uuid) -> Self {
        Self {
            student_id: Some(student_id),
            subject_id: None,
        }
    }

    pub fn with_subject(mut self, subject_id: Uuid) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    pub fn student_filter(&self, ctx: &RequestContext) -> Option<Uuid> {
        self.student_id
            .or_else(|| ctx.user_id().filter(|_| ctx.is_student()))
    }

    pub fn apply(&self, ctx: &RequestContext, query: Query) -> Query {
        query
            .eq_opt("student_id", self.student_filter(ctx).map(|id| id.to_string()))
            .eq_opt("subject_id", self.subject_id.map(|id| id.to_string()))
    }
}

/// 将原始行转为类型化投影；任一行不合法则整体失败
pub fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            serde_json::from_value(row).map_err(|e| {
                PortalError::validation(format!("Malformed {table} row at index {index}: {e}"))
            })
        })
        .collect()
}

/// 查询并反序列化，错误向上传播
pub async fn select_as<T: DeserializeOwned>(
    store: &dyn RemoteStore,
    ctx: &RequestContext,
    table: &str,
    query: &Query,
) -> Result<Vec<T>> {
    let rows = store.select(ctx, table, query).await?;
    decode_rows(table, rows)
}

pub async fn fetch_rows(
    store: &dyn RemoteStore,
    ctx: &RequestContext,
    table: &str,
    query: &Query,
) -> FetchResult<Value> {
    fetch_as(store, ctx, table, query).await
}

pub async fn fetch_as<T: DeserializeOwned>(
    store: &dyn RemoteStore,
    ctx: &RequestContext,
    table: &str,
    query: &Query,
) -> FetchResult<T> {
    if ctx.user.is_none() {
        debug!("Skipping {} fetch without a signed-in user", table);
        return FetchResult::empty();
    }
    match select_as(store, ctx, table, query).await {
        Ok(rows) => FetchResult::success(rows),
        Err(e) => FetchResult::from_error(table, &e),
    }
}
