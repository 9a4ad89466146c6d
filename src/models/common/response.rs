use serde::Serialize;
use tracing::warn;

use crate::errors::PortalError;

/// 列表查询结果 `{data, error}`
///
/// 出错时 `data` 为空数组；调用方必须先检查 `error`，
/// 不能把空数组当作成功信号。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResult<T> {
    pub data: Vec<T>,
    pub error: Option<String>,
}

impl<T> FetchResult<T> {
    pub fn success(data: Vec<T>) -> Self {
        Self { data, error: None }
    }

    /// 无会话时的空结果（不是错误）
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            data: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn from_error(context: &str, err: &PortalError) -> Self {
        warn!("Error fetching {}: {}", context, err);
        Self::failure(err.user_message())
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> FetchResult<U> {
        FetchResult {
            data: self.data.into_iter().map(f).collect(),
            error: self.error,
        }
    }
}

impl<T> From<crate::errors::Result<Vec<T>>> for FetchResult<T> {
    fn from(result: crate::errors::Result<Vec<T>>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => Self::failure(e.user_message()),
        }
    }
}

/// 单对象结果 `{data, error}`，用于写操作与汇总查询
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn none() -> Self {
        Self {
            data: None,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn from_error(context: &str, err: &PortalError) -> Self {
        warn!("Error {}: {}", context, err);
        Self::failure(err.user_message())
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Option<T>, String> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.data),
        }
    }
}

impl<T> From<crate::errors::Result<T>> for Envelope<T> {
    fn from(result: crate::errors::Result<T>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => Self::failure(e.user_message()),
        }
    }
}

/// 删除操作的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub success: bool,
}
