//! 数据模型定义
//!
//! 按领域划分：`entities` 为远端表行的类型化投影，
//! `requests` 为写入载荷，`responses` 为汇总结果。

pub mod analytics;
pub mod attendance;
pub mod common;
pub mod enrollments;
pub mod marks;
pub mod notifications;
pub mod users;

pub use common::{DeleteOutcome, Envelope, FetchResult, FetchState, ListView};
