//! 配置管理
//!
//! 分层加载：`portal` 配置文件 → `portal.{APP_ENV}` → `PORTAL__*` 环境变量。

#[path = "impl.rs"]
mod loader;
mod structs;

pub use structs::*;
