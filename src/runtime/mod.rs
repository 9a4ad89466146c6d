//! 运行时：日志初始化与启动装配

pub mod lifetime;
pub mod logging;

pub use lifetime::startup::{StartupContext, prepare_client_startup};
pub use logging::init_tracing;
