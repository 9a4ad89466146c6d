use serde::{Deserialize, Serialize};

use crate::calc::AcademicPolicy;

/// 应用配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSettings,
    pub backend: BackendConfig,
    pub realtime: RealtimeConfig,
    pub policy: AcademicPolicy,
}

/// 应用设置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub environment: String,
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// 远端存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: String,     // postgrest | memory
    pub url: String,      // 项目地址，例如 https://xyz.supabase.co
    #[serde(skip_serializing)] // 不序列化匿名密钥
    pub anon_key: String,
    pub schema: String,
    pub timeout_secs: u64, // 请求超时 (秒)
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: "postgrest".to_string(),
            url: String::new(),
            anon_key: String::new(),
            schema: "public".to_string(),
            timeout_secs: 10,
        }
    }
}

/// 实时订阅配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    pub heartbeat_interval_secs: u64,
    pub channel_capacity: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 30,
            channel_capacity: 100,
        }
    }
}
