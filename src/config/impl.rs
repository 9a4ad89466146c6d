use config::{Config, ConfigError, Environment, File, FileFormat};
use std::sync::OnceLock;

use super::AppConfig;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

impl AppConfig {
    /// 加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // 首先加载默认配置文件
            .add_source(File::with_name("portal").required(false))
            // 然后根据环境加载特定配置文件
            .add_source(
                File::with_name(&format!(
                    "portal.{}",
                    std::env::var("APP_ENV").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // 最后加载环境变量覆盖，例如 PORTAL__BACKEND__ANON_KEY
            .add_source(
                Environment::with_prefix("PORTAL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        // 支持从常用环境变量加载
        builder = builder
            .set_override_option("app.environment", std::env::var("APP_ENV").ok())?
            .set_override_option("app.log_level", std::env::var("RUST_LOG").ok())?
            .set_override_option("backend.url", std::env::var("SUPABASE_URL").ok())?
            .set_override_option("backend.anon_key", std::env::var("SUPABASE_ANON_KEY").ok())?;

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// 从 TOML 文本加载（不读取环境变量）
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;
        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.policy
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::Message(
                "backend.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// 获取全局配置实例
    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                tracing::error!("Failed to load configuration: {e}, using defaults");
                AppConfig::default()
            })
        })
    }

    /// 初始化配置 (在应用启动时调用)
    pub fn init() -> Result<(), ConfigError> {
        dotenv::dotenv().ok();
        let config = Self::load()?;
        APP_CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))?;
        Ok(())
    }

    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    /// 检查是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    /// REST 接口根地址
    pub fn rest_endpoint(&self) -> String {
        format!("{}/rest/v1", self.backend.url.trim_end_matches('/'))
    }

    /// 认证接口根地址
    pub fn auth_endpoint(&self) -> String {
        format!("{}/auth/v1", self.backend.url.trim_end_matches('/'))
    }

    /// 实时订阅 WebSocket 地址
    pub fn realtime_endpoint(&self) -> String {
        let base = self.backend.url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };
        format!(
            "{ws_base}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            self.backend.anon_key
        )
    }
}
