use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::{AuthProvider, GoTrueAuth, MemoryAuth, SessionManager};
use crate::calc::AcademicPolicy;
use crate::config::AppConfig;
use crate::errors::Result;
use crate::services::{
    AnalyticsService, AttendanceService, MarksService, NotificationService, RealtimeService,
    RosterService, UserService,
};
use crate::storage::{RemoteStore, create_store};

/// 启动完成后的共享组件
pub struct StartupContext {
    pub store: Arc<dyn RemoteStore>,
    pub session: Arc<SessionManager>,
    pub policy: AcademicPolicy,
}

impl StartupContext {
    pub fn attendance(&self) -> AttendanceService {
        AttendanceService::new(self.store.clone(), self.policy.clone())
    }

    pub fn marks(&self) -> MarksService {
        MarksService::new(self.store.clone(), self.policy.clone())
    }

    pub fn analytics(&self) -> AnalyticsService {
        AnalyticsService::new(self.store.clone(), self.policy.clone())
    }

    pub fn roster(&self) -> RosterService {
        RosterService::new(self.store.clone())
    }

    pub fn notifications(&self) -> NotificationService {
        NotificationService::new(self.store.clone())
    }

    pub fn realtime(&self) -> RealtimeService {
        RealtimeService::new(self.store.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.store.clone())
    }
}

fn create_auth_provider(config: &AppConfig) -> Result<Arc<dyn AuthProvider>> {
    let provider: Arc<dyn AuthProvider> = match config.backend.kind.as_str() {
        "memory" => Arc::new(MemoryAuth::new()),
        _ => Arc::new(GoTrueAuth::new(config)?),
    };
    info!("Auth provider initialized: {}", provider.provider_name());
    Ok(provider)
}

/// 准备客户端启动的上下文
/// 包括 TLS 提供者、远端存储、认证提供者与会话恢复
pub async fn prepare_client_startup(config: &AppConfig) -> Result<StartupContext> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    config.policy.validate()?;

    let store = create_store(config)?;
    let provider = create_auth_provider(config)?;
    let session = Arc::new(SessionManager::new(provider, store.clone()));

    match session.initialize().await {
        Ok(ctx) if ctx.user.is_some() => info!("Restored session for user {:?}", ctx.user_id()),
        Ok(_) => debug!("No existing session"),
        Err(e) => warn!("Failed to restore session: {}", e),
    }

    warn!(
        "Client startup completed: {} store, environment {}",
        store.backend_name(),
        config.app.environment
    );

    Ok(StartupContext {
        store,
        session,
        policy: config.policy.clone(),
    })
}
