//! 会话管理
//!
//! 持有当前会话与用户资料，派生每次调用使用的 [`RequestContext`]，
//! 并通过广播通道通知登录、注销与资料更新。

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::{info, warn};
use uuid::Uuid;

use super::{AuthProvider, AuthSession, RequestContext, SignUpMetadata};
use crate::errors::{PortalError, Result};
use crate::models::users::entities::UserProfile;
use crate::models::users::requests::ProfileUpdate;
use crate::services::users::{USER_PROFILES, load_profile};
use crate::storage::RemoteStore;
use crate::utils::{validate_email, validate_password};

/// 认证状态变化
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn { user_id: Uuid },
    SignedOut,
    ProfileUpdated(UserProfile),
}

#[derive(Default)]
struct SessionState {
    session: Option<AuthSession>,
    profile: Option<UserProfile>,
}

pub struct SessionManager {
    provider: Arc<dyn AuthProvider>,
    store: Arc<dyn RemoteStore>,
    state: RwLock<SessionState>,
    events: broadcast::Sender<AuthEvent>,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn AuthProvider>, store: Arc<dyn RemoteStore>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            provider,
            store,
            state: RwLock::new(SessionState::default()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: AuthEvent) {
        // 没有订阅者时发送失败是正常的
        let _ = self.events.send(event);
    }

    /// 当前调用方上下文
    pub async fn context(&self) -> RequestContext {
        let state = self.state.read().await;
        match &state.session {
            Some(session) => RequestContext::new(
                session.user.clone(),
                state.profile.clone(),
                Some(session.access_token.clone()),
            ),
            None => RequestContext::anonymous(),
        }
    }

    pub async fn profile(&self) -> Option<UserProfile> {
        self.state.read().await.profile.clone()
    }

    /// 读取资料失败只记录日志，会话仍然有效
    async fn fetch_profile_for(&self, session: &AuthSession) -> Option<UserProfile> {
        let ctx = RequestContext::new(
            session.user.clone(),
            None,
            Some(session.access_token.clone()),
        );
        match load_profile(self.store.as_ref(), &ctx, session.user.id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Error fetching user profile: {}", e);
                None
            }
        }
    }

    async fn establish(&self, session: AuthSession) -> RequestContext {
        let profile = self.fetch_profile_for(&session).await;
        let user_id = session.user.id;
        {
            let mut state = self.state.write().await;
            state.session = Some(session);
            state.profile = profile;
        }
        info!("User {} signed in", user_id);
        self.emit(AuthEvent::SignedIn { user_id });
        self.context().await
    }

    /// 恢复已有会话
    pub async fn initialize(&self) -> Result<RequestContext> {
        match self.provider.get_session().await? {
            Some(session) => Ok(self.establish(session).await),
            None => Ok(RequestContext::anonymous()),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<RequestContext> {
        validate_email(email).map_err(PortalError::validation)?;
        let session = self.provider.sign_in_with_password(email, password).await?;
        Ok(self.establish(session).await)
    }

    /// 注册；需要邮箱确认时返回 `None`
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<Option<RequestContext>> {
        validate_email(email).map_err(PortalError::validation)?;
        validate_password(password).map_err(PortalError::validation)?;
        if metadata.full_name.trim().is_empty() {
            return Err(PortalError::validation("Full name is required"));
        }

        match self.provider.sign_up(email, password, metadata).await? {
            Some(session) => Ok(Some(self.establish(session).await)),
            None => {
                info!("Sign-up for {} is waiting for email confirmation", email);
                Ok(None)
            }
        }
    }

    /// 注销；无论提供者是否成功都清空本地状态
    pub async fn sign_out(&self) -> Result<()> {
        let result = self.provider.sign_out().await;
        if let Err(e) = &result {
            warn!("Provider sign-out failed: {}", e);
        }
        *self.state.write().await = SessionState::default();
        self.emit(AuthEvent::SignedOut);
        result
    }

    pub async fn reset_password(&self, email: &str) -> Result<()> {
        validate_email(email).map_err(PortalError::validation)?;
        self.provider.reset_password_for_email(email).await
    }

    /// 重新读取当前用户资料
    pub async fn refetch_profile(&self) -> Option<UserProfile> {
        let session = self.state.read().await.session.clone()?;
        let profile = self.fetch_profile_for(&session).await;
        self.state.write().await.profile = profile.clone();
        profile
    }

    /// 修改当前用户资料，成功后更新缓存
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        let ctx = self.context().await;
        let user_id = ctx.require_user()?;
        if update.is_empty() {
            return Err(PortalError::validation("No profile fields to update"));
        }

        let patch: Value = serde_json::to_value(update)?;
        let row = self
            .store
            .update(&ctx, USER_PROFILES, &user_id.to_string(), patch)
            .await?;
        let profile: UserProfile = serde_json::from_value(row)
            .map_err(|e| PortalError::validation(format!("Malformed user_profiles row: {e}")))?;

        self.state.write().await.profile = Some(profile.clone());
        self.emit(AuthEvent::ProfileUpdated(profile.clone()));
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryAuth;
    use crate::models::users::entities::UserRole;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn setup() -> (Uuid, Arc<MemoryStore>, SessionManager) {
        let id = Uuid::new_v4();
        let store = Arc::new(MemoryStore::new());
        store.seed(
            USER_PROFILES,
            vec![json!({
                "id": id.to_string(),
                "email": "rao@college.edu",
                "full_name": "Dr. Rao",
                "role": "teacher"
            })],
        );
        let auth = Arc::new(MemoryAuth::new().with_account("rao@college.edu", "secret1", id));
        let manager = SessionManager::new(auth, store.clone());
        (id, store, manager)
    }

    #[tokio::test]
    async fn test_sign_in_loads_profile_and_emits() {
        let (id, _store, manager) = setup();
        let mut events = manager.subscribe();

        let ctx = manager.sign_in("rao@college.edu", "secret1").await.expect("sign in");
        assert_eq!(ctx.user_id(), Some(id));
        assert!(ctx.is_teacher());
        assert!(ctx.access_token.is_some());
        assert_eq!(events.recv().await.expect("event"), AuthEvent::SignedIn { user_id: id });

        manager.sign_out().await.expect("sign out");
        assert_eq!(manager.context().await, RequestContext::anonymous());
        assert_eq!(events.recv().await.expect("event"), AuthEvent::SignedOut);
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let (_id, _store, manager) = setup();
        let err = manager
            .sign_in("rao@college.edu", "nope")
            .await
            .expect_err("must fail");
        assert_eq!(err.user_message(), "Invalid login credentials");
        assert!(manager.sign_in("not-an-email", "secret1").await.is_err());
        assert_eq!(manager.context().await.user, None);
    }

    #[tokio::test]
    async fn test_update_profile_refreshes_cache() {
        let (_id, _store, manager) = setup();
        let mut events = manager.subscribe();
        assert!(manager.update_profile(&ProfileUpdate::default()).await.is_err());

        manager.sign_in("rao@college.edu", "secret1").await.expect("sign in");
        let _ = events.recv().await;

        let update = ProfileUpdate {
            department: Some("ECE".to_string()),
            ..ProfileUpdate::default()
        };
        let profile = manager.update_profile(&update).await.expect("update");
        assert_eq!(profile.department.as_deref(), Some("ECE"));
        assert_eq!(
            manager.profile().await.and_then(|p| p.department),
            Some("ECE".to_string())
        );
        assert!(matches!(
            events.recv().await.expect("event"),
            AuthEvent::ProfileUpdated(p) if p.role == UserRole::Teacher
        ));

        assert!(manager.update_profile(&ProfileUpdate::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_sign_up_without_profile_row() {
        let (_id, _store, manager) = setup();
        let metadata = SignUpMetadata {
            full_name: "Asha Patil".to_string(),
            role: UserRole::Student,
            prn: Some("2021ECE001".to_string()),
            department: Some("ECE".to_string()),
        };
        assert!(manager.sign_up("asha@college.edu", "123", &metadata).await.is_err());

        let ctx = manager
            .sign_up("asha@college.edu", "secret1", &metadata)
            .await
            .expect("sign up")
            .expect("auto-confirmed");
        assert!(ctx.user.is_some());
        assert_eq!(ctx.profile, None);
        assert_eq!(manager.refetch_profile().await, None);
    }

    #[tokio::test]
    async fn test_initialize_restores_session() {
        let (id, store, _manager) = setup();
        let auth = Arc::new(MemoryAuth::new().with_account("rao@college.edu", "secret1", id));
        auth.sign_in_with_password("rao@college.edu", "secret1")
            .await
            .expect("provider sign in");

        let manager = SessionManager::new(auth, store);
        let ctx = manager.initialize().await.expect("initialize");
        assert_eq!(ctx.role(), Some(UserRole::Teacher));

        let (_, _, fresh) = setup();
        assert_eq!(fresh.initialize().await.expect("initialize").user, None);

        manager.reset_password("rao@college.edu").await.expect("reset");
    }
}
