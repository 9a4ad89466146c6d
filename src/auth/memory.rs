use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AuthProvider, AuthSession, AuthUser, SignUpMetadata};
use crate::errors::{PortalError, Result};

#[derive(Debug, Clone)]
struct Account {
    password: String,
    user: AuthUser,
}

/// 进程内认证
///
/// 注册即确认；重置密码只记录请求的邮箱。
#[derive(Default)]
pub struct MemoryAuth {
    accounts: DashMap<String, Account>,
    session: RwLock<Option<AuthSession>>,
    resets: DashMap<String, usize>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置账号
    pub fn with_account(self, email: &str, password: &str, id: Uuid) -> Self {
        self.accounts.insert(
            email.to_lowercase(),
            Account {
                password: password.to_string(),
                user: AuthUser {
                    id,
                    email: Some(email.to_string()),
                },
            },
        );
        self
    }

    /// 某邮箱收到的重置请求次数
    pub fn reset_requests(&self, email: &str) -> usize {
        self.resets
            .get(&email.to_lowercase())
            .map(|count| *count)
            .unwrap_or(0)
    }

    fn issue_session(user: AuthUser) -> AuthSession {
        AuthSession {
            access_token: format!("memory-{}", Uuid::new_v4()),
            refresh_token: None,
            expires_at: None,
            user,
        }
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    fn provider_name(&self) -> &'static str {
        "memory"
    }

    async fn get_session(&self) -> Result<Option<AuthSession>> {
        Ok(self.session.read().await.clone())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession> {
        let user = self
            .accounts
            .get(&email.to_lowercase())
            .filter(|account| account.password == password)
            .map(|account| account.user.clone())
            .ok_or_else(|| PortalError::authentication("Invalid login credentials"))?;
        let session = Self::issue_session(user);
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _metadata: &SignUpMetadata,
    ) -> Result<Option<AuthSession>> {
        let key = email.to_lowercase();
        if self.accounts.contains_key(&key) {
            return Err(PortalError::authentication("User already registered"));
        }
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
        };
        self.accounts.insert(
            key,
            Account {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        let session = Self::issue_session(user);
        *self.session.write().await = Some(session.clone());
        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<()> {
        *self.session.write().await = None;
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str) -> Result<()> {
        *self.resets.entry(email.to_lowercase()).or_insert(0) += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;

    #[tokio::test]
    async fn test_sign_in_flow() {
        let id = Uuid::new_v4();
        let auth = MemoryAuth::new().with_account("Teacher@College.edu", "secret1", id);

        assert!(auth.sign_in_with_password("teacher@college.edu", "wrong").await.is_err());
        let session = auth
            .sign_in_with_password("teacher@college.edu", "secret1")
            .await
            .expect("sign in");
        assert_eq!(session.user.id, id);
        assert_eq!(auth.get_session().await.expect("session"), Some(session));

        auth.sign_out().await.expect("sign out");
        assert_eq!(auth.get_session().await.expect("session"), None);
    }

    #[tokio::test]
    async fn test_sign_up_rejects_duplicates() {
        let auth = MemoryAuth::new();
        let metadata = SignUpMetadata {
            full_name: "Asha".to_string(),
            role: UserRole::Student,
            prn: Some("PRN001".to_string()),
            department: None,
        };
        assert!(auth.sign_up("a@college.edu", "secret1", &metadata).await.expect("sign up").is_some());
        let err = auth
            .sign_up("A@college.edu", "secret1", &metadata)
            .await
            .expect_err("duplicate");
        assert_eq!(err.message(), "User already registered");
    }
}
