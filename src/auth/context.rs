use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{PortalError, Result};
use crate::models::users::entities::{UserProfile, UserRole};

/// 认证服务返回的用户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// 每次数据访问显式携带的调用方上下文
///
/// `user` 为空表示未登录；`profile` 可能在登录后仍为空（资料行尚未创建）。
/// 角色判断只看 `profile.role`。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    pub user: Option<AuthUser>,
    pub profile: Option<UserProfile>,
    pub access_token: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(user: AuthUser, profile: Option<UserProfile>, access_token: Option<String>) -> Self {
        Self {
            user: Some(user),
            profile,
            access_token,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user.as_ref().map(|u| u.id)
    }

    /// 已登录用户 ID，未登录时返回认证错误
    pub fn require_user(&self) -> Result<Uuid> {
        self.user_id()
            .ok_or_else(|| PortalError::authentication("No user logged in"))
    }

    pub fn role(&self) -> Option<UserRole> {
        self.profile.as_ref().map(|p| p.role)
    }

    pub fn is_student(&self) -> bool {
        self.role() == Some(UserRole::Student)
    }

    pub fn is_teacher(&self) -> bool {
        self.role() == Some(UserRole::Teacher)
    }

    pub fn is_hod(&self) -> bool {
        self.role() == Some(UserRole::Hod)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(UserRole::Admin)
    }

    pub fn is_staff(&self) -> bool {
        self.role().is_some_and(|r| r.is_staff())
    }

    /// 教职工用户 ID；未登录或非教职工时返回错误
    pub fn require_staff(&self) -> Result<Uuid> {
        let user_id = self.require_user()?;
        if !self.is_staff() {
            return Err(PortalError::authorization(
                "Only teachers, HODs and admins can perform this action",
            ));
        }
        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: Uuid, role: UserRole) -> UserProfile {
        UserProfile {
            id,
            email: format!("{role}@college.edu"),
            full_name: format!("Test {role}"),
            role,
            prn: None,
            department: None,
            avatar_url: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn context(role: Option<UserRole>) -> RequestContext {
        let id = Uuid::new_v4();
        RequestContext::new(
            AuthUser { id, email: None },
            role.map(|r| profile(id, r)),
            None,
        )
    }

    #[test]
    fn test_role_helpers() {
        assert!(context(Some(UserRole::Student)).is_student());
        assert!(!context(Some(UserRole::Student)).is_staff());
        assert!(context(Some(UserRole::Hod)).is_hod());
        assert!(context(Some(UserRole::Hod)).is_staff());
        assert!(context(Some(UserRole::Admin)).is_admin());
        assert!(!context(None).is_staff());
        assert_eq!(RequestContext::anonymous().user_id(), None);
    }

    #[test]
    fn test_require_staff() {
        assert!(context(Some(UserRole::Teacher)).require_staff().is_ok());
        assert_eq!(
            context(Some(UserRole::Student)).require_staff().err().map(|e| e.code()),
            Some("E005")
        );
        assert_eq!(
            RequestContext::anonymous().require_staff().err().map(|e| e.code()),
            Some("E004")
        );
    }
}
