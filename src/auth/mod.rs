//! 认证与会话
//!
//! - `context`: 显式传入每次调用的 [`RequestContext`]
//! - `gotrue`: Supabase GoTrue HTTP 认证
//! - `memory`: 进程内认证，用于测试
//! - `session`: 登录状态、用户资料缓存与认证事件广播

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::models::users::entities::UserRole;

pub mod context;
pub mod gotrue;
pub mod memory;
pub mod session;

pub use context::{AuthUser, RequestContext};
pub use gotrue::GoTrueAuth;
pub use memory::MemoryAuth;
pub use session::{AuthEvent, SessionManager};

/// 登录会话
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

/// 注册时写入用户元数据，由后端触发器生成资料行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignUpMetadata {
    pub full_name: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    // 当前会话（可能为空）
    async fn get_session(&self) -> Result<Option<AuthSession>>;
    // 邮箱密码登录
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession>;
    // 注册；需要邮箱确认时没有会话
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<Option<AuthSession>>;
    // 注销当前会话
    async fn sign_out(&self) -> Result<()>;
    // 发送重置密码邮件
    async fn reset_password_for_email(&self, email: &str) -> Result<()>;
}
