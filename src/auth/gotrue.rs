use async_trait::async_trait;
use reqwest::Response;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{AuthProvider, AuthSession, SignUpMetadata};
use crate::config::AppConfig;
use crate::errors::{PortalError, Result};

/// GoTrue 错误响应，不同版本字段不一致
#[derive(Debug, Default, Deserialize)]
struct GoTrueErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl GoTrueErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}

fn parse_auth_error(status: u16, body: &str) -> PortalError {
    let message = serde_json::from_str::<GoTrueErrorBody>(body)
        .ok()
        .and_then(GoTrueErrorBody::into_message)
        .unwrap_or_else(|| format!("Authentication request failed with HTTP {status}"));
    PortalError::authentication(message)
}

/// 注册响应：自动确认时带会话，否则只有用户对象
fn parse_sign_up(body: Value) -> Result<Option<AuthSession>> {
    if body.get("access_token").is_some_and(|t| !t.is_null()) {
        Ok(Some(serde_json::from_value(body)?))
    } else {
        Ok(None)
    }
}

/// Supabase GoTrue 认证
pub struct GoTrueAuth {
    client: reqwest::Client,
    auth_url: String,
    anon_key: String,
    session: RwLock<Option<AuthSession>>,
}

impl GoTrueAuth {
    pub fn new(config: &AppConfig) -> Result<Self> {
        if config.backend.url.trim().is_empty() || config.backend.anon_key.trim().is_empty() {
            return Err(PortalError::config(
                "backend.url and backend.anon_key are required for GoTrue authentication",
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.backend.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            auth_url: config.auth_endpoint(),
            anon_key: config.backend.anon_key.clone(),
            session: RwLock::new(None),
        })
    }

    async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Result<Response> {
        debug!("GoTrue POST {}", path);
        let response = self
            .client
            .post(format!("{}/{}", self.auth_url, path))
            .header("apikey", &self.anon_key)
            .bearer_auth(token.unwrap_or(&self.anon_key))
            .json(&body)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            warn!("GoTrue {} failed with status {}", path, status);
            Err(parse_auth_error(status, &text))
        }
    }
}

#[async_trait]
impl AuthProvider for GoTrueAuth {
    fn provider_name(&self) -> &'static str {
        "gotrue"
    }

    async fn get_session(&self) -> Result<Option<AuthSession>> {
        Ok(self.session.read().await.clone())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession> {
        let response = self
            .post(
                "token?grant_type=password",
                None,
                json!({ "email": email, "password": password }),
            )
            .await?;
        let session: AuthSession = response.json().await?;
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<Option<AuthSession>> {
        let response = self
            .post(
                "signup",
                None,
                json!({ "email": email, "password": password, "data": metadata }),
            )
            .await?;
        let session = parse_sign_up(response.json().await?)?;
        if let Some(session) = &session {
            *self.session.write().await = Some(session.clone());
        }
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        let current = self.session.write().await.take();
        if let Some(session) = current {
            self.post("logout", Some(&session.access_token), json!({}))
                .await?;
        }
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str) -> Result<()> {
        self.post("recover", None, json!({ "email": email })).await?;
        Ok(())
    }
}
