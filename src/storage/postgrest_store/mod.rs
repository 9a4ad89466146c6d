//! PostgREST 存储实现
//!
//! 通过 reqwest 访问 `{url}/rest/v1/{table}`，实时订阅走 Phoenix 通道。

pub mod realtime;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ChangeFilter, Query, RemoteStore, Subscription};
use crate::auth::RequestContext;
use crate::config::AppConfig;
use crate::errors::{PortalError, RemoteError, Result};
use crate::utils::validate_identifier;

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

pub struct PostgrestStore {
    client: reqwest::Client,
    rest_url: String,
    anon_key: String,
    schema: String,
    realtime: realtime::RealtimeSettings,
}

impl PostgrestStore {
    pub fn new(config: &AppConfig) -> Result<Self> {
        if config.backend.url.trim().is_empty() {
            return Err(PortalError::config(
                "backend.url is required for the postgrest store",
            ));
        }
        if config.backend.anon_key.trim().is_empty() {
            return Err(PortalError::config(
                "backend.anon_key is required for the postgrest store",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.backend.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            rest_url: config.rest_endpoint(),
            anon_key: config.backend.anon_key.clone(),
            schema: config.backend.schema.clone(),
            realtime: realtime::RealtimeSettings {
                endpoint: config.realtime_endpoint(),
                schema: config.backend.schema.clone(),
                heartbeat: Duration::from_secs(config.realtime.heartbeat_interval_secs.max(1)),
                capacity: config.realtime.channel_capacity.max(1),
            },
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    /// 公共请求头：匿名密钥、会话令牌（无会话时退回匿名密钥）、schema
    fn request(&self, ctx: &RequestContext, method: Method, table: &str) -> RequestBuilder {
        let token = ctx.access_token.as_deref().unwrap_or(&self.anon_key);
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .header("Accept-Profile", &self.schema)
            .header("Content-Profile", &self.schema)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }
}

/// 将失败响应体 `{code, message, details, hint}` 转为 [`RemoteError`]
async fn error_from_response(response: Response) -> PortalError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    warn!("PostgREST request failed with status {}: {}", status, body);
    parse_error_body(status.as_u16(), &body).into()
}

pub(crate) fn parse_error_body(status: u16, body: &str) -> RemoteError {
    match serde_json::from_str::<RemoteError>(body) {
        Ok(err) if err.code.is_some() || !err.message.is_empty() => err,
        _ if body.trim().is_empty() => RemoteError::without_code(format!("HTTP {status}")),
        _ => RemoteError::without_code(body.trim()),
    }
}

#[async_trait]
impl RemoteStore for PostgrestStore {
    fn backend_name(&self) -> &'static str {
        "postgrest"
    }

    async fn select(&self, ctx: &RequestContext, table: &str, query: &Query) -> Result<Vec<Value>> {
        query.validate(table)?;
        debug!("GET {} {:?}", table, query.to_params());
        let response = self
            .send(self.request(ctx, Method::GET, table).query(&query.to_params()))
            .await?;
        Ok(response.json().await?)
    }

    async fn insert(
        &self,
        ctx: &RequestContext,
        table: &str,
        rows: Vec<Value>,
    ) -> Result<Vec<Value>> {
        validate_identifier(table).map_err(PortalError::validation)?;
        debug!("POST {} ({} rows)", table, rows.len());
        let response = self
            .send(
                self.request(ctx, Method::POST, table)
                    .header("Prefer", "return=representation")
                    .json(&rows),
            )
            .await?;
        Ok(response.json().await?)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        table: &str,
        id: &str,
        patch: Value,
    ) -> Result<Value> {
        validate_identifier(table).map_err(PortalError::validation)?;
        debug!("PATCH {} id={}", table, id);
        let response = self
            .send(
                self.request(ctx, Method::PATCH, table)
                    .query(&[("id", format!("eq.{id}"))])
                    .header("Prefer", "return=representation")
                    .header("Accept", SINGLE_OBJECT)
                    .json(&patch),
            )
            .await?;
        Ok(response.json().await?)
    }

    async fn delete(&self, ctx: &RequestContext, table: &str, id: &str) -> Result<()> {
        validate_identifier(table).map_err(PortalError::validation)?;
        debug!("DELETE {} id={}", table, id);
        self.send(
            self.request(ctx, Method::DELETE, table)
                .query(&[("id", format!("eq.{id}"))]),
        )
        .await?;
        Ok(())
    }

    async fn subscribe(
        &self,
        ctx: &RequestContext,
        table: &str,
        filter: Option<ChangeFilter>,
    ) -> Result<Subscription> {
        validate_identifier(table).map_err(PortalError::validation)?;
        if let Some(filter) = &filter {
            filter.validate()?;
        }
        let token = ctx
            .access_token
            .clone()
            .unwrap_or_else(|| self.anon_key.clone());
        realtime::open_channel(&self.realtime, table, filter, token).await
    }
}
