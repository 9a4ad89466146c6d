/*!
 * Supabase Realtime 通道（Phoenix 协议）
 *
 * ## 消息格式
 *
 * ### 加入通道
 * ```json
 * {
 *     "topic": "realtime:notifications_changes",
 *     "event": "phx_join",
 *     "payload": {
 *         "config": {
 *             "postgres_changes": [
 *                 {"event": "*", "schema": "public", "table": "notifications", "filter": "recipient_id=eq.<uuid>"}
 *             ]
 *         },
 *         "access_token": "<jwt>"
 *     },
 *     "ref": "1",
 *     "join_ref": "1"
 * }
 * ```
 *
 * ### 心跳
 * ```json
 * {"topic": "phoenix", "event": "heartbeat", "payload": {}, "ref": "2"}
 * ```
 *
 * ### 变更推送
 * ```json
 * {
 *     "topic": "realtime:notifications_changes",
 *     "event": "postgres_changes",
 *     "payload": {
 *         "data": {"type": "INSERT", "table": "notifications", "record": {}, "old_record": null, "commit_timestamp": "..."}
 *     }
 * }
 * ```
 */

use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::storage::realtime::{ChangeEvent, ChangeFilter, ChangeKind, Subscription};

/// 实时通道参数
#[derive(Debug, Clone)]
pub struct RealtimeSettings {
    pub endpoint: String,
    pub schema: String,
    pub heartbeat: Duration,
    pub capacity: usize,
}

/// Phoenix 消息帧
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_ref: Option<String>,
}

pub fn channel_topic(table: &str) -> String {
    format!("realtime:{table}_changes")
}

pub fn join_message(
    table: &str,
    schema: &str,
    filter: Option<&ChangeFilter>,
    access_token: &str,
    reference: &str,
) -> PhoenixMessage {
    let mut change = json!({
        "event": "*",
        "schema": schema,
        "table": table,
    });
    if let Some(filter) = filter {
        change["filter"] = Value::String(filter.to_string());
    }

    PhoenixMessage {
        topic: channel_topic(table),
        event: "phx_join".to_string(),
        payload: json!({
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [change],
            },
            "access_token": access_token,
        }),
        reference: Some(reference.to_string()),
        join_ref: Some(reference.to_string()),
    }
}

pub fn heartbeat_message(reference: &str) -> PhoenixMessage {
    PhoenixMessage {
        topic: "phoenix".to_string(),
        event: "heartbeat".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
        join_ref: None,
    }
}

pub fn leave_message(topic: &str, reference: &str) -> PhoenixMessage {
    PhoenixMessage {
        topic: topic.to_string(),
        event: "phx_leave".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
        join_ref: None,
    }
}

/// 从 `postgres_changes` 帧中取出变更；其他帧返回 `None`
pub fn parse_change(message: &PhoenixMessage) -> Option<ChangeEvent> {
    if message.event != "postgres_changes" {
        return None;
    }
    let data = message.payload.get("data")?;
    let kind = data
        .get("type")
        .or_else(|| data.get("eventType"))
        .and_then(Value::as_str)?
        .parse::<ChangeKind>()
        .ok()?;
    let row = |primary: &str, fallback: &str| {
        data.get(primary)
            .or_else(|| data.get(fallback))
            .filter(|v| v.as_object().is_some_and(|o| !o.is_empty()))
            .cloned()
    };

    Some(ChangeEvent {
        kind,
        table: data
            .get("table")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        new: row("record", "new"),
        old: row("old_record", "old"),
        commit_timestamp: data
            .get("commit_timestamp")
            .and_then(Value::as_str)
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc)),
    })
}

fn is_join_error(message: &PhoenixMessage, topic: &str) -> bool {
    message.topic == topic
        && message.event == "phx_reply"
        && message.payload.get("status").and_then(Value::as_str) == Some("error")
}

fn encode(message: &PhoenixMessage) -> Result<Message> {
    Ok(Message::Text(serde_json::to_string(message)?.into()))
}

/// 建立连接并加入通道，后台任务负责心跳与事件转发
pub(crate) async fn open_channel(
    settings: &RealtimeSettings,
    table: &str,
    filter: Option<ChangeFilter>,
    access_token: String,
) -> Result<Subscription> {
    let (stream, _) = connect_async(settings.endpoint.as_str()).await?;
    let (mut sink, mut source) = stream.split();

    let topic = channel_topic(table);
    let mut counter: u64 = 1;
    sink.send(encode(&join_message(
        table,
        &settings.schema,
        filter.as_ref(),
        &access_token,
        &counter.to_string(),
    ))?)
    .await?;
    info!("Realtime channel joined: {}", topic);

    let (tx, rx) = mpsc::channel(settings.capacity);
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let heartbeat = settings.heartbeat;

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(heartbeat);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = &mut stop_rx => {
                    counter += 1;
                    if let Ok(frame) = encode(&leave_message(&topic, &counter.to_string())) {
                        let _ = sink.send(frame).await;
                    }
                    let _ = sink.close().await;
                    break;
                }
                _ = ticker.tick() => {
                    counter += 1;
                    let sent = match encode(&heartbeat_message(&counter.to_string())) {
                        Ok(frame) => sink.send(frame).await.map_err(|e| e.to_string()),
                        Err(e) => Err(e.to_string()),
                    };
                    if let Err(e) = sent {
                        warn!("Realtime heartbeat failed: {}", e);
                        break;
                    }
                }
                incoming = source.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let message = match serde_json::from_str::<PhoenixMessage>(&text) {
                            Ok(message) => message,
                            Err(e) => {
                                debug!("Ignoring malformed realtime frame: {}", e);
                                continue;
                            }
                        };
                        if is_join_error(&message, &topic) {
                            warn!("Realtime join rejected for {}: {}", topic, message.payload);
                            break;
                        }
                        if let Some(event) = parse_change(&message)
                            && tx.send(event).await.is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Realtime connection error: {}", e);
                        break;
                    }
                }
            }
        }
        debug!("Realtime channel {} closed", topic);
    });

    Ok(Subscription::new(rx, stop_tx, task))
}
