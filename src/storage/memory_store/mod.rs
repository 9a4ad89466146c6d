//! 内存存储实现
//!
//! 用 DashMap 按表保存 JSON 行，行为尽量贴近 PostgREST：
//! 自动生成 `id` / `created_at`，可选的唯一约束 (23505) 与外键约束 (23503)，
//! 更新不存在的行返回 PGRST116。

mod embed;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use super::realtime::forward_broadcast;
use super::{ChangeEvent, ChangeFilter, ChangeKind, Query, RemoteStore, Subscription};
use crate::auth::RequestContext;
use crate::errors::{PortalError, RemoteError, Result};
use crate::utils::validate_identifier;

#[derive(Debug, Clone)]
struct ForeignKey {
    column: String,
    parent: String,
}

pub struct MemoryStore {
    tables: DashMap<String, Vec<Value>>,
    unique: DashMap<String, Vec<Vec<String>>>,
    foreign_keys: DashMap<String, Vec<ForeignKey>>,
    channels: DashMap<String, broadcast::Sender<ChangeEvent>>,
    channel_capacity: usize,
    requests: AtomicUsize,
    injected: Mutex<Option<(usize, RemoteError)>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
            unique: DashMap::new(),
            foreign_keys: DashMap::new(),
            channels: DashMap::new(),
            channel_capacity: 100,
            requests: AtomicUsize::new(0),
            injected: Mutex::new(None),
        }
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// 声明唯一约束（列组合）
    pub fn with_unique(self, table: &str, columns: &[&str]) -> Self {
        self.unique
            .entry(table.to_string())
            .or_default()
            .push(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// 声明外键：`child.column` 引用 `parent.id`
    pub fn with_foreign_key(self, child: &str, column: &str, parent: &str) -> Self {
        self.foreign_keys
            .entry(child.to_string())
            .or_default()
            .push(ForeignKey {
                column: column.to_string(),
                parent: parent.to_string(),
            });
        self
    }

    /// 直接写入初始数据（不计请求数，不触发变更事件），缺失的 `id` 自动生成
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let rows = rows.into_iter().map(|row| match row {
            Value::Object(map) => Value::Object(with_defaults(map)),
            other => other,
        });
        self.tables.entry(table.to_string()).or_default().extend(rows);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .get(table)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    /// 已处理的请求数
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// 让下一次请求返回指定错误
    pub fn inject_error(&self, error: RemoteError) {
        self.inject_error_after(0, error);
    }

    /// 放行 `skip` 次请求后，让下一次请求返回指定错误
    pub fn inject_error_after(&self, skip: usize, error: RemoteError) {
        if let Ok(mut slot) = self.injected.lock() {
            *slot = Some((skip, error));
        }
    }

    /// 当前订阅该表的监听数
    pub fn listener_count(&self, table: &str) -> usize {
        self.channels
            .get(table)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    fn begin_request(&self, operation: &str, table: &str) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        debug!("MemoryStore {} {}", operation, table);
        validate_identifier(table).map_err(PortalError::validation)?;
        let Ok(mut slot) = self.injected.lock() else {
            return Ok(());
        };
        match slot.take() {
            Some((0, error)) => Err(error.into()),
            Some((skip, error)) => {
                *slot = Some((skip - 1, error));
                Ok(())
            }
            None => Ok(()),
        }
    }

    pub(crate) fn find_by_id(&self, table: &str, id: &Value) -> Option<Value> {
        let rows = self.tables.get(table)?;
        rows.iter()
            .find(|row| embed::value_matches(row.get("id"), id))
            .cloned()
    }

    fn publish(&self, table: &str, kind: ChangeKind, new: Option<Value>, old: Option<Value>) {
        if let Some(sender) = self.channels.get(table) {
            let _ = sender.send(ChangeEvent {
                kind,
                table: table.to_string(),
                new,
                old,
                commit_timestamp: Some(Utc::now()),
            });
        }
    }

    fn check_foreign_keys(&self, table: &str, row: &Map<String, Value>) -> Result<()> {
        let Some(foreign_keys) = self.foreign_keys.get(table).map(|fks| fks.clone()) else {
            return Ok(());
        };
        for fk in foreign_keys {
            match row.get(&fk.column) {
                None | Some(Value::Null) => continue,
                Some(id) if self.find_by_id(&fk.parent, id).is_some() => continue,
                Some(_) => {
                    return Err(RemoteError::new(
                        "23503",
                        format!(
                            "insert or update on table \"{table}\" violates foreign key constraint \"{table}_{}_fkey\"",
                            fk.column
                        ),
                    )
                    .into());
                }
            }
        }
        Ok(())
    }

    /// 唯一约束检查；`existing` 中跳过 `skip_id` 对应的行（更新自身）
    fn check_unique(
        &self,
        table: &str,
        row: &Map<String, Value>,
        existing: &[Value],
        skip_id: Option<&Value>,
    ) -> Result<()> {
        let mut constraints = vec![vec!["id".to_string()]];
        if let Some(declared) = self.unique.get(table) {
            constraints.extend(declared.iter().cloned());
        }

        for columns in constraints {
            let key: Option<Vec<&Value>> = columns
                .iter()
                .map(|c| row.get(c).filter(|v| !v.is_null()))
                .collect();
            let Some(key) = key else { continue };

            let conflict = existing.iter().any(|other| {
                if skip_id.is_some_and(|id| embed::value_matches(other.get("id"), id)) {
                    return false;
                }
                columns
                    .iter()
                    .zip(&key)
                    .all(|(column, value)| embed::value_matches(other.get(column), value))
            });
            if conflict {
                let name = if columns == ["id"] {
                    format!("{table}_pkey")
                } else {
                    format!("{table}_{}_key", columns.join("_"))
                };
                return Err(RemoteError::new(
                    "23505",
                    format!("duplicate key value violates unique constraint \"{name}\""),
                )
                .with_details(format!("Key ({}) already exists.", columns.join(", ")))
                .into());
            }
        }
        Ok(())
    }
}

fn as_object(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(PortalError::validation(format!(
            "Expected a JSON object row, got {other}"
        ))),
    }
}

fn with_defaults(mut row: Map<String, Value>) -> Map<String, Value> {
    row.entry("id")
        .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    row.entry("created_at")
        .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
    row
}

#[async_trait]
impl RemoteStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn select(
        &self,
        _ctx: &RequestContext,
        table: &str,
        query: &Query,
    ) -> Result<Vec<Value>> {
        self.begin_request("select", table)?;
        let items = query.validate(table)?;

        let mut rows: Vec<Value> = self
            .rows(table)
            .into_iter()
            .filter(|row| {
                query
                    .filters
                    .iter()
                    .all(|f| embed::value_matches(row.get(&f.column), &f.value))
            })
            .collect();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                embed::compare_values(a.get(&order.column), b.get(&order.column), order.ascending)
            });
        }

        let mut projected: Vec<Value> = rows
            .iter()
            .filter_map(|row| embed::project(self, table, row, &items))
            .collect();
        if let Some(limit) = query.limit {
            projected.truncate(limit);
        }
        Ok(projected)
    }

    async fn insert(
        &self,
        _ctx: &RequestContext,
        table: &str,
        rows: Vec<Value>,
    ) -> Result<Vec<Value>> {
        self.begin_request("insert", table)?;

        let mut prepared: Vec<Value> = Vec::with_capacity(rows.len());
        let existing = self.rows(table);
        for row in rows {
            let row = with_defaults(as_object(row)?);

            self.check_foreign_keys(table, &row)?;
            // 同一批次内的行也参与唯一约束检查
            let mut seen = existing.clone();
            seen.extend(prepared.iter().cloned());
            self.check_unique(table, &row, &seen, None)?;
            prepared.push(Value::Object(row));
        }

        self.tables
            .entry(table.to_string())
            .or_default()
            .extend(prepared.iter().cloned());

        for row in &prepared {
            self.publish(table, ChangeKind::Insert, Some(row.clone()), None);
        }
        Ok(prepared)
    }

    async fn update(
        &self,
        _ctx: &RequestContext,
        table: &str,
        id: &str,
        patch: Value,
    ) -> Result<Value> {
        self.begin_request("update", table)?;
        let patch = as_object(patch)?;
        let id_value = Value::String(id.to_string());

        let existing = self.rows(table);
        let Some(old) = existing
            .iter()
            .find(|row| embed::value_matches(row.get("id"), &id_value))
            .cloned()
        else {
            return Err(RemoteError::new(
                "PGRST116",
                "JSON object requested, multiple (or no) rows returned",
            )
            .with_details("The result contains 0 rows")
            .into());
        };

        let mut updated = as_object(old.clone())?;
        for (key, value) in patch {
            if key != "id" {
                updated.insert(key, value);
            }
        }
        self.check_foreign_keys(table, &updated)?;
        self.check_unique(table, &updated, &existing, Some(&id_value))?;

        let updated = Value::Object(updated);
        if let Some(mut rows) = self.tables.get_mut(table)
            && let Some(slot) = rows
                .iter_mut()
                .find(|row| embed::value_matches(row.get("id"), &id_value))
        {
            *slot = updated.clone();
        }

        self.publish(table, ChangeKind::Update, Some(updated.clone()), Some(old));
        Ok(updated)
    }

    async fn delete(&self, _ctx: &RequestContext, table: &str, id: &str) -> Result<()> {
        self.begin_request("delete", table)?;
        let id_value = Value::String(id.to_string());

        let referencing: Vec<(String, ForeignKey)> = self
            .foreign_keys
            .iter()
            .flat_map(|entry| {
                let child = entry.key().clone();
                entry
                    .value()
                    .iter()
                    .filter(|fk| fk.parent == table)
                    .map(|fk| (child.clone(), fk.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();
        for (child, fk) in referencing {
            if self
                .rows(&child)
                .iter()
                .any(|row| embed::value_matches(row.get(&fk.column), &id_value))
            {
                return Err(RemoteError::new(
                    "23503",
                    format!(
                        "update or delete on table \"{table}\" violates foreign key constraint \"{child}_{}_fkey\" on table \"{child}\"",
                        fk.column
                    ),
                )
                .into());
            }
        }

        let removed = self.tables.get_mut(table).and_then(|mut rows| {
            let index = rows
                .iter()
                .position(|row| embed::value_matches(row.get("id"), &id_value))?;
            Some(rows.remove(index))
        });
        if let Some(old) = removed {
            self.publish(table, ChangeKind::Delete, None, Some(old));
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        _ctx: &RequestContext,
        table: &str,
        filter: Option<ChangeFilter>,
    ) -> Result<Subscription> {
        self.begin_request("subscribe", table)?;
        if let Some(filter) = &filter {
            filter.validate()?;
        }
        let receiver = self
            .channels
            .entry(table.to_string())
            .or_insert_with(|| broadcast::channel(self.channel_capacity).0)
            .subscribe();
        Ok(forward_broadcast(receiver, filter, self.channel_capacity))
    }
}
