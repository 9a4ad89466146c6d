//! 内存后端的投影与嵌入解析
//!
//! 只支持多对一嵌入：子行上的外键列指向被嵌入表的 `id`。
//! 外键列的推断顺序：
//! 1. 提示形如 `{table}_{column}_fkey` 时取其中的 `column`
//! 2. 其他提示视为列名本身
//! 3. 无提示时取 `{alias}_id`，没有别名则取 `{table 单数}_id`

use serde_json::{Map, Value};
use std::cmp::Ordering;

use super::MemoryStore;
use crate::storage::query::{Embed, SelectItem, encode_value};

pub(super) fn fk_column(parent_table: &str, embed: &Embed) -> String {
    if let Some(hint) = &embed.hint {
        let prefix = format!("{parent_table}_");
        return hint
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix("_fkey"))
            .unwrap_or(hint)
            .to_string();
    }
    match &embed.alias {
        Some(alias) => format!("{alias}_id"),
        None => format!("{}_id", embed.table.strip_suffix('s').unwrap_or(&embed.table)),
    }
}

/// 按投影生成结果行；`!inner` 嵌入缺失时返回 `None`（整行被过滤）
pub(super) fn project(
    store: &MemoryStore,
    table: &str,
    row: &Value,
    items: &[SelectItem],
) -> Option<Value> {
    let source = row.as_object()?;
    let mut output = Map::new();

    for item in items {
        match item {
            SelectItem::Star => {
                for (key, value) in source {
                    output.insert(key.clone(), value.clone());
                }
            }
            SelectItem::Column { name, alias } => {
                let key = alias.as_ref().unwrap_or(name);
                output.insert(
                    key.clone(),
                    source.get(name).cloned().unwrap_or(Value::Null),
                );
            }
            SelectItem::Embed(embed) => {
                let column = fk_column(table, embed);
                let parent = source
                    .get(&column)
                    .filter(|v| !v.is_null())
                    .and_then(|id| store.find_by_id(&embed.table, id))
                    .and_then(|parent| project(store, &embed.table, &parent, &embed.items));
                match parent {
                    Some(value) => {
                        output.insert(embed.key().to_string(), value);
                    }
                    None if embed.inner => return None,
                    None => {
                        output.insert(embed.key().to_string(), Value::Null);
                    }
                }
            }
        }
    }

    Some(Value::Object(output))
}

/// 等值比较；过滤值为 null 时匹配缺失或 null 的列
pub(super) fn value_matches(row_value: Option<&Value>, expected: &Value) -> bool {
    match (row_value, expected) {
        (None | Some(Value::Null), Value::Null) => true,
        (None | Some(Value::Null), _) | (_, Value::Null) => false,
        (Some(actual), expected) => encode_value(actual) == encode_value(expected),
    }
}

/// 排序比较：升序时 null 在后，降序时 null 在前
pub(super) fn compare_values(a: Option<&Value>, b: Option<&Value>, ascending: bool) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    let ordering = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => compare_present(x, y),
    };
    if ascending { ordering } else { ordering.reverse() }
}

fn compare_present(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (x, y) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn embed(alias: Option<&str>, table: &str, hint: Option<&str>) -> Embed {
        Embed {
            alias: alias.map(str::to_string),
            table: table.to_string(),
            hint: hint.map(str::to_string),
            inner: false,
            items: vec![SelectItem::Star],
        }
    }

    #[test]
    fn test_fk_column_inference() {
        assert_eq!(
            fk_column(
                "attendance_records",
                &embed(
                    Some("marked_by_user"),
                    "user_profiles",
                    Some("attendance_records_marked_by_fkey")
                )
            ),
            "marked_by"
        );
        assert_eq!(
            fk_column("marks_records", &embed(Some("exam_type"), "exam_types", None)),
            "exam_type_id"
        );
        assert_eq!(
            fk_column("subject_assignments", &embed(None, "subjects", None)),
            "subject_id"
        );
        assert_eq!(
            fk_column("x", &embed(None, "user_profiles", Some("teacher_id"))),
            "teacher_id"
        );
    }

    #[test]
    fn test_null_ordering() {
        let one = json!(1);
        assert_eq!(compare_values(None, Some(&one), true), Ordering::Greater);
        assert_eq!(compare_values(None, Some(&one), false), Ordering::Less);
        assert_eq!(
            compare_values(Some(&json!("2024-01-02")), Some(&json!("2024-01-10")), false),
            Ordering::Greater
        );
    }

    #[test]
    fn test_value_matches() {
        assert!(value_matches(Some(&json!("a")), &json!("a")));
        assert!(value_matches(Some(&json!(false)), &json!(false)));
        assert!(!value_matches(Some(&json!(true)), &json!(false)));
        assert!(value_matches(None, &Value::Null));
        assert!(!value_matches(None, &json!("a")));
        assert!(value_matches(Some(&json!(3)), &json!("3")));
    }
}
