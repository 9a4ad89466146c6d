//! 声明式查询
//!
//! `{select, filters, order, limit}` 描述一次只读查询，
//! 两种存储后端都从这里取得校验后的查询参数。

use serde_json::Value;

use crate::errors::{PortalError, Result};
use crate::utils::validate_identifier;

/// 等值过滤条件（多个条件之间为 AND）
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub select: String,
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            select: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// 投影，去掉所有空白
    pub fn select(mut self, projection: &str) -> Self {
        self.select = projection.chars().filter(|c| !c.is_whitespace()).collect();
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    /// 值为 `None` 时跳过该条件
    pub fn eq_opt<V: Into<Value>>(self, column: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.eq(column, value),
            None => self,
        }
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            ascending,
        });
        self
    }

    /// `0` 表示不限制
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    /// 校验表名、列名与投影，返回解析后的投影
    pub fn validate(&self, table: &str) -> Result<Vec<SelectItem>> {
        validate_identifier(table).map_err(PortalError::validation)?;
        for filter in &self.filters {
            validate_identifier(&filter.column).map_err(PortalError::validation)?;
        }
        if let Some(order) = &self.order {
            validate_identifier(&order.column).map_err(PortalError::validation)?;
        }
        parse_select(&self.select)
    }

    /// PostgREST 查询参数
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.select.clone())];
        for filter in &self.filters {
            let condition = match &filter.value {
                Value::Null => "is.null".to_string(),
                value => format!("eq.{}", encode_value(value)),
            };
            params.push((filter.column.clone(), condition));
        }
        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{direction}", order.column)));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

/// 过滤值在查询串中的文本形式
pub fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 投影中的一项
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Star,
    Column { name: String, alias: Option<String> },
    Embed(Embed),
}

/// 嵌入关联表：`alias:table!hint!inner(items)`
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub alias: Option<String>,
    pub table: String,
    pub hint: Option<String>,
    pub inner: bool,
    pub items: Vec<SelectItem>,
}

impl Embed {
    /// 结果中的字段名
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

pub fn parse_select(projection: &str) -> Result<Vec<SelectItem>> {
    let mut parser = SelectParser {
        chars: projection.chars().filter(|c| !c.is_whitespace()).collect(),
        pos: 0,
    };
    parser.items(false)
}

struct SelectParser {
    chars: Vec<char>,
    pos: usize,
}

impl SelectParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn token(&mut self) -> Result<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, ',' | ':' | '!' | '(' | ')') {
                break;
            }
            self.pos += 1;
        }
        let token: String = self.chars[start..self.pos].iter().collect();
        validate_identifier(&token).map_err(PortalError::validation)?;
        Ok(token)
    }

    fn items(&mut self, nested: bool) -> Result<Vec<SelectItem>> {
        let mut items = Vec::new();
        loop {
            items.push(self.item()?);
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(')') if nested => return Ok(items),
                None if !nested => return Ok(items),
                None => return Err(PortalError::validation("Unclosed '(' in select")),
                Some(c) => {
                    return Err(PortalError::validation(format!(
                        "Unexpected '{c}' in select"
                    )));
                }
            }
        }
    }

    fn item(&mut self) -> Result<SelectItem> {
        if self.peek() == Some('*') {
            self.pos += 1;
            return Ok(SelectItem::Star);
        }

        let first = self.token()?;
        let (alias, name) = if self.peek() == Some(':') {
            self.pos += 1;
            (Some(first), self.token()?)
        } else {
            (None, first)
        };

        let mut hint = None;
        let mut inner = false;
        while self.peek() == Some('!') {
            self.pos += 1;
            match self.token()?.as_str() {
                "inner" => inner = true,
                "left" => {}
                other => hint = Some(other.to_string()),
            }
        }

        if self.peek() == Some('(') {
            self.pos += 1;
            let items = self.items(true)?;
            self.pos += 1; // ')'
            Ok(SelectItem::Embed(Embed {
                alias,
                table: name,
                hint,
                inner,
                items,
            }))
        } else if hint.is_some() || inner {
            Err(PortalError::validation(format!(
                "Embedded resource '{name}' is missing its column list"
            )))
        } else {
            Ok(SelectItem::Column { name, alias })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_encoding() {
        let query = Query::new()
            .select("*, subject:subjects(subject_name, subject_code)")
            .eq("student_id", "abc")
            .eq("is_read", false)
            .eq("prn", Value::Null)
            .order("attendance_date", false)
            .limit(20);
        assert_eq!(
            query.to_params(),
            vec![
                (
                    "select".to_string(),
                    "*,subject:subjects(subject_name,subject_code)".to_string()
                ),
                ("student_id".to_string(), "eq.abc".to_string()),
                ("is_read".to_string(), "eq.false".to_string()),
                ("prn".to_string(), "is.null".to_string()),
                ("order".to_string(), "attendance_date.desc".to_string()),
                ("limit".to_string(), "20".to_string()),
            ]
        );
    }

    #[test]
    fn test_absent_values_and_zero_limit_are_skipped() {
        let query = Query::new()
            .eq_opt("student_id", Some("s1"))
            .eq_opt::<String>("subject_id", None)
            .limit(0);
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.limit, None);
        assert_eq!(query.select, "*");
    }

    #[test]
    fn test_rejects_bad_identifiers() {
        assert!(Query::new().validate("attendance_records").is_ok());
        assert!(Query::new().validate("attendance records").is_err());
        assert!(Query::new().eq("id;drop", 1).validate("t").is_err());
        assert!(Query::new().order("a.b", true).validate("t").is_err());
        assert!(Query::new().select("id,na-me").validate("t").is_err());
    }

    #[test]
    fn test_parse_embeds() {
        let items = parse_select(
            "*, marked_by_user:user_profiles!attendance_records_marked_by_fkey(full_name), class:classes!inner(class_name)",
        )
        .expect("select should parse");
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], SelectItem::Star);
        match &items[1] {
            SelectItem::Embed(embed) => {
                assert_eq!(embed.key(), "marked_by_user");
                assert_eq!(embed.table, "user_profiles");
                assert_eq!(
                    embed.hint.as_deref(),
                    Some("attendance_records_marked_by_fkey")
                );
                assert!(!embed.inner);
            }
            other => panic!("expected embed, got {other:?}"),
        }
        match &items[2] {
            SelectItem::Embed(embed) => {
                assert!(embed.inner);
                assert_eq!(embed.items.len(), 1);
            }
            other => panic!("expected embed, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_select("").is_err());
        assert!(parse_select("id,,name").is_err());
        assert!(parse_select("subject:subjects(subject_name").is_err());
        assert!(parse_select("id)").is_err());
        assert!(parse_select("user_profiles!hint").is_err());
    }

    #[test]
    fn test_encode_value() {
        assert_eq!(encode_value(&json!("x")), "x");
        assert_eq!(encode_value(&json!(42)), "42");
        assert_eq!(encode_value(&json!(true)), "true");
    }
}
