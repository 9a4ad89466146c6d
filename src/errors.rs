//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。
//! 远端存储返回的错误（PostgREST / GoTrue）保留原始错误码，
//! 由 [`normalize_error_message`] 转换为面向用户的提示文本。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 远端存储返回的原始错误
///
/// 对应 PostgREST 的错误响应体 `{code, message, details, hint}`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl RemoteError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    pub fn without_code(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{code}] {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义（附带 `Remote` 变体承载远端错误）
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_portal_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum PortalError {
            $($variant(String),)*
            Remote(RemoteError),
        }

        impl PortalError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(PortalError::$variant(_) => $code,)*
                    PortalError::Remote(_) => "E100",
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(PortalError::$variant(_) => $type_name,)*
                    PortalError::Remote(_) => "Remote Store Error",
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(PortalError::$variant(msg) => msg,)*
                    PortalError::Remote(err) => &err.message,
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl PortalError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        PortalError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_portal_errors! {
    Config("E001", "Configuration Error"),
    StorePluginNotFound("E002", "Store Plugin Not Found"),
    Transport("E003", "Transport Error"),
    Authentication("E004", "Authentication Error"),
    Authorization("E005", "Authorization Error"),
    Validation("E006", "Validation Error"),
    NotFound("E007", "Resource Not Found"),
    Serialization("E008", "Serialization Error"),
    Realtime("E009", "Realtime Channel Error"),
}

pub const NO_DATA_FOUND: &str = "No data found";
pub const ACCESS_DENIED: &str = "Access denied. Please check your permissions.";
pub const RELATED_DATA: &str = "Cannot perform this action due to related data.";
pub const DUPLICATE_RECORD: &str = "This record already exists.";
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// 将远端错误码映射为面向用户的提示
///
/// 纯函数：任何输入都会得到一个字符串。
pub fn normalize_error_message(code: Option<&str>, raw_message: Option<&str>) -> String {
    match code {
        Some("PGRST116") => NO_DATA_FOUND.to_string(),
        Some("42501") => ACCESS_DENIED.to_string(),
        Some("23503") => RELATED_DATA.to_string(),
        Some("23505") => DUPLICATE_RECORD.to_string(),
        _ => match raw_message.map(str::trim) {
            Some(msg) if !msg.is_empty() => msg.to_string(),
            _ => UNEXPECTED_ERROR.to_string(),
        },
    }
}

impl PortalError {
    /// 远端错误码（仅 `Remote` 变体有）
    pub fn remote_code(&self) -> Option<&str> {
        match self {
            PortalError::Remote(err) => err.code.as_deref(),
            _ => None,
        }
    }

    /// 是否为 "无数据" 错误（PGRST116）
    pub fn is_no_rows(&self) -> bool {
        matches!(self.remote_code(), Some("PGRST116")) || matches!(self, PortalError::NotFound(_))
    }

    /// 面向用户的错误提示
    pub fn user_message(&self) -> String {
        normalize_error_message(self.remote_code(), Some(self.message()))
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        match self {
            PortalError::Remote(err) => format!("{}: {}", self.error_type(), err),
            _ => format!("{}: {}", self.error_type(), self.message()),
        }
    }
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for PortalError {}

impl From<RemoteError> for PortalError {
    fn from(err: RemoteError) -> Self {
        PortalError::Remote(err)
    }
}

// 为常见的错误类型实现 From trait
impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        PortalError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(err: reqwest::Error) -> Self {
        PortalError::Transport(err.to_string())
    }
}

impl From<config::ConfigError> for PortalError {
    fn from(err: config::ConfigError) -> Self {
        PortalError::Config(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for PortalError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        PortalError::Realtime(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(PortalError::config("test").code(), "E001");
        assert_eq!(PortalError::validation("test").code(), "E006");
        assert_eq!(PortalError::authentication("test").code(), "E004");
        assert_eq!(
            PortalError::from(RemoteError::new("42501", "denied")).code(),
            "E100"
        );
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            PortalError::store_plugin_not_found("test").error_type(),
            "Store Plugin Not Found"
        );
        assert_eq!(
            PortalError::validation("test").error_type(),
            "Validation Error"
        );
    }

    #[test]
    fn test_known_codes_are_normalized() {
        assert_eq!(normalize_error_message(Some("PGRST116"), None), "No data found");
        assert_eq!(
            normalize_error_message(Some("42501"), Some("permission denied for table")),
            "Access denied. Please check your permissions."
        );
        assert_eq!(
            normalize_error_message(Some("23503"), Some("violates foreign key")),
            "Cannot perform this action due to related data."
        );
        assert_eq!(
            normalize_error_message(Some("23505"), None),
            "This record already exists."
        );
    }

    #[test]
    fn test_unknown_codes_fall_back() {
        assert_eq!(
            normalize_error_message(Some("XX000"), Some("boom")),
            "boom"
        );
        assert_eq!(
            normalize_error_message(None, Some("   ")),
            "An unexpected error occurred"
        );
        assert_eq!(normalize_error_message(None, None), UNEXPECTED_ERROR);
    }

    #[test]
    fn test_user_message_uses_remote_code() {
        let err = PortalError::from(RemoteError::new(
            "PGRST116",
            "JSON object requested, multiple (or no) rows returned",
        ));
        assert_eq!(err.user_message(), "No data found");
        assert!(err.is_no_rows());

        let err = PortalError::transport("connection refused");
        assert_eq!(err.user_message(), "connection refused");
    }

    #[test]
    fn test_conversions_keep_their_kind() {
        let decode = serde_json::from_str::<RemoteError>("{not json").map_err(PortalError::from);
        let decode = decode.expect_err("malformed body");
        assert_eq!(decode.code(), "E008");
        assert_eq!(decode.error_type(), "Serialization Error");

        let closed = PortalError::from(tokio_tungstenite::tungstenite::Error::ConnectionClosed);
        assert_eq!(closed.code(), "E009");
        assert_eq!(closed.error_type(), "Realtime Channel Error");
        assert_eq!(closed.user_message(), closed.message());
    }

    #[test]
    fn test_format_simple() {
        let err = PortalError::validation("Invalid column");
        let formatted = err.format_simple();
        assert!(formatted.contains("Validation Error"));
        assert!(formatted.contains("Invalid column"));

        let remote = PortalError::from(RemoteError::new("23503", "fk"));
        assert!(remote.format_simple().contains("[23503] fk"));
    }
}
