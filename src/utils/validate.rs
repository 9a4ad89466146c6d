use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid identifier regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

/// 认证服务要求的最短密码长度
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// 表名 / 列名校验：只允许字母、数字、下划线，且不能以数字开头
pub fn validate_identifier(identifier: &str) -> Result<(), String> {
    if IDENTIFIER_RE.is_match(identifier) {
        Ok(())
    } else {
        Err(format!("Invalid identifier: '{identifier}'"))
    }
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    // 邮箱格式校验：必须包含 @ 和 .
    if !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err("Password must be at least 6 characters long");
    }
    Ok(())
}
