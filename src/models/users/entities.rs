use serde::{Deserialize, Serialize};
use uuid::Uuid;

// 用户角色
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Student, // 学生
    Teacher, // 教师
    Hod,     // 系主任
    Admin,   // 管理员
}

impl UserRole {
    pub const STUDENT: &'static str = "student";
    pub const TEACHER: &'static str = "teacher";
    pub const HOD: &'static str = "hod";
    pub const ADMIN: &'static str = "admin";

    /// 可查看班级统计的角色
    pub fn staff_roles() -> &'static [UserRole] {
        &[Self::Teacher, Self::Hod, Self::Admin]
    }
    pub fn all_roles() -> &'static [UserRole] {
        &[Self::Student, Self::Teacher, Self::Hod, Self::Admin]
    }

    pub fn is_staff(&self) -> bool {
        Self::staff_roles().contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => Self::STUDENT,
            UserRole::Teacher => Self::TEACHER,
            UserRole::Hod => Self::HOD,
            UserRole::Admin => Self::ADMIN,
        }
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| {
            serde::de::Error::custom(format!(
                "invalid user role: '{s}'. supported roles: student, teacher, hod, admin"
            ))
        })
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            UserRole::STUDENT => Ok(UserRole::Student),
            UserRole::TEACHER => Ok(UserRole::Teacher),
            UserRole::HOD => Ok(UserRole::Hod),
            UserRole::ADMIN => Ok(UserRole::Admin),
            _ => Err(format!("Invalid user role: {s}")),
        }
    }
}

// 用户资料（user_profiles 表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    #[serde(default)]
    pub prn: Option<String>, // 学号（Permanent Registration Number）
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// 嵌入投影：只含姓名
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserName {
    pub full_name: String,
}

/// 嵌入投影：姓名 + 角色
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserNameRole {
    pub full_name: String,
    pub role: UserRole,
}

/// 嵌入投影：姓名 + 学号
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserNamePrn {
    pub full_name: String,
    #[serde(default)]
    pub prn: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_names() {
        for role in UserRole::all_roles() {
            assert_eq!(role.as_str().parse::<UserRole>(), Ok(*role));
        }
        assert!("principal".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_staff_roles() {
        assert!(!UserRole::Student.is_staff());
        assert!(UserRole::Teacher.is_staff());
        assert!(UserRole::Hod.is_staff());
        assert!(UserRole::Admin.is_staff());
    }

    #[test]
    fn test_profile_rejects_unknown_role() {
        let row = serde_json::json!({
            "id": "2f1c0b8e-6f0e-4d57-9a53-0d3b7c1f9e11",
            "email": "a@college.edu",
            "full_name": "A",
            "role": "dean"
        });
        let err = serde_json::from_value::<UserProfile>(row).unwrap_err();
        assert!(err.to_string().contains("invalid user role"));
    }
}
