use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::users::entities::UserName;

// 考勤状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,       // 出勤
    Absent,        // 缺勤
    Late,          // 迟到
    LeaveApproved, // 已批准请假
    Od,            // 公假（On Duty）
}

impl AttendanceStatus {
    pub fn all() -> &'static [AttendanceStatus] {
        &[
            Self::Present,
            Self::Absent,
            Self::Late,
            Self::LeaveApproved,
            Self::Od,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::LeaveApproved => "leave_approved",
            AttendanceStatus::Od => "od",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// 课程类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LectureType {
    Theory,
    Practical,
    Tutorial,
}

impl LectureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LectureType::Theory => "theory",
            LectureType::Practical => "practical",
            LectureType::Tutorial => "tutorial",
        }
    }
}

/// 嵌入投影：课程名称与代码
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRef {
    pub subject_name: String,
    #[serde(default)]
    pub subject_code: Option<String>,
}

// 考勤记录（attendance_records 表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub attendance_date: chrono::NaiveDate,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub lecture_type: Option<LectureType>,
    #[serde(default)]
    pub marked_by: Option<Uuid>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub subject: Option<SubjectRef>,
    #[serde(default)]
    pub marked_by_user: Option<UserName>,
}
