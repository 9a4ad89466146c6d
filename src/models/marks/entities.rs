use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::attendance::entities::SubjectRef;
use crate::models::users::entities::UserName;

/// 嵌入投影：考试类型（CT1 / CT2 / MidSem ...）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamTypeRef {
    pub exam_name: String,
    #[serde(default)]
    pub max_marks: Option<f64>,
}

// 成绩记录（marks_records 表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarksRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub exam_type_id: Uuid,
    pub marks_obtained: f64,
    pub max_marks: f64,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub marked_by: Option<Uuid>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub subject: Option<SubjectRef>,
    #[serde(default)]
    pub exam_type: Option<ExamTypeRef>,
    #[serde(default)]
    pub marked_by_user: Option<UserName>,
}

/// 统计用的精简成绩投影
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarksScore {
    pub marks_obtained: f64,
    pub max_marks: f64,
    #[serde(default)]
    pub percentage: Option<f64>,
}
