use serde::Serialize;
use uuid::Uuid;

/// 录入的一条成绩（未派生百分比与等级）
#[derive(Debug, Clone)]
pub struct MarksEntry {
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub exam_type_id: Uuid,
    pub class_id: Option<Uuid>,
    pub marks_obtained: f64,
    pub max_marks: f64,
}

// 新成绩记录（写入 marks_records）
#[derive(Debug, Clone, Serialize)]
pub struct NewMarksRecord {
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub exam_type_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<Uuid>,
    pub marks_obtained: f64,
    pub max_marks: f64,
    pub percentage: f64,
    pub grade: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marked_by: Option<Uuid>,
}
