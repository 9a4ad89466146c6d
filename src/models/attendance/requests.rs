use serde::Serialize;
use uuid::Uuid;

use super::entities::{AttendanceStatus, LectureType};

// 新考勤记录（写入 attendance_records）
#[derive(Debug, Clone, Serialize)]
pub struct NewAttendanceRecord {
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub attendance_date: chrono::NaiveDate,
    pub status: AttendanceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lecture_type: Option<LectureType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marked_by: Option<Uuid>,
}

/// 单个学生的点名结果
#[derive(Debug, Clone)]
pub struct AttendanceEntry {
    pub student_id: Uuid,
    pub status: AttendanceStatus,
}

/// 一次点名（同一课程、课程类型、日期）
#[derive(Debug, Clone)]
pub struct AttendanceSession {
    pub subject_id: Uuid,
    pub attendance_date: chrono::NaiveDate,
    pub lecture_type: LectureType,
    pub entries: Vec<AttendanceEntry>,
}

impl AttendanceSession {
    /// 展开为待写入的记录，`marked_by` 为点名教师
    pub fn to_records(&self, marked_by: Option<Uuid>) -> Vec<NewAttendanceRecord> {
        self.entries
            .iter()
            .map(|entry| NewAttendanceRecord {
                student_id: entry.student_id,
                subject_id: self.subject_id,
                attendance_date: self.attendance_date,
                status: entry.status,
                lecture_type: Some(self.lecture_type),
                marked_by,
            })
            .collect()
    }

    /// 全部标记为同一状态（全勤 / 全缺）
    pub fn mark_all(&mut self, status: AttendanceStatus) {
        for entry in &mut self.entries {
            entry.status = status;
        }
    }
}
