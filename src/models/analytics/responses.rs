use serde::Serialize;
use uuid::Uuid;

use crate::models::enrollments::entities::ClassMember;
use crate::models::marks::entities::MarksScore;

/// 单门课程的表现
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectPerformance {
    pub subject_id: Uuid,
    pub subject_name: Option<String>,
    pub records: usize,
    pub average_percentage: f64,
}

/// 班级统计
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassAnalytics {
    pub total_students: usize,
    pub average_attendance: f64,
    pub average_marks: f64,
    pub defaulter_count: usize,
    pub subject_performance: Vec<SubjectPerformance>,
}

/// 课程成绩统计
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubjectAnalytics {
    pub total_students: usize,
    pub average_percentage: f64,
    pub marks: Vec<MarksScore>,
}

/// 班级成员概览
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassPerformance {
    pub total_students: usize,
    pub students: Vec<ClassMember>,
}

/// 考勤不达标学生
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Defaulter {
    pub student_id: Uuid,
    pub attended: usize,
    pub total: usize,
    pub attendance_percentage: f64,
}
