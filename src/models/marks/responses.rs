use serde::Serialize;

use super::entities::MarksRecord;
use crate::calc::Grade;

/// 学生成绩汇总
#[derive(Debug, Clone, Serialize)]
pub struct MarksSummary {
    pub records: Vec<MarksRecord>,
    pub total_exams: usize,
    pub total_marks: f64,
    pub total_possible: f64,
    pub average_percentage: f64,
    pub grade: Grade,
}

/// 等级分布中的一项
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeCount {
    pub grade: Grade,
    pub count: usize,
}

/// 单次考核的分数统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentStats {
    pub count: usize,
    pub average: f64,
    pub highest: f64,
    pub lowest: f64,
    pub distribution: Vec<GradeCount>,
}
