use std::collections::HashMap;
use uuid::Uuid;

use super::AcademicPolicy;
use super::attendance::{round_one_decimal, round_whole};
use super::policy::Grade;
use crate::errors::{PortalError, Result};
use crate::models::analytics::responses::SubjectPerformance;
use crate::models::marks::entities::{MarksRecord, MarksScore};
use crate::models::marks::responses::{AssessmentStats, GradeCount, MarksSummary};

/// 得分率 = 得分 / 满分 × 100；满分不大于 0 或输入非有限数时返回 0
pub fn marks_percentage(obtained: f64, max: f64) -> f64 {
    if !(max > 0.0) || !obtained.is_finite() || !max.is_finite() {
        return 0.0;
    }
    obtained / max * 100.0
}

pub fn grade_for(percentage: f64, policy: &AcademicPolicy) -> Grade {
    policy.grade_for(percentage)
}

/// 录入校验：满分必须大于 0，得分必须在 [0, 满分] 内
pub fn validate_marks(obtained: f64, max: f64) -> Result<()> {
    if !max.is_finite() || max <= 0.0 {
        return Err(PortalError::validation(format!(
            "max marks must be greater than 0, got {max}"
        )));
    }
    if !obtained.is_finite() || obtained < 0.0 || obtained > max {
        return Err(PortalError::validation(format!(
            "marks obtained must be between 0 and {max}, got {obtained}"
        )));
    }
    Ok(())
}

/// 记录自带的百分比优先，缺失时按得分重新计算
pub fn record_percentage(record: &MarksRecord) -> f64 {
    record
        .percentage
        .filter(|p| p.is_finite())
        .unwrap_or_else(|| marks_percentage(record.marks_obtained, record.max_marks))
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// 学生成绩汇总：总得分 / 总满分
pub fn summarize_marks(records: Vec<MarksRecord>, policy: &AcademicPolicy) -> MarksSummary {
    let total_marks: f64 = records.iter().map(|r| r.marks_obtained).sum();
    let total_possible: f64 = records.iter().map(|r| r.max_marks).sum();
    let average_percentage = round_whole(marks_percentage(total_marks, total_possible));

    MarksSummary {
        total_exams: records.len(),
        records,
        total_marks,
        total_possible,
        average_percentage,
        grade: grade_for(average_percentage, policy),
    }
}

/// 单次考核的分数分布，每个分数按自身满分定等级
pub fn assessment_stats(rows: &[MarksScore], policy: &AcademicPolicy) -> AssessmentStats {
    let mut distribution: Vec<GradeCount> = Grade::all()
        .iter()
        .map(|grade| GradeCount {
            grade: *grade,
            count: 0,
        })
        .collect();

    for row in rows {
        let grade = grade_for(marks_percentage(row.marks_obtained, row.max_marks), policy);
        if let Some(slot) = distribution.iter_mut().find(|c| c.grade == grade) {
            slot.count += 1;
        }
    }

    let scores: Vec<f64> = rows.iter().map(|r| r.marks_obtained).collect();
    let highest = scores.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let lowest = scores.iter().copied().reduce(f64::min).unwrap_or(0.0);

    AssessmentStats {
        count: scores.len(),
        average: round_one_decimal(mean(&scores).unwrap_or(0.0)),
        highest,
        lowest,
        distribution,
    }
}

/// 按课程分组的成绩表现，保持首次出现的顺序
pub fn subject_breakdown(records: &[MarksRecord]) -> Vec<SubjectPerformance> {
    let mut order: Vec<Uuid> = Vec::new();
    let mut groups: HashMap<Uuid, (Option<String>, Vec<f64>)> = HashMap::new();

    for record in records {
        let entry = groups.entry(record.subject_id).or_insert_with(|| {
            order.push(record.subject_id);
            (None, Vec::new())
        });
        if entry.0.is_none() {
            entry.0 = record.subject.as_ref().map(|s| s.subject_name.clone());
        }
        entry.1.push(record_percentage(record));
    }

    order
        .into_iter()
        .filter_map(|subject_id| {
            groups.remove(&subject_id).map(|(subject_name, percentages)| SubjectPerformance {
                subject_id,
                subject_name,
                records: percentages.len(),
                average_percentage: round_one_decimal(mean(&percentages).unwrap_or(0.0)),
            })
        })
        .collect()
}
