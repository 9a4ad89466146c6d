use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use super::AcademicPolicy;
use crate::models::analytics::responses::Defaulter;
use crate::models::attendance::entities::{AttendanceRecord, AttendanceStatus};
use crate::models::attendance::responses::{AttendanceSummary, SessionSummary, StatusCounts};

/// 出勤情况分级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStanding {
    Good,
    Warning,
    Critical,
}

/// 四舍五入到整数（0.5 向上）
pub fn round_whole(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// 四舍五入到一位小数
pub fn round_one_decimal(value: f64) -> f64 {
    ((value * 10.0) + 0.5).floor() / 10.0
}

/// 出勤率 = 出勤次数 / 总次数 × 100，取整；总数为 0 时返回 0
pub fn attendance_percentage(attended: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_whole(attended as f64 / total as f64 * 100.0)
}

/// 按策略统计一组考勤状态的出勤率
pub fn attendance_percentage_for<I>(statuses: I, policy: &AcademicPolicy) -> f64
where
    I: IntoIterator<Item = AttendanceStatus>,
{
    let (attended, total) = statuses.into_iter().fold((0, 0), |(attended, total), s| {
        (attended + usize::from(policy.is_attended(s)), total + 1)
    });
    attendance_percentage(attended, total)
}

pub fn is_defaulter(percentage: f64, policy: &AcademicPolicy) -> bool {
    percentage < policy.defaulter_threshold
}

pub fn attendance_standing(percentage: f64, policy: &AcademicPolicy) -> AttendanceStanding {
    if percentage >= policy.defaulter_threshold {
        AttendanceStanding::Good
    } else if percentage >= policy.warning_threshold {
        AttendanceStanding::Warning
    } else {
        AttendanceStanding::Critical
    }
}

fn attended_count(counts: &StatusCounts, policy: &AcademicPolicy) -> usize {
    AttendanceStatus::all()
        .iter()
        .filter(|s| policy.is_attended(**s))
        .map(|s| counts.get(*s))
        .sum()
}

/// 学生考勤汇总
pub fn summarize_attendance(
    records: Vec<AttendanceRecord>,
    policy: &AcademicPolicy,
) -> AttendanceSummary {
    let counts: StatusCounts = records.iter().map(|r| r.status).collect();
    let total_classes = counts.total();
    let attended_classes = attended_count(&counts, policy);
    let attendance_percentage = attendance_percentage(attended_classes, total_classes);

    AttendanceSummary {
        records,
        total_classes,
        attended_classes,
        absent_classes: total_classes - attended_classes,
        counts,
        attendance_percentage,
        is_defaulter: is_defaulter(attendance_percentage, policy),
        standing: attendance_standing(attendance_percentage, policy),
    }
}

/// 单次点名的汇总
pub fn session_summary<I>(statuses: I, policy: &AcademicPolicy) -> SessionSummary
where
    I: IntoIterator<Item = AttendanceStatus>,
{
    let counts: StatusCounts = statuses.into_iter().collect();
    let total_students = counts.total();
    SessionSummary {
        total_students,
        counts,
        attendance_percentage: attendance_percentage(attended_count(&counts, policy), total_students),
    }
}

/// 从每个学生的考勤历史中找出出勤率不达标的学生，出勤率升序
pub fn find_defaulters(
    histories: &HashMap<Uuid, Vec<AttendanceStatus>>,
    policy: &AcademicPolicy,
) -> Vec<Defaulter> {
    let mut defaulters: Vec<Defaulter> = histories
        .iter()
        .filter_map(|(student_id, statuses)| {
            let attended = statuses.iter().filter(|s| policy.is_attended(**s)).count();
            let total = statuses.len();
            let percentage = attendance_percentage(attended, total);
            is_defaulter(percentage, policy).then_some(Defaulter {
                student_id: *student_id,
                attended,
                total,
                attendance_percentage: percentage,
            })
        })
        .collect();

    defaulters.sort_by(|a, b| {
        a.attendance_percentage
            .total_cmp(&b.attendance_percentage)
            .then_with(|| a.student_id.cmp(&b.student_id))
    });
    defaulters
}
