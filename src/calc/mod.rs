//! 统计计算
//!
//! 出勤率、得分率、等级划分与各类汇总。全部为纯函数，
//! 阈值与等级分段由 [`AcademicPolicy`] 显式传入。

pub mod attendance;
pub mod marks;
pub mod policy;

pub use attendance::{
    AttendanceStanding, attendance_percentage, attendance_percentage_for, attendance_standing,
    find_defaulters, is_defaulter, round_one_decimal, round_whole, session_summary,
    summarize_attendance,
};
pub use marks::{
    assessment_stats, grade_for, marks_percentage, mean, record_percentage, subject_breakdown,
    summarize_marks, validate_marks,
};
pub use policy::{AcademicPolicy, Grade, GradeBand};
