use serde::Serialize;

use super::entities::{AttendanceRecord, AttendanceStatus};
use crate::calc::AttendanceStanding;

/// 各考勤状态计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub leave_approved: usize,
    pub od: usize,
}

impl StatusCounts {
    pub fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Late => self.late += 1,
            AttendanceStatus::LeaveApproved => self.leave_approved += 1,
            AttendanceStatus::Od => self.od += 1,
        }
    }

    pub fn get(&self, status: AttendanceStatus) -> usize {
        match status {
            AttendanceStatus::Present => self.present,
            AttendanceStatus::Absent => self.absent,
            AttendanceStatus::Late => self.late,
            AttendanceStatus::LeaveApproved => self.leave_approved,
            AttendanceStatus::Od => self.od,
        }
    }

    pub fn total(&self) -> usize {
        self.present + self.absent + self.late + self.leave_approved + self.od
    }
}

impl FromIterator<AttendanceStatus> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = AttendanceStatus>>(iter: I) -> Self {
        let mut counts = StatusCounts::default();
        for status in iter {
            counts.add(status);
        }
        counts
    }
}

/// 学生考勤汇总
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceSummary {
    pub records: Vec<AttendanceRecord>,
    pub total_classes: usize,
    pub attended_classes: usize,
    pub absent_classes: usize,
    pub counts: StatusCounts,
    pub attendance_percentage: f64,
    pub is_defaulter: bool,
    pub standing: AttendanceStanding,
}

/// 单次点名汇总
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub total_students: usize,
    pub counts: StatusCounts,
    pub attendance_percentage: f64,
}

/// 点名写入结果
#[derive(Debug, Clone, Serialize)]
pub struct MarkedSession {
    pub records: Vec<AttendanceRecord>,
    pub summary: SessionSummary,
}
