//! 学业策略：出勤阈值、计入出勤的状态、等级分段
//!
//! 这些都是院校策略值，通过配置注入，而不是写死在计算函数中。

use serde::{Deserialize, Serialize};

use crate::errors::{PortalError, Result};
use crate::models::attendance::entities::AttendanceStatus;

// 成绩等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "F")]
    F,
}

impl Grade {
    /// 从高到低
    pub fn all() -> &'static [Grade] {
        &[
            Self::APlus,
            Self::A,
            Self::BPlus,
            Self::B,
            Self::CPlus,
            Self::C,
            Self::F,
        ]
    }

    /// 越小越好
    pub fn rank(&self) -> usize {
        Self::all().iter().position(|g| g == self).unwrap_or(usize::MAX)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::F => "F",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 百分比 >= `min` 即落入该等级
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeBand {
    pub min: f64,
    pub grade: Grade,
}

impl GradeBand {
    pub const fn new(min: f64, grade: Grade) -> Self {
        Self { min, grade }
    }
}

/// 出勤 / 成绩相关策略
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcademicPolicy {
    /// 出勤率低于该值即为缺勤预警学生
    pub defaulter_threshold: f64,
    /// 出勤率低于该值（且不低于 0）为严重
    pub warning_threshold: f64,
    /// 计入出勤的状态
    pub attended_statuses: Vec<AttendanceStatus>,
    pub grade_bands: Vec<GradeBand>,
}

impl Default for AcademicPolicy {
    fn default() -> Self {
        Self {
            defaulter_threshold: 75.0,
            warning_threshold: 65.0,
            attended_statuses: vec![AttendanceStatus::Present, AttendanceStatus::Late],
            grade_bands: vec![
                GradeBand::new(90.0, Grade::APlus),
                GradeBand::new(80.0, Grade::A),
                GradeBand::new(70.0, Grade::BPlus),
                GradeBand::new(60.0, Grade::B),
                GradeBand::new(50.0, Grade::CPlus),
                GradeBand::new(40.0, Grade::C),
            ],
        }
    }
}

impl AcademicPolicy {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("defaulter_threshold", self.defaulter_threshold),
            ("warning_threshold", self.warning_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(PortalError::validation(format!(
                    "{name} must be within 0..=100, got {value}"
                )));
            }
        }
        if self.warning_threshold > self.defaulter_threshold {
            return Err(PortalError::validation(
                "warning_threshold must not exceed defaulter_threshold",
            ));
        }
        if self.attended_statuses.is_empty() {
            return Err(PortalError::validation(
                "attended_statuses must name at least one status",
            ));
        }
        if let Some(band) = self.grade_bands.iter().find(|b| !b.min.is_finite()) {
            return Err(PortalError::validation(format!(
                "grade band {} has a non-finite minimum",
                band.grade
            )));
        }
        Ok(())
    }

    pub fn is_attended(&self, status: AttendanceStatus) -> bool {
        self.attended_statuses.contains(&status)
    }

    /// 取最低分数线不超过 `percentage` 的最高分段；NaN 与低于全部分段的值为 F
    pub fn grade_for(&self, percentage: f64) -> Grade {
        if percentage.is_nan() {
            return Grade::F;
        }
        self.grade_bands
            .iter()
            .filter(|band| percentage >= band.min)
            .max_by(|a, b| a.min.total_cmp(&b.min))
            .map(|band| band.grade)
            .unwrap_or(Grade::F)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_band_boundaries() {
        let policy = AcademicPolicy::default();
        assert_eq!(policy.grade_for(100.0), Grade::APlus);
        assert_eq!(policy.grade_for(90.0), Grade::APlus);
        assert_eq!(policy.grade_for(89.0), Grade::A);
        assert_eq!(policy.grade_for(89.99), Grade::A);
        assert_eq!(policy.grade_for(80.0), Grade::A);
        assert_eq!(policy.grade_for(79.0), Grade::BPlus);
        assert_eq!(policy.grade_for(70.0), Grade::BPlus);
        assert_eq!(policy.grade_for(60.0), Grade::B);
        assert_eq!(policy.grade_for(50.0), Grade::CPlus);
        assert_eq!(policy.grade_for(40.0), Grade::C);
        assert_eq!(policy.grade_for(39.9), Grade::F);
        assert_eq!(policy.grade_for(0.0), Grade::F);
    }

    #[test]
    fn test_out_of_range_inputs_degrade() {
        let policy = AcademicPolicy::default();
        assert_eq!(policy.grade_for(250.0), Grade::APlus);
        assert_eq!(policy.grade_for(f64::INFINITY), Grade::APlus);
        assert_eq!(policy.grade_for(-3.0), Grade::F);
        assert_eq!(policy.grade_for(f64::NEG_INFINITY), Grade::F);
        assert_eq!(policy.grade_for(f64::NAN), Grade::F);
    }

    #[test]
    fn test_grade_is_monotone() {
        let policy = AcademicPolicy::default();
        let mut previous = policy.grade_for(100.0);
        let mut p = 100.0;
        while p >= 0.0 {
            let current = policy.grade_for(p);
            assert!(
                current.rank() >= previous.rank(),
                "grade improved from {previous} to {current} at {p}"
            );
            previous = current;
            p -= 0.25;
        }
    }

    #[test]
    fn test_band_order_does_not_matter() {
        let mut policy = AcademicPolicy::default();
        policy.grade_bands.reverse();
        assert_eq!(policy.grade_for(95.0), Grade::APlus);
        assert_eq!(policy.grade_for(45.0), Grade::C);
    }

    #[test]
    fn test_validate() {
        assert!(AcademicPolicy::default().validate().is_ok());

        let mut policy = AcademicPolicy::default();
        policy.warning_threshold = 90.0;
        assert!(policy.validate().is_err());

        let mut policy = AcademicPolicy::default();
        policy.attended_statuses.clear();
        assert!(policy.validate().is_err());

        let mut policy = AcademicPolicy::default();
        policy.grade_bands.push(GradeBand::new(f64::NAN, Grade::B));
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_grade_wire_names() {
        let grades: Vec<Grade> =
            serde_json::from_str(r#"["A+","A","B+","B","C+","C","F"]"#).expect("grades parse");
        assert_eq!(grades, Grade::all());
    }
}
