use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::attendance::entities::SubjectRef;
use crate::models::users::entities::{UserNamePrn, UserProfile};

/// 嵌入投影：班级名称
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRef {
    pub class_name: String,
}

// 教师授课分配（subject_assignments 表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectAssignment {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub class_id: Uuid,
    #[serde(default)]
    pub teacher_id: Option<Uuid>,
    #[serde(default)]
    pub subject: Option<SubjectRef>,
    #[serde(default)]
    pub class: Option<ClassRef>,
}

// 学生选课/入班记录（student_enrollments 表），嵌入完整学生资料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentEnrollment {
    pub class_id: Uuid,
    #[serde(default)]
    pub student: Option<UserProfile>,
}

// 班级成员投影，只含姓名与学号
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMember {
    pub student_id: Uuid,
    #[serde(default)]
    pub student: Option<UserNamePrn>,
}

/// 教师名下的学生（去重后）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterStudent {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub class_name: Option<String>,
    pub subjects: Vec<String>,
}
