//! 教师名下学生名单
//!
//! 两阶段查询：先取当前教师的授课分配（嵌入课程与班级），
//! 再并发取每个班级的入班记录（嵌入学生资料），按学生 ID 去重。

use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::fetch::select_as;
use crate::auth::RequestContext;
use crate::errors::Result;
use crate::models::FetchResult;
use crate::models::enrollments::entities::{RosterStudent, StudentEnrollment, SubjectAssignment};
use crate::storage::{Query, RemoteStore};

pub const SUBJECT_ASSIGNMENTS: &str = "subject_assignments";
pub const STUDENT_ENROLLMENTS: &str = "student_enrollments";

const ASSIGNMENT_SELECT: &str =
    "*, subject:subjects(subject_name, subject_code), class:classes(class_name)";
const ENROLLMENT_SELECT: &str =
    "class_id, student:user_profiles!student_enrollments_student_id_fkey(*)";

pub struct RosterService {
    store: Arc<dyn RemoteStore>,
}

impl RosterService {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// 当前教师的学生名单；非教师或未登录返回空列表且不发请求
    pub async fn teacher_roster(&self, ctx: &RequestContext) -> FetchResult<RosterStudent> {
        let Some(teacher_id) = ctx.user_id().filter(|_| ctx.is_teacher()) else {
            debug!("Skipping roster fetch for a non-teacher caller");
            return FetchResult::empty();
        };
        match self.load_roster(ctx, teacher_id).await {
            Ok(roster) => FetchResult::success(roster),
            Err(e) => FetchResult::from_error("teacher roster", &e),
        }
    }

    async fn load_roster(&self, ctx: &RequestContext, teacher_id: Uuid) -> Result<Vec<RosterStudent>> {
        let assignments: Vec<SubjectAssignment> = select_as(
            self.store.as_ref(),
            ctx,
            SUBJECT_ASSIGNMENTS,
            &Query::new()
                .select(ASSIGNMENT_SELECT)
                .eq("teacher_id", teacher_id.to_string()),
        )
        .await?;

        let mut class_ids: Vec<Uuid> = Vec::new();
        for assignment in &assignments {
            if !class_ids.contains(&assignment.class_id) {
                class_ids.push(assignment.class_id);
            }
        }

        let fetches = class_ids.iter().map(|class_id| {
            let query = Query::new()
                .select(ENROLLMENT_SELECT)
                .eq("class_id", class_id.to_string());
            async move {
                select_as::<StudentEnrollment>(self.store.as_ref(), ctx, STUDENT_ENROLLMENTS, &query).await
            }
        });
        let mut by_class: HashMap<Uuid, Vec<StudentEnrollment>> = HashMap::new();
        for (class_id, enrollments) in class_ids.iter().zip(join_all(fetches).await) {
            by_class.insert(*class_id, enrollments?);
        }

        Ok(merge_roster(&assignments, &by_class))
    }
}

/// 按授课分配顺序合并；同一学生只出现一次，班级取第一次出现时的班级
pub fn merge_roster(
    assignments: &[SubjectAssignment],
    enrollments: &HashMap<Uuid, Vec<StudentEnrollment>>,
) -> Vec<RosterStudent> {
    let mut roster: Vec<RosterStudent> = Vec::new();
    let mut seen: HashMap<Uuid, usize> = HashMap::new();

    for assignment in assignments {
        let class_name = assignment.class.as_ref().map(|c| c.class_name.clone());
        let subject_name = assignment.subject.as_ref().map(|s| s.subject_name.clone());
        let students = enrollments
            .get(&assignment.class_id)
            .into_iter()
            .flatten()
            .filter_map(|e| e.student.as_ref());

        for student in students {
            let index = *seen.entry(student.id).or_insert_with(|| {
                roster.push(RosterStudent {
                    profile: student.clone(),
                    class_name: class_name.clone(),
                    subjects: Vec::new(),
                });
                roster.len() - 1
            });
            if let Some(name) = &subject_name
                && !roster[index].subjects.contains(name)
            {
                roster[index].subjects.push(name.clone());
            }
        }
    }
    roster
}
