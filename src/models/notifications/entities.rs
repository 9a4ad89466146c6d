use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::users::entities::UserNameRole;

// 通知（notifications 表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub category: String,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub created_by_user: Option<UserNameRole>,
}
