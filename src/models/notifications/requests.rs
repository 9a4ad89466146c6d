use serde::Serialize;

// 通知只允许修改已读标记
#[derive(Debug, Clone, Serialize)]
pub struct NotificationReadPatch {
    pub is_read: bool,
}
