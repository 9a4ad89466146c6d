use serde::Serialize;

/// 未读通知数量
#[derive(Debug, Clone, Serialize)]
pub struct UnreadCountResponse {
    pub unread_count: usize,
}

/// 标记全部已读的结果
#[derive(Debug, Clone, Serialize)]
pub struct MarkAllReadResponse {
    pub marked_count: usize,
}
