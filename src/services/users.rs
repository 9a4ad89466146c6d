use std::sync::Arc;
use uuid::Uuid;

use super::fetch::select_as;
use crate::auth::RequestContext;
use crate::errors::Result;
use crate::models::Envelope;
use crate::models::users::entities::UserProfile;
use crate::storage::{Query, RemoteStore};

pub const USER_PROFILES: &str = "user_profiles";

/// 按 ID 读取用户资料；无数据（空结果或 PGRST116）返回 `None`
pub async fn load_profile(
    store: &dyn RemoteStore,
    ctx: &RequestContext,
    user_id: Uuid,
) -> Result<Option<UserProfile>> {
    let query = Query::new().eq("id", user_id.to_string()).limit(1);
    match select_as::<UserProfile>(store, ctx, USER_PROFILES, &query).await {
        Ok(mut rows) => Ok(rows.pop()),
        Err(e) if e.is_no_rows() => Ok(None),
        Err(e) => Err(e),
    }
}

pub struct UserService {
    store: Arc<dyn RemoteStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    // 查询用户资料
    pub async fn get_profile(&self, ctx: &RequestContext, user_id: Uuid) -> Envelope<UserProfile> {
        if ctx.user.is_none() {
            return Envelope::none();
        }
        match load_profile(self.store.as_ref(), ctx, user_id).await {
            Ok(Some(profile)) => Envelope::success(profile),
            Ok(None) => Envelope::none(),
            Err(e) => Envelope::from_error("fetching user profile", &e),
        }
    }
}
