use serde_json::{Value, json};
use uuid::Uuid;

use crate::auth::{AuthUser, RequestContext};
use crate::models::users::entities::{UserProfile, UserRole};

pub(crate) fn profile(id: Uuid, full_name: &str, role: UserRole) -> UserProfile {
    UserProfile {
        id,
        email: format!("{}@college.edu", full_name.to_lowercase().replace(' ', ".")),
        full_name: full_name.to_string(),
        role,
        prn: None,
        department: Some("ECE".to_string()),
        avatar_url: None,
        created_at: None,
        updated_at: None,
    }
}

pub(crate) fn profile_row(id: Uuid, full_name: &str, role: UserRole) -> Value {
    serde_json::to_value(profile(id, full_name, role)).unwrap_or_else(|_| json!({}))
}

pub(crate) fn context_for(id: Uuid, role: UserRole) -> RequestContext {
    RequestContext::new(
        AuthUser { id, email: None },
        Some(profile(id, role.as_str(), role)),
        Some("token".to_string()),
    )
}

pub(crate) fn context_as(role: UserRole) -> RequestContext {
    context_for(Uuid::new_v4(), role)
}
