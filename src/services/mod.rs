//! 领域服务
//!
//! 每个服务持有共享的 [`RemoteStore`](crate::storage::RemoteStore)，
//! 每次调用都显式接收 [`RequestContext`](crate::auth::RequestContext)，不做缓存。

pub mod analytics;
pub mod attendance;
pub mod fetch;
pub mod marks;
pub mod mutations;
pub mod notifications;
pub mod realtime;
pub mod resource;
pub mod roster;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

pub use analytics::AnalyticsService;
pub use attendance::AttendanceService;
pub use fetch::{StudentQuery, fetch_as, fetch_rows};
pub use marks::MarksService;
pub use mutations::MutationGateway;
pub use notifications::NotificationService;
pub use realtime::RealtimeService;
pub use resource::{Resource, Settle, Ticket};
pub use roster::RosterService;
pub use users::UserService;
