//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` (or a connection, when the caller owns the
//! transaction) as the first argument.

pub mod group_repo;
pub mod notification_repo;
pub mod push_subscription_repo;
pub mod schedule_repo;
pub mod user_repo;

pub use group_repo::GroupRepo;
pub use notification_repo::NotificationRepo;
pub use push_subscription_repo::PushSubscriptionRepo;
pub use schedule_repo::ScheduleRepo;
pub use user_repo::UserRepo;
