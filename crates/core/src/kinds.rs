//! Well-known notification type tags.
//!
//! These values are stored in the `notifications.notification_type` column
//! and forwarded to push clients as the payload's `type` field.

/// Reminder that a lesson from the user's schedule is about to start.
pub const KIND_LESSON: &str = "lesson";

/// Manually triggered test notification.
pub const KIND_TEST: &str = "test";

/// Administrative broadcast.
pub const KIND_BROADCAST: &str = "broadcast";
