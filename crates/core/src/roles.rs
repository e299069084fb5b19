//! Well-known user role names stored in `users.role`.

/// Default role assigned on registration.
pub const ROLE_STUDENT: &str = "student";

/// Teaching staff.
pub const ROLE_TEACHER: &str = "teacher";

/// Administrators may broadcast push notifications to every subscriber.
pub const ROLE_ADMIN: &str = "admin";
