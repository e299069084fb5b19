//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for inserts where the application creates rows

pub mod group;
pub mod notification;
pub mod push_subscription;
pub mod schedule;
pub mod user;
