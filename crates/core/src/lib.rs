//! Shared domain types and pure logic for the campus backend.
//!
//! Nothing in this crate performs I/O; the database and delivery layers
//! build on top of it.

pub mod cursor;
pub mod error;
pub mod kinds;
pub mod reminders;
pub mod roles;
pub mod schedule;
pub mod types;
