//! User entity model and DTOs.
//!
//! Only the columns the notification subsystem relies on are modeled;
//! profile and credential columns belong to the account service.

use campus_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub group_id: Option<DbId>,
    pub is_active: bool,
    pub created_at: Timestamp,
}

/// DTO for creating a user. `role` defaults to `student` when `None`.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub group_id: Option<DbId>,
    pub is_active: Option<bool>,
}
