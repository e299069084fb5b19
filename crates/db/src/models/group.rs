//! Academic group entity.

use campus_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `groups` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Group {
    pub id: DbId,
    pub name: String,
    pub course: Option<i32>,
    pub faculty: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for creating a group.
#[derive(Debug, Deserialize)]
pub struct CreateGroup {
    pub name: String,
    pub course: Option<i32>,
    pub faculty: Option<String>,
}
