// src/models/activity.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'activity_logs' table: append-only audit trail of user
/// actions (quiz submissions, enrollments, approvals).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: i64,
    pub user_id: i64,
    pub action: String,
    pub detail: Option<sqlx::types::Json<serde_json::Value>>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
