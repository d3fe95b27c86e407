// src/models/notification.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'notifications' table. Clients poll these on an interval;
/// there is no push channel.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
