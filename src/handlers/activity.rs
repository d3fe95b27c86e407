// src/handlers/activity.rs

use sqlx::SqlitePool;

use crate::error::AppError;

/// Appends one row to the activity audit trail.
///
/// Logging failures are reported to the caller; callers that treat the log as
/// best-effort can ignore the result explicitly.
pub async fn log_activity(
    pool: &SqlitePool,
    user_id: i64,
    action: &str,
    detail: serde_json::Value,
) -> Result<(), AppError> {
    sqlx::query("INSERT INTO activity_logs (user_id, action, detail) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(action)
        .bind(detail.to_string())
        .execute(pool)
        .await?;

    Ok(())
}
