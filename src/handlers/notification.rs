// src/handlers/notification.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{error::AppError, models::notification::Notification, utils::jwt::Claims};

/// Inserts a notification for a user. Clients pick these up by polling.
pub async fn notify(
    pool: &SqlitePool,
    user_id: i64,
    title: &str,
    message: &str,
) -> Result<(), AppError> {
    sqlx::query("INSERT INTO notifications (user_id, title, message) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(title)
        .bind(message)
        .execute(pool)
        .await?;

    Ok(())
}

/// Lists the authenticated user's notifications, newest first.
pub async fn list_notifications(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let notifications = sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, user_id, title, message, read, created_at
        FROM notifications
        WHERE user_id = ?
        ORDER BY created_at DESC
        LIMIT 100
        "#,
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "notifications": notifications })))
}

/// Marks one of the user's notifications as read.
pub async fn mark_notification_read(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("UPDATE notifications SET read = 1 WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(claims.user_id())
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }

    Ok(Json(json!({ "success": true })))
}
