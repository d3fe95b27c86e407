// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::{activity::log_activity, notification::notify},
    models::{
        activity::ActivityLog,
        course::Course,
        discussion::DiscussionWithAuthor,
        settings::{Settings, UpdateSettingsRequest},
        user::User,
    },
    utils::jwt::Claims,
};

const USER_COLUMNS: &str =
    "id, name, email, password, role, status, rejection_reason, created_at";

/// Query parameters for the user/instructor listings.
#[derive(Debug, Deserialize)]
pub struct UserListParams {
    pub role: Option<String>,
    pub status: Option<String>,
}

/// Lists users, optionally filtered by role and/or status.
/// Admin only.
pub async fn list_users(
    State(pool): State<SqlitePool>,
    Query(params): Query<UserListParams>,
) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users
        WHERE (? IS NULL OR role = ?)
          AND (? IS NULL OR status = ?)
        ORDER BY id DESC
        "#
    ))
    .bind(&params.role)
    .bind(&params.role)
    .bind(&params.status)
    .bind(&params.status)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(json!({ "success": true, "users": users })))
}

/// Lists instructor accounts, defaulting to the pending approval queue.
/// Admin only.
pub async fn list_instructors(
    State(pool): State<SqlitePool>,
    Query(params): Query<UserListParams>,
) -> Result<impl IntoResponse, AppError> {
    let status = params.status.as_deref().unwrap_or("pending");

    let instructors = sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users
        WHERE role = 'instructor' AND status = ?
        ORDER BY created_at
        "#
    ))
    .bind(status)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "instructors": instructors })))
}

/// Approves a pending instructor, unlocking authoring actions.
/// Admin only.
pub async fn approve_instructor(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET status = 'approved', rejection_reason = NULL
        WHERE id = ? AND role = 'instructor'
        "#,
    )
    .bind(id)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Instructor not found".to_string()));
    }

    log_activity(
        &pool,
        claims.user_id(),
        "instructor_approved",
        json!({ "instructor_id": id }),
    )
    .await?;

    notify(
        &pool,
        id,
        "Account approved",
        "Your instructor account has been approved. You can now create courses.",
    )
    .await?;

    Ok(Json(json!({ "success": true, "message": "Instructor approved" })))
}

/// DTO for rejecting an instructor.
#[derive(Debug, Deserialize, Validate)]
pub struct RejectInstructorRequest {
    #[validate(length(min = 1, max = 1000))]
    pub reason: String,
}

/// Rejects a pending instructor, recording the reason.
///
/// The account keeps its role and can still log in; authoring stays gated by
/// the status check in instructor handlers.
pub async fn reject_instructor(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<RejectInstructorRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let result = sqlx::query(
        r#"
        UPDATE users
        SET status = 'rejected', rejection_reason = ?
        WHERE id = ? AND role = 'instructor'
        "#,
    )
    .bind(&payload.reason)
    .bind(id)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Instructor not found".to_string()));
    }

    log_activity(
        &pool,
        claims.user_id(),
        "instructor_rejected",
        json!({ "instructor_id": id, "reason": payload.reason }),
    )
    .await?;

    notify(&pool, id, "Account rejected", &payload.reason).await?;

    Ok(Json(json!({ "success": true, "message": "Instructor rejected" })))
}

/// DTO for updating a user's status.
#[derive(Debug, Deserialize)]
pub struct UpdateUserStatusRequest {
    pub status: String,
}

/// Sets a user's status ('approved', 'pending', 'rejected' or 'inactive').
/// Admin only.
pub async fn update_user_status(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    match payload.status.as_str() {
        "approved" | "pending" | "rejected" | "inactive" => {}
        _ => return Err(AppError::BadRequest("Invalid status".to_string())),
    }

    let result = sqlx::query("UPDATE users SET status = ? WHERE id = ?")
        .bind(&payload.status)
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(Json(json!({ "success": true, "message": "User status updated" })))
}

/// Deletes a user by ID.
/// Admin only. Prevents deleting self.
pub async fn delete_user(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if id == claims.user_id() {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete user: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Lists all courses (published and drafts).
/// Admin only.
pub async fn list_courses(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let courses = sqlx::query_as::<_, Course>(
        r#"
        SELECT id, instructor_id, title, description, category, published, created_at
        FROM courses
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "courses": courses })))
}

/// Deletes any course.
/// Admin only.
pub async fn delete_course(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Course not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Platform-wide counters for the admin dashboard. Clients poll this on an
/// interval.
pub async fn platform_analytics(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let totals = sqlx::query_as::<_, (i64, i64, i64, i64)>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users) as users,
            (SELECT COUNT(*) FROM courses) as courses,
            (SELECT COUNT(*) FROM enrollments) as enrollments,
            (SELECT COUNT(*) FROM quiz_attempts) as quiz_attempts
        "#,
    )
    .fetch_one(&pool)
    .await?;

    let by_role = sqlx::query_as::<_, (String, i64)>(
        "SELECT role, COUNT(*) FROM users GROUP BY role",
    )
    .fetch_all(&pool)
    .await?;

    let recent_activity = sqlx::query_as::<_, ActivityLog>(
        r#"
        SELECT id, user_id, action, detail, created_at
        FROM activity_logs
        ORDER BY id DESC
        LIMIT 20
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "analytics": {
            "users": totals.0,
            "courses": totals.1,
            "enrollments": totals.2,
            "quiz_attempts": totals.3,
            "users_by_role": by_role
                .into_iter()
                .map(|(role, count)| json!({ "role": role, "count": count }))
                .collect::<Vec<_>>(),
            "recent_activity": recent_activity,
        },
    })))
}

/// Returns the platform settings row.
/// Admin only.
pub async fn get_settings(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let settings = sqlx::query_as::<_, Settings>(
        "SELECT id, site_name, allow_signup, maintenance_mode, updated_at FROM settings WHERE id = 1",
    )
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "settings": settings })))
}

/// Updates the platform settings row.
/// Admin only.
pub async fn update_settings(
    State(pool): State<SqlitePool>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if let Some(site_name) = payload.site_name {
        sqlx::query("UPDATE settings SET site_name = ?, updated_at = CURRENT_TIMESTAMP WHERE id = 1")
            .bind(site_name)
            .execute(&pool)
            .await?;
    }

    if let Some(allow_signup) = payload.allow_signup {
        sqlx::query("UPDATE settings SET allow_signup = ?, updated_at = CURRENT_TIMESTAMP WHERE id = 1")
            .bind(allow_signup)
            .execute(&pool)
            .await?;
    }

    if let Some(maintenance_mode) = payload.maintenance_mode {
        sqlx::query("UPDATE settings SET maintenance_mode = ?, updated_at = CURRENT_TIMESTAMP WHERE id = 1")
            .bind(maintenance_mode)
            .execute(&pool)
            .await?;
    }

    Ok(Json(json!({ "success": true, "message": "Settings updated" })))
}

/// Lists recent discussions across all courses for moderation.
/// Admin only.
pub async fn list_discussions(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let discussions = sqlx::query_as::<_, DiscussionWithAuthor>(
        r#"
        SELECT d.id, d.course_id, d.author_id, u.name as author_name, d.title, d.content,
               (SELECT COUNT(*) FROM discussion_replies r WHERE r.discussion_id = d.id) as reply_count,
               d.created_at
        FROM discussions d
        JOIN users u ON d.author_id = u.id
        WHERE d.deleted_at IS NULL
        ORDER BY d.created_at DESC
        LIMIT 100
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "discussions": discussions })))
}

/// Soft-deletes a discussion thread.
/// Admin only.
pub async fn delete_discussion(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query(
        "UPDATE discussions SET deleted_at = CURRENT_TIMESTAMP WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(id)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Discussion not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
