// src/handlers/discussion.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::notification::notify,
    models::discussion::{
        CreateDiscussionRequest, CreateReplyRequest, DiscussionReply, DiscussionWithAuthor,
    },
    utils::{html::clean_html, jwt::Claims},
};

async fn ensure_course_member(
    pool: &SqlitePool,
    claims: &Claims,
    course_id: i64,
) -> Result<(), AppError> {
    let allowed: Option<i64> = match claims.role.as_str() {
        "student" => {
            sqlx::query_scalar("SELECT id FROM enrollments WHERE student_id = ? AND course_id = ?")
                .bind(claims.user_id())
                .bind(course_id)
                .fetch_optional(pool)
                .await?
        }
        "instructor" => {
            sqlx::query_scalar("SELECT id FROM courses WHERE id = ? AND instructor_id = ?")
                .bind(course_id)
                .bind(claims.user_id())
                .fetch_optional(pool)
                .await?
        }
        // Admins moderate everywhere.
        _ => Some(0),
    };

    match allowed {
        Some(_) => Ok(()),
        None => Err(AppError::Forbidden(
            "Not a member of this course".to_string(),
        )),
    }
}

/// Lists a course's discussion threads with author names and reply counts.
/// Soft-deleted threads are hidden.
pub async fn list_discussions(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_course_member(&pool, &claims, course_id).await?;

    let discussions = sqlx::query_as::<_, DiscussionWithAuthor>(
        r#"
        SELECT d.id, d.course_id, d.author_id, u.name as author_name, d.title, d.content,
               (SELECT COUNT(*) FROM discussion_replies r WHERE r.discussion_id = d.id) as reply_count,
               d.created_at
        FROM discussions d
        JOIN users u ON d.author_id = u.id
        WHERE d.course_id = ? AND d.deleted_at IS NULL
        ORDER BY d.created_at DESC
        "#,
    )
    .bind(course_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "discussions": discussions })))
}

/// Opens a discussion thread in a course the caller belongs to.
/// Content is sanitized before storage.
pub async fn create_discussion(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateDiscussionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    ensure_course_member(&pool, &claims, payload.course_id).await?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO discussions (course_id, author_id, title, content)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(payload.course_id)
    .bind(claims.user_id())
    .bind(&payload.title)
    .bind(clean_html(&payload.content))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create discussion: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "id": id }))))
}

/// Replies to a discussion thread; the thread author is notified.
pub async fn create_reply(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(discussion_id): Path<i64>,
    Json(payload): Json<CreateReplyRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let thread = sqlx::query_as::<_, (i64, i64, String)>(
        "SELECT course_id, author_id, title FROM discussions WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(discussion_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Discussion not found".to_string()))?;

    let (course_id, author_id, title) = thread;
    ensure_course_member(&pool, &claims, course_id).await?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO discussion_replies (discussion_id, author_id, content)
        VALUES (?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(discussion_id)
    .bind(claims.user_id())
    .bind(clean_html(&payload.content))
    .fetch_one(&pool)
    .await?;

    if author_id != claims.user_id() {
        notify(
            &pool,
            author_id,
            "New reply",
            &format!("Someone replied to your discussion '{}'", title),
        )
        .await?;
    }

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "id": id }))))
}

/// Lists the replies of one thread, oldest first.
pub async fn list_replies(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(discussion_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course_id: i64 = sqlx::query_scalar(
        "SELECT course_id FROM discussions WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(discussion_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Discussion not found".to_string()))?;

    ensure_course_member(&pool, &claims, course_id).await?;

    let replies = sqlx::query_as::<_, DiscussionReply>(
        r#"
        SELECT id, discussion_id, author_id, content, created_at
        FROM discussion_replies
        WHERE discussion_id = ?
        ORDER BY created_at, id
        "#,
    )
    .bind(discussion_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "replies": replies })))
}
