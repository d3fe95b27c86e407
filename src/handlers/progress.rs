// src/handlers/progress.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    handlers::activity::log_activity,
    models::enrollment::{Enrollment, Progress, ProgressEventRequest},
    utils::jwt::Claims,
};

/// Progress percentage for `completed` out of `total` content items.
/// An empty course counts as 0%, not 100%.
pub fn progress_percentage(completed: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (completed as f64 / total as f64) * 100.0
}

/// Marks a content item complete for a student and rolls the result up into
/// the enrollment.
///
/// * Upserts the per-content Progress row to 'completed' (unique per
///   (student, content)).
/// * Adds the item to the enrollment's completed set (insert-or-ignore gives
///   set semantics).
/// * Recomputes `progress_percentage`; at 100% an 'active' enrollment
///   transitions to 'completed'. The transition is monotonic: 'inactive'
///   enrollments are left alone.
pub async fn mark_content_complete(
    pool: &SqlitePool,
    student_id: i64,
    course_id: i64,
    content_id: i64,
) -> Result<f64, AppError> {
    let enrollment = sqlx::query_as::<_, Enrollment>(
        r#"
        SELECT id, student_id, course_id, status, progress_percentage, enrolled_at, completed_at
        FROM enrollments
        WHERE student_id = ? AND course_id = ?
        "#,
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::Forbidden("Not enrolled in this course".to_string()))?;

    // One transaction: the progress row, the completed set and the rolled-up
    // enrollment percentage move together or not at all.
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO progress (student_id, course_id, content_id, status, completed_at)
        VALUES (?, ?, ?, 'completed', CURRENT_TIMESTAMP)
        ON CONFLICT(student_id, content_id) DO UPDATE SET
            status = 'completed',
            completed_at = COALESCE(progress.completed_at, CURRENT_TIMESTAMP),
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(student_id)
    .bind(course_id)
    .bind(content_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT OR IGNORE INTO completed_items (enrollment_id, content_id) VALUES (?, ?)",
    )
    .bind(enrollment.id)
    .bind(content_id)
    .execute(&mut *tx)
    .await?;

    let completed: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM completed_items WHERE enrollment_id = ?")
            .bind(enrollment.id)
            .fetch_one(&mut *tx)
            .await?;

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM course_contents WHERE course_id = ?")
            .bind(course_id)
            .fetch_one(&mut *tx)
            .await?;

    let percentage = progress_percentage(completed, total);

    sqlx::query(
        r#"
        UPDATE enrollments SET
            progress_percentage = ?,
            status = CASE WHEN ? >= 100.0 AND status = 'active' THEN 'completed' ELSE status END,
            completed_at = CASE WHEN ? >= 100.0 AND status = 'active' THEN CURRENT_TIMESTAMP ELSE completed_at END
        WHERE id = ?
        "#,
    )
    .bind(percentage)
    .bind(percentage)
    .bind(percentage)
    .bind(enrollment.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(percentage)
}

/// Records a content interaction event for the authenticated student.
///
/// Accumulates watch time on the per-content Progress row (created as
/// 'started' on first interaction). When the client reports the completion
/// condition met, the item is marked complete and the enrollment updated.
/// Quiz contents are excluded: those complete only through a passed attempt.
pub async fn record_progress_event(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(content_id): Path<i64>,
    Json(payload): Json<ProgressEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id();

    let content = sqlx::query_as::<_, (i64, String)>(
        "SELECT course_id, content_type FROM course_contents WHERE id = ?",
    )
    .bind(content_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Content not found".to_string()))?;

    let (course_id, content_type) = content;

    let enrolled: Option<i64> =
        sqlx::query_scalar("SELECT id FROM enrollments WHERE student_id = ? AND course_id = ?")
            .bind(student_id)
            .bind(course_id)
            .fetch_optional(&pool)
            .await?;
    if enrolled.is_none() {
        return Err(AppError::Forbidden("Not enrolled in this course".to_string()));
    }

    if payload.completed && content_type == "quiz" {
        return Err(AppError::BadRequest(
            "Quiz content is completed by passing the quiz".to_string(),
        ));
    }

    sqlx::query(
        r#"
        INSERT INTO progress (student_id, course_id, content_id, status, watch_time_seconds)
        VALUES (?, ?, ?, 'started', ?)
        ON CONFLICT(student_id, content_id) DO UPDATE SET
            watch_time_seconds = progress.watch_time_seconds + excluded.watch_time_seconds,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(student_id)
    .bind(course_id)
    .bind(content_id)
    .bind(payload.watch_time_seconds.max(0))
    .execute(&pool)
    .await?;

    let mut course_percentage = None;
    if payload.completed {
        course_percentage = Some(mark_content_complete(&pool, student_id, course_id, content_id).await?);
    }

    let progress = sqlx::query_as::<_, Progress>(
        r#"
        SELECT id, student_id, course_id, content_id, status, watch_time_seconds,
               completed_at, updated_at
        FROM progress
        WHERE student_id = ? AND content_id = ?
        "#,
    )
    .bind(student_id)
    .bind(content_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "progress": progress,
        "course_progress_percentage": course_percentage,
    })))
}

/// Resets a student's progress in one course: the explicit re-attempt path.
///
/// Clears the completed-items set, zeroes the percentage, reverts the
/// enrollment to 'active' and deletes the student's Progress rows and
/// QuizAttempt history for that course.
pub async fn reset_course_progress(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id();

    let enrollment_id: i64 =
        sqlx::query_scalar("SELECT id FROM enrollments WHERE student_id = ? AND course_id = ?")
            .bind(student_id)
            .bind(course_id)
            .fetch_optional(&pool)
            .await?
            .ok_or(AppError::NotFound("Enrollment not found".to_string()))?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM completed_items WHERE enrollment_id = ?")
        .bind(enrollment_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM progress WHERE student_id = ? AND course_id = ?")
        .bind(student_id)
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        DELETE FROM quiz_attempts
        WHERE student_id = ?
          AND quiz_id IN (SELECT id FROM quizzes WHERE course_id = ?)
        "#,
    )
    .bind(student_id)
    .bind(course_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE enrollments
        SET progress_percentage = 0, status = 'active', completed_at = NULL
        WHERE id = ?
        "#,
    )
    .bind(enrollment_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    log_activity(
        &pool,
        student_id,
        "course_progress_reset",
        json!({ "course_id": course_id }),
    )
    .await?;

    Ok(Json(json!({ "success": true, "message": "Course progress reset" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage_basic() {
        assert_eq!(progress_percentage(1, 4), 25.0);
        assert_eq!(progress_percentage(4, 4), 100.0);
    }

    #[test]
    fn test_progress_percentage_empty_course() {
        assert_eq!(progress_percentage(0, 0), 0.0);
    }

    #[test]
    fn test_progress_percentage_zero_completed() {
        assert_eq!(progress_percentage(0, 10), 0.0);
    }
}
