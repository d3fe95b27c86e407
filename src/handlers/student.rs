// src/handlers/student.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::{AppError, is_unique_violation},
    handlers::{activity::log_activity, notification::notify},
    models::{
        course::{Course, CourseContent, Module, StudyMaterial},
        enrollment::EnrolledCourse,
    },
    utils::jwt::Claims,
};

/// Query parameters for the course catalog.
#[derive(Debug, Deserialize)]
pub struct CourseListParams {
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Lists published courses, optionally filtered by category.
pub async fn list_courses(
    State(pool): State<SqlitePool>,
    Query(params): Query<CourseListParams>,
) -> Result<impl IntoResponse, AppError> {
    // A negative LIMIT means "unlimited" to SQLite, so clamp both ends.
    let limit = params.limit.unwrap_or(20).clamp(0, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let courses = sqlx::query_as::<_, Course>(
        r#"
        SELECT id, instructor_id, title, description, category, published, created_at
        FROM courses
        WHERE published = 1
          AND (? IS NULL OR category = ?)
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(&params.category)
    .bind(&params.category)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "courses": courses })))
}

/// Returns one published course with its modules, contents and materials.
pub async fn get_course(
    State(pool): State<SqlitePool>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = sqlx::query_as::<_, Course>(
        r#"
        SELECT id, instructor_id, title, description, category, published, created_at
        FROM courses
        WHERE id = ? AND published = 1
        "#,
    )
    .bind(course_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Course not found".to_string()))?;

    let modules = sqlx::query_as::<_, Module>(
        r#"
        SELECT id, course_id, title, position, created_at
        FROM modules
        WHERE course_id = ?
        ORDER BY position, id
        "#,
    )
    .bind(course_id)
    .fetch_all(&pool)
    .await?;

    let contents = sqlx::query_as::<_, CourseContent>(
        r#"
        SELECT id, course_id, module_id, title, content_type, url,
               duration_seconds, position, created_at
        FROM course_contents
        WHERE course_id = ?
        ORDER BY position, id
        "#,
    )
    .bind(course_id)
    .fetch_all(&pool)
    .await?;

    let materials = sqlx::query_as::<_, StudyMaterial>(
        r#"
        SELECT id, course_id, instructor_id, title, description, file_url, created_at
        FROM study_materials
        WHERE course_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(course_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "course": course,
        "modules": modules,
        "contents": contents,
        "materials": materials,
    })))
}

/// Enrolls the student in a published course.
///
/// The UNIQUE(student_id, course_id) index guarantees at most one enrollment
/// per pair; a duplicate attempt (including a concurrent one) gets 409.
pub async fn enroll(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id();

    let course = sqlx::query_as::<_, (i64, String)>(
        "SELECT instructor_id, title FROM courses WHERE id = ? AND published = 1",
    )
    .bind(course_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Course not found".to_string()))?;

    let enrollment_id: i64 = sqlx::query_scalar(
        "INSERT INTO enrollments (student_id, course_id) VALUES (?, ?) RETURNING id",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Already enrolled in this course".to_string())
        } else {
            tracing::error!("Failed to enroll: {:?}", e);
            AppError::from(e)
        }
    })?;

    let (instructor_id, course_title) = course;

    log_activity(
        &pool,
        student_id,
        "course_enrolled",
        json!({ "course_id": course_id }),
    )
    .await?;

    notify(
        &pool,
        instructor_id,
        "New enrollment",
        &format!("A student enrolled in '{}'", course_title),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "enrollment_id": enrollment_id })),
    ))
}

/// Lists the student's enrollments with course info and progress.
pub async fn my_courses(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let courses = sqlx::query_as::<_, EnrolledCourse>(
        r#"
        SELECT e.id as enrollment_id, c.id as course_id, c.title, c.category,
               e.status, e.progress_percentage, e.enrolled_at
        FROM enrollments e
        JOIN courses c ON e.course_id = c.id
        WHERE e.student_id = ?
        ORDER BY e.enrolled_at DESC
        "#,
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "courses": courses })))
}
