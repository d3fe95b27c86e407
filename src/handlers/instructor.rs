// src/handlers/instructor.rs

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
    models::course::{
        Course, CourseContent, CreateContentRequest, CreateCourseRequest, CreateMaterialRequest,
        CreateModuleRequest, Module, StudyMaterial, UpdateContentRequest, UpdateCourseRequest,
        UpdateMaterialRequest, UpdateModuleRequest,
    },
    models::quiz::{CreateQuizRequest, Question, Quiz, UpdateQuizRequest},
    utils::jwt::Claims,
};

/// Application-level approval gate.
///
/// The JWT and the role middleware let any instructor through; accounts that
/// are still 'pending' (or were 'rejected') are stopped here before any
/// authoring action.
async fn ensure_approved(pool: &SqlitePool, claims: &Claims) -> Result<(), AppError> {
    let status: Option<String> = sqlx::query_scalar("SELECT status FROM users WHERE id = ?")
        .bind(claims.user_id())
        .fetch_optional(pool)
        .await?;

    match status.as_deref() {
        Some("approved") => Ok(()),
        Some(_) => Err(AppError::Forbidden(
            "Instructor account is not approved".to_string(),
        )),
        None => Err(AppError::NotFound("User not found".to_string())),
    }
}

/// Resolves a course owned by the calling instructor, or 404.
async fn owned_course(pool: &SqlitePool, claims: &Claims, course_id: i64) -> Result<Course, AppError> {
    sqlx::query_as::<_, Course>(
        r#"
        SELECT id, instructor_id, title, description, category, published, created_at
        FROM courses
        WHERE id = ? AND instructor_id = ?
        "#,
    )
    .bind(course_id)
    .bind(claims.user_id())
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Course not found".to_string()))
}

/// Lists the instructor's own courses (drafts included).
pub async fn list_courses(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let courses = sqlx::query_as::<_, Course>(
        r#"
        SELECT id, instructor_id, title, description, category, published, created_at
        FROM courses
        WHERE instructor_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "courses": courses })))
}

/// Creates a course (unpublished draft).
/// Requires an approved instructor account.
pub async fn create_course(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    ensure_approved(&pool, &claims).await?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO courses (instructor_id, title, description, category)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(claims.user_id())
    .bind(&payload.title)
    .bind(payload.description.as_deref().unwrap_or(""))
    .bind(payload.category.as_deref().unwrap_or("general"))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create course: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "id": id }))))
}

/// Updates a course (title, description, category, published flag).
pub async fn update_course(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
    Json(payload): Json<UpdateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    ensure_approved(&pool, &claims).await?;
    owned_course(&pool, &claims, course_id).await?;

    if let Some(title) = payload.title {
        sqlx::query("UPDATE courses SET title = ? WHERE id = ?")
            .bind(title)
            .bind(course_id)
            .execute(&pool)
            .await?;
    }

    if let Some(description) = payload.description {
        sqlx::query("UPDATE courses SET description = ? WHERE id = ?")
            .bind(description)
            .bind(course_id)
            .execute(&pool)
            .await?;
    }

    if let Some(category) = payload.category {
        sqlx::query("UPDATE courses SET category = ? WHERE id = ?")
            .bind(category)
            .bind(course_id)
            .execute(&pool)
            .await?;
    }

    if let Some(published) = payload.published {
        sqlx::query("UPDATE courses SET published = ? WHERE id = ?")
            .bind(published)
            .bind(course_id)
            .execute(&pool)
            .await?;
    }

    Ok(Json(json!({ "success": true, "message": "Course updated" })))
}

/// Deletes a course and, via cascades, its modules, contents, quizzes,
/// enrollments and progress.
pub async fn delete_course(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_approved(&pool, &claims).await?;
    owned_course(&pool, &claims, course_id).await?;

    sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(course_id)
        .execute(&pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Adds a module to one of the instructor's courses.
pub async fn create_module(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateModuleRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    ensure_approved(&pool, &claims).await?;
    owned_course(&pool, &claims, payload.course_id).await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO modules (course_id, title, position) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(payload.course_id)
    .bind(&payload.title)
    .bind(payload.position.unwrap_or(0))
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "id": id }))))
}

/// Lists the modules of one owned course.
pub async fn list_modules(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    owned_course(&pool, &claims, course_id).await?;

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

    Ok(Json(json!({ "success": true, "modules": modules })))
}

/// Updates a module of an owned course (title, position).
pub async fn update_module(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(module_id): Path<i64>,
    Json(payload): Json<UpdateModuleRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    ensure_approved(&pool, &claims).await?;

    let owned: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT m.id
        FROM modules m
        JOIN courses c ON m.course_id = c.id
        WHERE m.id = ? AND c.instructor_id = ?
        "#,
    )
    .bind(module_id)
    .bind(claims.user_id())
    .fetch_optional(&pool)
    .await?;
    if owned.is_none() {
        return Err(AppError::NotFound("Module not found".to_string()));
    }

    if let Some(title) = payload.title {
        sqlx::query("UPDATE modules SET title = ? WHERE id = ?")
            .bind(title)
            .bind(module_id)
            .execute(&pool)
            .await?;
    }

    if let Some(position) = payload.position {
        sqlx::query("UPDATE modules SET position = ? WHERE id = ?")
            .bind(position)
            .bind(module_id)
            .execute(&pool)
            .await?;
    }

    Ok(Json(json!({ "success": true, "message": "Module updated" })))
}

/// Deletes a module of an owned course.
pub async fn delete_module(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(module_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_approved(&pool, &claims).await?;

    let result = sqlx::query(
        r#"
        DELETE FROM modules
        WHERE id = ?
          AND course_id IN (SELECT id FROM courses WHERE instructor_id = ?)
        "#,
    )
    .bind(module_id)
    .bind(claims.user_id())
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Module not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Adds a content item to a module of an owned course.
pub async fn create_content(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateContentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    ensure_approved(&pool, &claims).await?;

    let course_id: i64 = sqlx::query_scalar(
        r#"
        SELECT m.course_id
        FROM modules m
        JOIN courses c ON m.course_id = c.id
        WHERE m.id = ? AND c.instructor_id = ?
        "#,
    )
    .bind(payload.module_id)
    .bind(claims.user_id())
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Module not found".to_string()))?;

    let content = sqlx::query_as::<_, CourseContent>(
        r#"
        INSERT INTO course_contents
            (course_id, module_id, title, content_type, url, duration_seconds, position)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id, course_id, module_id, title, content_type, url,
                  duration_seconds, position, created_at
        "#,
    )
    .bind(course_id)
    .bind(payload.module_id)
    .bind(&payload.title)
    .bind(&payload.content_type)
    .bind(&payload.url)
    .bind(payload.duration_seconds.unwrap_or(0))
    .bind(payload.position.unwrap_or(0))
    .fetch_one(&pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "content": content })),
    ))
}

/// Updates a content item of an owned course. The content type is fixed at
/// creation; changing a 'quiz' slot to 'video' would orphan the bound quiz.
pub async fn update_content(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(content_id): Path<i64>,
    Json(payload): Json<UpdateContentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    ensure_approved(&pool, &claims).await?;

    let owned: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT id FROM course_contents
        WHERE id = ? AND course_id IN (SELECT id FROM courses WHERE instructor_id = ?)
        "#,
    )
    .bind(content_id)
    .bind(claims.user_id())
    .fetch_optional(&pool)
    .await?;
    if owned.is_none() {
        return Err(AppError::NotFound("Content not found".to_string()));
    }

    if let Some(title) = payload.title {
        sqlx::query("UPDATE course_contents SET title = ? WHERE id = ?")
            .bind(title)
            .bind(content_id)
            .execute(&pool)
            .await?;
    }

    if let Some(url) = payload.url {
        sqlx::query("UPDATE course_contents SET url = ? WHERE id = ?")
            .bind(url)
            .bind(content_id)
            .execute(&pool)
            .await?;
    }

    if let Some(duration_seconds) = payload.duration_seconds {
        sqlx::query("UPDATE course_contents SET duration_seconds = ? WHERE id = ?")
            .bind(duration_seconds)
            .bind(content_id)
            .execute(&pool)
            .await?;
    }

    if let Some(position) = payload.position {
        sqlx::query("UPDATE course_contents SET position = ? WHERE id = ?")
            .bind(position)
            .bind(content_id)
            .execute(&pool)
            .await?;
    }

    Ok(Json(json!({ "success": true, "message": "Content updated" })))
}

/// Deletes a content item of an owned course.
pub async fn delete_content(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(content_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_approved(&pool, &claims).await?;

    let result = sqlx::query(
        r#"
        DELETE FROM course_contents
        WHERE id = ?
          AND course_id IN (SELECT id FROM courses WHERE instructor_id = ?)
        "#,
    )
    .bind(content_id)
    .bind(claims.user_id())
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Content not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Creates a quiz with its questions in one request.
///
/// The quiz may be bound to a 'quiz' content item of the same course, which
/// makes a passing attempt count toward course progress.
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    ensure_approved(&pool, &claims).await?;
    owned_course(&pool, &claims, payload.course_id).await?;

    if payload.questions.is_empty() {
        return Err(AppError::BadRequest("A quiz needs at least one question".to_string()));
    }

    if let Some(content_id) = payload.content_id {
        let content_type: Option<String> = sqlx::query_scalar(
            "SELECT content_type FROM course_contents WHERE id = ? AND course_id = ?",
        )
        .bind(content_id)
        .bind(payload.course_id)
        .fetch_optional(&pool)
        .await?;

        match content_type.as_deref() {
            Some("quiz") => {}
            Some(_) => {
                return Err(AppError::BadRequest(
                    "Bound content item must have type 'quiz'".to_string(),
                ));
            }
            None => return Err(AppError::NotFound("Content not found".to_string())),
        }
    }

    let mut tx = pool.begin().await?;

    let quiz_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO quizzes
            (course_id, module_id, content_id, instructor_id, title,
             passing_percentage, retake_policy, max_retakes, time_limit_minutes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(payload.course_id)
    .bind(payload.module_id)
    .bind(payload.content_id)
    .bind(claims.user_id())
    .bind(&payload.title)
    .bind(payload.passing_percentage.unwrap_or(crate::config::DEFAULT_PASSING_PERCENTAGE))
    .bind(payload.retake_policy.as_deref().unwrap_or("unlimited"))
    .bind(payload.max_retakes.unwrap_or(0))
    .bind(payload.time_limit_minutes)
    .fetch_one(&mut *tx)
    .await?;

    for (position, question) in payload.questions.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO questions (quiz_id, question_type, text, options, points, explanation, position)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(quiz_id)
        .bind(&question.question_type)
        .bind(&question.text)
        .bind(serde_json::to_string(&question.options)?)
        .bind(question.points)
        .bind(&question.explanation)
        .bind(position as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "id": quiz_id })),
    ))
}

/// Lists the quizzes of one owned course, with full questions (correctness
/// flags included; this is the authoring view).
pub async fn list_quizzes(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    owned_course(&pool, &claims, course_id).await?;

    let quizzes = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, course_id, module_id, content_id, instructor_id, title,
               passing_percentage, retake_policy, max_retakes, time_limit_minutes, created_at
        FROM quizzes
        WHERE course_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(course_id)
    .fetch_all(&pool)
    .await?;

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT q.id, q.quiz_id, q.question_type, q.text, q.options, q.points,
               q.explanation, q.position
        FROM questions q
        JOIN quizzes z ON q.quiz_id = z.id
        WHERE z.course_id = ?
        ORDER BY q.quiz_id, q.position, q.id
        "#,
    )
    .bind(course_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "quizzes": quizzes,
        "questions": questions,
    })))
}

/// Updates a quiz's settings (title, passing threshold, retake policy).
/// Applies to future attempts only; recorded attempts keep their verdict.
pub async fn update_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    ensure_approved(&pool, &claims).await?;

    let owned: Option<i64> =
        sqlx::query_scalar("SELECT id FROM quizzes WHERE id = ? AND instructor_id = ?")
            .bind(quiz_id)
            .bind(claims.user_id())
            .fetch_optional(&pool)
            .await?;
    if owned.is_none() {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    if let Some(title) = payload.title {
        sqlx::query("UPDATE quizzes SET title = ? WHERE id = ?")
            .bind(title)
            .bind(quiz_id)
            .execute(&pool)
            .await?;
    }

    if let Some(passing_percentage) = payload.passing_percentage {
        sqlx::query("UPDATE quizzes SET passing_percentage = ? WHERE id = ?")
            .bind(passing_percentage)
            .bind(quiz_id)
            .execute(&pool)
            .await?;
    }

    if let Some(retake_policy) = payload.retake_policy {
        sqlx::query("UPDATE quizzes SET retake_policy = ? WHERE id = ?")
            .bind(retake_policy)
            .bind(quiz_id)
            .execute(&pool)
            .await?;
    }

    if let Some(max_retakes) = payload.max_retakes {
        sqlx::query("UPDATE quizzes SET max_retakes = ? WHERE id = ?")
            .bind(max_retakes)
            .bind(quiz_id)
            .execute(&pool)
            .await?;
    }

    if let Some(time_limit_minutes) = payload.time_limit_minutes {
        sqlx::query("UPDATE quizzes SET time_limit_minutes = ? WHERE id = ?")
            .bind(time_limit_minutes)
            .bind(quiz_id)
            .execute(&pool)
            .await?;
    }

    Ok(Json(json!({ "success": true, "message": "Quiz updated" })))
}

/// Deletes a quiz (and its questions/attempts via cascades).
pub async fn delete_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_approved(&pool, &claims).await?;

    let result = sqlx::query("DELETE FROM quizzes WHERE id = ? AND instructor_id = ?")
        .bind(quiz_id)
        .bind(claims.user_id())
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Attaches a study material to an owned course.
pub async fn create_material(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateMaterialRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    ensure_approved(&pool, &claims).await?;
    owned_course(&pool, &claims, payload.course_id).await?;

    let material = sqlx::query_as::<_, StudyMaterial>(
        r#"
        INSERT INTO study_materials (course_id, instructor_id, title, description, file_url)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, course_id, instructor_id, title, description, file_url, created_at
        "#,
    )
    .bind(payload.course_id)
    .bind(claims.user_id())
    .bind(&payload.title)
    .bind(payload.description.as_deref().unwrap_or(""))
    .bind(&payload.file_url)
    .fetch_one(&pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "material": material })),
    ))
}

/// Updates a study material of an owned course.
pub async fn update_material(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(material_id): Path<i64>,
    Json(payload): Json<UpdateMaterialRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    ensure_approved(&pool, &claims).await?;

    let owned: Option<i64> =
        sqlx::query_scalar("SELECT id FROM study_materials WHERE id = ? AND instructor_id = ?")
            .bind(material_id)
            .bind(claims.user_id())
            .fetch_optional(&pool)
            .await?;
    if owned.is_none() {
        return Err(AppError::NotFound("Material not found".to_string()));
    }

    if let Some(title) = payload.title {
        sqlx::query("UPDATE study_materials SET title = ? WHERE id = ?")
            .bind(title)
            .bind(material_id)
            .execute(&pool)
            .await?;
    }

    if let Some(description) = payload.description {
        sqlx::query("UPDATE study_materials SET description = ? WHERE id = ?")
            .bind(description)
            .bind(material_id)
            .execute(&pool)
            .await?;
    }

    if let Some(file_url) = payload.file_url {
        sqlx::query("UPDATE study_materials SET file_url = ? WHERE id = ?")
            .bind(file_url)
            .bind(material_id)
            .execute(&pool)
            .await?;
    }

    Ok(Json(json!({ "success": true, "message": "Material updated" })))
}

/// Deletes a study material of an owned course.
pub async fn delete_material(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(material_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_approved(&pool, &claims).await?;

    let result = sqlx::query("DELETE FROM study_materials WHERE id = ? AND instructor_id = ?")
        .bind(material_id)
        .bind(claims.user_id())
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Material not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Per-course analytics for the instructor: enrollment count, average
/// progress and average quiz score.
pub async fn course_analytics(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    owned_course(&pool, &claims, course_id).await?;

    let stats = sqlx::query_as::<_, (i64, Option<f64>, i64)>(
        r#"
        SELECT COUNT(*) as enrollments,
               AVG(progress_percentage) as avg_progress,
               COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0) as completed
        FROM enrollments
        WHERE course_id = ?
        "#,
    )
    .bind(course_id)
    .fetch_one(&pool)
    .await?;

    let quiz_stats = sqlx::query_as::<_, (i64, Option<f64>, Option<f64>)>(
        r#"
        SELECT COUNT(*) as attempts,
               AVG(a.score) as avg_score,
               AVG(CASE WHEN a.passed THEN 1.0 ELSE 0.0 END) as pass_rate
        FROM quiz_attempts a
        JOIN quizzes q ON a.quiz_id = q.id
        WHERE q.course_id = ?
        "#,
    )
    .bind(course_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "analytics": {
            "enrollments": stats.0,
            "average_progress": stats.1.unwrap_or(0.0),
            "completed_enrollments": stats.2,
            "quiz_attempts": quiz_stats.0,
            "average_quiz_score": quiz_stats.1.unwrap_or(0.0),
            "quiz_pass_rate": quiz_stats.2.unwrap_or(0.0),
        },
    })))
}
