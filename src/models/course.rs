// src/models/course.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'courses' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub instructor_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub published: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'modules' table: an ordered section of a course.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Module {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub position: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'course_contents' table: one consumable item inside a
/// module ('video', 'document' or 'quiz').
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CourseContent {
    pub id: i64,
    pub course_id: i64,
    pub module_id: i64,
    pub title: String,
    pub content_type: String,
    pub url: Option<String>,
    pub duration_seconds: i64,
    pub position: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'study_materials' table: downloadable extras attached to a
/// course by its instructor.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StudyMaterial {
    pub id: i64,
    pub course_id: i64,
    pub instructor_id: i64,
    pub title: String,
    pub description: String,
    pub file_url: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a course.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
}

/// DTO for updating a course. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub published: Option<bool>,
}

/// DTO for creating a module.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateModuleRequest {
    pub course_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub position: Option<i64>,
}

/// DTO for updating a module. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateModuleRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub position: Option<i64>,
}

fn validate_content_type(content_type: &str) -> Result<(), validator::ValidationError> {
    match content_type {
        "video" | "document" | "quiz" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_content_type")),
    }
}

/// DTO for creating a content item.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateContentRequest {
    pub module_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(custom(function = validate_content_type))]
    pub content_type: String,
    #[validate(length(max = 2000))]
    pub url: Option<String>,
    pub duration_seconds: Option<i64>,
    pub position: Option<i64>,
}

/// DTO for updating a content item. Fields are optional; the type is fixed at
/// creation.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateContentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub url: Option<String>,
    pub duration_seconds: Option<i64>,
    pub position: Option<i64>,
}

/// DTO for creating a study material.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMaterialRequest {
    pub course_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub file_url: String,
}

/// DTO for updating a study material. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMaterialRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub file_url: Option<String>,
}
