// src/models/enrollment.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'enrollments' table: one row per (student, course), the
/// UNIQUE index rejects duplicate enrollments.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,

    /// 'active', 'completed' or 'inactive'. Reaching 100% progress moves
    /// active -> completed; 'inactive' only via instructor/admin action.
    pub status: String,

    pub progress_percentage: f64,
    pub enrolled_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'progress' table: one row per (student, content item).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Progress {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub content_id: i64,

    /// 'started' or 'completed'.
    pub status: String,

    pub watch_time_seconds: i64,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for a content interaction event (video watch time, completion).
#[derive(Debug, Deserialize)]
pub struct ProgressEventRequest {
    #[serde(default)]
    pub watch_time_seconds: i64,
    /// Set by the client when the completion condition is met (video watched
    /// fully, document read). Quiz contents complete via a passed attempt
    /// instead.
    #[serde(default)]
    pub completed: bool,
}

/// Enrollment joined with course info for the my-courses listing.
#[derive(Debug, Serialize, FromRow)]
pub struct EnrolledCourse {
    pub enrollment_id: i64,
    pub course_id: i64,
    pub title: String,
    pub category: String,
    pub status: String,
    pub progress_percentage: f64,
    pub enrolled_at: Option<chrono::DateTime<chrono::Utc>>,
}
