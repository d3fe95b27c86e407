// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub course_id: i64,
    pub module_id: i64,
    /// Optional binding to the 'quiz' content item that gates module
    /// progress.
    pub content_id: Option<i64>,
    pub instructor_id: i64,
    pub title: String,

    /// Score threshold in [0, 100] a student must reach to pass.
    pub passing_percentage: i64,

    /// 'none' (single attempt), 'limited' (max_retakes) or 'unlimited'.
    pub retake_policy: String,
    pub max_retakes: i64,

    pub time_limit_minutes: Option<i64>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// One answer option of a question. For fill-blank questions the options
/// carry the accepted answer texts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionOption {
    pub text: String,
    pub is_correct: bool,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,

    /// 'mcq-single', 'mcq-multiple', 'true-false' or 'fill-blank'.
    pub question_type: String,

    pub text: String,

    /// Stored as a JSON array in the database.
    pub options: Json<Vec<QuestionOption>>,

    /// Point value of the question, non-negative.
    pub points: i64,

    /// Explanation shown to the student after submission.
    pub explanation: Option<String>,

    pub position: i64,
}

/// DTO for sending a question to a student (hides correctness flags and the
/// explanation until the attempt is graded).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    #[serde(rename = "type")]
    pub question_type: String,
    pub text: String,
    pub options: Vec<String>,
    pub points: i64,
    pub position: i64,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        // Fill-blank options hold the accepted answer texts, so the student
        // view gets no options at all for that type.
        let options = if q.question_type == "fill-blank" {
            Vec::new()
        } else {
            q.options.0.into_iter().map(|o| o.text).collect()
        };

        PublicQuestion {
            id: q.id,
            question_type: q.question_type,
            text: q.text,
            options,
            points: q.points,
            position: q.position,
        }
    }
}

fn validate_question_type(question_type: &str) -> Result<(), validator::ValidationError> {
    match question_type {
        "mcq-single" | "mcq-multiple" | "true-false" | "fill-blank" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_question_type")),
    }
}

fn validate_retake_policy(policy: &str) -> Result<(), validator::ValidationError> {
    match policy {
        "none" | "limited" | "unlimited" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_retake_policy")),
    }
}

fn validate_options(options: &[QuestionOption]) -> Result<(), validator::ValidationError> {
    if options.is_empty() {
        return Err(validator::ValidationError::new("options_cannot_be_empty"));
    }
    if !options.iter().any(|o| o.is_correct) {
        return Err(validator::ValidationError::new("no_correct_option"));
    }
    for opt in options {
        if opt.text.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

/// DTO for one question inside a quiz creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[serde(rename = "type")]
    #[validate(custom(function = validate_question_type))]
    pub question_type: String,
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<QuestionOption>,
    #[validate(range(min = 0))]
    pub points: i64,
    #[validate(length(max = 2000))]
    pub explanation: Option<String>,
}

/// DTO for creating a quiz with its questions in one request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    pub course_id: i64,
    pub module_id: i64,
    /// Content item of type 'quiz' this quiz is bound to, if any.
    pub content_id: Option<i64>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(range(min = 0, max = 100))]
    pub passing_percentage: Option<i64>,
    #[validate(custom(function = validate_retake_policy))]
    pub retake_policy: Option<String>,
    #[validate(range(min = 0))]
    pub max_retakes: Option<i64>,
    pub time_limit_minutes: Option<i64>,
    #[validate(nested)]
    pub questions: Vec<CreateQuestionRequest>,
}

/// DTO for updating a quiz's settings. Fields are optional; questions are
/// replaced by deleting and recreating the quiz, not patched in place.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(range(min = 0, max = 100))]
    pub passing_percentage: Option<i64>,
    #[validate(custom(function = validate_retake_policy))]
    pub retake_policy: Option<String>,
    #[validate(range(min = 0))]
    pub max_retakes: Option<i64>,
    pub time_limit_minutes: Option<i64>,
}

/// One submitted answer: selected option indices for choice questions, free
/// text for fill-blank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    #[serde(default)]
    pub selected_options: Vec<usize>,
    #[serde(default)]
    pub text_answer: Option<String>,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    pub answers: Vec<SubmittedAnswer>,
    #[serde(default)]
    pub time_spent_seconds: i64,
}

/// Per-question grading result, persisted inside the attempt's answers JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradedAnswer {
    pub question_id: i64,
    pub correct: bool,
    pub points_earned: i64,
}

/// Represents the 'quiz_attempts' table: one immutable graded submission.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub quiz_id: i64,
    pub student_id: i64,
    pub attempt_number: i64,
    pub answers: Json<Vec<GradedAnswer>>,
    pub earned_points: i64,
    pub total_points: i64,
    /// Rounded percentage in [0, 100].
    pub score: i64,
    pub passed: bool,
    pub time_spent_seconds: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
