// src/handlers/quiz.rs

use std::collections::{BTreeSet, HashMap};

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::{AppError, is_unique_violation},
    handlers::{activity::log_activity, progress::mark_content_complete},
    models::quiz::{
        GradedAnswer, PublicQuestion, Question, Quiz, QuizAttempt, SubmitQuizRequest,
        SubmittedAnswer,
    },
    utils::jwt::Claims,
};

/// Aggregate result of grading one submission.
#[derive(Debug)]
pub struct GradeOutcome {
    pub graded: Vec<GradedAnswer>,
    pub earned_points: i64,
    pub total_points: i64,
    /// Rounded percentage in [0, 100]; 0 when the quiz has no points.
    pub score: i64,
}

fn correct_option_indices(question: &Question) -> BTreeSet<usize> {
    question
        .options
        .0
        .iter()
        .enumerate()
        .filter(|(_, o)| o.is_correct)
        .map(|(i, _)| i)
        .collect()
}

/// Per-question correctness:
/// * single choice / true-false: exactly the one correct option selected;
/// * multiple choice: set equality between selected and correct indices;
/// * fill-blank: trimmed, case-insensitive match against any accepted text.
fn is_answer_correct(question: &Question, answer: &SubmittedAnswer) -> bool {
    match question.question_type.as_str() {
        "mcq-single" | "true-false" => {
            let selected: BTreeSet<usize> = answer.selected_options.iter().copied().collect();
            selected.len() == 1 && selected == correct_option_indices(question)
        }
        "mcq-multiple" => {
            let selected: BTreeSet<usize> = answer.selected_options.iter().copied().collect();
            !selected.is_empty() && selected == correct_option_indices(question)
        }
        "fill-blank" => match &answer.text_answer {
            Some(text) => {
                let given = text.trim();
                question
                    .options
                    .0
                    .iter()
                    .filter(|o| o.is_correct)
                    .any(|o| o.text.trim().eq_ignore_ascii_case(given))
            }
            None => false,
        },
        _ => false,
    }
}

/// Grades a submission against the quiz's questions.
///
/// Every question contributes its points to `total_points`; unanswered
/// questions earn 0. Answers referencing unknown question IDs are ignored.
pub fn grade_attempt(questions: &[Question], answers: &[SubmittedAnswer]) -> GradeOutcome {
    let by_question: HashMap<i64, &SubmittedAnswer> =
        answers.iter().map(|a| (a.question_id, a)).collect();

    let mut graded = Vec::with_capacity(questions.len());
    let mut earned_points = 0;
    let mut total_points = 0;

    for question in questions {
        total_points += question.points;

        let correct = by_question
            .get(&question.id)
            .map(|a| is_answer_correct(question, a))
            .unwrap_or(false);

        let points_earned = if correct { question.points } else { 0 };
        earned_points += points_earned;

        graded.push(GradedAnswer {
            question_id: question.id,
            correct,
            points_earned,
        });
    }

    let score = if total_points == 0 {
        0
    } else {
        ((earned_points as f64 / total_points as f64) * 100.0).round() as i64
    };

    GradeOutcome {
        graded,
        earned_points,
        total_points,
        score,
    }
}

/// Whether one more attempt is allowed under the quiz's retake policy.
pub fn retake_allowed(policy: &str, max_retakes: i64, prior_attempts: i64) -> bool {
    match policy {
        "none" => prior_attempts < 1,
        "limited" => prior_attempts < max_retakes,
        _ => true,
    }
}

async fn fetch_quiz(pool: &SqlitePool, quiz_id: i64) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, course_id, module_id, content_id, instructor_id, title,
               passing_percentage, retake_policy, max_retakes, time_limit_minutes, created_at
        FROM quizzes
        WHERE id = ?
        "#,
    )
    .bind(quiz_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

async fn fetch_questions(pool: &SqlitePool, quiz_id: i64) -> Result<Vec<Question>, AppError> {
    Ok(sqlx::query_as::<_, Question>(
        r#"
        SELECT id, quiz_id, question_type, text, options, points, explanation, position
        FROM questions
        WHERE quiz_id = ?
        ORDER BY position, id
        "#,
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await?)
}

async fn ensure_enrolled(
    pool: &SqlitePool,
    student_id: i64,
    course_id: i64,
) -> Result<(), AppError> {
    let enrolled: Option<i64> =
        sqlx::query_scalar("SELECT id FROM enrollments WHERE student_id = ? AND course_id = ?")
            .bind(student_id)
            .bind(course_id)
            .fetch_optional(pool)
            .await?;

    match enrolled {
        Some(_) => Ok(()),
        None => Err(AppError::Forbidden("Not enrolled in this course".to_string())),
    }
}

/// Returns a quiz with its questions for taking (answers hidden).
pub async fn get_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, quiz_id).await?;
    ensure_enrolled(&pool, claims.user_id(), quiz.course_id).await?;

    let questions: Vec<PublicQuestion> = fetch_questions(&pool, quiz_id)
        .await?
        .into_iter()
        .map(PublicQuestion::from)
        .collect();

    let prior_attempts: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM quiz_attempts WHERE quiz_id = ? AND student_id = ?",
    )
    .bind(quiz_id)
    .bind(claims.user_id())
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "quiz": {
            "id": quiz.id,
            "title": quiz.title,
            "passing_percentage": quiz.passing_percentage,
            "retake_policy": quiz.retake_policy,
            "max_retakes": quiz.max_retakes,
            "time_limit_minutes": quiz.time_limit_minutes,
        },
        "questions": questions,
        "prior_attempts": prior_attempts,
    })))
}

/// Submits a student's answers and persists the graded attempt.
///
/// * Enforces the retake policy against prior attempt count.
/// * Grades per question, derives score and pass/fail.
/// * Inserts an immutable QuizAttempt with attempt_number = prior + 1; a
///   concurrent duplicate submission loses on the unique index and gets 409.
/// * Writes an ActivityLog entry and, on a passing attempt of a quiz bound to
///   a content item, marks that content complete (rolling up enrollment
///   progress).
pub async fn submit_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id();

    let quiz = fetch_quiz(&pool, quiz_id).await?;
    ensure_enrolled(&pool, student_id, quiz.course_id).await?;

    let prior_attempts: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM quiz_attempts WHERE quiz_id = ? AND student_id = ?",
    )
    .bind(quiz_id)
    .bind(student_id)
    .fetch_one(&pool)
    .await?;

    if !retake_allowed(&quiz.retake_policy, quiz.max_retakes, prior_attempts) {
        return Err(AppError::Forbidden(
            "No attempts remaining for this quiz".to_string(),
        ));
    }

    let questions = fetch_questions(&pool, quiz_id).await?;
    if questions.is_empty() {
        return Err(AppError::BadRequest("Quiz has no questions".to_string()));
    }

    let outcome = grade_attempt(&questions, &payload.answers);
    let passed = outcome.score >= quiz.passing_percentage;
    let attempt_number = prior_attempts + 1;
    let answers_json = serde_json::to_string(&outcome.graded)?;

    let attempt = sqlx::query_as::<_, QuizAttempt>(
        r#"
        INSERT INTO quiz_attempts
            (quiz_id, student_id, attempt_number, answers, earned_points, total_points,
             score, passed, time_spent_seconds)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id, quiz_id, student_id, attempt_number, answers, earned_points,
                  total_points, score, passed, time_spent_seconds, created_at
        "#,
    )
    .bind(quiz_id)
    .bind(student_id)
    .bind(attempt_number)
    .bind(&answers_json)
    .bind(outcome.earned_points)
    .bind(outcome.total_points)
    .bind(outcome.score)
    .bind(passed)
    .bind(payload.time_spent_seconds.max(0))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Attempt already recorded, retry submission".to_string())
        } else {
            tracing::error!("Failed to record quiz attempt: {:?}", e);
            AppError::from(e)
        }
    })?;

    log_activity(
        &pool,
        student_id,
        "quiz_submitted",
        json!({
            "quiz_id": quiz_id,
            "attempt_number": attempt_number,
            "score": outcome.score,
            "passed": passed,
        }),
    )
    .await?;

    let mut course_percentage = None;
    if passed {
        if let Some(content_id) = quiz.content_id {
            course_percentage =
                Some(mark_content_complete(&pool, student_id, quiz.course_id, content_id).await?);
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "attempt": attempt,
            "course_progress_percentage": course_percentage,
        })),
    ))
}

/// Lists the student's attempt history for a quiz, oldest first.
pub async fn list_attempts(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = sqlx::query_as::<_, QuizAttempt>(
        r#"
        SELECT id, quiz_id, student_id, attempt_number, answers, earned_points,
               total_points, score, passed, time_spent_seconds, created_at
        FROM quiz_attempts
        WHERE quiz_id = ? AND student_id = ?
        ORDER BY attempt_number
        "#,
    )
    .bind(quiz_id)
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "attempts": attempts })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::QuestionOption;
    use sqlx::types::Json as SqlxJson;

    fn option(text: &str, is_correct: bool) -> QuestionOption {
        QuestionOption {
            text: text.to_string(),
            is_correct,
        }
    }

    fn question(id: i64, question_type: &str, options: Vec<QuestionOption>, points: i64) -> Question {
        Question {
            id,
            quiz_id: 1,
            question_type: question_type.to_string(),
            text: format!("Question {}", id),
            options: SqlxJson(options),
            points,
            explanation: None,
            position: id,
        }
    }

    fn choice_answer(question_id: i64, selected: &[usize]) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id,
            selected_options: selected.to_vec(),
            text_answer: None,
        }
    }

    fn text_answer(question_id: i64, text: &str) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id,
            selected_options: vec![],
            text_answer: Some(text.to_string()),
        }
    }

    #[test]
    fn test_two_question_perfect_score() {
        // 2 questions worth 5 + 5, both correct: 10/10, score 100.
        let questions = vec![
            question(1, "mcq-single", vec![option("A", true), option("B", false)], 5),
            question(2, "true-false", vec![option("True", false), option("False", true)], 5),
        ];
        let answers = vec![choice_answer(1, &[0]), choice_answer(2, &[1])];

        let outcome = grade_attempt(&questions, &answers);
        assert_eq!(outcome.earned_points, 10);
        assert_eq!(outcome.total_points, 10);
        assert_eq!(outcome.score, 100);
    }

    #[test]
    fn test_score_is_rounded_percentage() {
        // 1 of 3 equal questions correct: 33.33% rounds to 33.
        let questions = vec![
            question(1, "mcq-single", vec![option("A", true), option("B", false)], 1),
            question(2, "mcq-single", vec![option("A", true), option("B", false)], 1),
            question(3, "mcq-single", vec![option("A", true), option("B", false)], 1),
        ];
        let answers = vec![
            choice_answer(1, &[0]),
            choice_answer(2, &[1]),
            choice_answer(3, &[1]),
        ];

        let outcome = grade_attempt(&questions, &answers);
        assert_eq!(outcome.earned_points, 1);
        assert_eq!(outcome.total_points, 3);
        assert_eq!(outcome.score, 33);
        assert!(outcome.earned_points <= outcome.total_points);
    }

    #[test]
    fn test_multiple_choice_requires_set_equality() {
        let options = vec![
            option("A", true),
            option("B", true),
            option("C", false),
            option("D", false),
        ];
        let questions = vec![question(1, "mcq-multiple", options, 4)];

        // Exact set, order and duplicates don't matter.
        let outcome = grade_attempt(&questions, &[choice_answer(1, &[1, 0, 0])]);
        assert_eq!(outcome.earned_points, 4);

        // Subset of correct options is not enough.
        let outcome = grade_attempt(&questions, &[choice_answer(1, &[0])]);
        assert_eq!(outcome.earned_points, 0);

        // Superset including a wrong option fails.
        let outcome = grade_attempt(&questions, &[choice_answer(1, &[0, 1, 2])]);
        assert_eq!(outcome.earned_points, 0);
    }

    #[test]
    fn test_single_choice_rejects_multiple_selections() {
        let questions = vec![question(
            1,
            "mcq-single",
            vec![option("A", true), option("B", false)],
            2,
        )];

        let outcome = grade_attempt(&questions, &[choice_answer(1, &[0, 1])]);
        assert_eq!(outcome.earned_points, 0);
    }

    #[test]
    fn test_fill_blank_trims_and_ignores_case() {
        let questions = vec![question(1, "fill-blank", vec![option("Paris", true)], 3)];

        let outcome = grade_attempt(&questions, &[text_answer(1, "  paris ")]);
        assert_eq!(outcome.earned_points, 3);

        let outcome = grade_attempt(&questions, &[text_answer(1, "London")]);
        assert_eq!(outcome.earned_points, 0);
    }

    #[test]
    fn test_unanswered_questions_count_in_total() {
        let questions = vec![
            question(1, "mcq-single", vec![option("A", true)], 5),
            question(2, "mcq-single", vec![option("A", true)], 5),
        ];

        let outcome = grade_attempt(&questions, &[choice_answer(1, &[0])]);
        assert_eq!(outcome.earned_points, 5);
        assert_eq!(outcome.total_points, 10);
        assert_eq!(outcome.score, 50);
    }

    #[test]
    fn test_empty_quiz_scores_zero() {
        let outcome = grade_attempt(&[], &[]);
        assert_eq!(outcome.total_points, 0);
        assert_eq!(outcome.score, 0);
    }

    #[test]
    fn test_pass_threshold_comparison() {
        // passing_percentage 60, score 50: not passed.
        let questions = vec![
            question(1, "mcq-single", vec![option("A", true)], 1),
            question(2, "mcq-single", vec![option("A", true)], 1),
        ];
        let outcome = grade_attempt(&questions, &[choice_answer(1, &[0])]);
        assert_eq!(outcome.score, 50);
        assert!(outcome.score < 60);
    }

    #[test]
    fn test_student_view_hides_answer_data() {
        // Choice questions expose option texts but never correctness flags.
        let q = question(
            1,
            "mcq-single",
            vec![option("let", true), option("mut", false)],
            5,
        );
        let public = PublicQuestion::from(q);
        assert_eq!(public.options, vec!["let", "mut"]);

        // Fill-blank options ARE the accepted answers; none may reach the
        // student.
        let q = question(2, "fill-blank", vec![option("Paris", true)], 3);
        let public = PublicQuestion::from(q);
        assert!(
            !public.options.iter().any(|o| o == "Paris"),
            "fill-blank answer leaked to the student: {:?}",
            public.options
        );
        assert!(public.options.is_empty());
    }

    #[test]
    fn test_retake_policy() {
        // 'none': only the first attempt.
        assert!(retake_allowed("none", 0, 0));
        assert!(!retake_allowed("none", 0, 1));

        // 'limited': capped by max_retakes.
        assert!(retake_allowed("limited", 3, 2));
        assert!(!retake_allowed("limited", 3, 3));
        assert!(!retake_allowed("limited", 3, 5));

        // 'unlimited': never rejected.
        assert!(retake_allowed("unlimited", 0, 100));
    }
}
