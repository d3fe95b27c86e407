// tests/quiz_flow_tests.rs

use edunexus_backend::{config::Config, routes, state::AppState};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

async fn spawn_app() -> (String, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "quiz_flow_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_email: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

fn unique_email(prefix: &str) -> String {
    format!("{}_{}@example.com", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

/// Registers a user and returns a login token. Instructors are approved
/// directly in the database (the admin approval flow has its own test).
async fn make_user(
    client: &reqwest::Client,
    address: &str,
    pool: &SqlitePool,
    role: &str,
) -> (i64, String) {
    let email = unique_email(role);

    client
        .post(format!("{}/api/auth/signup", address))
        .json(&serde_json::json!({
            "name": format!("Test {}", role),
            "email": email,
            "password": "password123",
            "role": role,
        }))
        .send()
        .await
        .expect("Signup failed");

    if role == "instructor" {
        sqlx::query("UPDATE users SET status = 'approved' WHERE email = ?")
            .bind(&email)
            .execute(pool)
            .await
            .unwrap();
    }

    let id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_one(pool)
        .await
        .unwrap();

    let resp: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .unwrap();

    (id, resp["token"].as_str().unwrap().to_string())
}

/// Builds a published course with one module and two content items
/// (a video and a quiz slot) plus a quiz bound to the quiz slot.
/// Returns (course_id, video_content_id, quiz_id).
async fn seed_course(
    client: &reqwest::Client,
    address: &str,
    instructor_token: &str,
    retake_policy: &str,
    max_retakes: i64,
) -> (i64, i64, i64) {
    let resp: serde_json::Value = client
        .post(format!("{}/api/instructor/courses", address))
        .bearer_auth(instructor_token)
        .json(&serde_json::json!({ "title": "Rust 101", "category": "programming" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let course_id = resp["id"].as_i64().unwrap();

    client
        .put(format!("{}/api/instructor/courses/{}", address, course_id))
        .bearer_auth(instructor_token)
        .json(&serde_json::json!({ "published": true }))
        .send()
        .await
        .unwrap();

    let resp: serde_json::Value = client
        .post(format!("{}/api/instructor/modules", address))
        .bearer_auth(instructor_token)
        .json(&serde_json::json!({ "course_id": course_id, "title": "Basics" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let module_id = resp["id"].as_i64().unwrap();

    let resp: serde_json::Value = client
        .post(format!("{}/api/instructor/content", address))
        .bearer_auth(instructor_token)
        .json(&serde_json::json!({
            "module_id": module_id,
            "title": "Intro video",
            "content_type": "video",
            "url": "https://videos.example.com/intro.mp4",
            "duration_seconds": 300,
            "position": 0,
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let video_content_id = resp["content"]["id"].as_i64().unwrap();

    let resp: serde_json::Value = client
        .post(format!("{}/api/instructor/content", address))
        .bearer_auth(instructor_token)
        .json(&serde_json::json!({
            "module_id": module_id,
            "title": "Basics quiz",
            "content_type": "quiz",
            "position": 1,
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let quiz_content_id = resp["content"]["id"].as_i64().unwrap();

    let resp = client
        .post(format!("{}/api/instructor/quizzes", address))
        .bearer_auth(instructor_token)
        .json(&serde_json::json!({
            "course_id": course_id,
            "module_id": module_id,
            "content_id": quiz_content_id,
            "title": "Basics quiz",
            "passing_percentage": 60,
            "retake_policy": retake_policy,
            "max_retakes": max_retakes,
            "questions": [
                {
                    "type": "mcq-single",
                    "text": "Which keyword declares an immutable binding?",
                    "options": [
                        { "text": "let", "is_correct": true },
                        { "text": "mut", "is_correct": false },
                        { "text": "var", "is_correct": false }
                    ],
                    "points": 5
                },
                {
                    "type": "true-false",
                    "text": "Rust has a garbage collector.",
                    "options": [
                        { "text": "True", "is_correct": false },
                        { "text": "False", "is_correct": true }
                    ],
                    "points": 5
                }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let resp: serde_json::Value = resp.json().await.unwrap();
    let quiz_id = resp["id"].as_i64().unwrap();

    (course_id, video_content_id, quiz_id)
}

#[tokio::test]
async fn quiz_submission_grades_and_completes_course() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (_instructor_id, instructor_token) =
        make_user(&client, &address, &pool, "instructor").await;
    let (student_id, student_token) = make_user(&client, &address, &pool, "student").await;

    let (course_id, video_content_id, quiz_id) =
        seed_course(&client, &address, &instructor_token, "unlimited", 0).await;

    // Enroll
    let resp = client
        .post(format!("{}/api/student/courses/{}/enroll", address, course_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    // Fetch the quiz: answers must be hidden.
    let resp = client
        .get(format!("{}/api/student/quiz/{}", address, quiz_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let quiz_view: serde_json::Value = resp.json().await.unwrap();
    let questions = quiz_view["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    assert!(questions[0]["options"][0].is_string());
    let q1 = questions[0]["id"].as_i64().unwrap();
    let q2 = questions[1]["id"].as_i64().unwrap();

    // Submit both answers correctly: 10/10, score 100, passed.
    let resp = client
        .post(format!("{}/api/student/quiz/{}/submit", address, quiz_id))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({
            "answers": [
                { "question_id": q1, "selected_options": [0] },
                { "question_id": q2, "selected_options": [1] }
            ],
            "time_spent_seconds": 120,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let result: serde_json::Value = resp.json().await.unwrap();
    let attempt = &result["attempt"];
    assert_eq!(attempt["earned_points"], 10);
    assert_eq!(attempt["total_points"], 10);
    assert_eq!(attempt["score"], 100);
    assert_eq!(attempt["passed"], true);
    assert_eq!(attempt["attempt_number"], 1);

    // The passing attempt completed the bound content: 1 of 2 items done.
    assert_eq!(result["course_progress_percentage"], 50.0);

    // Completing the video brings the course to 100% and the enrollment to
    // 'completed'.
    let resp = client
        .post(format!("{}/api/student/progress/{}", address, video_content_id))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({ "watch_time_seconds": 300, "completed": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["course_progress_percentage"], 100.0);

    let my_courses: serde_json::Value = client
        .get(format!("{}/api/student/my-courses", address))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(my_courses["courses"][0]["status"], "completed");
    assert_eq!(my_courses["courses"][0]["progress_percentage"], 100.0);

    // The submission was recorded in the audit trail.
    let logged: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM activity_logs WHERE user_id = ? AND action = 'quiz_submitted'",
    )
    .bind(student_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(logged, 1);
}

#[tokio::test]
async fn failing_score_does_not_pass_or_complete() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (_instructor_id, instructor_token) =
        make_user(&client, &address, &pool, "instructor").await;
    let (_student_id, student_token) = make_user(&client, &address, &pool, "student").await;

    let (course_id, _video, quiz_id) =
        seed_course(&client, &address, &instructor_token, "unlimited", 0).await;

    client
        .post(format!("{}/api/student/courses/{}/enroll", address, course_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();

    let quiz_view: serde_json::Value = client
        .get(format!("{}/api/student/quiz/{}", address, quiz_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let q1 = quiz_view["questions"][0]["id"].as_i64().unwrap();
    let q2 = quiz_view["questions"][1]["id"].as_i64().unwrap();

    // One of two correct: 50% against a passing bar of 60.
    let result: serde_json::Value = client
        .post(format!("{}/api/student/quiz/{}/submit", address, quiz_id))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({
            "answers": [
                { "question_id": q1, "selected_options": [0] },
                { "question_id": q2, "selected_options": [0] }
            ],
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(result["attempt"]["score"], 50);
    assert_eq!(result["attempt"]["passed"], false);
    // No content completion on a failed attempt.
    assert!(result["course_progress_percentage"].is_null());
}

#[tokio::test]
async fn retake_limits_are_enforced_and_attempt_numbers_increase() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (_instructor_id, instructor_token) =
        make_user(&client, &address, &pool, "instructor").await;
    let (_student_id, student_token) = make_user(&client, &address, &pool, "student").await;

    // 'limited' with max_retakes 2: two attempts total.
    let (course_id, _video, quiz_id) =
        seed_course(&client, &address, &instructor_token, "limited", 2).await;

    client
        .post(format!("{}/api/student/courses/{}/enroll", address, course_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();

    let quiz_view: serde_json::Value = client
        .get(format!("{}/api/student/quiz/{}", address, quiz_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let q1 = quiz_view["questions"][0]["id"].as_i64().unwrap();

    let submit = |n: i64| {
        let client = client.clone();
        let address = address.clone();
        let token = student_token.clone();
        async move {
            let resp = client
                .post(format!("{}/api/student/quiz/{}/submit", address, quiz_id))
                .bearer_auth(&token)
                .json(&serde_json::json!({
                    "answers": [{ "question_id": q1, "selected_options": [1] }],
                }))
                .send()
                .await
                .unwrap();
            (n, resp)
        }
    };

    let (_, first) = submit(1).await;
    assert_eq!(first.status().as_u16(), 201);
    let first: serde_json::Value = first.json().await.unwrap();
    assert_eq!(first["attempt"]["attempt_number"], 1);

    let (_, second) = submit(2).await;
    assert_eq!(second.status().as_u16(), 201);
    let second: serde_json::Value = second.json().await.unwrap();
    assert_eq!(second["attempt"]["attempt_number"], 2);

    // Third attempt exceeds max_retakes.
    let (_, third) = submit(3).await;
    assert_eq!(third.status().as_u16(), 403);

    // History lists both attempts in order.
    let attempts: serde_json::Value = client
        .get(format!("{}/api/student/quiz/{}/attempts", address, quiz_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let attempts = attempts["attempts"].as_array().unwrap();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0]["attempt_number"], 1);
    assert_eq!(attempts[1]["attempt_number"], 2);
}

#[tokio::test]
async fn instructor_updates_quiz_settings_and_materials() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (instructor_id, instructor_token) =
        make_user(&client, &address, &pool, "instructor").await;
    let (_student_id, student_token) = make_user(&client, &address, &pool, "student").await;

    // Start with a single-attempt quiz.
    let (course_id, _video, quiz_id) =
        seed_course(&client, &address, &instructor_token, "none", 0).await;

    client
        .post(format!("{}/api/student/courses/{}/enroll", address, course_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();

    // Loosen the retake policy and raise the bar.
    let resp = client
        .put(format!("{}/api/instructor/quizzes/{}", address, quiz_id))
        .bearer_auth(&instructor_token)
        .json(&serde_json::json!({
            "retake_policy": "limited",
            "max_retakes": 2,
            "passing_percentage": 80,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let (policy, max_retakes, passing): (String, i64, i64) = sqlx::query_as(
        "SELECT retake_policy, max_retakes, passing_percentage FROM quizzes WHERE id = ?",
    )
    .bind(quiz_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(policy, "limited");
    assert_eq!(max_retakes, 2);
    assert_eq!(passing, 80);

    // The student sees the updated settings.
    let quiz_view: serde_json::Value = client
        .get(format!("{}/api/student/quiz/{}", address, quiz_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(quiz_view["quiz"]["retake_policy"], "limited");
    assert_eq!(quiz_view["quiz"]["passing_percentage"], 80);

    // An invalid retake policy is rejected.
    let resp = client
        .put(format!("{}/api/instructor/quizzes/{}", address, quiz_id))
        .bearer_auth(&instructor_token)
        .json(&serde_json::json!({ "retake_policy": "whenever" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // Materials: create, then fix a typo in the title.
    let resp = client
        .post(format!("{}/api/instructor/materials", address))
        .bearer_auth(&instructor_token)
        .json(&serde_json::json!({
            "course_id": course_id,
            "title": "Chet sheet",
            "file_url": "https://files.example.com/cheatsheet.pdf",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let resp: serde_json::Value = resp.json().await.unwrap();
    let material_id = resp["material"]["id"].as_i64().unwrap();

    let resp = client
        .put(format!("{}/api/instructor/materials/{}", address, material_id))
        .bearer_auth(&instructor_token)
        .json(&serde_json::json!({ "title": "Cheat sheet" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let (title, owner): (String, i64) = sqlx::query_as(
        "SELECT title, instructor_id FROM study_materials WHERE id = ?",
    )
    .bind(material_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(title, "Cheat sheet");
    assert_eq!(owner, instructor_id);

    // Another instructor cannot touch it.
    let (_other_id, other_token) = make_user(&client, &address, &pool, "instructor").await;
    let resp = client
        .put(format!("{}/api/instructor/materials/{}", address, material_id))
        .bearer_auth(&other_token)
        .json(&serde_json::json!({ "title": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn course_catalog_clamps_negative_limit() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (_instructor_id, instructor_token) =
        make_user(&client, &address, &pool, "instructor").await;
    let (_student_id, student_token) = make_user(&client, &address, &pool, "student").await;

    seed_course(&client, &address, &instructor_token, "unlimited", 0).await;

    // A negative limit would mean "unlimited" in SQLite; it clamps to zero
    // rows instead of bypassing the page-size cap.
    let body: serde_json::Value = client
        .get(format!("{}/api/student/courses?limit=-1", address))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["courses"].as_array().unwrap().len(), 0);

    // The default page still returns the published course.
    let body: serde_json::Value = client
        .get(format!("{}/api/student/courses", address))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["courses"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_enrollment_is_rejected() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (_instructor_id, instructor_token) =
        make_user(&client, &address, &pool, "instructor").await;
    let (student_id, student_token) = make_user(&client, &address, &pool, "student").await;

    let (course_id, _video, _quiz) =
        seed_course(&client, &address, &instructor_token, "unlimited", 0).await;

    let first = client
        .post(format!("{}/api/student/courses/{}/enroll", address, course_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = client
        .post(format!("{}/api/student/courses/{}/enroll", address, course_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM enrollments WHERE student_id = ? AND course_id = ?",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn progress_events_accumulate_and_reset_clears_history() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (_instructor_id, instructor_token) =
        make_user(&client, &address, &pool, "instructor").await;
    let (student_id, student_token) = make_user(&client, &address, &pool, "student").await;

    let (course_id, video_content_id, quiz_id) =
        seed_course(&client, &address, &instructor_token, "unlimited", 0).await;

    client
        .post(format!("{}/api/student/courses/{}/enroll", address, course_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();

    // Two partial watch events accumulate on one progress row.
    for _ in 0..2 {
        let resp = client
            .post(format!("{}/api/student/progress/{}", address, video_content_id))
            .bearer_auth(&student_token)
            .json(&serde_json::json!({ "watch_time_seconds": 60 }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }

    let (rows, watch_time): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(watch_time_seconds), 0) FROM progress WHERE student_id = ? AND content_id = ?",
    )
    .bind(student_id)
    .bind(video_content_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(rows, 1, "at most one progress row per (student, content)");
    assert_eq!(watch_time, 120);

    // Pass the quiz so there is an attempt to clear.
    let quiz_view: serde_json::Value = client
        .get(format!("{}/api/student/quiz/{}", address, quiz_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let q1 = quiz_view["questions"][0]["id"].as_i64().unwrap();
    let q2 = quiz_view["questions"][1]["id"].as_i64().unwrap();
    client
        .post(format!("{}/api/student/quiz/{}/submit", address, quiz_id))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({
            "answers": [
                { "question_id": q1, "selected_options": [0] },
                { "question_id": q2, "selected_options": [1] }
            ],
        }))
        .send()
        .await
        .unwrap();

    // Reset the course: progress, completed items and attempts are gone.
    let resp = client
        .post(format!("{}/api/student/progress/course/{}/reset", address, course_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let progress_rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM progress WHERE student_id = ? AND course_id = ?",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(progress_rows, 0);

    let attempts: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM quiz_attempts WHERE student_id = ?")
            .bind(student_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(attempts, 0);

    let (status, pct): (String, f64) = sqlx::query_as(
        "SELECT status, progress_percentage FROM enrollments WHERE student_id = ? AND course_id = ?",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(status, "active");
    assert_eq!(pct, 0.0);
}
