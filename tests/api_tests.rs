// tests/api_tests.rs

use edunexus_backend::{config::Config, routes, state::AppState};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

/// Helper function to spawn the app on a random port for testing.
/// Each test gets its own in-memory SQLite database; a pool handle is
/// returned alongside the base URL for direct seeding/assertions.
async fn spawn_app() -> (String, SqlitePool) {
    // A single connection keeps the in-memory database alive and shared
    // between the app and the test.
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
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        admin_email: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

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

async fn signup(
    client: &reqwest::Client,
    address: &str,
    name: &str,
    email: &str,
    password: &str,
    role: Option<&str>,
) -> reqwest::Response {
    let mut body = serde_json::json!({
        "name": name,
        "email": email,
        "password": password,
    });
    if let Some(role) = role {
        body["role"] = serde_json::json!(role);
    }

    client
        .post(format!("{}/api/auth/signup", address))
        .json(&body)
        .send()
        .await
        .expect("Signup request failed")
}

async fn login_token(
    client: &reqwest::Client,
    address: &str,
    email: &str,
    password: &str,
) -> String {
    let resp = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Login request failed")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse login json");

    resp["token"].as_str().expect("Token not found").to_string()
}

#[tokio::test]
async fn health_check_works() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/health", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn unknown_route_404() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn signup_works() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = signup(
        &client,
        &address,
        "Test Student",
        &unique_email("student"),
        "password123",
        None,
    )
    .await;

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["user"]["role"], "student");
    assert_eq!(body["user"]["status"], "approved");
    // The password hash must never be serialized.
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn signup_fails_validation() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Not an email address
    let response = signup(&client, &address, "Bad", "not-an-email", "password123", None).await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("dup");

    let first = signup(&client, &address, "First", &email, "password123", None).await;
    assert_eq!(first.status().as_u16(), 201);

    let second = signup(&client, &address, "Second", &email, "password456", None).await;
    assert_eq!(second.status().as_u16(), 409);

    let body: serde_json::Value = second.json().await.unwrap();
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("already registered"), "got: {}", message);

    // No duplicate row was created.
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(&email)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn instructor_signs_up_as_pending() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = signup(
        &client,
        &address,
        "Teacher",
        &unique_email("teacher"),
        "password123",
        Some("instructor"),
    )
    .await;

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["user"]["role"], "instructor");
    assert_eq!(body["user"]["status"], "pending");
}

#[tokio::test]
async fn protected_routes_require_token_and_role() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // No token: 401
    let response = client
        .get(format!("{}/api/student/my-courses", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    // Student token on an admin route: 403
    let email = unique_email("student");
    signup(&client, &address, "Student", &email, "password123", None).await;
    let token = login_token(&client, &address, &email, "password123").await;

    let response = client
        .get(format!("{}/api/admin/users", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("login");

    signup(&client, &address, "User", &email, "password123", None).await;

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": "wrong" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn profile_roundtrip() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("profile");

    signup(&client, &address, "Original Name", &email, "password123", None).await;
    let token = login_token(&client, &address, &email, "password123").await;

    let response = client
        .put(format!("{}/api/auth/profile", address))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "name": "New Name" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let profile: serde_json::Value = client
        .get(format!("{}/api/auth/profile", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["user"]["name"], "New Name");
}

#[tokio::test]
async fn admin_can_reject_instructor_who_can_still_log_in() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Seed an admin directly.
    let admin_email = unique_email("admin");
    let hash = edunexus_backend::utils::hash::hash_password("adminpass1").unwrap();
    sqlx::query(
        "INSERT INTO users (name, email, password, role, status) VALUES ('Admin', ?, ?, 'admin', 'approved')",
    )
    .bind(&admin_email)
    .bind(&hash)
    .execute(&pool)
    .await
    .unwrap();
    let admin_token = login_token(&client, &address, &admin_email, "adminpass1").await;

    // A pending instructor signs up.
    let teacher_email = unique_email("teacher");
    signup(
        &client,
        &address,
        "Teacher",
        &teacher_email,
        "password123",
        Some("instructor"),
    )
    .await;
    let teacher_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(&teacher_email)
        .fetch_one(&pool)
        .await
        .unwrap();

    // Admin rejects with a reason.
    let response = client
        .put(format!("{}/api/admin/instructors/{}/reject", address, teacher_id))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "reason": "Incomplete credentials" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let (status, reason): (String, Option<String>) = sqlx::query_as(
        "SELECT status, rejection_reason FROM users WHERE id = ?",
    )
    .bind(teacher_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(status, "rejected");
    assert_eq!(reason.as_deref(), Some("Incomplete credentials"));

    // Rejected instructors still log in (role untouched)...
    let teacher_token = login_token(&client, &address, &teacher_email, "password123").await;

    // ...but authoring actions stay gated by status.
    let response = client
        .post(format!("{}/api/instructor/courses", address))
        .bearer_auth(&teacher_token)
        .json(&serde_json::json!({ "title": "My Course" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn admin_settings_can_disable_signup() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    sqlx::query("UPDATE settings SET allow_signup = 0 WHERE id = 1")
        .execute(&pool)
        .await
        .unwrap();

    let response = signup(
        &client,
        &address,
        "Latecomer",
        &unique_email("late"),
        "password123",
        None,
    )
    .await;

    assert_eq!(response.status().as_u16(), 403);
}
