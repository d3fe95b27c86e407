// src/routes.rs

use axum::{
    Json, Router,
    http::Method,
    middleware,
    routing::{delete, get, post, put},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, discussion, instructor, notification, progress, quiz, student},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, instructor_middleware, student_middleware},
};

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "success": true, "message": "ok" }))
}

/// Assembles the main application router.
///
/// * Merges the role-prefixed sub-routers (auth, student, instructor, admin).
/// * Layers authentication and role checks per group.
/// * Applies global middleware (Trace, CORS) and injects the state.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/profile", get(auth::get_profile).put(auth::update_profile))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let student_routes = Router::new()
        .route("/courses", get(student::list_courses))
        .route("/courses/{id}", get(student::get_course))
        .route("/courses/{id}/enroll", post(student::enroll))
        .route("/my-courses", get(student::my_courses))
        .route("/progress/{content_id}", post(progress::record_progress_event))
        .route(
            "/progress/course/{course_id}/reset",
            post(progress::reset_course_progress),
        )
        .route("/quiz/{id}", get(quiz::get_quiz))
        .route("/quiz/{id}/submit", post(quiz::submit_quiz))
        .route("/quiz/{id}/attempts", get(quiz::list_attempts))
        .route("/discussions", post(discussion::create_discussion))
        .route("/discussions/course/{course_id}", get(discussion::list_discussions))
        .route(
            "/discussions/{id}/replies",
            get(discussion::list_replies).post(discussion::create_reply),
        )
        .route("/notifications", get(notification::list_notifications))
        .route(
            "/notifications/{id}/read",
            put(notification::mark_notification_read),
        )
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let instructor_routes = Router::new()
        .route(
            "/courses",
            get(instructor::list_courses).post(instructor::create_course),
        )
        .route(
            "/courses/{id}",
            put(instructor::update_course).delete(instructor::delete_course),
        )
        .route("/courses/{id}/modules", get(instructor::list_modules))
        .route("/courses/{id}/quizzes", get(instructor::list_quizzes))
        .route("/modules", post(instructor::create_module))
        .route(
            "/modules/{id}",
            put(instructor::update_module).delete(instructor::delete_module),
        )
        .route("/content", post(instructor::create_content))
        .route(
            "/content/{id}",
            put(instructor::update_content).delete(instructor::delete_content),
        )
        .route("/quizzes", post(instructor::create_quiz))
        .route(
            "/quizzes/{id}",
            put(instructor::update_quiz).delete(instructor::delete_quiz),
        )
        .route("/materials", post(instructor::create_material))
        .route(
            "/materials/{id}",
            put(instructor::update_material).delete(instructor::delete_material),
        )
        .route("/analytics/{course_id}", get(instructor::course_analytics))
        .route("/discussions", post(discussion::create_discussion))
        .route("/discussions/course/{course_id}", get(discussion::list_discussions))
        .route(
            "/discussions/{id}/replies",
            get(discussion::list_replies).post(discussion::create_reply),
        )
        .route("/notifications", get(notification::list_notifications))
        .route(
            "/notifications/{id}/read",
            put(notification::mark_notification_read),
        )
        .layer(middleware::from_fn(instructor_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/instructors", get(admin::list_instructors))
        .route("/instructors/{id}/approve", put(admin::approve_instructor))
        .route("/instructors/{id}/reject", put(admin::reject_instructor))
        .route("/users", get(admin::list_users))
        .route(
            "/users/{id}",
            put(admin::update_user_status).delete(admin::delete_user),
        )
        .route("/courses", get(admin::list_courses))
        .route("/courses/{id}", delete(admin::delete_course))
        .route("/analytics", get(admin::platform_analytics))
        .route(
            "/settings",
            get(admin::get_settings).put(admin::update_settings),
        )
        .route("/discussions", get(admin::list_discussions))
        .route("/discussions/{id}", delete(admin::delete_discussion))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/api/health", get(health))
        .nest("/api/auth", auth_routes)
        .nest("/api/student", student_routes)
        .nest("/api/instructor", instructor_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
