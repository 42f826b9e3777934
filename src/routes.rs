// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, students},
    state::AppState,
    utils::jwt::{auth_middleware, student_middleware},
};

/// Assembles the main application router.
///
/// * Auth routes are public; everything under /api/student requires a valid
///   token with the 'student' role.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins: [HeaderValue; 2] = [
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
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let student_routes = Router::new()
        .route("/interests", put(students::update_interests))
        .route("/quizzes", get(students::list_quizzes))
        .route("/taken", get(students::list_taken))
        .route("/quizzes/{id}/take", get(students::take_quiz))
        .route(
            "/quizzes/{quiz_id}/questions/{question_id}",
            get(students::show_question).post(students::submit_question),
        )
        .route("/quizzes/{id}/discussion", get(students::view_discussion))
        // Double middleware protection: Auth first, then student check
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/student", student_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
