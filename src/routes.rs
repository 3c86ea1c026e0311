// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{auth, practice, profile, questions, test_result},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Builds the CORS policy from the configured origins. `*` allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                        None
                    }
                }),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, user, questions, practice, test).
/// * Protects user, practice and test routes with the auth middleware.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let question_routes = Router::new()
        .route("/topics", get(questions::list_topics))
        .route("/by-topic", get(questions::list_by_topic))
        .route("/for-test", post(questions::for_test));

    let user_routes = Router::new().route("/profile", get(profile::get_profile));

    let practice_routes = Router::new().route("/submit", post(practice::submit));

    let test_routes = Router::new()
        .route("/submit", post(test_result::submit))
        .route("/history", get(test_result::history));

    let protected = Router::new()
        .nest("/api/user", user_routes)
        .nest("/api/practice", practice_routes)
        .nest("/api/test", test_routes)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/questions", question_routes)
        .merge(protected)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
