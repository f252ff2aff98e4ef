//! HTTP server and routes.

mod extract;
mod handlers;
mod state;

pub use extract::{CurrentUser, JsonBody};
pub use state::AppState;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/signup", post(handlers::auth_signup))
        .route("/login", post(handlers::auth_login))
        .route("/logout", post(handlers::auth_logout))
        .route("/me", get(handlers::auth_me));

    Router::new()
        .route("/api/ping", get(handlers::ping))
        .route(
            "/api/books",
            get(handlers::list_books).post(handlers::create_book),
        )
        .route("/api/books/{id}", get(handlers::book_detail))
        .route(
            "/api/books/{id}/reviews",
            get(handlers::list_reviews).post(handlers::create_review),
        )
        .nest("/api/auth", auth_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
