pub mod actor_handlers;
pub mod api_error;
pub mod app_state;
pub mod movie_handlers;
pub mod pagination;
pub mod validate;

pub use api_error::ApiError;
pub use app_state::AppState;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "description": "Movie catalog API is running"
    }))
}

/// All routes; everything except the health check requires a bearer token
/// with the matching scope.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route(
            "/movies",
            get(movie_handlers::list_movies).post(movie_handlers::create_movie),
        )
        .route(
            "/movies/:id",
            get(movie_handlers::get_movie)
                .patch(movie_handlers::update_movie)
                .delete(movie_handlers::delete_movie),
        )
        .route(
            "/actors",
            get(actor_handlers::list_actors).post(actor_handlers::create_actor),
        )
        .route(
            "/actors/:id",
            get(actor_handlers::get_actor)
                .patch(actor_handlers::update_actor)
                .delete(actor_handlers::delete_actor),
        )
        .with_state(state)
}
