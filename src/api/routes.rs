use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/venue", venue_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Venue routes under /api/venue
fn venue_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_venue))
        .route("/list", get(handlers::list_venues))
        .route("/sync", post(handlers::sync_venues))
        .route("/notvisited", get(handlers::not_visited_venue))
        .route("/next", get(handlers::next_venue))
        .route("/getfromplaces/:query", get(handlers::get_from_places))
        .route(
            "/:id",
            get(handlers::get_venue)
                .patch(handlers::update_venue)
                .delete(handlers::delete_venue),
        )
        .route("/:id/addvisits", post(handlers::add_visits))
        .route("/:id/rename", post(handlers::rename_venue))
}
