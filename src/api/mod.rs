mod handlers;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::registry::CredentialRegistry;
use crate::store::SeenIdStore;

/// Shared handles for the HTTP handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: CredentialRegistry,
    pub store: SeenIdStore,
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/stats", get(handlers::stats))
        .route("/registrations", post(handlers::register))
        .route("/channels/{channel}", delete(handlers::remove_channel))
        .route("/channels/{channel}/credential", put(handlers::rekey_channel))
        .route("/projects/{id}", delete(handlers::remove_project));

    Router::new()
        .route("/healthcheck", get(handlers::health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
