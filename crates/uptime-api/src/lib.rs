//! uptime-api — REST API for managing monitors.
//!
//! The API owns monitor configuration; runtime health fields are only ever
//! written by the checker and are read-only here.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/monitors` | List all monitors |
//! | POST | `/api/v1/monitors` | Create a monitor |
//! | GET | `/api/v1/monitors/{id}` | Get a monitor |
//! | DELETE | `/api/v1/monitors/{id}` | Delete a monitor and its log |
//! | GET | `/api/v1/monitors/{id}/logs` | Recent check log, newest first |
//! | GET | `/healthz` | Daemon liveness |

pub mod handlers;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use uptime_state::StateStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: StateStore,
}

/// Build the complete API router.
pub fn build_router(store: StateStore) -> Router {
    let api_state = ApiState { store };

    let api_routes = Router::new()
        .route("/monitors", get(handlers::list_monitors).post(handlers::create_monitor))
        .route("/monitors/{id}", get(handlers::get_monitor).delete(handlers::delete_monitor))
        .route("/monitors/{id}/logs", get(handlers::list_logs))
        .with_state(api_state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/healthz", get(handlers::healthz))
        .layer(CorsLayer::permissive())
}
