pub mod admin;
pub mod gate;
pub mod health;

use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::auth::AdminGate;
use crate::service::GateDecisionEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: GateDecisionEngine,
    pub admin: Arc<AdminGate>,
}

impl AppState {
    pub fn new(engine: GateDecisionEngine, admin: AdminGate) -> Self {
        Self {
            engine,
            admin: Arc::new(admin),
        }
    }
}

/// Full application router: gate workflows, password-protected admin routes
/// and the health probe.
pub fn app(state: AppState) -> Router {
    let protected = admin::protected_router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        admin::require_admin,
    ));

    Router::new()
        .nest("/api/v1/gate", gate::router())
        .nest("/api/v1/admin", protected.merge(admin::password_router()))
        .nest("/api/v1", health::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
