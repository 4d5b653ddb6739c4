//! HTTP API Layer
//!
//! REST API for the membership dues ledger using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: request handlers for the dues and roster operations
//! - **Middleware**: authentication, audit logging
//! - **DTOs**: request/response data transfer objects
//! - **Error Handling**: consistent error responses
//!
//! The router is generic over the ledger store through `DuesService`, so
//! the same surface runs against PostgreSQL in production and the
//! in-memory store in tests.

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use domain_dues::DuesService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{dues, health, members};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DuesService>,
    pub config: ApiConfig,
}

/// Creates the main API router
pub fn create_router(service: Arc<DuesService>, config: ApiConfig) -> Router {
    let state = AppState { service, config };

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Member roster routes
    let member_routes = Router::new()
        .route("/", post(members::register_member))
        .route("/:id/initial-debts", post(members::add_initial_debt))
        .route("/:id/debt-summary", get(dues::debt_summary))
        .route("/:id/credit-sweeps", post(dues::sweep_credits));

    // Dues ledger routes
    let ledger_routes = Router::new()
        .route("/payments", post(dues::record_payment))
        .route("/obligations/generate", post(dues::generate_obligations))
        .route("/reminders/generate", post(dues::generate_reminders));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/members", member_routes)
        .merge(ledger_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            audit_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
