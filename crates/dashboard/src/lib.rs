//! Pharma Supply Chain Dashboard
//!
//! HTTP front end for the supply chain ledger. Every change to a product is
//! signed by the connected wallet before it is applied, and only the
//! authorized administrator wallet may connect.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /api/wallet/connect` - Connect the wallet and open a session
//! - `DELETE /api/wallet` - Disconnect
//! - `GET /api/wallet/session` - Current session
//! - `GET /api/products?search=` - List products
//! - `POST /api/products` - Create a product
//! - `GET /api/products/{id}` - Get a product
//! - `POST /api/products/{id}/transfer` - Transfer to a new holder
//! - `POST /api/products/{id}/temperature` - Log a temperature reading
//! - `POST /api/products/{id}/compliance` - Verify compliance
//! - `GET /api/stats` - Dashboard metrics

pub mod config;
pub mod handlers;
pub mod inflight;
pub mod service;
pub mod watcher;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::Config;
pub use inflight::{InFlightGuard, InFlightTicket};
pub use service::{OperationOutcome, SupplyChainService};
pub use watcher::SessionWatcher;

/// Application state shared across handlers
pub type AppState = Arc<SupplyChainService>;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_handler))
        // Wallet session
        .route("/api/wallet/connect", post(handlers::connect_handler))
        .route("/api/wallet", delete(handlers::disconnect_handler))
        .route("/api/wallet/session", get(handlers::session_handler))
        // Products
        .route(
            "/api/products",
            get(handlers::list_products_handler).post(handlers::create_product_handler),
        )
        .route("/api/products/{id}", get(handlers::get_product_handler))
        .route(
            "/api/products/{id}/transfer",
            post(handlers::transfer_product_handler),
        )
        .route(
            "/api/products/{id}/temperature",
            post(handlers::log_temperature_handler),
        )
        .route(
            "/api/products/{id}/compliance",
            post(handlers::verify_compliance_handler),
        )
        // Metrics
        .route("/api/stats", get(handlers::stats_handler))
        // Middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
