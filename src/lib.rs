//! Foodstock API Library
//!
//! Inventory ledger and production-log backend: per-product stock levels, an
//! append-only movement ledger, and production runs that atomically consume
//! ingredients and credit outputs.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod repositories;
pub mod services;
pub mod tracing;

use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;

use crate::auth::consts as perm;
use crate::auth::{AuthRouterExt, AuthService};
use crate::db::DbPool;
use crate::handlers::{InventoryHandlerState, PageLimits, ProductionLogHandlerState};
use crate::services::{InventoryService, ProductionLogService};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub inventory_service: InventoryService,
    pub production_log_service: ProductionLogService,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: config::AppConfig, event_sender: events::EventSender) -> Self {
        Self {
            inventory_service: InventoryService::new(db.clone(), event_sender.clone()),
            production_log_service: ProductionLogService::new(db.clone(), event_sender.clone()),
            db,
            config,
            event_sender,
        }
    }
}

impl InventoryHandlerState for AppState {
    fn inventory_service(&self) -> &InventoryService {
        &self.inventory_service
    }

    fn page_limits(&self) -> PageLimits {
        PageLimits::from(&self.config)
    }
}

impl ProductionLogHandlerState for AppState {
    fn production_log_service(&self) -> &ProductionLogService {
        &self.production_log_service
    }

    fn page_limits(&self) -> PageLimits {
        PageLimits::from(&self.config)
    }
}

pub fn api_v1_routes() -> Router<AppState> {
    let production_read = handlers::production_logs::production_log_read_router::<AppState>()
        .with_permission(perm::PRODUCTION_LOGS_READ);

    let production_write = handlers::production_logs::production_log_write_router::<AppState>()
        .with_permission(perm::PRODUCTION_LOGS_WRITE);

    let inventory_read = handlers::inventory::inventory_read_router::<AppState>()
        .with_permission(perm::INVENTORY_READ);

    let inventory_adjust = handlers::inventory::inventory_adjust_router::<AppState>()
        .with_permission(perm::INVENTORY_ADJUST);

    Router::new()
        .merge(production_read)
        .merge(production_write)
        .merge(inventory_read)
        .merge(inventory_adjust)
}

/// Full application router minus CORS, which the binary layers on from config.
pub fn build_router(state: AppState, auth_service: Arc<AuthService>) -> Router {
    let health = health::health_routes(state.db.clone());

    Router::<AppState>::new()
        .nest("/api/v1", api_v1_routes())
        .nest("/health", health)
        .merge(openapi::swagger_ui())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        // Inject AuthService into request extensions for auth middleware
        .layer(Extension(auth_service))
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
