#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use foodstock_api::{
    auth::{AuthConfig, AuthService, ALL_PERMISSIONS},
    build_router,
    config::AppConfig,
    db,
    entities::TransactionType,
    events::{process_events, EventSender},
    models::Actor,
    repositories::{InventoryRepository, SeaOrmInventoryRepository},
    services::StockMovementRequest,
    AppState,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const ACTOR_ID: &str = "user-42";
pub const ACTOR_NAME: &str = "Mai Tran";

/// Router plus state over a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    auth_service: Arc<AuthService>,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("failed to create temp dir");
        let db_path = db_dir.path().join("foodstock_test.sqlite");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            "test".to_string(),
        );
        // SQLite allows one writer; a single pooled connection serializes transactions.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (tx, rx) = mpsc::channel(cfg.event_channel_capacity);
        let event_task = tokio::spawn(process_events(rx));

        let auth_service = Arc::new(AuthService::new(AuthConfig::from(&cfg)));
        let state = AppState::new(Arc::new(pool), cfg, EventSender::new(tx));
        let router = build_router(state.clone(), auth_service.clone());

        Self {
            router,
            state,
            auth_service,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Token for the default actor holding the given permissions.
    pub fn token_with(&self, permissions: &[&str]) -> String {
        self.auth_service
            .generate_token(ACTOR_ID, Some(ACTOR_NAME), &[], permissions)
            .expect("failed to issue token")
    }

    /// Token carrying every permission the API checks.
    pub fn full_token(&self) -> String {
        self.token_with(&ALL_PERMISSIONS)
    }

    pub fn token_for(&self, subject: &str, name: Option<&str>, roles: &[&str]) -> String {
        self.auth_service
            .generate_token(subject, name, roles, &[])
            .expect("failed to issue token")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Request with a full-permission token; returns status and parsed JSON body.
    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let token = self.full_token();
        let response = self.request(method, uri, body, Some(&token)).await;
        let status = response.status();
        (status, read_json(response).await)
    }

    /// Credits `quantity` of `product_id` through an IMPORT movement.
    pub async fn seed_stock(&self, product_id: Uuid, quantity: i64) {
        self.state
            .inventory_service
            .record_movement(
                &Actor::new("seed", "Seeder"),
                StockMovementRequest {
                    product_id,
                    transaction_type: TransactionType::Import,
                    quantity,
                    price: 0,
                    note: None,
                },
            )
            .await
            .expect("failed to seed stock");
    }

    pub async fn quantity(&self, product_id: Uuid) -> Option<i64> {
        SeaOrmInventoryRepository::new(self.state.db.as_ref())
            .find(product_id)
            .await
            .expect("inventory lookup failed")
            .map(|record| record.quantity)
    }
}

pub async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body is not JSON")
    }
}
