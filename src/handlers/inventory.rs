use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Json, Path, Query, State,
    },
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use super::common::{
    created_response, json_body, query_params, success_response, PageLimits, PaginatedResponse, PaginationParams,
};
use crate::{
    auth::AuthUser,
    entities::{inventory, inventory_transaction, TransactionType},
    errors::ServiceError,
    models::Actor,
    services::inventory::{InventoryService, LedgerQuery, StockMovementRequest},
};

// Trait for inventory handler state that provides access to inventory service
pub trait InventoryHandlerState: Clone + Send + Sync + 'static {
    fn inventory_service(&self) -> &InventoryService;
    fn page_limits(&self) -> PageLimits;
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionFilters {
    pub product_id: Option<Uuid>,
    pub production_log_id: Option<Uuid>,
    /// IMPORT, EXPORT or RETURN_DAMAGED
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl TransactionFilters {
    fn split(self) -> (LedgerQuery, PaginationParams) {
        (
            LedgerQuery {
                product_id: self.product_id,
                production_log_id: self.production_log_id,
                transaction_type: self.transaction_type,
            },
            PaginationParams {
                page: self.page,
                per_page: self.per_page,
            },
        )
    }
}

/// Stock and ledger reads
pub fn inventory_read_router<S>() -> Router<S>
where
    S: InventoryHandlerState,
{
    Router::new()
        .route("/inventory", get(list_inventory::<S>))
        .route("/inventory/:product_id", get(get_inventory::<S>))
        .route("/inventory-transactions", get(list_transactions::<S>))
}

/// Manual stock movements
pub fn inventory_adjust_router<S>() -> Router<S>
where
    S: InventoryHandlerState,
{
    Router::new().route("/inventory-transactions", post(record_movement::<S>))
}

/// List inventory records ordered by product id
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(PaginationParams),
    responses(
        (status = 200, description = "Inventory list returned", body = PaginatedResponse<inventory::Model>,
            headers(("X-Request-Id" = String, description = "Unique request id for tracing"))
        ),
        (status = 400, description = "Malformed query parameters", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn list_inventory<S>(
    State(state): State<S>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: InventoryHandlerState,
{
    let params = query_params(params)?;
    let (page, per_page) = params.resolve(state.page_limits());
    let (records, total) = state
        .inventory_service()
        .list_inventory(page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::new(
        records, page, per_page, total,
    )))
}

/// Get the inventory record of one product
#[utoipa::path(
    get,
    path = "/api/v1/inventory/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Inventory record returned", body = inventory::Model),
        (status = 400, description = "Malformed product id", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No record for this product", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn get_inventory<S>(
    State(state): State<S>,
    product_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: InventoryHandlerState,
{
    let Path(product_id) =
        product_id.map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))?;
    let record = state.inventory_service().get_inventory(product_id).await?;
    Ok(success_response(record))
}

/// Record a manual stock movement
///
/// `IMPORT` credits stock, creating the record on first receipt. `EXPORT` and
/// `RETURN_DAMAGED` debit stock and fail when the product is missing or short.
#[utoipa::path(
    post,
    path = "/api/v1/inventory-transactions",
    request_body = StockMovementRequest,
    responses(
        (status = 201, description = "Movement recorded", body = inventory_transaction::Model),
        (status = 400, description = "Invalid request or insufficient stock", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No record for this product", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn record_movement<S>(
    State(state): State<S>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<StockMovementRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: InventoryHandlerState,
{
    let request = json_body(payload)?;
    let row = state
        .inventory_service()
        .record_movement(&Actor::from(&user), request)
        .await?;
    Ok(created_response(row))
}

/// Query the stock ledger, newest first
#[utoipa::path(
    get,
    path = "/api/v1/inventory-transactions",
    params(TransactionFilters),
    responses(
        (status = 200, description = "Page of ledger rows", body = PaginatedResponse<inventory_transaction::Model>),
        (status = 400, description = "Malformed query parameters", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn list_transactions<S>(
    State(state): State<S>,
    filters: Result<Query<TransactionFilters>, QueryRejection>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: InventoryHandlerState,
{
    let (query, params) = query_params(filters)?.split();
    let (page, per_page) = params.resolve(state.page_limits());
    let (rows, total) = state
        .inventory_service()
        .list_transactions(query, page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::new(rows, page, per_page, total)))
}
