use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Json, Path, Query, State,
    },
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tracing::debug;
use uuid::Uuid;

use super::common::{created_response, json_body, query_params, success_response, PageLimits, PaginatedResponse, PaginationParams};
use crate::{
    auth::AuthUser,
    errors::ServiceError,
    models::{Actor, ProductionLog},
    services::production_logs::{ProductionLogService, RecordProductionRequest},
};

/// State needed by the production-log handlers
pub trait ProductionLogHandlerState: Clone + Send + Sync + 'static {
    fn production_log_service(&self) -> &ProductionLogService;
    fn page_limits(&self) -> PageLimits;
}

/// Read endpoints; callers gate these with the read permission.
pub fn production_log_read_router<S>() -> Router<S>
where
    S: ProductionLogHandlerState,
{
    Router::new()
        .route("/production-log", get(list_production_logs::<S>))
        .route("/production-log/:id", get(get_production_log::<S>))
}

/// Write endpoints; callers gate these with the write permission.
pub fn production_log_write_router<S>() -> Router<S>
where
    S: ProductionLogHandlerState,
{
    Router::new().route("/production-log", post(create_production_log::<S>))
}

/// Record a production run
///
/// Consumes every ingredient line and credits every output line in a single
/// transaction. Nothing is written when any ingredient is missing or short.
#[utoipa::path(
    post,
    path = "/api/v1/production-log",
    request_body = RecordProductionRequest,
    responses(
        (status = 201, description = "Production run recorded", body = ProductionLog,
            headers(("X-Request-Id" = String, description = "Unique request id for tracing"))
        ),
        (status = 400, description = "Invalid request or insufficient stock", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "An ingredient has no inventory record", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "production-logs"
)]
pub async fn create_production_log<S>(
    State(state): State<S>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<RecordProductionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: ProductionLogHandlerState,
{
    let request = json_body(payload)?;
    let actor = Actor::from(&user);
    debug!(
        actor_id = %actor.id,
        ingredient_lines = request.ingredient_item.len(),
        output_lines = request.output_item.len(),
        "recording production run"
    );

    let log = state.production_log_service().record(&actor, request).await?;
    Ok(created_response(log))
}

/// Get one production run
#[utoipa::path(
    get,
    path = "/api/v1/production-log/{id}",
    params(("id" = Uuid, Path, description = "Production log id")),
    responses(
        (status = 200, description = "Production run returned", body = ProductionLog),
        (status = 400, description = "Malformed id", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Unknown production log", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "production-logs"
)]
pub async fn get_production_log<S>(
    State(state): State<S>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: ProductionLogHandlerState,
{
    let Path(id) = id.map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))?;
    let log = state.production_log_service().get(id).await?;
    Ok(success_response(log))
}

/// List production runs, newest first
#[utoipa::path(
    get,
    path = "/api/v1/production-log",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of production runs", body = PaginatedResponse<ProductionLog>),
        (status = 400, description = "Malformed query parameters", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "production-logs"
)]
pub async fn list_production_logs<S>(
    State(state): State<S>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: ProductionLogHandlerState,
{
    let params = query_params(params)?;
    let (page, per_page) = params.resolve(state.page_limits());
    let (logs, total) = state.production_log_service().list(page, per_page).await?;
    Ok(success_response(PaginatedResponse::new(logs, page, per_page, total)))
}
