use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Foodstock API",
        version = "0.1.0",
        description = r#"
# Foodstock Inventory API

Stock ledger and production log for a food and goods commerce platform.

## Authentication

Every `/api/v1` endpoint requires a bearer JWT:

```
Authorization: Bearer <your-jwt-token>
```

Missing or invalid tokens get `401`; tokens lacking the route's permission get `403`.

## Pagination

List endpoints accept `page` (default 1) and `per_page` (default 20, max 100).
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "production-logs", description = "Production runs that consume ingredients and produce outputs"),
        (name = "inventory", description = "Stock levels and the stock movement ledger"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::production_logs::create_production_log,
        crate::handlers::production_logs::get_production_log,
        crate::handlers::production_logs::list_production_logs,

        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::get_inventory,
        crate::handlers::inventory::record_movement,
        crate::handlers::inventory::list_transactions,

        crate::health::health_check,
    ),
    components(
        schemas(
            crate::models::LineItem,
            crate::models::ProductionLog,
            crate::services::production_logs::RecordProductionRequest,
            crate::services::inventory::StockMovementRequest,
            crate::entities::TransactionType,
            crate::handlers::common::PaginationMeta,
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
