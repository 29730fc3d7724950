use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{config::AppConfig, errors::ServiceError};

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Unwraps a JSON body, turning malformed or mistyped payloads into a 400.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))
}

/// Unwraps query parameters; malformed values become a 400 with the JSON error body.
pub fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ServiceError> {
    params
        .map(|Query(params)| params)
        .map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))
}

/// Page size bounds taken from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_per_page: u64,
    pub max_per_page: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_per_page: 20,
            max_per_page: 100,
        }
    }
}

impl From<&AppConfig> for PageLimits {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            default_per_page: cfg.api_default_page_size,
            max_per_page: cfg.api_max_page_size,
        }
    }
}

/// Pagination parameters for list operations
#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// 1-based page number (default 1)
    pub page: Option<u64>,
    /// Items per page, capped by the configured maximum
    pub per_page: Option<u64>,
}

impl PaginationParams {
    /// Resolves to a `(page, per_page)` pair; zero values fall back to defaults.
    pub fn resolve(&self, limits: PageLimits) -> (u64, u64) {
        let page = self.page.filter(|p| *p > 0).unwrap_or(1);
        let per_page = self
            .per_page
            .filter(|n| *n > 0)
            .unwrap_or(limits.default_per_page)
            .min(limits.max_per_page);
        (page, per_page)
    }
}

/// Standard pagination response metadata
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page)
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

/// Standard paginated response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: u64, per_page: u64, total: u64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(page, per_page, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_caps() {
        let limits = PageLimits::default();
        assert_eq!(PaginationParams::default().resolve(limits), (1, 20));

        let oversized = PaginationParams {
            page: Some(3),
            per_page: Some(10_000),
        };
        assert_eq!(oversized.resolve(limits), (3, 100));

        let zeros = PaginationParams {
            page: Some(0),
            per_page: Some(0),
        };
        assert_eq!(zeros.resolve(limits), (1, 20));
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(PaginationMeta::new(1, 20, 0).total_pages, 0);
        assert_eq!(PaginationMeta::new(1, 20, 20).total_pages, 1);
        assert_eq!(PaginationMeta::new(1, 20, 21).total_pages, 2);
    }
}
