//! HTTP route handlers
//!
//! Each file covers one resource under /api/retailer. Handlers return
//! `Result<Json<T>, HttpError>`; service errors are mapped to status
//! codes in the file that owns the endpoint.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};

use crate::AppState;

pub mod account_groups;
pub mod accounts;
pub mod companies;
pub mod fiscal_years;
pub mod items;
pub mod metrics;
pub mod purchases;
pub mod reports;
pub mod settings;
pub mod stores;

/// Build the /api/retailer router with all resource routes
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(crate::health::health))
        .route(
            "/api/retailer/companies",
            post(companies::create_company).get(companies::list_companies),
        )
        .route(
            "/api/retailer/companies/{id}",
            get(companies::get_company).put(companies::update_company),
        )
        .route(
            "/api/retailer/companies/{id}/fiscal-years",
            post(fiscal_years::create_fiscal_year).get(fiscal_years::list_fiscal_years),
        )
        .route(
            "/api/retailer/fiscal-years/{id}/activate",
            post(fiscal_years::activate_fiscal_year),
        )
        .route(
            "/api/retailer/account-groups",
            post(account_groups::create_group).get(account_groups::list_groups),
        )
        .route(
            "/api/retailer/account-groups/{id}",
            put(account_groups::update_group).delete(account_groups::delete_group),
        )
        .route(
            "/api/retailer/accounts",
            post(accounts::create_account).get(accounts::list_accounts),
        )
        .route(
            "/api/retailer/accounts/{id}",
            get(accounts::get_account)
                .put(accounts::update_account)
                .delete(accounts::delete_account),
        )
        .route(
            "/api/retailer/accounts/{id}/opening-balance",
            put(accounts::set_opening_balance),
        )
        .route(
            "/api/retailer/items",
            post(items::create_item).get(items::list_items),
        )
        .route(
            "/api/retailer/items/{id}",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        .route("/api/retailer/items/{id}/stock", get(items::get_item_stock))
        .route(
            "/api/retailer/stores",
            post(stores::create_store).get(stores::list_stores),
        )
        .route(
            "/api/retailer/stores/{id}",
            put(stores::update_store).delete(stores::delete_store),
        )
        .route(
            "/api/retailer/stores/{id}/racks",
            post(stores::create_rack).get(stores::list_racks),
        )
        .route("/api/retailer/racks/{id}", delete(stores::delete_rack))
        .route(
            "/api/retailer/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        .route(
            "/api/retailer/purchases",
            post(purchases::create_bill).get(purchases::list_bills),
        )
        .route(
            "/api/retailer/purchases/{id}",
            get(purchases::get_bill)
                .put(purchases::edit_bill)
                .delete(purchases::delete_bill),
        )
        .route(
            "/api/retailer/reports/purchase-register",
            get(reports::purchase_register),
        )
        .route(
            "/api/retailer/reports/ledger/{account_id}",
            get(reports::account_ledger),
        )
        .route("/api/retailer/reports/stock", get(reports::stock_report))
        .route(
            "/api/retailer/reports/trial-balance",
            get(reports::trial_balance),
        )
        .with_state(state)
}

pub(crate) const DEFAULT_PAGE_SIZE: i64 = 50;
pub(crate) const MAX_PAGE_SIZE: i64 = 500;

/// Resolve limit/offset query params to effective values
pub(crate) fn page_params(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

/// Error response body
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// HTTP error with status code
#[derive(Debug)]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    /// Internal details never leak to clients
    pub fn database() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<sqlx::Error> for HttpError {
    fn from(_: sqlx::Error) -> Self {
        Self::database()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_defaults() {
        assert_eq!(page_params(None, None), (DEFAULT_PAGE_SIZE, 0));
    }

    #[test]
    fn test_page_params_clamps_limit() {
        assert_eq!(page_params(Some(10_000), None), (MAX_PAGE_SIZE, 0));
        assert_eq!(page_params(Some(0), None), (1, 0));
        assert_eq!(page_params(Some(-5), Some(-3)), (1, 0));
    }

    #[test]
    fn test_page_params_passthrough() {
        assert_eq!(page_params(Some(25), Some(50)), (25, 50));
    }
}
