use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::purchase_repo::{self, BillListFilter, PurchaseBill};
use crate::repos::report_query_repo::{self, RegisterTotals, ReportQueryError};
use crate::routes::{page_params, HttpError};
use crate::services::ledger_service::{self, AccountLedgerResponse, LedgerReportError};
use crate::services::stock_report_service::{self, StockReportError, StockReportResponse};
use crate::services::trial_balance_service::{self, TrialBalanceError, TrialBalanceResponse};
use crate::AppState;

fn map_query_error(err: ReportQueryError) -> HttpError {
    match err {
        ReportQueryError::InvalidDateRange { .. } => HttpError::unprocessable(err.to_string()),
        ReportQueryError::InvalidPagination { .. } => {
            HttpError::new(StatusCode::BAD_REQUEST, err.to_string())
        }
        ReportQueryError::Database(_) => HttpError::database(),
    }
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRegisterQuery {
    pub company_id: Uuid,
    pub fiscal_year_id: Option<Uuid>,
    pub supplier_account_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseRegisterResponse {
    pub totals: RegisterTotals,
    pub bills: Vec<PurchaseBill>,
}

pub async fn purchase_register(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PurchaseRegisterQuery>,
) -> Result<Json<PurchaseRegisterResponse>, HttpError> {
    let totals = report_query_repo::register_totals(
        &state.pool,
        query.company_id,
        query.fiscal_year_id,
        query.supplier_account_id,
        query.from,
        query.to,
    )
    .await
    .map_err(map_query_error)?;

    let filter = BillListFilter {
        fiscal_year_id: query.fiscal_year_id,
        supplier_account_id: query.supplier_account_id,
        from: query.from,
        to: query.to,
    };
    let (limit, offset) = page_params(query.limit, query.offset);
    let bills =
        purchase_repo::list_bills(&state.pool, query.company_id, &filter, limit, offset).await?;

    Ok(Json(PurchaseRegisterResponse { totals, bills }))
}

#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    pub fiscal_year_id: Uuid,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn map_ledger_error(err: LedgerReportError) -> HttpError {
    match err {
        LedgerReportError::AccountNotFound(_) | LedgerReportError::FiscalYearNotFound(_) => {
            HttpError::not_found(err.to_string())
        }
        LedgerReportError::Query(inner) => map_query_error(inner),
        LedgerReportError::Database(_) => HttpError::database(),
    }
}

pub async fn account_ledger(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<LedgerQuery>,
) -> Result<Json<AccountLedgerResponse>, HttpError> {
    let (limit, offset) = page_params(query.limit, query.offset);
    let report = ledger_service::get_account_ledger(
        &state.pool,
        account_id,
        query.fiscal_year_id,
        query.from,
        query.to,
        limit,
        offset,
    )
    .await
    .map_err(map_ledger_error)?;

    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct StockQuery {
    pub company_id: Uuid,
    pub store_id: Option<Uuid>,
    pub expiring_within_days: Option<i64>,
}

fn map_stock_error(err: StockReportError) -> HttpError {
    match err {
        StockReportError::InvalidExpiryWindow(_) => HttpError::unprocessable(err.to_string()),
        StockReportError::Query(inner) => map_query_error(inner),
    }
}

pub async fn stock_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StockQuery>,
) -> Result<Json<StockReportResponse>, HttpError> {
    let report = stock_report_service::get_stock_report(
        &state.pool,
        query.company_id,
        query.store_id,
        query.expiring_within_days,
    )
    .await
    .map_err(map_stock_error)?;

    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct TrialBalanceQuery {
    pub company_id: Uuid,
    pub fiscal_year_id: Uuid,
}

fn map_trial_balance_error(err: TrialBalanceError) -> HttpError {
    match err {
        TrialBalanceError::FiscalYearNotFound(_) => HttpError::not_found(err.to_string()),
        TrialBalanceError::Query(inner) => map_query_error(inner),
        TrialBalanceError::Database(_) => HttpError::database(),
    }
}

pub async fn trial_balance(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrialBalanceQuery>,
) -> Result<Json<TrialBalanceResponse>, HttpError> {
    let report =
        trial_balance_service::get_trial_balance(&state.pool, query.company_id, query.fiscal_year_id)
            .await
            .map_err(map_trial_balance_error)?;

    Ok(Json(report))
}
