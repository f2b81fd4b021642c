use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::contracts::purchase_bill::PurchaseBillInput;
use crate::repos::purchase_repo::{self, BillLineWithItem, BillListFilter, PurchaseBill};
use crate::routes::{page_params, HttpError};
use crate::services::purchase_math::MathError;
use crate::services::purchase_service::{self, PurchaseError};
use crate::validation::ValidationError;
use crate::AppState;

fn map_error(err: PurchaseError) -> HttpError {
    match err {
        PurchaseError::Validation(inner) => match inner {
            ValidationError::VatExemptVatableItem(_)
            | ValidationError::DateOutsideFiscalYear { .. } => {
                HttpError::unprocessable(inner.to_string())
            }
            other => HttpError::new(StatusCode::BAD_REQUEST, other.to_string()),
        },
        PurchaseError::Math(MathError::EmptyLines) => {
            HttpError::new(StatusCode::BAD_REQUEST, MathError::EmptyLines.to_string())
        }
        PurchaseError::Math(MathError::AmountOverflow) => {
            HttpError::unprocessable(MathError::AmountOverflow.to_string())
        }
        PurchaseError::SettingsNotFound(_)
        | PurchaseError::FiscalYearNotFound(_)
        | PurchaseError::SupplierNotFound(_)
        | PurchaseError::ItemNotFound(_)
        | PurchaseError::StoreNotFound(_)
        | PurchaseError::BillNotFound(_) => HttpError::not_found(err.to_string()),
        PurchaseError::SupplierInactive(_)
        | PurchaseError::ItemInactive(_)
        | PurchaseError::RackMismatch { .. }
        | PurchaseError::FiscalYearMismatch { .. } => HttpError::unprocessable(err.to_string()),
        PurchaseError::MissingDefaultAccount(_) | PurchaseError::Unbalanced { .. } => {
            tracing::error!(error = %err, "purchase posting failed");
            HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, "Ledger posting failed")
        }
        PurchaseError::Database(_) => HttpError::database(),
    }
}

#[derive(Debug, Deserialize)]
pub struct BillListQuery {
    pub company_id: Uuid,
    pub fiscal_year_id: Option<Uuid>,
    pub supplier_account_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct BillListResponse {
    pub bills: Vec<PurchaseBill>,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct BillDetailResponse {
    #[serde(flatten)]
    pub bill: PurchaseBill,
    pub lines: Vec<BillLineWithItem>,
}

pub async fn create_bill(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PurchaseBillInput>,
) -> Result<Json<PurchaseBill>, HttpError> {
    match purchase_service::create_purchase_bill(&state.pool, &payload).await {
        Ok(bill) => {
            state
                .metrics
                .purchase_posted_total
                .with_label_values(&["create", "success"])
                .inc();
            Ok(Json(bill))
        }
        Err(err) => {
            state
                .metrics
                .purchase_posted_total
                .with_label_values(&["create", "failure"])
                .inc();
            Err(map_error(err))
        }
    }
}

pub async fn edit_bill(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PurchaseBillInput>,
) -> Result<Json<PurchaseBill>, HttpError> {
    match purchase_service::edit_purchase_bill(&state.pool, id, &payload).await {
        Ok(bill) => {
            state
                .metrics
                .purchase_posted_total
                .with_label_values(&["edit", "success"])
                .inc();
            Ok(Json(bill))
        }
        Err(err) => {
            state
                .metrics
                .purchase_posted_total
                .with_label_values(&["edit", "failure"])
                .inc();
            Err(map_error(err))
        }
    }
}

pub async fn delete_bill(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, HttpError> {
    match purchase_service::delete_purchase_bill(&state.pool, id).await {
        Ok(()) => {
            state
                .metrics
                .purchase_posted_total
                .with_label_values(&["delete", "success"])
                .inc();
            Ok(Json(json!({ "deleted": id })))
        }
        Err(err) => {
            state
                .metrics
                .purchase_posted_total
                .with_label_values(&["delete", "failure"])
                .inc();
            Err(map_error(err))
        }
    }
}

pub async fn list_bills(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BillListQuery>,
) -> Result<Json<BillListResponse>, HttpError> {
    let filter = BillListFilter {
        fiscal_year_id: query.fiscal_year_id,
        supplier_account_id: query.supplier_account_id,
        from: query.from,
        to: query.to,
    };

    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if to < from {
            return Err(HttpError::unprocessable(format!(
                "Invalid date range: {from} to {to}"
            )));
        }
    }

    let (limit, offset) = page_params(query.limit, query.offset);
    let bills = purchase_repo::list_bills(&state.pool, query.company_id, &filter, limit, offset).await?;
    let total = purchase_repo::count_bills(&state.pool, query.company_id, &filter).await?;

    Ok(Json(BillListResponse { bills, total }))
}

pub async fn get_bill(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BillDetailResponse>, HttpError> {
    let bill = purchase_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| HttpError::not_found("Purchase bill not found"))?;

    let lines = purchase_repo::fetch_lines_with_items(&state.pool, id).await?;

    Ok(Json(BillDetailResponse { bill, lines }))
}
