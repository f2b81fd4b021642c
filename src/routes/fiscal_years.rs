//! Fiscal year endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::repos::fiscal_year_repo::{self, FiscalYear, FyCalendar};
use crate::routes::HttpError;
use crate::services::fiscal_year_service::{self, FiscalYearError};
use crate::AppState;

fn map_error(error: FiscalYearError) -> HttpError {
    match error {
        FiscalYearError::CompanyNotFound(_) | FiscalYearError::NotFound(_) => {
            HttpError::not_found(error.to_string())
        }
        FiscalYearError::InvalidRange { .. } | FiscalYearError::Overlap(_) => {
            HttpError::unprocessable(error.to_string())
        }
        FiscalYearError::DuplicateLabel(_) => HttpError::conflict(error.to_string()),
        FiscalYearError::Database(_) => HttpError::database(),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateFiscalYearBody {
    pub label: String,
    #[serde(default = "default_calendar")]
    pub calendar: FyCalendar,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub activate: bool,
}

fn default_calendar() -> FyCalendar {
    FyCalendar::Bs
}

/// Handler for POST /api/retailer/companies/{company_id}/fiscal-years
pub async fn create_fiscal_year(
    State(state): State<Arc<AppState>>,
    Path(company_id): Path<Uuid>,
    Json(body): Json<CreateFiscalYearBody>,
) -> Result<Json<FiscalYear>, HttpError> {
    let fy = fiscal_year_service::create_fiscal_year(
        &state.pool,
        company_id,
        &body.label,
        body.calendar,
        body.start_date,
        body.end_date,
        body.activate,
    )
    .await
    .map_err(map_error)?;

    Ok(Json(fy))
}

/// Handler for GET /api/retailer/companies/{company_id}/fiscal-years
pub async fn list_fiscal_years(
    State(state): State<Arc<AppState>>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Vec<FiscalYear>>, HttpError> {
    let years = fiscal_year_repo::list_by_company(&state.pool, company_id).await?;
    Ok(Json(years))
}

/// Handler for POST /api/retailer/fiscal-years/{id}/activate
pub async fn activate_fiscal_year(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<FiscalYear>, HttpError> {
    let fy = fiscal_year_service::activate_fiscal_year(&state.pool, id)
        .await
        .map_err(map_error)?;

    Ok(Json(fy))
}
