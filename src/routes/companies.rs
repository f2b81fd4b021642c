//! Company endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::repos::company_repo::{self, Company};
use crate::routes::{page_params, HttpError};
use crate::services::company_service::{self, CompanyError};
use crate::AppState;

fn map_error(error: CompanyError) -> HttpError {
    match error {
        CompanyError::DuplicateName(_) => HttpError::conflict(error.to_string()),
        CompanyError::NotFound(_) => HttpError::not_found(error.to_string()),
        CompanyError::Database(_) => HttpError::database(),
    }
}

#[derive(Debug, Deserialize)]
pub struct CompanyBody {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub pan_no: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "NPR".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Handler for POST /api/retailer/companies
pub async fn create_company(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CompanyBody>,
) -> Result<Json<Company>, HttpError> {
    let company = company_service::create_company(
        &state.pool,
        &body.name,
        body.address.as_deref(),
        body.phone.as_deref(),
        body.pan_no.as_deref(),
        &body.currency,
    )
    .await
    .map_err(map_error)?;

    Ok(Json(company))
}

/// Handler for GET /api/retailer/companies
pub async fn list_companies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Company>>, HttpError> {
    let (limit, offset) = page_params(query.limit, query.offset);
    let companies = company_repo::list(&state.pool, limit, offset).await?;
    Ok(Json(companies))
}

/// Handler for GET /api/retailer/companies/{id}
pub async fn get_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Company>, HttpError> {
    let company = company_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| HttpError::not_found(format!("Company not found: {id}")))?;

    Ok(Json(company))
}

/// Handler for PUT /api/retailer/companies/{id}
pub async fn update_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<CompanyBody>,
) -> Result<Json<Company>, HttpError> {
    let company = company_service::update_company(
        &state.pool,
        id,
        &body.name,
        body.address.as_deref(),
        body.phone.as_deref(),
        body.pan_no.as_deref(),
        &body.currency,
    )
    .await
    .map_err(map_error)?;

    Ok(Json(company))
}
