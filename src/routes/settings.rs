use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::repos::settings_repo;
use crate::routes::HttpError;
use crate::services::purchase_math;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SettingsQuery {
    pub company_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsBody {
    pub company_id: Uuid,
    /// VAT rate as a percentage, e.g. 13.0
    pub vat_rate: f64,
    pub store_management_enabled: bool,
    pub bill_no_prefix: String,
}

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SettingsQuery>,
) -> Result<Json<settings_repo::Settings>, HttpError> {
    let settings = settings_repo::find_by_company(&state.pool, query.company_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Settings not found for this company"))?;

    Ok(Json(settings))
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UpdateSettingsBody>,
) -> Result<Json<settings_repo::Settings>, HttpError> {
    if !body.vat_rate.is_finite() || body.vat_rate < 0.0 || body.vat_rate > 100.0 {
        return Err(HttpError::unprocessable(
            "VAT rate must be between 0 and 100 percent",
        ));
    }

    let prefix = body.bill_no_prefix.trim();
    if prefix.is_empty() {
        return Err(HttpError::unprocessable("Bill number prefix must not be empty"));
    }

    let settings = settings_repo::update(
        &state.pool,
        body.company_id,
        purchase_math::pct_to_bp(body.vat_rate),
        body.store_management_enabled,
        prefix,
    )
    .await?
    .ok_or_else(|| HttpError::not_found("Settings not found for this company"))?;

    tracing::info!(
        company_id = %settings.company_id,
        vat_rate_bp = settings.vat_rate_bp,
        store_management_enabled = settings.store_management_enabled,
        "settings updated"
    );

    Ok(Json(settings))
}
