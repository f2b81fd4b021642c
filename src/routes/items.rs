//! Item endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::repos::item_repo::{self, Item};
use crate::repos::stock_repo::{self, StockLot};
use crate::repos::{company_repo, purchase_repo};
use crate::routes::{page_params, HttpError};
use crate::services::purchase_math;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateItemBody {
    pub company_id: Uuid,
    pub name: String,
    pub unit: String,
    pub manufacturer: Option<String>,
    #[serde(default = "default_true")]
    pub is_vatable: bool,
    /// Rupees; stored in minor units
    #[serde(default)]
    pub sales_rate: f64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemBody {
    pub name: String,
    pub unit: String,
    pub manufacturer: Option<String>,
    pub is_vatable: bool,
    #[serde(default)]
    pub sales_rate: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ItemListQuery {
    pub company_id: Uuid,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Handler for POST /api/retailer/items
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateItemBody>,
) -> Result<Json<Item>, HttpError> {
    if company_repo::find_by_id(&state.pool, body.company_id)
        .await?
        .is_none()
    {
        return Err(HttpError::not_found(format!(
            "Company not found: {}",
            body.company_id
        )));
    }

    if item_repo::find_by_name(&state.pool, body.company_id, &body.name)
        .await?
        .is_some()
    {
        return Err(HttpError::conflict(format!(
            "Item already exists: {}",
            body.name
        )));
    }

    let item = match item_repo::insert(
        &state.pool,
        Uuid::new_v4(),
        body.company_id,
        &body.name,
        &body.unit,
        body.manufacturer.as_deref(),
        body.is_vatable,
        purchase_math::to_minor(body.sales_rate),
    )
    .await
    {
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(HttpError::conflict(format!(
                "Item already exists: {}",
                body.name
            )));
        }
        other => other?,
    };

    Ok(Json(item))
}

/// Handler for GET /api/retailer/items?company_id=
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ItemListQuery>,
) -> Result<Json<Vec<Item>>, HttpError> {
    let (limit, offset) = page_params(query.limit, query.offset);
    let items = item_repo::list_by_company(&state.pool, query.company_id, limit, offset).await?;
    Ok(Json(items))
}

/// Handler for GET /api/retailer/items/{id}
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Item>, HttpError> {
    let item = item_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| HttpError::not_found(format!("Item not found: {id}")))?;

    Ok(Json(item))
}

/// Handler for PUT /api/retailer/items/{id}
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateItemBody>,
) -> Result<Json<Item>, HttpError> {
    let item = item_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| HttpError::not_found(format!("Item not found: {id}")))?;

    if let Some(existing) =
        item_repo::find_by_name(&state.pool, item.company_id, &body.name).await?
    {
        if existing.id != id {
            return Err(HttpError::conflict(format!(
                "Item already exists: {}",
                body.name
            )));
        }
    }

    let updated = item_repo::update(
        &state.pool,
        id,
        &body.name,
        &body.unit,
        body.manufacturer.as_deref(),
        body.is_vatable,
        purchase_math::to_minor(body.sales_rate),
        body.is_active,
    )
    .await?
    .ok_or_else(|| HttpError::not_found(format!("Item not found: {id}")))?;

    Ok(Json(updated))
}

/// Handler for DELETE /api/retailer/items/{id}
///
/// Refused while stock lots or bill lines still reference the item.
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, HttpError> {
    if item_repo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(HttpError::not_found(format!("Item not found: {id}")));
    }

    let lot_count = stock_repo::count_for_item(&state.pool, id).await?;
    if lot_count > 0 {
        return Err(HttpError::conflict(format!(
            "Item has {lot_count} stock lot(s)"
        )));
    }

    let line_count = purchase_repo::count_lines_for_item(&state.pool, id).await?;
    if line_count > 0 {
        return Err(HttpError::conflict(format!(
            "Item appears on {line_count} bill line(s)"
        )));
    }

    item_repo::delete(&state.pool, id).await?;

    Ok(Json(json!({ "deleted": id })))
}

/// Item stock response: the aggregate plus each lot
#[derive(Debug, Serialize)]
pub struct ItemStockResponse {
    pub item_id: Uuid,
    pub name: String,
    pub unit: String,
    pub stock_qty: i64,
    pub last_rate_minor: i64,
    pub lots: Vec<StockLot>,
}

/// Handler for GET /api/retailer/items/{id}/stock
pub async fn get_item_stock(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ItemStockResponse>, HttpError> {
    let item = item_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| HttpError::not_found(format!("Item not found: {id}")))?;

    let lots = stock_repo::list_by_item(&state.pool, id).await?;

    Ok(Json(ItemStockResponse {
        item_id: item.id,
        name: item.name,
        unit: item.unit,
        stock_qty: item.stock_qty,
        last_rate_minor: item.last_rate_minor,
        lots,
    }))
}
