use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::repos::{stock_repo, store_repo};
use crate::routes::HttpError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateStoreBody {
    pub company_id: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStoreBody {
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct StoreListQuery {
    pub company_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CreateRackBody {
    pub name: String,
}

pub async fn create_store(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateStoreBody>,
) -> Result<Json<store_repo::Store>, HttpError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(HttpError::unprocessable("Store name must not be empty"));
    }

    crate::repos::company_repo::find_by_id(&state.pool, body.company_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Company not found"))?;

    if store_repo::find_store_by_name(&state.pool, body.company_id, name)
        .await?
        .is_some()
    {
        return Err(HttpError::conflict(format!(
            "Store '{name}' already exists for this company"
        )));
    }

    match store_repo::insert_store(&state.pool, Uuid::new_v4(), body.company_id, name).await {
        Ok(store) => Ok(Json(store)),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(HttpError::conflict(
            format!("Store '{name}' already exists for this company"),
        )),
        Err(err) => Err(err.into()),
    }
}

pub async fn list_stores(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StoreListQuery>,
) -> Result<Json<Vec<store_repo::Store>>, HttpError> {
    let stores = store_repo::list_stores(&state.pool, query.company_id).await?;
    Ok(Json(stores))
}

pub async fn update_store(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStoreBody>,
) -> Result<Json<store_repo::Store>, HttpError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(HttpError::unprocessable("Store name must not be empty"));
    }

    let existing = store_repo::find_store_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| HttpError::not_found("Store not found"))?;

    if let Some(other) = store_repo::find_store_by_name(&state.pool, existing.company_id, name).await? {
        if other.id != id {
            return Err(HttpError::conflict(format!(
                "Store '{name}' already exists for this company"
            )));
        }
    }

    let store = store_repo::update_store(&state.pool, id, name, body.is_active)
        .await?
        .ok_or_else(|| HttpError::not_found("Store not found"))?;

    Ok(Json(store))
}

pub async fn delete_store(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, HttpError> {
    store_repo::find_store_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| HttpError::not_found("Store not found"))?;

    let lots = stock_repo::count_for_store(&state.pool, id).await?;
    if lots > 0 {
        return Err(HttpError::conflict(format!(
            "Store is referenced by {lots} stock lot(s)"
        )));
    }

    let racks = store_repo::list_racks_by_store(&state.pool, id).await?;
    if !racks.is_empty() {
        return Err(HttpError::conflict(format!(
            "Store has {} rack(s); delete them first",
            racks.len()
        )));
    }

    store_repo::delete_store(&state.pool, id).await?;
    Ok(Json(json!({ "deleted": id })))
}

pub async fn create_rack(
    State(state): State<Arc<AppState>>,
    Path(store_id): Path<Uuid>,
    Json(body): Json<CreateRackBody>,
) -> Result<Json<store_repo::Rack>, HttpError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(HttpError::unprocessable("Rack name must not be empty"));
    }

    store_repo::find_store_by_id(&state.pool, store_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Store not found"))?;

    if store_repo::find_rack_by_name(&state.pool, store_id, name)
        .await?
        .is_some()
    {
        return Err(HttpError::conflict(format!(
            "Rack '{name}' already exists in this store"
        )));
    }

    match store_repo::insert_rack(&state.pool, Uuid::new_v4(), store_id, name).await {
        Ok(rack) => Ok(Json(rack)),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(HttpError::conflict(
            format!("Rack '{name}' already exists in this store"),
        )),
        Err(err) => Err(err.into()),
    }
}

pub async fn list_racks(
    State(state): State<Arc<AppState>>,
    Path(store_id): Path<Uuid>,
) -> Result<Json<Vec<store_repo::Rack>>, HttpError> {
    store_repo::find_store_by_id(&state.pool, store_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Store not found"))?;

    let racks = store_repo::list_racks_by_store(&state.pool, store_id).await?;
    Ok(Json(racks))
}

pub async fn delete_rack(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, HttpError> {
    store_repo::find_rack_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| HttpError::not_found("Rack not found"))?;

    let lots = stock_repo::count_for_rack(&state.pool, id).await?;
    if lots > 0 {
        return Err(HttpError::conflict(format!(
            "Rack is referenced by {lots} stock lot(s)"
        )));
    }

    store_repo::delete_rack(&state.pool, id).await?;
    Ok(Json(json!({ "deleted": id })))
}
