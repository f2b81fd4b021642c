//! Account group endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::repos::account_group_repo::{self, AccountGroup};
use crate::repos::company_repo;
use crate::routes::HttpError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateGroupBody {
    pub company_id: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGroupBody {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct GroupListQuery {
    pub company_id: Uuid,
}

/// Handler for POST /api/retailer/account-groups
pub async fn create_group(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateGroupBody>,
) -> Result<Json<AccountGroup>, HttpError> {
    if company_repo::find_by_id(&state.pool, body.company_id)
        .await?
        .is_none()
    {
        return Err(HttpError::not_found(format!(
            "Company not found: {}",
            body.company_id
        )));
    }

    if account_group_repo::find_by_name(&state.pool, body.company_id, &body.name)
        .await?
        .is_some()
    {
        return Err(HttpError::conflict(format!(
            "Account group already exists: {}",
            body.name
        )));
    }

    let mut tx = state.pool.begin().await?;
    let group = match account_group_repo::insert_tx(
        &mut tx,
        Uuid::new_v4(),
        body.company_id,
        &body.name,
        false,
    )
    .await
    {
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(HttpError::conflict(format!(
                "Account group already exists: {}",
                body.name
            )));
        }
        other => other?,
    };
    tx.commit().await?;

    Ok(Json(group))
}

/// Handler for GET /api/retailer/account-groups?company_id=
pub async fn list_groups(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GroupListQuery>,
) -> Result<Json<Vec<AccountGroup>>, HttpError> {
    let groups = account_group_repo::list_by_company(&state.pool, query.company_id).await?;
    Ok(Json(groups))
}

/// Handler for PUT /api/retailer/account-groups/{id}
pub async fn update_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateGroupBody>,
) -> Result<Json<AccountGroup>, HttpError> {
    let group = account_group_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| HttpError::not_found(format!("Account group not found: {id}")))?;

    if group.is_default {
        return Err(HttpError::unprocessable(
            "Default account groups cannot be renamed",
        ));
    }

    if let Some(existing) =
        account_group_repo::find_by_name(&state.pool, group.company_id, &body.name).await?
    {
        if existing.id != id {
            return Err(HttpError::conflict(format!(
                "Account group already exists: {}",
                body.name
            )));
        }
    }

    let updated = account_group_repo::update_name(&state.pool, id, &body.name)
        .await?
        .ok_or_else(|| HttpError::not_found(format!("Account group not found: {id}")))?;

    Ok(Json(updated))
}

/// Handler for DELETE /api/retailer/account-groups/{id}
pub async fn delete_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, HttpError> {
    let group = account_group_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| HttpError::not_found(format!("Account group not found: {id}")))?;

    if group.is_default {
        return Err(HttpError::unprocessable(
            "Default account groups cannot be deleted",
        ));
    }

    let referencing = account_group_repo::count_accounts_referencing(&state.pool, id).await?;
    if referencing > 0 {
        return Err(HttpError::conflict(format!(
            "Account group is referenced by {referencing} account(s)"
        )));
    }

    account_group_repo::delete(&state.pool, id).await?;

    Ok(Json(json!({ "deleted": id })))
}
