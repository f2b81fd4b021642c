//! Chart of accounts endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::repos::account_repo::{self, Account, AccountType, AccountUpdate, NewAccount};
use crate::repos::opening_balance_repo::{self, BalanceSide, OpeningBalance};
use crate::repos::purchase_repo::{self, BillListFilter};
use crate::repos::{account_group_repo, company_repo, ledger_repo};
use crate::routes::{page_params, HttpError};
use crate::services::opening_balance_service::{self, OpeningBalanceError};
use crate::services::purchase_math;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateAccountBody {
    pub company_id: Uuid,
    pub account_group_id: Uuid,
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub pan_no: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountBody {
    pub account_group_id: Uuid,
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub pan_no: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct AccountListQuery {
    pub company_id: Uuid,
    pub account_group_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Handler for POST /api/retailer/accounts
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateAccountBody>,
) -> Result<Json<Account>, HttpError> {
    if company_repo::find_by_id(&state.pool, body.company_id)
        .await?
        .is_none()
    {
        return Err(HttpError::not_found(format!(
            "Company not found: {}",
            body.company_id
        )));
    }

    let group = account_group_repo::find_by_id(&state.pool, body.account_group_id)
        .await?
        .filter(|g| g.company_id == body.company_id)
        .ok_or_else(|| {
            HttpError::not_found(format!("Account group not found: {}", body.account_group_id))
        })?;

    if account_repo::find_by_code(&state.pool, body.company_id, &body.code)
        .await?
        .is_some()
    {
        return Err(HttpError::conflict(format!(
            "Account code already exists: {}",
            body.code
        )));
    }
    if account_repo::find_by_name(&state.pool, body.company_id, &body.name)
        .await?
        .is_some()
    {
        return Err(HttpError::conflict(format!(
            "Account name already exists: {}",
            body.name
        )));
    }

    let mut tx = state.pool.begin().await?;
    let account = match account_repo::insert_tx(
        &mut tx,
        NewAccount {
            id: Uuid::new_v4(),
            company_id: body.company_id,
            account_group_id: group.id,
            code: body.code.clone(),
            name: body.name,
            account_type: body.account_type,
            is_default: false,
            pan_no: body.pan_no,
            address: body.address,
            phone: body.phone,
        },
    )
    .await
    {
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(HttpError::conflict(format!(
                "Account code or name already exists: {}",
                body.code
            )));
        }
        other => other?,
    };
    tx.commit().await?;

    Ok(Json(account))
}

/// Handler for GET /api/retailer/accounts?company_id=
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AccountListQuery>,
) -> Result<Json<Vec<Account>>, HttpError> {
    let (limit, offset) = page_params(query.limit, query.offset);
    let accounts = account_repo::list_by_company(
        &state.pool,
        query.company_id,
        query.account_group_id,
        limit,
        offset,
    )
    .await?;

    Ok(Json(accounts))
}

/// Handler for GET /api/retailer/accounts/{id}
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Account>, HttpError> {
    let account = account_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| HttpError::not_found(format!("Account not found: {id}")))?;

    Ok(Json(account))
}

/// Handler for PUT /api/retailer/accounts/{id}
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateAccountBody>,
) -> Result<Json<Account>, HttpError> {
    let account = account_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| HttpError::not_found(format!("Account not found: {id}")))?;

    let group = account_group_repo::find_by_id(&state.pool, body.account_group_id)
        .await?
        .filter(|g| g.company_id == account.company_id)
        .ok_or_else(|| {
            HttpError::not_found(format!("Account group not found: {}", body.account_group_id))
        })?;

    if let Some(existing) =
        account_repo::find_by_name(&state.pool, account.company_id, &body.name).await?
    {
        if existing.id != id {
            return Err(HttpError::conflict(format!(
                "Account name already exists: {}",
                body.name
            )));
        }
    }

    let updated = account_repo::update(
        &state.pool,
        id,
        AccountUpdate {
            account_group_id: group.id,
            name: body.name,
            is_active: body.is_active,
            pan_no: body.pan_no,
            address: body.address,
            phone: body.phone,
        },
    )
    .await?
    .ok_or_else(|| HttpError::not_found(format!("Account not found: {id}")))?;

    Ok(Json(updated))
}

/// Handler for DELETE /api/retailer/accounts/{id}
///
/// Refused while ledger rows, bills or opening balances still reference
/// the account.
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, HttpError> {
    let account = account_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| HttpError::not_found(format!("Account not found: {id}")))?;

    if account.is_default {
        return Err(HttpError::unprocessable("Default accounts cannot be deleted"));
    }

    let txn_count = ledger_repo::count_for_account(&state.pool, id).await?;
    if txn_count > 0 {
        return Err(HttpError::conflict(format!(
            "Account has {txn_count} ledger transaction(s)"
        )));
    }

    let bill_filter = BillListFilter {
        supplier_account_id: Some(id),
        ..Default::default()
    };
    let bill_count = purchase_repo::count_bills(&state.pool, account.company_id, &bill_filter).await?;
    if bill_count > 0 {
        return Err(HttpError::conflict(format!(
            "Account is the supplier on {bill_count} purchase bill(s)"
        )));
    }

    let opening_count = opening_balance_repo::count_for_account(&state.pool, id).await?;
    if opening_count > 0 {
        return Err(HttpError::conflict(
            "Account has an opening balance; remove it first",
        ));
    }

    account_repo::delete(&state.pool, id).await?;

    Ok(Json(json!({ "deleted": id })))
}

#[derive(Debug, Deserialize)]
pub struct OpeningBalanceBody {
    pub fiscal_year_id: Uuid,
    pub side: BalanceSide,
    /// Rupees; stored in minor units
    pub amount: f64,
}

fn map_opening_error(error: OpeningBalanceError) -> HttpError {
    match error {
        OpeningBalanceError::AccountNotFound(_) | OpeningBalanceError::FiscalYearNotFound(_) => {
            HttpError::not_found(error.to_string())
        }
        OpeningBalanceError::NotFirstFiscalYear { .. } => HttpError::unprocessable(error.to_string()),
        OpeningBalanceError::NegativeAmount(_) => {
            HttpError::new(axum::http::StatusCode::BAD_REQUEST, error.to_string())
        }
        OpeningBalanceError::Database(_) => HttpError::database(),
    }
}

/// Handler for PUT /api/retailer/accounts/{id}/opening-balance
pub async fn set_opening_balance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<OpeningBalanceBody>,
) -> Result<Json<OpeningBalance>, HttpError> {
    let amount_minor = purchase_math::to_minor(body.amount);

    let balance = opening_balance_service::set_opening_balance(
        &state.pool,
        id,
        body.fiscal_year_id,
        body.side,
        amount_minor,
    )
    .await
    .map_err(map_opening_error)?;

    Ok(Json(balance))
}
