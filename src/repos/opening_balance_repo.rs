use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::account_repo::AccountType;

/// Which side of the ledger an opening balance sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "balance_side", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BalanceSide {
    Dr,
    Cr,
}

/// Opening balance for an account in its company's first fiscal year
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct OpeningBalance {
    pub id: Uuid,
    pub account_id: Uuid,
    pub fiscal_year_id: Uuid,
    pub side: BalanceSide,
    pub amount_minor: i64,
    pub created_at: DateTime<Utc>,
}

/// Upsert the opening balance for (account, fiscal year).
///
/// INSERT if no balance exists for the grain, otherwise UPDATE in place.
/// The first-fiscal-year rule is enforced by the service before calling.
pub async fn upsert(
    pool: &PgPool,
    id: Uuid,
    account_id: Uuid,
    fiscal_year_id: Uuid,
    side: BalanceSide,
    amount_minor: i64,
) -> Result<OpeningBalance, sqlx::Error> {
    sqlx::query_as::<_, OpeningBalance>(
        r#"
        INSERT INTO account_opening_balances (id, account_id, fiscal_year_id, side, amount_minor)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (account_id, fiscal_year_id)
        DO UPDATE SET
            side = EXCLUDED.side,
            amount_minor = EXCLUDED.amount_minor
        RETURNING id, account_id, fiscal_year_id, side, amount_minor, created_at
        "#,
    )
    .bind(id)
    .bind(account_id)
    .bind(fiscal_year_id)
    .bind(side)
    .bind(amount_minor)
    .fetch_one(pool)
    .await
}

pub async fn find_for_account_fy(
    pool: &PgPool,
    account_id: Uuid,
    fiscal_year_id: Uuid,
) -> Result<Option<OpeningBalance>, sqlx::Error> {
    sqlx::query_as::<_, OpeningBalance>(
        r#"
        SELECT id, account_id, fiscal_year_id, side, amount_minor, created_at
        FROM account_opening_balances
        WHERE account_id = $1 AND fiscal_year_id = $2
        "#,
    )
    .bind(account_id)
    .bind(fiscal_year_id)
    .fetch_optional(pool)
    .await
}

/// Opening balance row with its account's metadata joined in, for the
/// trial balance report.
#[derive(Debug, Clone, FromRow)]
pub struct OpeningBalanceRow {
    pub account_id: Uuid,
    pub code: String,
    pub name: String,
    #[sqlx(rename = "type")]
    pub account_type: AccountType,
    pub side: BalanceSide,
    pub amount_minor: i64,
}

/// Opening balances of every account of a company for one fiscal year
pub async fn list_by_company_fy(
    pool: &PgPool,
    company_id: Uuid,
    fiscal_year_id: Uuid,
) -> Result<Vec<OpeningBalanceRow>, sqlx::Error> {
    sqlx::query_as::<_, OpeningBalanceRow>(
        r#"
        SELECT ob.account_id, a.code, a.name, a.type, ob.side, ob.amount_minor
        FROM account_opening_balances ob
        INNER JOIN accounts a ON a.id = ob.account_id
        WHERE a.company_id = $1 AND ob.fiscal_year_id = $2
        "#,
    )
    .bind(company_id)
    .bind(fiscal_year_id)
    .fetch_all(pool)
    .await
}

/// Number of opening balance rows held by an account (any fiscal year)
pub async fn count_for_account(pool: &PgPool, account_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM account_opening_balances WHERE account_id = $1",
    )
    .bind(account_id)
    .fetch_one(pool)
    .await
}
