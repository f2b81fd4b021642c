use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

/// What produced a ledger row
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "txn_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TxnSource {
    Purchase,
    PurchaseVat,
    RoundOff,
    Payment,
    Opening,
}

/// A single ledger transaction row. One financial effect per row; the
/// rows of one bill are grouped by purchase_bill_id and always balance.
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct LedgerRow {
    pub id: Uuid,
    pub company_id: Uuid,
    pub fiscal_year_id: Uuid,
    pub account_id: Uuid,
    pub purchase_bill_id: Option<Uuid>,
    pub txn_date: NaiveDate,
    pub description: Option<String>,
    pub source: TxnSource,
    pub debit_minor: i64,
    pub credit_minor: i64,
    pub created_at: DateTime<Utc>,
}

/// Struct for inserting a ledger row
#[derive(Debug, Clone)]
pub struct LedgerInsert {
    pub id: Uuid,
    pub company_id: Uuid,
    pub fiscal_year_id: Uuid,
    pub account_id: Uuid,
    pub purchase_bill_id: Option<Uuid>,
    pub txn_date: NaiveDate,
    pub description: Option<String>,
    pub source: TxnSource,
    pub debit_minor: i64,
    pub credit_minor: i64,
}

/// Bulk insert ledger rows inside a transaction
pub async fn bulk_insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    rows: Vec<LedgerInsert>,
) -> Result<(), sqlx::Error> {
    for row in rows {
        sqlx::query(
            r#"
            INSERT INTO ledger_transactions
                (id, company_id, fiscal_year_id, account_id, purchase_bill_id,
                 txn_date, description, source, debit_minor, credit_minor)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(row.id)
        .bind(row.company_id)
        .bind(row.fiscal_year_id)
        .bind(row.account_id)
        .bind(row.purchase_bill_id)
        .bind(row.txn_date)
        .bind(&row.description)
        .bind(row.source)
        .bind(row.debit_minor)
        .bind(row.credit_minor)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Delete every ledger row of a bill (the reversal pass of edit/delete)
pub async fn delete_by_bill_tx(
    tx: &mut Transaction<'_, Postgres>,
    purchase_bill_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM ledger_transactions WHERE purchase_bill_id = $1")
        .bind(purchase_bill_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected())
}

/// Number of ledger rows touching an account. Account deletion is
/// refused while this is non-zero.
pub async fn count_for_account(pool: &PgPool, account_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM ledger_transactions WHERE account_id = $1",
    )
    .bind(account_id)
    .fetch_one(pool)
    .await
}
