//! Repository for report query operations
//!
//! Provides read-only, bounded queries for reporting. All queries are
//! company-scoped and designed to use indexes.

use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::repos::account_repo::AccountType;
use crate::repos::ledger_repo::TxnSource;

/// Errors that can occur during report query operations
#[derive(Debug, Error)]
pub enum ReportQueryError {
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid pagination parameters: limit={limit}, offset={offset}")]
    InvalidPagination { limit: i64, offset: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

// ============================================================
// ACCOUNT LEDGER QUERIES
// ============================================================

/// One ledger line for the account ledger report, with the source bill
/// number joined in where the row came from a purchase.
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct AccountLedgerLine {
    pub id: Uuid,
    pub txn_date: NaiveDate,
    pub description: Option<String>,
    pub source: TxnSource,
    pub bill_no: Option<String>,
    pub debit_minor: i64,
    pub credit_minor: i64,
}

/// Query ledger activity for a single account over a date range
///
/// Returns rows ordered by txn_date ASC, created_at ASC.
/// Uses index: `idx_ledger_account_fy_date`
pub async fn query_account_ledger(
    pool: &PgPool,
    account_id: Uuid,
    fiscal_year_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
    limit: i64,
    offset: i64,
) -> Result<Vec<AccountLedgerLine>, ReportQueryError> {
    if from > to {
        return Err(ReportQueryError::InvalidDateRange { start: from, end: to });
    }

    if limit <= 0 || offset < 0 {
        return Err(ReportQueryError::InvalidPagination { limit, offset });
    }

    let lines = sqlx::query_as::<_, AccountLedgerLine>(
        r#"
        SELECT
            lt.id,
            lt.txn_date,
            lt.description,
            lt.source,
            pb.bill_no,
            lt.debit_minor,
            lt.credit_minor
        FROM ledger_transactions lt
        LEFT JOIN purchase_bills pb ON pb.id = lt.purchase_bill_id
        WHERE lt.account_id = $1
          AND lt.fiscal_year_id = $2
          AND lt.txn_date >= $3
          AND lt.txn_date <= $4
        ORDER BY lt.txn_date ASC, lt.created_at ASC
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(account_id)
    .bind(fiscal_year_id)
    .bind(from)
    .bind(to)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(lines)
}

/// Count total account ledger lines for pagination metadata
pub async fn count_account_ledger(
    pool: &PgPool,
    account_id: Uuid,
    fiscal_year_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<i64, ReportQueryError> {
    if from > to {
        return Err(ReportQueryError::InvalidDateRange { start: from, end: to });
    }

    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM ledger_transactions
        WHERE account_id = $1
          AND fiscal_year_id = $2
          AND txn_date >= $3
          AND txn_date <= $4
        "#,
    )
    .bind(account_id)
    .bind(fiscal_year_id)
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Debit/credit totals of an account within a fiscal year (whole year,
/// not range-limited; used for the closing line of the ledger report).
pub async fn account_ledger_totals(
    pool: &PgPool,
    account_id: Uuid,
    fiscal_year_id: Uuid,
) -> Result<(i64, i64), ReportQueryError> {
    let totals = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT
            COALESCE(SUM(debit_minor), 0)::BIGINT,
            COALESCE(SUM(credit_minor), 0)::BIGINT
        FROM ledger_transactions
        WHERE account_id = $1 AND fiscal_year_id = $2
        "#,
    )
    .bind(account_id)
    .bind(fiscal_year_id)
    .fetch_one(pool)
    .await?;

    Ok(totals)
}

// ============================================================
// PURCHASE REGISTER QUERIES
// ============================================================

/// Aggregate totals over the purchase register selection
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct RegisterTotals {
    pub bill_count: i64,
    pub sub_total_minor: i64,
    pub discount_minor: i64,
    pub taxable_minor: i64,
    pub vat_minor: i64,
    pub grand_total_minor: i64,
}

pub async fn register_totals(
    pool: &PgPool,
    company_id: Uuid,
    fiscal_year_id: Option<Uuid>,
    supplier_account_id: Option<Uuid>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<RegisterTotals, ReportQueryError> {
    if let (Some(f), Some(t)) = (from, to) {
        if f > t {
            return Err(ReportQueryError::InvalidDateRange { start: f, end: t });
        }
    }

    let totals = sqlx::query_as::<_, RegisterTotals>(
        r#"
        SELECT
            COUNT(*) AS bill_count,
            COALESCE(SUM(sub_total_minor), 0)::BIGINT AS sub_total_minor,
            COALESCE(SUM(discount_minor), 0)::BIGINT AS discount_minor,
            COALESCE(SUM(taxable_minor), 0)::BIGINT AS taxable_minor,
            COALESCE(SUM(vat_minor), 0)::BIGINT AS vat_minor,
            COALESCE(SUM(grand_total_minor), 0)::BIGINT AS grand_total_minor
        FROM purchase_bills
        WHERE company_id = $1
          AND ($2::uuid IS NULL OR fiscal_year_id = $2)
          AND ($3::uuid IS NULL OR supplier_account_id = $3)
          AND ($4::date IS NULL OR bill_date >= $4)
          AND ($5::date IS NULL OR bill_date <= $5)
        "#,
    )
    .bind(company_id)
    .bind(fiscal_year_id)
    .bind(supplier_account_id)
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;

    Ok(totals)
}

// ============================================================
// TRIAL BALANCE QUERIES
// ============================================================

/// Per-account ledger totals with account metadata
#[derive(Debug, Clone, FromRow)]
pub struct TrialBalanceQueryRow {
    pub account_id: Uuid,
    pub code: String,
    pub name: String,
    #[sqlx(rename = "type")]
    pub account_type: AccountType,
    pub debit_minor: i64,
    pub credit_minor: i64,
}

/// Sum ledger rows per account for a fiscal year. Accounts with no
/// activity are omitted; the service merges opening balances back in.
pub async fn query_trial_balance_rows(
    pool: &PgPool,
    company_id: Uuid,
    fiscal_year_id: Uuid,
) -> Result<Vec<TrialBalanceQueryRow>, ReportQueryError> {
    let rows = sqlx::query_as::<_, TrialBalanceQueryRow>(
        r#"
        SELECT
            a.id AS account_id,
            a.code,
            a.name,
            a.type,
            COALESCE(SUM(lt.debit_minor), 0)::BIGINT AS debit_minor,
            COALESCE(SUM(lt.credit_minor), 0)::BIGINT AS credit_minor
        FROM ledger_transactions lt
        INNER JOIN accounts a ON a.id = lt.account_id
        WHERE lt.company_id = $1
          AND lt.fiscal_year_id = $2
        GROUP BY a.id, a.code, a.name, a.type
        ORDER BY a.code ASC
        "#,
    )
    .bind(company_id)
    .bind(fiscal_year_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ============================================================
// STOCK REPORT QUERIES
// ============================================================

/// One stock lot with its item metadata, for the stock report
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct StockReportLot {
    pub item_id: Uuid,
    pub item_name: String,
    pub unit: String,
    pub last_rate_minor: i64,
    pub batch_no: String,
    pub expiry_date: Option<NaiveDate>,
    pub qty: i64,
    pub rate_minor: i64,
    pub store_id: Option<Uuid>,
    pub rack_id: Option<Uuid>,
}

/// Query stock lots of a company, optionally narrowed to one store or to
/// lots expiring on/before a cutoff date. Near-expiry batches come first.
/// Uses index: `idx_stock_lots_company_expiry`
pub async fn query_stock_lots(
    pool: &PgPool,
    company_id: Uuid,
    store_id: Option<Uuid>,
    expiring_on_or_before: Option<NaiveDate>,
) -> Result<Vec<StockReportLot>, ReportQueryError> {
    let lots = sqlx::query_as::<_, StockReportLot>(
        r#"
        SELECT
            sl.item_id,
            i.name AS item_name,
            i.unit,
            i.last_rate_minor,
            sl.batch_no,
            sl.expiry_date,
            sl.qty,
            sl.rate_minor,
            sl.store_id,
            sl.rack_id
        FROM stock_lots sl
        INNER JOIN items i ON i.id = sl.item_id
        WHERE sl.company_id = $1
          AND ($2::uuid IS NULL OR sl.store_id = $2)
          AND ($3::date IS NULL OR (sl.expiry_date IS NOT NULL AND sl.expiry_date <= $3))
        ORDER BY sl.expiry_date ASC NULLS LAST, i.name ASC, sl.created_at ASC
        "#,
    )
    .bind(company_id)
    .bind(store_id)
    .bind(expiring_on_or_before)
    .fetch_all(pool)
    .await?;

    Ok(lots)
}
