//! Account ledger reporting
//!
//! Serves one account's ledger for a fiscal year: the opening balance
//! when the year is the company's first, the dated rows in range, and
//! closing totals.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::repos::opening_balance_repo::{self, BalanceSide};
use crate::repos::report_query_repo::{self, AccountLedgerLine, ReportQueryError};
use crate::repos::{account_repo, fiscal_year_repo};

/// Opening balance carried into the report
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OpeningDto {
    pub side: BalanceSide,
    pub amount_minor: i64,
}

/// Account ledger response
#[derive(Debug, Clone, Serialize)]
pub struct AccountLedgerResponse {
    pub account_id: Uuid,
    pub code: String,
    pub name: String,
    pub fiscal_year_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening: Option<OpeningDto>,
    pub lines: Vec<AccountLedgerLine>,
    /// Rows in range, ignoring pagination
    pub line_count: i64,
    /// Fiscal-year-wide ledger sums, opening excluded
    pub debit_total_minor: i64,
    pub credit_total_minor: i64,
    /// Opening plus year activity, debit positive
    pub closing_minor: i64,
}

/// Errors that can occur during ledger reporting
#[derive(Debug, Error)]
pub enum LedgerReportError {
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    #[error("Fiscal year not found: {0}")]
    FiscalYearNotFound(Uuid),

    #[error("Report query error: {0}")]
    Query(#[from] ReportQueryError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Build the ledger report for an account over a fiscal year.
///
/// `from`/`to` default to the fiscal year's range. The opening balance
/// appears only when the year is the company's chronologically first.
pub async fn get_account_ledger(
    pool: &PgPool,
    account_id: Uuid,
    fiscal_year_id: Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    limit: i64,
    offset: i64,
) -> Result<AccountLedgerResponse, LedgerReportError> {
    let account = account_repo::find_by_id(pool, account_id)
        .await?
        .ok_or(LedgerReportError::AccountNotFound(account_id))?;

    let fy = fiscal_year_repo::find_by_id(pool, fiscal_year_id)
        .await?
        .filter(|fy| fy.company_id == account.company_id)
        .ok_or(LedgerReportError::FiscalYearNotFound(fiscal_year_id))?;

    let from = from.unwrap_or(fy.start_date);
    let to = to.unwrap_or(fy.end_date);

    let lines =
        report_query_repo::query_account_ledger(pool, account_id, fiscal_year_id, from, to, limit, offset)
            .await?;
    let line_count =
        report_query_repo::count_account_ledger(pool, account_id, fiscal_year_id, from, to).await?;
    let (debit_total_minor, credit_total_minor) =
        report_query_repo::account_ledger_totals(pool, account_id, fiscal_year_id).await?;

    let first = fiscal_year_repo::find_first_of_company(pool, account.company_id).await?;
    let opening = match first {
        Some(first_fy) if first_fy.id == fy.id => {
            opening_balance_repo::find_for_account_fy(pool, account_id, fiscal_year_id)
                .await?
                .map(|ob| OpeningDto {
                    side: ob.side,
                    amount_minor: ob.amount_minor,
                })
        }
        _ => None,
    };

    let closing_minor = closing_balance(opening, debit_total_minor, credit_total_minor);

    Ok(AccountLedgerResponse {
        account_id,
        code: account.code,
        name: account.name,
        fiscal_year_id,
        from,
        to,
        opening,
        lines,
        line_count,
        debit_total_minor,
        credit_total_minor,
        closing_minor,
    })
}

/// Closing balance as a signed amount, debit positive
fn closing_balance(opening: Option<OpeningDto>, debits: i64, credits: i64) -> i64 {
    let opening_signed = match opening {
        Some(OpeningDto {
            side: BalanceSide::Dr,
            amount_minor,
        }) => amount_minor,
        Some(OpeningDto {
            side: BalanceSide::Cr,
            amount_minor,
        }) => -amount_minor,
        None => 0,
    };

    opening_signed + debits - credits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closing_without_opening() {
        assert_eq!(closing_balance(None, 70_000, 20_000), 50_000);
    }

    #[test]
    fn test_closing_with_debit_opening() {
        let opening = Some(OpeningDto {
            side: BalanceSide::Dr,
            amount_minor: 10_000,
        });
        assert_eq!(closing_balance(opening, 5_000, 0), 15_000);
    }

    #[test]
    fn test_closing_with_credit_opening_goes_negative() {
        let opening = Some(OpeningDto {
            side: BalanceSide::Cr,
            amount_minor: 40_000,
        });
        assert_eq!(closing_balance(opening, 10_000, 0), -30_000);
    }
}
