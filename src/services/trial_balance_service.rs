//! Trial balance reporting
//!
//! Sums every account's ledger activity for a fiscal year, merges in
//! opening balances, and reports whether debits and credits agree.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::repos::account_repo::AccountType;
use crate::repos::opening_balance_repo::{self, BalanceSide, OpeningBalanceRow};
use crate::repos::report_query_repo::{self, ReportQueryError, TrialBalanceQueryRow};
use crate::repos::fiscal_year_repo;

/// Trial balance response with per-account rows and overall totals
#[derive(Debug, Clone, Serialize)]
pub struct TrialBalanceResponse {
    pub company_id: Uuid,
    pub fiscal_year_id: Uuid,
    pub rows: Vec<TrialBalanceRowDto>,
    pub totals: TrialBalanceTotals,
}

/// One account's aggregated position
#[derive(Debug, Clone, Serialize)]
pub struct TrialBalanceRowDto {
    pub account_id: Uuid,
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub debit_total_minor: i64,
    pub credit_total_minor: i64,
    pub net_balance_minor: i64,
}

/// Overall totals for verification
#[derive(Debug, Clone, Serialize)]
pub struct TrialBalanceTotals {
    pub total_debits: i64,
    pub total_credits: i64,
    pub is_balanced: bool,
}

/// Errors that can occur during trial balance reporting
#[derive(Debug, Error)]
pub enum TrialBalanceError {
    #[error("Fiscal year not found: {0}")]
    FiscalYearNotFound(Uuid),

    #[error("Report query error: {0}")]
    Query(#[from] ReportQueryError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Build the trial balance for a company's fiscal year
pub async fn get_trial_balance(
    pool: &PgPool,
    company_id: Uuid,
    fiscal_year_id: Uuid,
) -> Result<TrialBalanceResponse, TrialBalanceError> {
    fiscal_year_repo::find_by_id(pool, fiscal_year_id)
        .await?
        .filter(|fy| fy.company_id == company_id)
        .ok_or(TrialBalanceError::FiscalYearNotFound(fiscal_year_id))?;

    let ledger_rows =
        report_query_repo::query_trial_balance_rows(pool, company_id, fiscal_year_id).await?;
    let openings = opening_balance_repo::list_by_company_fy(pool, company_id, fiscal_year_id).await?;

    let rows = merge_rows(ledger_rows, openings);
    let totals = calculate_totals(&rows);

    Ok(TrialBalanceResponse {
        company_id,
        fiscal_year_id,
        rows,
        totals,
    })
}

/// Merge ledger activity with opening balances into one row per account,
/// ordered by account code. An account with an opening balance but no
/// activity still gets a row.
fn merge_rows(
    ledger: Vec<TrialBalanceQueryRow>,
    openings: Vec<OpeningBalanceRow>,
) -> Vec<TrialBalanceRowDto> {
    let mut by_account: HashMap<Uuid, TrialBalanceRowDto> = HashMap::new();

    for row in ledger {
        by_account.insert(
            row.account_id,
            TrialBalanceRowDto {
                account_id: row.account_id,
                code: row.code,
                name: row.name,
                account_type: row.account_type,
                debit_total_minor: row.debit_minor,
                credit_total_minor: row.credit_minor,
                net_balance_minor: 0,
            },
        );
    }

    for opening in openings {
        let entry = by_account
            .entry(opening.account_id)
            .or_insert_with(|| TrialBalanceRowDto {
                account_id: opening.account_id,
                code: opening.code.clone(),
                name: opening.name.clone(),
                account_type: opening.account_type,
                debit_total_minor: 0,
                credit_total_minor: 0,
                net_balance_minor: 0,
            });

        match opening.side {
            BalanceSide::Dr => entry.debit_total_minor += opening.amount_minor,
            BalanceSide::Cr => entry.credit_total_minor += opening.amount_minor,
        }
    }

    let mut rows: Vec<TrialBalanceRowDto> = by_account.into_values().collect();
    for row in &mut rows {
        row.net_balance_minor = row.debit_total_minor - row.credit_total_minor;
    }
    rows.sort_by(|a, b| a.code.cmp(&b.code));

    rows
}

fn calculate_totals(rows: &[TrialBalanceRowDto]) -> TrialBalanceTotals {
    let total_debits: i64 = rows.iter().map(|r| r.debit_total_minor).sum();
    let total_credits: i64 = rows.iter().map(|r| r.credit_total_minor).sum();

    TrialBalanceTotals {
        total_debits,
        total_credits,
        is_balanced: total_debits == total_credits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_row(code: &str, debit: i64, credit: i64) -> TrialBalanceQueryRow {
        TrialBalanceQueryRow {
            account_id: Uuid::new_v4(),
            code: code.to_string(),
            name: format!("Account {code}"),
            account_type: AccountType::Asset,
            debit_minor: debit,
            credit_minor: credit,
        }
    }

    fn opening_row(account_id: Uuid, code: &str, side: BalanceSide, amount: i64) -> OpeningBalanceRow {
        OpeningBalanceRow {
            account_id,
            code: code.to_string(),
            name: format!("Account {code}"),
            account_type: AccountType::Asset,
            side,
            amount_minor: amount,
        }
    }

    #[test]
    fn test_merge_adds_opening_to_active_account() {
        let row = ledger_row("1000", 50_000, 0);
        let account_id = row.account_id;
        let openings = vec![opening_row(account_id, "1000", BalanceSide::Dr, 10_000)];

        let rows = merge_rows(vec![row], openings);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].debit_total_minor, 60_000);
        assert_eq!(rows[0].net_balance_minor, 60_000);
    }

    #[test]
    fn test_merge_creates_row_for_opening_only_account() {
        let active = ledger_row("5000", 30_000, 0);
        let opening_only = Uuid::new_v4();
        let openings = vec![opening_row(opening_only, "2000", BalanceSide::Cr, 30_000)];

        let rows = merge_rows(vec![active], openings);
        assert_eq!(rows.len(), 2);

        let cr_row = rows.iter().find(|r| r.account_id == opening_only).unwrap();
        assert_eq!(cr_row.credit_total_minor, 30_000);
        assert_eq!(cr_row.debit_total_minor, 0);
        assert_eq!(cr_row.net_balance_minor, -30_000);
    }

    #[test]
    fn test_rows_are_sorted_by_code() {
        let rows = merge_rows(
            vec![ledger_row("5000", 10, 0), ledger_row("1000", 0, 10), ledger_row("1300", 5, 5)],
            vec![],
        );
        let codes: Vec<&str> = rows.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["1000", "1300", "5000"]);
    }

    #[test]
    fn test_totals_balanced() {
        let rows = merge_rows(
            vec![ledger_row("1000", 100_000, 0), ledger_row("2000", 0, 100_000)],
            vec![],
        );
        let totals = calculate_totals(&rows);
        assert_eq!(totals.total_debits, 100_000);
        assert_eq!(totals.total_credits, 100_000);
        assert!(totals.is_balanced);
    }

    #[test]
    fn test_totals_unbalanced_with_one_sided_opening() {
        let account_id = Uuid::new_v4();
        let rows = merge_rows(vec![], vec![opening_row(account_id, "1000", BalanceSide::Dr, 5_000)]);
        let totals = calculate_totals(&rows);
        assert_eq!(totals.total_debits, 5_000);
        assert_eq!(totals.total_credits, 0);
        assert!(!totals.is_balanced);
    }
}
