//! Purchase bill posting service
//!
//! Creates, edits and deletes purchase bills. Every financial effect of
//! a bill (stock lots, aggregate quantities, ledger rows, the bill
//! number) is applied inside one SQL transaction; any failure aborts the
//! whole posting. An edit is a reversal pass followed by a fresh apply
//! that keeps the original bill number.

use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::contracts::purchase_bill::{PaymentMode, PurchaseBillInput};
use crate::repos::account_repo::{self, AccountError};
use crate::repos::item_repo::{self, Item, ItemError};
use crate::repos::ledger_repo::{self, LedgerInsert, TxnSource};
use crate::repos::purchase_repo::{self, BillMoney, NewBillLine, NewPurchaseBill, PurchaseBill};
use crate::repos::{bill_counter_repo, fiscal_year_repo, settings_repo, stock_repo, store_repo};
use crate::services::company_service::{
    CASH_ACCOUNT_CODE, PURCHASE_ACCOUNT_CODE, ROUNDING_ACCOUNT_CODE, VAT_RECEIVABLE_CODE,
};
use crate::services::purchase_math::{self, LineInput, MathError};
use crate::validation::{self, ValidationError};

/// Errors that can occur during purchase bill processing
#[derive(Debug, thiserror::Error)]
pub enum PurchaseError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Computation failed: {0}")]
    Math(#[from] MathError),

    #[error("Settings not found for company: {0}")]
    SettingsNotFound(Uuid),

    #[error("Fiscal year not found: {0}")]
    FiscalYearNotFound(Uuid),

    #[error("Supplier account not found: {0}")]
    SupplierNotFound(Uuid),

    #[error("Supplier account is inactive: {0}")]
    SupplierInactive(Uuid),

    #[error("Item not found: {0}")]
    ItemNotFound(Uuid),

    #[error("Item is inactive: {0}")]
    ItemInactive(Uuid),

    #[error("Store not found: {0}")]
    StoreNotFound(Uuid),

    #[error("Rack {rack_id} does not belong to store {store_id}")]
    RackMismatch { rack_id: Uuid, store_id: Uuid },

    #[error("Purchase bill not found: {0}")]
    BillNotFound(Uuid),

    #[error("Bill belongs to fiscal year {actual}, cannot move it to {requested}")]
    FiscalYearMismatch { actual: Uuid, requested: Uuid },

    #[error("Default account '{0}' is missing; company defaults were not seeded")]
    MissingDefaultAccount(&'static str),

    #[error("Ledger rows do not balance: debits={debits}, credits={credits}")]
    Unbalanced { debits: i64, credits: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for purchase operations
pub type PurchaseResult<T> = Result<T, PurchaseError>;

fn map_supplier_err(e: AccountError) -> PurchaseError {
    match e {
        AccountError::NotFound { account_id } => PurchaseError::SupplierNotFound(account_id),
        AccountError::Inactive { account_id } => PurchaseError::SupplierInactive(account_id),
        AccountError::Database(e) => PurchaseError::Database(e),
    }
}

fn map_item_err(e: ItemError) -> PurchaseError {
    match e {
        ItemError::NotFound { item_id } => PurchaseError::ItemNotFound(item_id),
        ItemError::Inactive { item_id } => PurchaseError::ItemInactive(item_id),
        ItemError::Database(e) => PurchaseError::Database(e),
    }
}

/// Render a bill number from the configured prefix, the fiscal year
/// label and the allocated sequence.
pub fn format_bill_no(prefix: &str, fy_label: &str, seq: i64) -> String {
    format!("{prefix}-{fy_label}-{seq}")
}

/// Create a purchase bill, posting all of its effects atomically
pub async fn create_purchase_bill(
    pool: &PgPool,
    payload: &PurchaseBillInput,
) -> PurchaseResult<PurchaseBill> {
    let mut tx = pool.begin().await?;

    let bill = post_bill_tx(&mut tx, payload, None).await?;

    tx.commit().await?;

    tracing::info!(
        bill_id = %bill.id,
        bill_no = %bill.bill_no,
        company_id = %bill.company_id,
        grand_total_minor = bill.grand_total_minor,
        "Purchase bill posted"
    );

    Ok(bill)
}

/// Edit a purchase bill: reverse every effect of the stored bill, then
/// reapply the new payload under the original bill number.
pub async fn edit_purchase_bill(
    pool: &PgPool,
    bill_id: Uuid,
    payload: &PurchaseBillInput,
) -> PurchaseResult<PurchaseBill> {
    let mut tx = pool.begin().await?;

    let existing = purchase_repo::lock_by_id_tx(&mut tx, bill_id)
        .await?
        .ok_or(PurchaseError::BillNotFound(bill_id))?;

    if existing.company_id != payload.company_id {
        return Err(PurchaseError::BillNotFound(bill_id));
    }

    // A bill stays in the fiscal year it was numbered in
    if existing.fiscal_year_id != payload.fiscal_year_id {
        return Err(PurchaseError::FiscalYearMismatch {
            actual: existing.fiscal_year_id,
            requested: payload.fiscal_year_id,
        });
    }

    reverse_bill_effects_tx(&mut tx, bill_id).await?;
    let bill = post_bill_tx(&mut tx, payload, Some(&existing)).await?;

    tx.commit().await?;

    tracing::info!(
        bill_id = %bill.id,
        bill_no = %bill.bill_no,
        grand_total_minor = bill.grand_total_minor,
        "Purchase bill edited"
    );

    Ok(bill)
}

/// Delete a purchase bill, rolling back stock and ledger effects
pub async fn delete_purchase_bill(pool: &PgPool, bill_id: Uuid) -> PurchaseResult<()> {
    let mut tx = pool.begin().await?;

    let existing = purchase_repo::lock_by_id_tx(&mut tx, bill_id)
        .await?
        .ok_or(PurchaseError::BillNotFound(bill_id))?;

    reverse_bill_effects_tx(&mut tx, bill_id).await?;
    purchase_repo::delete_bill_tx(&mut tx, bill_id).await?;

    tx.commit().await?;

    tracing::info!(
        bill_id = %bill_id,
        bill_no = %existing.bill_no,
        "Purchase bill deleted"
    );

    Ok(())
}

/// Remove a bill's stock lots (rolling back aggregate quantities), its
/// ledger rows and its lines. The bill header stays.
async fn reverse_bill_effects_tx(
    tx: &mut Transaction<'_, Postgres>,
    bill_id: Uuid,
) -> PurchaseResult<()> {
    let removed = stock_repo::delete_by_bill_tx(tx, bill_id).await?;
    for (item_id, qty) in removed {
        item_repo::adjust_stock_tx(tx, item_id, -qty, None).await?;
    }

    ledger_repo::delete_by_bill_tx(tx, bill_id).await?;
    purchase_repo::delete_lines_tx(tx, bill_id).await?;

    Ok(())
}

/// Apply a bill payload inside the open transaction.
///
/// With `existing` set this is the reapply half of an edit: the header
/// is rewritten in place and the bill keeps its sequence and number.
/// Otherwise a new sequence is drawn from the bill counter.
async fn post_bill_tx(
    tx: &mut Transaction<'_, Postgres>,
    payload: &PurchaseBillInput,
    existing: Option<&PurchaseBill>,
) -> PurchaseResult<PurchaseBill> {
    // Settings double as the company existence check: the row is seeded
    // with the company.
    let settings = settings_repo::find_by_company_tx(tx, payload.company_id)
        .await?
        .ok_or(PurchaseError::SettingsNotFound(payload.company_id))?;

    validation::validate_purchase_bill(payload, settings.store_management_enabled)?;

    let fy = fiscal_year_repo::find_by_id_tx(tx, payload.fiscal_year_id)
        .await?
        .filter(|fy| fy.company_id == payload.company_id)
        .ok_or(PurchaseError::FiscalYearNotFound(payload.fiscal_year_id))?;
    validation::check_bill_date_in_fiscal_year(payload.bill_date, &fy)?;

    let supplier = account_repo::find_active_tx(tx, payload.company_id, payload.supplier_account_id)
        .await
        .map_err(map_supplier_err)?;

    let mut items: Vec<Item> = Vec::with_capacity(payload.lines.len());
    for line in &payload.lines {
        let item = item_repo::find_active_tx(tx, payload.company_id, line.item_id)
            .await
            .map_err(map_item_err)?;
        items.push(item);
    }

    validation::check_vat_exempt_items(payload.vat_exempt, &items)?;

    check_stores_tx(tx, payload).await?;

    let math_lines: Vec<LineInput> = payload
        .lines
        .iter()
        .zip(items.iter())
        .map(|(line, item)| LineInput {
            qty: line.qty,
            rate_minor: purchase_math::to_minor(line.rate),
            is_vatable: item.is_vatable,
        })
        .collect();

    let discount_pct_bp = purchase_math::pct_to_bp(payload.discount_pct);
    let computation = purchase_math::compute_bill_money(
        &math_lines,
        discount_pct_bp,
        settings.vat_rate_bp,
        payload.vat_exempt,
    )?;

    let bill = match existing {
        None => {
            let seq =
                bill_counter_repo::next_bill_seq_tx(tx, payload.company_id, payload.fiscal_year_id)
                    .await?;
            let bill_no = format_bill_no(&settings.bill_no_prefix, &fy.label, seq);

            purchase_repo::insert_bill_tx(
                tx,
                NewPurchaseBill {
                    id: Uuid::new_v4(),
                    company_id: payload.company_id,
                    fiscal_year_id: payload.fiscal_year_id,
                    bill_seq: seq,
                    bill_no,
                    supplier_account_id: supplier.id,
                    supplier_bill_no: payload.supplier_bill_no.clone(),
                    bill_date: payload.bill_date,
                    payment_mode: payload.payment_mode,
                    vat_exempt: payload.vat_exempt,
                    discount_pct_bp,
                    money: computation.money.clone(),
                    note: payload.note.clone(),
                },
            )
            .await?
        }
        Some(prev) => {
            purchase_repo::update_bill_tx(
                tx,
                prev.id,
                supplier.id,
                payload.supplier_bill_no.as_deref(),
                payload.bill_date,
                payload.payment_mode,
                payload.vat_exempt,
                discount_pct_bp,
                &computation.money,
                payload.note.as_deref(),
            )
            .await?
        }
    };

    // Lines, stock lots and aggregate quantities move together
    for (idx, (line, amount_minor)) in payload
        .lines
        .iter()
        .zip(computation.line_amounts_minor.iter())
        .enumerate()
    {
        let rate_minor = purchase_math::to_minor(line.rate);

        purchase_repo::insert_line_tx(
            tx,
            NewBillLine {
                id: Uuid::new_v4(),
                purchase_bill_id: bill.id,
                line_no: (idx + 1) as i32,
                item_id: line.item_id,
                batch_no: line.batch_no.clone(),
                expiry_date: line.expiry_date,
                qty: line.qty,
                rate_minor,
                amount_minor: *amount_minor,
                store_id: line.store_id,
                rack_id: line.rack_id,
            },
        )
        .await?;

        stock_repo::insert_tx(
            tx,
            stock_repo::NewStockLot {
                id: Uuid::new_v4(),
                company_id: payload.company_id,
                item_id: line.item_id,
                purchase_bill_id: Some(bill.id),
                batch_no: line.batch_no.clone(),
                expiry_date: line.expiry_date,
                qty: line.qty,
                rate_minor,
                store_id: line.store_id,
                rack_id: line.rack_id,
            },
        )
        .await?;

        item_repo::adjust_stock_tx(tx, line.item_id, line.qty, Some(rate_minor)).await?;
    }

    let accounts = load_posting_accounts_tx(tx, payload.company_id, payload.payment_mode).await?;
    let rows = build_ledger_rows(
        payload.company_id,
        payload.fiscal_year_id,
        bill.id,
        &bill.bill_no,
        payload.bill_date,
        payload.payment_mode,
        supplier.id,
        &accounts,
        &computation.money,
    );

    // Rows must balance before anything commits
    let debits: i64 = rows.iter().map(|r| r.debit_minor).sum();
    let credits: i64 = rows.iter().map(|r| r.credit_minor).sum();
    if debits != credits {
        return Err(PurchaseError::Unbalanced { debits, credits });
    }

    ledger_repo::bulk_insert_tx(tx, rows).await?;

    Ok(bill)
}

/// Every line's store must belong to the bill's company, and every rack
/// to its line's store. Checked whenever a store is given, not only
/// when store management is enabled.
async fn check_stores_tx(
    tx: &mut Transaction<'_, Postgres>,
    payload: &PurchaseBillInput,
) -> PurchaseResult<()> {
    for line in &payload.lines {
        let Some(store_id) = line.store_id else {
            continue;
        };

        let store = store_repo::find_store_by_id_tx(tx, store_id)
            .await?
            .filter(|s| s.company_id == payload.company_id)
            .ok_or(PurchaseError::StoreNotFound(store_id))?;

        if let Some(rack_id) = line.rack_id {
            let rack = store_repo::find_rack_by_id_tx(tx, rack_id).await?;
            match rack {
                Some(r) if r.store_id == store.id => {}
                _ => return Err(PurchaseError::RackMismatch { rack_id, store_id }),
            }
        }
    }

    Ok(())
}

/// The default accounts a posting debits/credits besides the supplier
#[derive(Debug, Clone)]
struct PostingAccounts {
    purchase: Uuid,
    vat_receivable: Uuid,
    rounding: Uuid,
    /// Only resolved for cash bills
    cash: Option<Uuid>,
}

async fn load_posting_accounts_tx(
    tx: &mut Transaction<'_, Postgres>,
    company_id: Uuid,
    payment_mode: PaymentMode,
) -> PurchaseResult<PostingAccounts> {
    let purchase = account_repo::find_by_code_tx(tx, company_id, PURCHASE_ACCOUNT_CODE)
        .await?
        .ok_or(PurchaseError::MissingDefaultAccount("Purchase"))?;
    let vat_receivable = account_repo::find_by_code_tx(tx, company_id, VAT_RECEIVABLE_CODE)
        .await?
        .ok_or(PurchaseError::MissingDefaultAccount("VAT Receivable"))?;
    let rounding = account_repo::find_by_code_tx(tx, company_id, ROUNDING_ACCOUNT_CODE)
        .await?
        .ok_or(PurchaseError::MissingDefaultAccount("Rounding"))?;

    let cash = match payment_mode {
        PaymentMode::Cash => Some(
            account_repo::find_by_code_tx(tx, company_id, CASH_ACCOUNT_CODE)
                .await?
                .ok_or(PurchaseError::MissingDefaultAccount("Cash"))?
                .id,
        ),
        PaymentMode::Credit => None,
    };

    Ok(PostingAccounts {
        purchase: purchase.id,
        vat_receivable: vat_receivable.id,
        rounding: rounding.id,
        cash,
    })
}

/// Build the ledger rows for a posted bill.
///
/// Debit purchases with the discounted base, debit VAT receivable with
/// the VAT, carry the round-off on the side its sign demands, and credit
/// the supplier (credit bill) or the cash account (cash bill) with the
/// grand total. Zero amounts emit no row.
#[allow(clippy::too_many_arguments)]
fn build_ledger_rows(
    company_id: Uuid,
    fiscal_year_id: Uuid,
    bill_id: Uuid,
    bill_no: &str,
    txn_date: NaiveDate,
    payment_mode: PaymentMode,
    supplier_account_id: Uuid,
    accounts: &PostingAccounts,
    money: &BillMoney,
) -> Vec<LedgerInsert> {
    let mut rows = Vec::new();

    let mut push = |account_id: Uuid, source: TxnSource, description: String, debit: i64, credit: i64| {
        rows.push(LedgerInsert {
            id: Uuid::new_v4(),
            company_id,
            fiscal_year_id,
            account_id,
            purchase_bill_id: Some(bill_id),
            txn_date,
            description: Some(description),
            source,
            debit_minor: debit,
            credit_minor: credit,
        });
    };

    if money.taxable_minor > 0 {
        push(
            accounts.purchase,
            TxnSource::Purchase,
            format!("Purchase {bill_no}"),
            money.taxable_minor,
            0,
        );
    }

    if money.vat_minor > 0 {
        push(
            accounts.vat_receivable,
            TxnSource::PurchaseVat,
            format!("VAT on {bill_no}"),
            money.vat_minor,
            0,
        );
    }

    if money.round_off_minor > 0 {
        push(
            accounts.rounding,
            TxnSource::RoundOff,
            format!("Round-off on {bill_no}"),
            money.round_off_minor,
            0,
        );
    } else if money.round_off_minor < 0 {
        push(
            accounts.rounding,
            TxnSource::RoundOff,
            format!("Round-off on {bill_no}"),
            0,
            -money.round_off_minor,
        );
    }

    if money.grand_total_minor > 0 {
        match payment_mode {
            PaymentMode::Credit => push(
                supplier_account_id,
                TxnSource::Purchase,
                format!("Payable for {bill_no}"),
                0,
                money.grand_total_minor,
            ),
            PaymentMode::Cash => {
                // load_posting_accounts_tx resolves cash for cash bills
                let cash = accounts.cash.unwrap_or(supplier_account_id);
                push(
                    cash,
                    TxnSource::Payment,
                    format!("Cash paid for {bill_no}"),
                    0,
                    money.grand_total_minor,
                );
            }
        }
    }

    rows
}
