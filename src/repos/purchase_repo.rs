use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::contracts::purchase_bill::PaymentMode;

/// Purchase bill header. All money fields are integer paisa.
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct PurchaseBill {
    pub id: Uuid,
    pub company_id: Uuid,
    pub fiscal_year_id: Uuid,
    pub bill_seq: i64,
    pub bill_no: String,
    pub supplier_account_id: Uuid,
    pub supplier_bill_no: Option<String>,
    pub bill_date: NaiveDate,
    pub payment_mode: PaymentMode,
    pub vat_exempt: bool,
    pub discount_pct_bp: i32,
    pub sub_total_minor: i64,
    pub discount_minor: i64,
    pub taxable_minor: i64,
    pub vat_minor: i64,
    pub round_off_minor: i64,
    pub grand_total_minor: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Purchase bill line as stored
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct BillLine {
    pub id: Uuid,
    pub purchase_bill_id: Uuid,
    pub line_no: i32,
    pub item_id: Uuid,
    pub batch_no: String,
    pub expiry_date: Option<NaiveDate>,
    pub qty: i64,
    pub rate_minor: i64,
    pub amount_minor: i64,
    pub store_id: Option<Uuid>,
    pub rack_id: Option<Uuid>,
}

/// Bill line joined with item metadata for responses
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct BillLineWithItem {
    pub id: Uuid,
    pub purchase_bill_id: Uuid,
    pub line_no: i32,
    pub item_id: Uuid,
    pub item_name: String,
    pub unit: String,
    pub batch_no: String,
    pub expiry_date: Option<NaiveDate>,
    pub qty: i64,
    pub rate_minor: i64,
    pub amount_minor: i64,
    pub store_id: Option<Uuid>,
    pub rack_id: Option<Uuid>,
}

/// Computed money fields of a bill, produced by the posting math
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillMoney {
    pub sub_total_minor: i64,
    pub discount_minor: i64,
    pub taxable_minor: i64,
    pub vat_minor: i64,
    pub round_off_minor: i64,
    pub grand_total_minor: i64,
}

/// Fields for inserting a bill header
#[derive(Debug, Clone)]
pub struct NewPurchaseBill {
    pub id: Uuid,
    pub company_id: Uuid,
    pub fiscal_year_id: Uuid,
    pub bill_seq: i64,
    pub bill_no: String,
    pub supplier_account_id: Uuid,
    pub supplier_bill_no: Option<String>,
    pub bill_date: NaiveDate,
    pub payment_mode: PaymentMode,
    pub vat_exempt: bool,
    pub discount_pct_bp: i32,
    pub money: BillMoney,
    pub note: Option<String>,
}

pub async fn insert_bill_tx(
    tx: &mut Transaction<'_, Postgres>,
    new: NewPurchaseBill,
) -> Result<PurchaseBill, sqlx::Error> {
    sqlx::query_as::<_, PurchaseBill>(
        r#"
        INSERT INTO purchase_bills
            (id, company_id, fiscal_year_id, bill_seq, bill_no, supplier_account_id,
             supplier_bill_no, bill_date, payment_mode, vat_exempt, discount_pct_bp,
             sub_total_minor, discount_minor, taxable_minor, vat_minor,
             round_off_minor, grand_total_minor, note)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
        RETURNING id, company_id, fiscal_year_id, bill_seq, bill_no, supplier_account_id,
                  supplier_bill_no, bill_date, payment_mode, vat_exempt, discount_pct_bp,
                  sub_total_minor, discount_minor, taxable_minor, vat_minor,
                  round_off_minor, grand_total_minor, note, created_at, updated_at
        "#,
    )
    .bind(new.id)
    .bind(new.company_id)
    .bind(new.fiscal_year_id)
    .bind(new.bill_seq)
    .bind(&new.bill_no)
    .bind(new.supplier_account_id)
    .bind(&new.supplier_bill_no)
    .bind(new.bill_date)
    .bind(new.payment_mode)
    .bind(new.vat_exempt)
    .bind(new.discount_pct_bp)
    .bind(new.money.sub_total_minor)
    .bind(new.money.discount_minor)
    .bind(new.money.taxable_minor)
    .bind(new.money.vat_minor)
    .bind(new.money.round_off_minor)
    .bind(new.money.grand_total_minor)
    .bind(&new.note)
    .fetch_one(&mut **tx)
    .await
}

/// Rewrite the mutable header fields of a bill during an edit. The bill
/// keeps its id, sequence and bill number.
pub async fn update_bill_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    supplier_account_id: Uuid,
    supplier_bill_no: Option<&str>,
    bill_date: NaiveDate,
    payment_mode: PaymentMode,
    vat_exempt: bool,
    discount_pct_bp: i32,
    money: &BillMoney,
    note: Option<&str>,
) -> Result<PurchaseBill, sqlx::Error> {
    sqlx::query_as::<_, PurchaseBill>(
        r#"
        UPDATE purchase_bills
        SET supplier_account_id = $2, supplier_bill_no = $3, bill_date = $4,
            payment_mode = $5, vat_exempt = $6, discount_pct_bp = $7,
            sub_total_minor = $8, discount_minor = $9, taxable_minor = $10,
            vat_minor = $11, round_off_minor = $12, grand_total_minor = $13,
            note = $14, updated_at = NOW()
        WHERE id = $1
        RETURNING id, company_id, fiscal_year_id, bill_seq, bill_no, supplier_account_id,
                  supplier_bill_no, bill_date, payment_mode, vat_exempt, discount_pct_bp,
                  sub_total_minor, discount_minor, taxable_minor, vat_minor,
                  round_off_minor, grand_total_minor, note, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(supplier_account_id)
    .bind(supplier_bill_no)
    .bind(bill_date)
    .bind(payment_mode)
    .bind(vat_exempt)
    .bind(discount_pct_bp)
    .bind(money.sub_total_minor)
    .bind(money.discount_minor)
    .bind(money.taxable_minor)
    .bind(money.vat_minor)
    .bind(money.round_off_minor)
    .bind(money.grand_total_minor)
    .bind(note)
    .fetch_one(&mut **tx)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<PurchaseBill>, sqlx::Error> {
    sqlx::query_as::<_, PurchaseBill>(
        r#"
        SELECT id, company_id, fiscal_year_id, bill_seq, bill_no, supplier_account_id,
               supplier_bill_no, bill_date, payment_mode, vat_exempt, discount_pct_bp,
               sub_total_minor, discount_minor, taxable_minor, vat_minor,
               round_off_minor, grand_total_minor, note, created_at, updated_at
        FROM purchase_bills
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Load a bill for edit/delete, taking a row lock so two reversal passes
/// cannot interleave on the same bill.
pub async fn lock_by_id_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<PurchaseBill>, sqlx::Error> {
    sqlx::query_as::<_, PurchaseBill>(
        r#"
        SELECT id, company_id, fiscal_year_id, bill_seq, bill_no, supplier_account_id,
               supplier_bill_no, bill_date, payment_mode, vat_exempt, discount_pct_bp,
               sub_total_minor, discount_minor, taxable_minor, vat_minor,
               round_off_minor, grand_total_minor, note, created_at, updated_at
        FROM purchase_bills
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
}

/// Fields for inserting a bill line
#[derive(Debug, Clone)]
pub struct NewBillLine {
    pub id: Uuid,
    pub purchase_bill_id: Uuid,
    pub line_no: i32,
    pub item_id: Uuid,
    pub batch_no: String,
    pub expiry_date: Option<NaiveDate>,
    pub qty: i64,
    pub rate_minor: i64,
    pub amount_minor: i64,
    pub store_id: Option<Uuid>,
    pub rack_id: Option<Uuid>,
}

pub async fn insert_line_tx(
    tx: &mut Transaction<'_, Postgres>,
    line: NewBillLine,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO purchase_bill_lines
            (id, purchase_bill_id, line_no, item_id, batch_no, expiry_date,
             qty, rate_minor, amount_minor, store_id, rack_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(line.id)
    .bind(line.purchase_bill_id)
    .bind(line.line_no)
    .bind(line.item_id)
    .bind(&line.batch_no)
    .bind(line.expiry_date)
    .bind(line.qty)
    .bind(line.rate_minor)
    .bind(line.amount_minor)
    .bind(line.store_id)
    .bind(line.rack_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn delete_lines_tx(
    tx: &mut Transaction<'_, Postgres>,
    purchase_bill_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM purchase_bill_lines WHERE purchase_bill_id = $1")
        .bind(purchase_bill_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected())
}

pub async fn delete_bill_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM purchase_bills WHERE id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected())
}

pub async fn fetch_lines(pool: &PgPool, purchase_bill_id: Uuid) -> Result<Vec<BillLine>, sqlx::Error> {
    sqlx::query_as::<_, BillLine>(
        r#"
        SELECT id, purchase_bill_id, line_no, item_id, batch_no, expiry_date,
               qty, rate_minor, amount_minor, store_id, rack_id
        FROM purchase_bill_lines
        WHERE purchase_bill_id = $1
        ORDER BY line_no ASC
        "#,
    )
    .bind(purchase_bill_id)
    .fetch_all(pool)
    .await
}

/// Lines with item name/unit joined, for the bill detail response
pub async fn fetch_lines_with_items(
    pool: &PgPool,
    purchase_bill_id: Uuid,
) -> Result<Vec<BillLineWithItem>, sqlx::Error> {
    sqlx::query_as::<_, BillLineWithItem>(
        r#"
        SELECT
            bl.id,
            bl.purchase_bill_id,
            bl.line_no,
            bl.item_id,
            i.name AS item_name,
            i.unit,
            bl.batch_no,
            bl.expiry_date,
            bl.qty,
            bl.rate_minor,
            bl.amount_minor,
            bl.store_id,
            bl.rack_id
        FROM purchase_bill_lines bl
        INNER JOIN items i ON i.id = bl.item_id
        WHERE bl.purchase_bill_id = $1
        ORDER BY bl.line_no ASC
        "#,
    )
    .bind(purchase_bill_id)
    .fetch_all(pool)
    .await
}

/// Number of bill lines referencing an item (across all bills). Item
/// deletion is refused while this is non-zero.
pub async fn count_lines_for_item(pool: &PgPool, item_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM purchase_bill_lines WHERE item_id = $1")
        .bind(item_id)
        .fetch_one(pool)
        .await
}

/// Filters for the purchase register listing
#[derive(Debug, Clone, Default)]
pub struct BillListFilter {
    pub fiscal_year_id: Option<Uuid>,
    pub supplier_account_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

pub async fn list_bills(
    pool: &PgPool,
    company_id: Uuid,
    filter: &BillListFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<PurchaseBill>, sqlx::Error> {
    sqlx::query_as::<_, PurchaseBill>(
        r#"
        SELECT id, company_id, fiscal_year_id, bill_seq, bill_no, supplier_account_id,
               supplier_bill_no, bill_date, payment_mode, vat_exempt, discount_pct_bp,
               sub_total_minor, discount_minor, taxable_minor, vat_minor,
               round_off_minor, grand_total_minor, note, created_at, updated_at
        FROM purchase_bills
        WHERE company_id = $1
          AND ($2::uuid IS NULL OR fiscal_year_id = $2)
          AND ($3::uuid IS NULL OR supplier_account_id = $3)
          AND ($4::date IS NULL OR bill_date >= $4)
          AND ($5::date IS NULL OR bill_date <= $5)
        ORDER BY bill_date DESC, bill_seq DESC
        LIMIT $6 OFFSET $7
        "#,
    )
    .bind(company_id)
    .bind(filter.fiscal_year_id)
    .bind(filter.supplier_account_id)
    .bind(filter.from)
    .bind(filter.to)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_bills(
    pool: &PgPool,
    company_id: Uuid,
    filter: &BillListFilter,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM purchase_bills
        WHERE company_id = $1
          AND ($2::uuid IS NULL OR fiscal_year_id = $2)
          AND ($3::uuid IS NULL OR supplier_account_id = $3)
          AND ($4::date IS NULL OR bill_date >= $4)
          AND ($5::date IS NULL OR bill_date <= $5)
        "#,
    )
    .bind(company_id)
    .bind(filter.fiscal_year_id)
    .bind(filter.supplier_account_id)
    .bind(filter.from)
    .bind(filter.to)
    .fetch_one(pool)
    .await
}
