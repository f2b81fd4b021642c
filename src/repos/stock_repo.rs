use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

/// A batch of stock received in one bill line. Lots are append-only from
/// the purchase side; editing or deleting a bill removes its lots and
/// rolls the aggregate quantity back.
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct StockLot {
    pub id: Uuid,
    pub company_id: Uuid,
    pub item_id: Uuid,
    pub purchase_bill_id: Option<Uuid>,
    pub batch_no: String,
    pub expiry_date: Option<NaiveDate>,
    pub qty: i64,
    pub rate_minor: i64,
    pub store_id: Option<Uuid>,
    pub rack_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a stock lot
#[derive(Debug, Clone)]
pub struct NewStockLot {
    pub id: Uuid,
    pub company_id: Uuid,
    pub item_id: Uuid,
    pub purchase_bill_id: Option<Uuid>,
    pub batch_no: String,
    pub expiry_date: Option<NaiveDate>,
    pub qty: i64,
    pub rate_minor: i64,
    pub store_id: Option<Uuid>,
    pub rack_id: Option<Uuid>,
}

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    lot: NewStockLot,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO stock_lots
            (id, company_id, item_id, purchase_bill_id, batch_no, expiry_date,
             qty, rate_minor, store_id, rack_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(lot.id)
    .bind(lot.company_id)
    .bind(lot.item_id)
    .bind(lot.purchase_bill_id)
    .bind(&lot.batch_no)
    .bind(lot.expiry_date)
    .bind(lot.qty)
    .bind(lot.rate_minor)
    .bind(lot.store_id)
    .bind(lot.rack_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Delete every lot belonging to a bill, returning (item_id, qty) of the
/// deleted rows so the caller can roll back the aggregate quantities.
pub async fn delete_by_bill_tx(
    tx: &mut Transaction<'_, Postgres>,
    purchase_bill_id: Uuid,
) -> Result<Vec<(Uuid, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (Uuid, i64)>(
        r#"
        DELETE FROM stock_lots
        WHERE purchase_bill_id = $1
        RETURNING item_id, qty
        "#,
    )
    .bind(purchase_bill_id)
    .fetch_all(&mut **tx)
    .await
}

pub async fn list_by_item(pool: &PgPool, item_id: Uuid) -> Result<Vec<StockLot>, sqlx::Error> {
    sqlx::query_as::<_, StockLot>(
        r#"
        SELECT id, company_id, item_id, purchase_bill_id, batch_no, expiry_date,
               qty, rate_minor, store_id, rack_id, created_at
        FROM stock_lots
        WHERE item_id = $1
        ORDER BY expiry_date ASC NULLS LAST, created_at ASC
        "#,
    )
    .bind(item_id)
    .fetch_all(pool)
    .await
}

pub async fn count_for_item(pool: &PgPool, item_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stock_lots WHERE item_id = $1")
        .bind(item_id)
        .fetch_one(pool)
        .await
}

pub async fn count_for_store(pool: &PgPool, store_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stock_lots WHERE store_id = $1")
        .bind(store_id)
        .fetch_one(pool)
        .await
}

pub async fn count_for_rack(pool: &PgPool, rack_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stock_lots WHERE rack_id = $1")
        .bind(rack_id)
        .fetch_one(pool)
        .await
}

/// Recompute every item's aggregate stock_qty from its lots.
///
/// Maintenance operation used by the rebuild_stock binary after manual
/// data surgery. Returns the number of items whose quantity changed.
pub async fn rebuild_aggregates(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE items i
        SET stock_qty = COALESCE(l.total, 0)
        FROM (
            SELECT it.id AS item_id, SUM(sl.qty) AS total
            FROM items it
            LEFT JOIN stock_lots sl ON sl.item_id = it.id
            GROUP BY it.id
        ) l
        WHERE i.id = l.item_id
          AND i.stock_qty IS DISTINCT FROM COALESCE(l.total, 0)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
