use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use retailer_rs::metrics::Metrics;
use retailer_rs::repos::account_group_repo;
use retailer_rs::repos::account_repo::{self, Account, AccountType, NewAccount};
use retailer_rs::repos::company_repo::Company;
use retailer_rs::repos::fiscal_year_repo::{FiscalYear, FyCalendar};
use retailer_rs::repos::item_repo::{self, Item};
use retailer_rs::routes::api_router;
use retailer_rs::services::{company_service, fiscal_year_service};
use retailer_rs::AppState;

/// Connect to the test database and run migrations.
/// Uses a small connection pool with short timeouts for tests.
pub async fn setup_pool() -> PgPool {
    dotenvy::dotenv().ok();

    let url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .idle_timeout(Some(std::time::Duration::from_secs(30)))
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./db/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// Build the full retailer API router with state for testing.
pub fn app(pool: &PgPool) -> Router {
    api_router(Arc::new(AppState {
        pool: pool.clone(),
        metrics: Metrics::new(),
    }))
}

/// Read response body as JSON.
pub async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

pub fn unique_code(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &suffix[..8])
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Create a company with its seeded default groups, accounts, and settings.
pub async fn seed_company(pool: &PgPool) -> Company {
    company_service::create_company(pool, &unique_name("Test Pharma"), None, None, None, "NPR")
        .await
        .expect("Failed to seed test company")
}

/// Create a fiscal year for a company.
pub async fn seed_fiscal_year(
    pool: &PgPool,
    company_id: Uuid,
    label: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> FiscalYear {
    fiscal_year_service::create_fiscal_year(
        pool,
        company_id,
        label,
        FyCalendar::Ad,
        start,
        end,
        true,
    )
    .await
    .expect("Failed to seed test fiscal year")
}

/// Create a supplier party account under the Sundry Creditors group.
pub async fn seed_supplier(pool: &PgPool, company_id: Uuid) -> Account {
    let group = account_group_repo::find_by_name(pool, company_id, "Sundry Creditors")
        .await
        .expect("Failed to query account groups")
        .expect("Sundry Creditors group should be seeded");

    let mut tx = pool.begin().await.expect("Failed to begin transaction");
    let account = account_repo::insert_tx(
        &mut tx,
        NewAccount {
            id: Uuid::new_v4(),
            company_id,
            account_group_id: group.id,
            code: unique_code("SUP"),
            name: unique_name("Supplier"),
            account_type: AccountType::Liability,
            is_default: false,
            pan_no: None,
            address: None,
            phone: None,
        },
    )
    .await
    .expect("Failed to seed test supplier");
    tx.commit().await.expect("Failed to commit");

    account
}

/// Create an item for purchase lines.
pub async fn seed_item(pool: &PgPool, company_id: Uuid, is_vatable: bool) -> Item {
    item_repo::insert(
        pool,
        Uuid::new_v4(),
        company_id,
        &unique_name("Item"),
        "pcs",
        None,
        is_vatable,
        0,
    )
    .await
    .expect("Failed to seed test item")
}

/// Build a minimal purchase bill payload. Lines are (item_id, qty, rate).
pub fn purchase_bill_body(
    company_id: Uuid,
    fiscal_year_id: Uuid,
    supplier_account_id: Uuid,
    bill_date: &str,
    lines: &[(Uuid, i64, f64)],
) -> serde_json::Value {
    let lines: Vec<serde_json::Value> = lines
        .iter()
        .map(|(item_id, qty, rate)| {
            serde_json::json!({
                "item_id": item_id,
                "batch_no": "B-001",
                "qty": qty,
                "rate": rate
            })
        })
        .collect();

    serde_json::json!({
        "company_id": company_id,
        "fiscal_year_id": fiscal_year_id,
        "supplier_account_id": supplier_account_id,
        "bill_date": bill_date,
        "payment_mode": "credit",
        "lines": lines
    })
}

/// Count ledger rows attached to a bill.
pub async fn ledger_row_count(pool: &PgPool, bill_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM ledger_transactions WHERE purchase_bill_id = $1")
        .bind(bill_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count ledger rows")
}

/// Current aggregate stock of an item.
pub async fn stock_qty(pool: &PgPool, item_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT stock_qty FROM items WHERE id = $1")
        .bind(item_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read stock qty")
}

/// Delete everything belonging to a test company, in reverse FK order.
pub async fn cleanup_company(pool: &PgPool, company_id: Uuid) {
    sqlx::query("DELETE FROM ledger_transactions WHERE company_id = $1")
        .bind(company_id)
        .execute(pool)
        .await
        .ok();

    sqlx::query(
        "DELETE FROM account_opening_balances WHERE account_id IN (SELECT id FROM accounts WHERE company_id = $1)"
    )
    .bind(company_id)
    .execute(pool)
    .await
    .ok();

    sqlx::query("DELETE FROM stock_lots WHERE company_id = $1")
        .bind(company_id)
        .execute(pool)
        .await
        .ok();

    sqlx::query("DELETE FROM purchase_bills WHERE company_id = $1")
        .bind(company_id)
        .execute(pool)
        .await
        .ok();

    sqlx::query("DELETE FROM bill_counters WHERE company_id = $1")
        .bind(company_id)
        .execute(pool)
        .await
        .ok();

    sqlx::query("DELETE FROM racks WHERE store_id IN (SELECT id FROM stores WHERE company_id = $1)")
        .bind(company_id)
        .execute(pool)
        .await
        .ok();

    sqlx::query("DELETE FROM stores WHERE company_id = $1")
        .bind(company_id)
        .execute(pool)
        .await
        .ok();

    sqlx::query("DELETE FROM items WHERE company_id = $1")
        .bind(company_id)
        .execute(pool)
        .await
        .ok();

    sqlx::query("DELETE FROM accounts WHERE company_id = $1")
        .bind(company_id)
        .execute(pool)
        .await
        .ok();

    sqlx::query("DELETE FROM account_groups WHERE company_id = $1")
        .bind(company_id)
        .execute(pool)
        .await
        .ok();

    sqlx::query("DELETE FROM settings WHERE company_id = $1")
        .bind(company_id)
        .execute(pool)
        .await
        .ok();

    sqlx::query("DELETE FROM fiscal_years WHERE company_id = $1")
        .bind(company_id)
        .execute(pool)
        .await
        .ok();

    sqlx::query("DELETE FROM companies WHERE id = $1")
        .bind(company_id)
        .execute(pool)
        .await
        .ok();
}

/// Close the pool and release all connections.
pub async fn teardown_pool(pool: PgPool) {
    pool.close().await;
}
