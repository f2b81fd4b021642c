mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serial_test::serial;
use tower::ServiceExt;
use uuid::Uuid;

async fn ledger_sums(pool: &sqlx::PgPool, bill_id: Uuid) -> (i64, i64) {
    sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT COALESCE(SUM(debit_minor), 0)::BIGINT, COALESCE(SUM(credit_minor), 0)::BIGINT
        FROM ledger_transactions
        WHERE purchase_bill_id = $1
        "#,
    )
    .bind(bill_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// TEST 1: A credit bill posts the header, lines, stock and balanced ledger rows
///
/// 10 x Rs 25.00 vatable at 13% VAT:
///   sub 250.00, VAT 32.50, total 282.50 -> rounds to 283.00 (+0.50)
#[tokio::test]
#[serial]
async fn test_create_purchase_bill_posts_everything() {
    let pool = common::setup_pool().await;
    let company = common::seed_company(&pool).await;
    let fy = common::seed_fiscal_year(
        &pool,
        company.id,
        "2081/82",
        common::date(2024, 7, 16),
        common::date(2025, 7, 15),
    )
    .await;
    let supplier = common::seed_supplier(&pool, company.id).await;
    let item = common::seed_item(&pool, company.id, true).await;

    let body = common::purchase_bill_body(
        company.id,
        fy.id,
        supplier.id,
        "2024-08-01",
        &[(item.id, 10, 25.0)],
    );
    let response = common::app(&pool)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/retailer/purchases")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bill = common::body_json(response).await;
    let bill_id = Uuid::parse_str(bill["id"].as_str().unwrap()).unwrap();

    assert_eq!(bill["bill_no"], "PB-2081/82-1");
    assert_eq!(bill["bill_seq"], 1);
    assert_eq!(bill["payment_mode"], "credit");
    assert_eq!(bill["sub_total_minor"], 25000);
    assert_eq!(bill["discount_minor"], 0);
    assert_eq!(bill["taxable_minor"], 25000);
    assert_eq!(bill["vat_minor"], 3250);
    assert_eq!(bill["round_off_minor"], 50);
    assert_eq!(bill["grand_total_minor"], 28300);

    // Stock applied
    assert_eq!(common::stock_qty(&pool, item.id).await, 10);

    // Ledger rows balance at the grand total
    assert_eq!(common::ledger_row_count(&pool, bill_id).await, 4);
    let (debits, credits) = ledger_sums(&pool, bill_id).await;
    assert_eq!(debits, 28300);
    assert_eq!(credits, 28300);

    // Detail endpoint returns the joined lines
    let response = common::app(&pool)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/retailer/purchases/{bill_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let detail = common::body_json(response).await;
    assert_eq!(detail["bill_no"], "PB-2081/82-1");
    let lines = detail["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["qty"], 10);
    assert_eq!(lines[0]["rate_minor"], 2500);
    assert_eq!(lines[0]["amount_minor"], 25000);
    assert_eq!(lines[0]["item_id"], item.id.to_string());
    assert!(lines[0]["item_name"].as_str().is_some());

    common::cleanup_company(&pool, company.id).await;
    common::teardown_pool(pool).await;
}

/// TEST 2: A VAT-exempt bill containing a vatable item aborts without side effects
#[tokio::test]
#[serial]
async fn test_vat_exempt_bill_with_vatable_item_rejected() {
    let pool = common::setup_pool().await;
    let company = common::seed_company(&pool).await;
    let fy = common::seed_fiscal_year(
        &pool,
        company.id,
        "2081/82",
        common::date(2024, 7, 16),
        common::date(2025, 7, 15),
    )
    .await;
    let supplier = common::seed_supplier(&pool, company.id).await;
    let item = common::seed_item(&pool, company.id, true).await;

    let mut body = common::purchase_bill_body(
        company.id,
        fy.id,
        supplier.id,
        "2024-08-01",
        &[(item.id, 10, 25.0)],
    );
    body["vat_exempt"] = serde_json::json!(true);

    let response = common::app(&pool)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/retailer/purchases")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Nothing was written
    let bills: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM purchase_bills WHERE company_id = $1")
            .bind(company.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(bills, 0);
    let lots: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_lots WHERE company_id = $1")
        .bind(company.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(lots, 0);
    let ledger: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM ledger_transactions WHERE company_id = $1")
            .bind(company.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(ledger, 0);
    assert_eq!(common::stock_qty(&pool, item.id).await, 0);

    common::cleanup_company(&pool, company.id).await;
    common::teardown_pool(pool).await;
}

/// TEST 3: Editing a bill reverses the old effects and applies the new ones
///
/// New lines: 4 x Rs 30.00 vatable -> sub 120.00, VAT 15.60,
/// total 135.60 -> rounds to 136.00 (+0.40)
#[tokio::test]
#[serial]
async fn test_edit_purchase_bill_reapplies_effects() {
    let pool = common::setup_pool().await;
    let company = common::seed_company(&pool).await;
    let fy = common::seed_fiscal_year(
        &pool,
        company.id,
        "2081/82",
        common::date(2024, 7, 16),
        common::date(2025, 7, 15),
    )
    .await;
    let supplier = common::seed_supplier(&pool, company.id).await;
    let item = common::seed_item(&pool, company.id, true).await;

    let body = common::purchase_bill_body(
        company.id,
        fy.id,
        supplier.id,
        "2024-08-01",
        &[(item.id, 10, 25.0)],
    );
    let response = common::app(&pool)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/retailer/purchases")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bill = common::body_json(response).await;
    let bill_id = Uuid::parse_str(bill["id"].as_str().unwrap()).unwrap();

    let body = common::purchase_bill_body(
        company.id,
        fy.id,
        supplier.id,
        "2024-08-05",
        &[(item.id, 4, 30.0)],
    );
    let response = common::app(&pool)
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/retailer/purchases/{bill_id}"))
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let edited = common::body_json(response).await;

    // Number and sequence survive the edit
    assert_eq!(edited["bill_no"], "PB-2081/82-1");
    assert_eq!(edited["bill_seq"], 1);
    assert_eq!(edited["sub_total_minor"], 12000);
    assert_eq!(edited["vat_minor"], 1560);
    assert_eq!(edited["round_off_minor"], 40);
    assert_eq!(edited["grand_total_minor"], 13600);

    // Stock reflects only the new lines
    assert_eq!(common::stock_qty(&pool, item.id).await, 4);
    let lots: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM stock_lots WHERE purchase_bill_id = $1")
            .bind(bill_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(lots, 1);

    // Ledger was replaced, not appended
    let (debits, credits) = ledger_sums(&pool, bill_id).await;
    assert_eq!(debits, 13600);
    assert_eq!(credits, 13600);

    common::cleanup_company(&pool, company.id).await;
    common::teardown_pool(pool).await;
}

/// TEST 4: Deleting a bill rolls back stock and ledger
#[tokio::test]
#[serial]
async fn test_delete_purchase_bill_reverses_effects() {
    let pool = common::setup_pool().await;
    let company = common::seed_company(&pool).await;
    let fy = common::seed_fiscal_year(
        &pool,
        company.id,
        "2081/82",
        common::date(2024, 7, 16),
        common::date(2025, 7, 15),
    )
    .await;
    let supplier = common::seed_supplier(&pool, company.id).await;
    let item = common::seed_item(&pool, company.id, true).await;

    let body = common::purchase_bill_body(
        company.id,
        fy.id,
        supplier.id,
        "2024-08-01",
        &[(item.id, 10, 25.0)],
    );
    let response = common::app(&pool)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/retailer/purchases")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bill = common::body_json(response).await;
    let bill_id = Uuid::parse_str(bill["id"].as_str().unwrap()).unwrap();
    assert_eq!(common::stock_qty(&pool, item.id).await, 10);

    let response = common::app(&pool)
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/retailer/purchases/{bill_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(common::stock_qty(&pool, item.id).await, 0);
    assert_eq!(common::ledger_row_count(&pool, bill_id).await, 0);

    let response = common::app(&pool)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/retailer/purchases/{bill_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    common::cleanup_company(&pool, company.id).await;
    common::teardown_pool(pool).await;
}

/// TEST 5: Bill sequences are never reused after a delete
#[tokio::test]
#[serial]
async fn test_bill_numbers_not_reused() {
    let pool = common::setup_pool().await;
    let company = common::seed_company(&pool).await;
    let fy = common::seed_fiscal_year(
        &pool,
        company.id,
        "2081/82",
        common::date(2024, 7, 16),
        common::date(2025, 7, 15),
    )
    .await;
    let supplier = common::seed_supplier(&pool, company.id).await;
    let item = common::seed_item(&pool, company.id, true).await;

    let body = common::purchase_bill_body(
        company.id,
        fy.id,
        supplier.id,
        "2024-08-01",
        &[(item.id, 1, 10.0)],
    );
    let response = common::app(&pool)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/retailer/purchases")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = common::body_json(response).await;
    assert_eq!(first["bill_no"], "PB-2081/82-1");
    let first_id = Uuid::parse_str(first["id"].as_str().unwrap()).unwrap();

    let response = common::app(&pool)
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/retailer/purchases/{first_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = common::app(&pool)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/retailer/purchases")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second = common::body_json(response).await;
    assert_eq!(second["bill_no"], "PB-2081/82-2");

    common::cleanup_company(&pool, company.id).await;
    common::teardown_pool(pool).await;
}

/// TEST 6: Cash bills credit the cash account, not the supplier
#[tokio::test]
#[serial]
async fn test_cash_bill_credits_cash_account() {
    let pool = common::setup_pool().await;
    let company = common::seed_company(&pool).await;
    let fy = common::seed_fiscal_year(
        &pool,
        company.id,
        "2081/82",
        common::date(2024, 7, 16),
        common::date(2025, 7, 15),
    )
    .await;
    let supplier = common::seed_supplier(&pool, company.id).await;
    let item = common::seed_item(&pool, company.id, true).await;

    let mut body = common::purchase_bill_body(
        company.id,
        fy.id,
        supplier.id,
        "2024-08-01",
        &[(item.id, 10, 100.0)],
    );
    body["payment_mode"] = serde_json::json!("cash");

    let response = common::app(&pool)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/retailer/purchases")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bill = common::body_json(response).await;
    let bill_id = Uuid::parse_str(bill["id"].as_str().unwrap()).unwrap();
    assert_eq!(bill["grand_total_minor"], 113000);

    // The credit side lands on the Cash default account with source 'payment'
    let row: (String, i64) = sqlx::query_as(
        r#"
        SELECT a.code, lt.credit_minor
        FROM ledger_transactions lt
        JOIN accounts a ON a.id = lt.account_id
        WHERE lt.purchase_bill_id = $1 AND lt.source = 'payment'
        "#,
    )
    .bind(bill_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(row.0, "1000");
    assert_eq!(row.1, 113000);

    let supplier_rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM ledger_transactions WHERE purchase_bill_id = $1 AND account_id = $2",
    )
    .bind(bill_id)
    .bind(supplier.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(supplier_rows, 0);

    common::cleanup_company(&pool, company.id).await;
    common::teardown_pool(pool).await;
}

/// TEST 7: Date and reference validation on the posting path
#[tokio::test]
#[serial]
async fn test_purchase_bill_validation() {
    let pool = common::setup_pool().await;
    let company = common::seed_company(&pool).await;
    let fy = common::seed_fiscal_year(
        &pool,
        company.id,
        "2081/82",
        common::date(2024, 7, 16),
        common::date(2025, 7, 15),
    )
    .await;
    let supplier = common::seed_supplier(&pool, company.id).await;
    let item = common::seed_item(&pool, company.id, true).await;

    // Bill date outside the fiscal year
    let body = common::purchase_bill_body(
        company.id,
        fy.id,
        supplier.id,
        "2026-01-01",
        &[(item.id, 1, 10.0)],
    );
    let response = common::app(&pool)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/retailer/purchases")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Unknown supplier account
    let body = common::purchase_bill_body(
        company.id,
        fy.id,
        Uuid::new_v4(),
        "2024-08-01",
        &[(item.id, 1, 10.0)],
    );
    let response = common::app(&pool)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/retailer/purchases")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Zero quantity
    let body = common::purchase_bill_body(
        company.id,
        fy.id,
        supplier.id,
        "2024-08-01",
        &[(item.id, 0, 10.0)],
    );
    let response = common::app(&pool)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/retailer/purchases")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    common::cleanup_company(&pool, company.id).await;
    common::teardown_pool(pool).await;
}

/// TEST 8: A bill cannot be moved to another fiscal year by an edit
#[tokio::test]
#[serial]
async fn test_edit_cannot_move_fiscal_year() {
    let pool = common::setup_pool().await;
    let company = common::seed_company(&pool).await;
    let fy1 = common::seed_fiscal_year(
        &pool,
        company.id,
        "2080/81",
        common::date(2023, 7, 17),
        common::date(2024, 7, 15),
    )
    .await;
    let fy2 = common::seed_fiscal_year(
        &pool,
        company.id,
        "2081/82",
        common::date(2024, 7, 16),
        common::date(2025, 7, 15),
    )
    .await;
    let supplier = common::seed_supplier(&pool, company.id).await;
    let item = common::seed_item(&pool, company.id, true).await;

    let body = common::purchase_bill_body(
        company.id,
        fy1.id,
        supplier.id,
        "2023-08-01",
        &[(item.id, 1, 10.0)],
    );
    let response = common::app(&pool)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/retailer/purchases")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bill = common::body_json(response).await;
    let bill_id = Uuid::parse_str(bill["id"].as_str().unwrap()).unwrap();

    let body = common::purchase_bill_body(
        company.id,
        fy2.id,
        supplier.id,
        "2024-08-01",
        &[(item.id, 1, 10.0)],
    );
    let response = common::app(&pool)
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/retailer/purchases/{bill_id}"))
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    common::cleanup_company(&pool, company.id).await;
    common::teardown_pool(pool).await;
}

/// TEST 9: Bill listing filters by date range and reports the total
#[tokio::test]
#[serial]
async fn test_list_bills_with_filters() {
    let pool = common::setup_pool().await;
    let company = common::seed_company(&pool).await;
    let fy = common::seed_fiscal_year(
        &pool,
        company.id,
        "2081/82",
        common::date(2024, 7, 16),
        common::date(2025, 7, 15),
    )
    .await;
    let supplier = common::seed_supplier(&pool, company.id).await;
    let item = common::seed_item(&pool, company.id, true).await;

    for bill_date in ["2024-08-01", "2024-09-01"] {
        let body = common::purchase_bill_body(
            company.id,
            fy.id,
            supplier.id,
            bill_date,
            &[(item.id, 1, 10.0)],
        );
        let response = common::app(&pool)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/retailer/purchases")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = common::app(&pool)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!(
                    "/api/retailer/purchases?company_id={}&from=2024-08-01&to=2024-08-31",
                    company.id
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = common::body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["bills"].as_array().unwrap().len(), 1);

    // Inverted range
    let response = common::app(&pool)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!(
                    "/api/retailer/purchases?company_id={}&from=2024-09-01&to=2024-08-01",
                    company.id
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    common::cleanup_company(&pool, company.id).await;
    common::teardown_pool(pool).await;
}
