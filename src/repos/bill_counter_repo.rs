use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// Allocate the next bill sequence for (company, fiscal year).
///
/// Single-statement upsert: the first bill of a year inserts the counter
/// row, later bills increment it. The conflicting row stays locked for
/// the rest of the transaction, so concurrent postings serialize here
/// and sequences come out unique. Sequences are never handed back, a
/// deleted bill leaves a gap in the numbering.
pub async fn next_bill_seq_tx(
    tx: &mut Transaction<'_, Postgres>,
    company_id: Uuid,
    fiscal_year_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO bill_counters (company_id, fiscal_year_id, next_seq)
        VALUES ($1, $2, 2)
        ON CONFLICT (company_id, fiscal_year_id)
        DO UPDATE SET next_seq = bill_counters.next_seq + 1
        RETURNING next_seq - 1
        "#,
    )
    .bind(company_id)
    .bind(fiscal_year_id)
    .fetch_one(&mut **tx)
    .await
}
