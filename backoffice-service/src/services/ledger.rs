//! Opening balance synchronization for party ledgers.
//!
//! Each party carries at most one "Opening Balance" ledger row. Creating
//! or updating the party re-syncs that row inside the caller's
//! transaction: a positive balance upserts it, a zero or negative one
//! deletes it.

use backoffice_core::error::AppError;
use rust_decimal::Decimal;
use sqlx::PgConnection;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::{BalanceType, LedgerEntry, PartyKind, OPENING_BALANCE_REFERENCE};
use crate::services::metrics::LEDGER_SYNCS_TOTAL;

/// Split an amount into its debit/credit columns. Exactly one side is
/// non-zero for a positive amount.
pub fn split_balance(amount: Decimal, balance_type: BalanceType) -> (Decimal, Decimal) {
    match balance_type {
        BalanceType::Debit => (amount, Decimal::ZERO),
        BalanceType::Credit => (Decimal::ZERO, amount),
    }
}

/// Bring the party's opening balance ledger row in line with the given
/// balance. Returns the surviving row, or `None` when the balance is
/// absent, zero, or negative and any existing row was removed.
#[instrument(skip(conn, opening_balance))]
pub async fn sync_opening_balance(
    conn: &mut PgConnection,
    kind: PartyKind,
    company_id: Uuid,
    party_id: Uuid,
    opening_balance: Option<Decimal>,
    balance_type: BalanceType,
) -> Result<Option<LedgerEntry>, AppError> {
    let table = kind.ledger_table();
    let party_column = kind.party_column();

    let balance = opening_balance.unwrap_or(Decimal::ZERO);
    if balance <= Decimal::ZERO {
        let sql = format!(
            "DELETE FROM {table} WHERE company_id = $1 AND {party_column} = $2 AND reference = $3",
            table = table,
            party_column = party_column
        );
        let result = sqlx::query(&sql)
            .bind(company_id)
            .bind(party_id)
            .bind(OPENING_BALANCE_REFERENCE)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to remove opening balance: {}",
                    e
                ))
            })?;

        if result.rows_affected() > 0 {
            LEDGER_SYNCS_TOTAL.with_label_values(&["removed"]).inc();
            info!(party_id = %party_id, "Removed opening balance entry");
        }
        return Ok(None);
    }

    let (debit, credit) = split_balance(balance, balance_type);

    let select_sql = format!(
        "SELECT ledger_id FROM {table} WHERE company_id = $1 AND {party_column} = $2 AND reference = $3 FOR UPDATE",
        table = table,
        party_column = party_column
    );
    let existing: Option<Uuid> = sqlx::query_scalar(&select_sql)
        .bind(company_id)
        .bind(party_id)
        .bind(OPENING_BALANCE_REFERENCE)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to read opening balance: {}", e))
        })?;

    let entry = if let Some(ledger_id) = existing {
        let update_sql = format!(
            r#"
            UPDATE {table}
            SET debit = $2, credit = $3, balance = $4, balance_type = $5,
                entry_date = CURRENT_DATE
            WHERE ledger_id = $1
            RETURNING ledger_id, company_id, {party_column} AS party_id, reference,
                      debit, credit, balance, balance_type, entry_date, created_utc
            "#,
            table = table,
            party_column = party_column
        );
        let entry = sqlx::query_as::<_, LedgerEntry>(&update_sql)
            .bind(ledger_id)
            .bind(debit)
            .bind(credit)
            .bind(balance)
            .bind(balance_type.as_str())
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to update opening balance: {}",
                    e
                ))
            })?;

        LEDGER_SYNCS_TOTAL.with_label_values(&["updated"]).inc();
        info!(party_id = %party_id, balance = %balance, "Updated opening balance entry");
        entry
    } else {
        let insert_sql = format!(
            r#"
            INSERT INTO {table} (ledger_id, company_id, {party_column}, reference,
                                 debit, credit, balance, balance_type, entry_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, CURRENT_DATE)
            RETURNING ledger_id, company_id, {party_column} AS party_id, reference,
                      debit, credit, balance, balance_type, entry_date, created_utc
            "#,
            table = table,
            party_column = party_column
        );
        let entry = sqlx::query_as::<_, LedgerEntry>(&insert_sql)
            .bind(Uuid::new_v4())
            .bind(company_id)
            .bind(party_id)
            .bind(OPENING_BALANCE_REFERENCE)
            .bind(debit)
            .bind(credit)
            .bind(balance)
            .bind(balance_type.as_str())
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| {
                if e.as_database_error()
                    .map(|d| d.is_unique_violation())
                    .unwrap_or(false)
                {
                    AppError::Conflict(anyhow::anyhow!(
                        "Opening balance entry already exists for party {}",
                        party_id
                    ))
                } else {
                    AppError::DatabaseError(anyhow::anyhow!(
                        "Failed to insert opening balance: {}",
                        e
                    ))
                }
            })?;

        LEDGER_SYNCS_TOTAL.with_label_values(&["created"]).inc();
        info!(party_id = %party_id, balance = %balance, "Created opening balance entry");
        entry
    };

    Ok(Some(entry))
}
