//! Sequential code generation for documents and party records.
//!
//! Every generator runs against the caller's open transaction and takes
//! a per-scope advisory lock before reading the latest code. The lock is
//! transaction-scoped, so a rolled-back caller releases it without
//! consuming a number and the next caller re-reads the same latest row.

use backoffice_core::error::AppError;
use chrono::{Datelike, Utc};
use sqlx::PgConnection;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::services::metrics::DOCUMENT_NUMBERS_TOTAL;

/// Generate the next plain code for `table.column`, e.g. "CST0001" then
/// "CST0002". The highest existing numeric suffix seeds the counter.
#[instrument(skip(conn))]
pub async fn generate_code(
    conn: &mut PgConnection,
    prefix: &str,
    table: &str,
    column: &str,
) -> Result<String, AppError> {
    ensure_identifier(table)?;
    ensure_identifier(column)?;

    let scope = format!("{}.{}:{}", table, column, prefix);
    lock_scope(conn, &scope).await?;

    // Order by numeric suffix, not insertion timestamp: concurrent
    // transactions serialized by the lock can commit with out-of-order
    // timestamps.
    let sql = format!(
        "SELECT {column} FROM {table} WHERE {column} IS NOT NULL \
         ORDER BY substring({column} FROM '[0-9]+$')::bigint DESC NULLS LAST, created_utc DESC \
         LIMIT 1",
        table = table,
        column = column
    );
    let latest: Option<String> = sqlx::query_scalar(&sql)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_scope_error)?;

    let next = next_from(latest.as_deref());
    let code = format_plain(prefix, next);

    DOCUMENT_NUMBERS_TOTAL.with_label_values(&["plain"]).inc();
    info!(scope = %scope, code = %code, "Generated plain code");
    Ok(code)
}

/// Generate the next prefixed code for `table.column`, e.g. "CUST-0001".
/// With `use_year` the current year is folded into the prefix, so the
/// counter restarts when the year rolls over ("INV2026-0001").
#[instrument(skip(conn))]
pub async fn generate_complex_code(
    conn: &mut PgConnection,
    prefix: &str,
    table: &str,
    column: &str,
    use_year: bool,
) -> Result<String, AppError> {
    ensure_identifier(table)?;
    ensure_identifier(column)?;

    let full_prefix = if use_year {
        format!("{}{}", prefix, Utc::now().year())
    } else {
        prefix.to_string()
    };

    let scope = format!("{}.{}:{}", table, column, full_prefix);
    lock_scope(conn, &scope).await?;

    let sql = format!(
        "SELECT {column} FROM {table} WHERE {column} LIKE $1 \
         ORDER BY substring({column} FROM '[0-9]+$')::bigint DESC NULLS LAST, created_utc DESC \
         LIMIT 1",
        table = table,
        column = column
    );
    let latest: Option<String> = sqlx::query_scalar(&sql)
        .bind(format!("{}%", full_prefix))
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_scope_error)?;

    let next = next_from(latest.as_deref());
    let code = format_complex(&full_prefix, next);

    DOCUMENT_NUMBERS_TOTAL.with_label_values(&["complex"]).inc();
    info!(scope = %scope, code = %code, "Generated complex code");
    Ok(code)
}

/// Allocate the next purchase order number for a company, e.g. "PO-0001".
#[instrument(skip(conn))]
pub async fn generate_po_number(
    conn: &mut PgConnection,
    company_id: Uuid,
) -> Result<String, AppError> {
    let code =
        scoped_document_number(conn, "purchases", "po_no", "PO", company_id).await?;
    DOCUMENT_NUMBERS_TOTAL
        .with_label_values(&["purchase"])
        .inc();
    Ok(code)
}

/// Allocate the next sale order number for a company, e.g. "SO-0001".
#[instrument(skip(conn))]
pub async fn generate_so_number(
    conn: &mut PgConnection,
    company_id: Uuid,
) -> Result<String, AppError> {
    let code = scoped_document_number(conn, "sales", "so_no", "SO", company_id).await?;
    DOCUMENT_NUMBERS_TOTAL.with_label_values(&["sale"]).inc();
    Ok(code)
}

/// Company-scoped document number: the counter is independent per
/// company, so two tenants both start at "PO-0001".
async fn scoped_document_number(
    conn: &mut PgConnection,
    table: &str,
    column: &str,
    prefix: &str,
    company_id: Uuid,
) -> Result<String, AppError> {
    let scope = format!("{}.{}:{}", table, column, company_id);
    lock_scope(conn, &scope).await?;

    let sql = format!(
        "SELECT {column} FROM {table} WHERE company_id = $1 \
         ORDER BY substring({column} FROM '[0-9]+$')::bigint DESC NULLS LAST, created_utc DESC \
         LIMIT 1",
        table = table,
        column = column
    );
    let latest: Option<String> = sqlx::query_scalar(&sql)
        .bind(company_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_scope_error)?;

    let next = next_from(latest.as_deref());
    let code = format_complex(prefix, next);
    info!(scope = %scope, code = %code, "Generated document number");
    Ok(code)
}

/// Serialize concurrent allocations in the same scope. The lock is held
/// until the surrounding transaction commits or rolls back.
async fn lock_scope(conn: &mut PgConnection, scope: &str) -> Result<(), AppError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(scope)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to lock sequence scope: {}", e))
        })?;
    Ok(())
}

/// Reject anything that is not a bare lowercase SQL identifier before it
/// is spliced into a query.
fn ensure_identifier(ident: &str) -> Result<(), AppError> {
    let mut chars = ident.chars();
    let valid_first = chars
        .next()
        .map(|c| c.is_ascii_lowercase() || c == '_')
        .unwrap_or(false);
    if valid_first && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        Ok(())
    } else {
        Err(AppError::InvalidScope(anyhow::anyhow!(
            "Invalid sequence scope identifier: {}",
            ident
        )))
    }
}

/// Missing tables and columns surface as scope errors, not server faults.
fn map_scope_error(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if let Some(code) = db_err.code() {
            // 42P01 undefined_table, 42703 undefined_column
            if code == "42P01" || code == "42703" {
                return AppError::InvalidScope(anyhow::anyhow!(
                    "Unknown sequence scope: {}",
                    db_err.message()
                ));
            }
        }
    }
    AppError::DatabaseError(anyhow::anyhow!("Failed to read latest code: {}", e))
}

/// Extract the trailing digit run of a code and return its value plus
/// one. Codes with no trailing digits restart the counter at 1.
fn next_from(latest: Option<&str>) -> u64 {
    let Some(code) = latest else {
        return 1;
    };
    let digits: String = code
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    match digits.parse::<u64>() {
        Ok(n) => n + 1,
        Err(_) => 1,
    }
}

fn format_plain(prefix: &str, n: u64) -> String {
    format!("{}{:04}", prefix, n)
}

fn format_complex(prefix: &str, n: u64) -> String {
    format!("{}-{:04}", prefix, n)
}
