//! Sequence generation integration tests for backoffice-service.

mod common;

use backoffice_core::error::AppError;
use backoffice_service::services::sequence::{
    generate_code, generate_complex_code, generate_po_number, generate_so_number,
};
use chrono::{Datelike, Utc};
use serial_test::serial;
use uuid::Uuid;

/// Create a throwaway table carrying a code column, so plain-mode tests
/// never race other suites on shared tables.
async fn scratch_table(db: &backoffice_service::services::Database) -> String {
    let table = format!("seq_probe_{}", Uuid::new_v4().simple());
    sqlx::query(&format!(
        "CREATE TABLE {} (code TEXT, created_utc TIMESTAMPTZ NOT NULL DEFAULT NOW())",
        table
    ))
    .execute(db.pool())
    .await
    .expect("Failed to create scratch table");
    table
}

async fn drop_table(db: &backoffice_service::services::Database, table: &str) {
    sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
        .execute(db.pool())
        .await
        .expect("Failed to drop scratch table");
}

/// Allocate a plain code and persist it in its own transaction.
async fn allocate_plain(
    db: &backoffice_service::services::Database,
    table: &str,
) -> String {
    let mut tx = db.pool().begin().await.expect("begin");
    let code = generate_code(&mut tx, "CMP", table, "code")
        .await
        .expect("Failed to generate code");
    sqlx::query(&format!("INSERT INTO {} (code) VALUES ($1)", table))
        .bind(&code)
        .execute(&mut *tx)
        .await
        .expect("Failed to insert code");
    tx.commit().await.expect("commit");
    code
}

#[tokio::test]
#[serial]
async fn plain_codes_start_at_one_and_increment() {
    let Some(db) = common::try_database().await else {
        return;
    };
    let table = scratch_table(&db).await;

    assert_eq!(allocate_plain(&db, &table).await, "CMP0001");
    assert_eq!(allocate_plain(&db, &table).await, "CMP0002");
    assert_eq!(allocate_plain(&db, &table).await, "CMP0003");

    drop_table(&db, &table).await;
}

#[tokio::test]
#[serial]
async fn rolled_back_allocation_does_not_consume_a_number() {
    let Some(db) = common::try_database().await else {
        return;
    };
    let table = scratch_table(&db).await;

    assert_eq!(allocate_plain(&db, &table).await, "CMP0001");

    // Allocate inside a transaction that rolls back.
    {
        let mut tx = db.pool().begin().await.expect("begin");
        let code = generate_code(&mut tx, "CMP", &table, "code")
            .await
            .expect("Failed to generate code");
        assert_eq!(code, "CMP0002");
        tx.rollback().await.expect("rollback");
    }

    // The next allocation sees the same latest row and reissues 0002.
    assert_eq!(allocate_plain(&db, &table).await, "CMP0002");

    drop_table(&db, &table).await;
}

#[tokio::test]
#[serial]
async fn concurrent_allocations_yield_distinct_codes() {
    let Some(db) = common::try_database().await else {
        return;
    };
    let table = scratch_table(&db).await;

    let mut handles = Vec::new();
    for _ in 0..5 {
        let db = db.clone();
        let table = table.clone();
        handles.push(tokio::spawn(
            async move { allocate_plain(&db, &table).await },
        ));
    }

    let mut codes = Vec::new();
    for handle in handles {
        codes.push(handle.await.expect("allocation task panicked"));
    }
    codes.sort();
    codes.dedup();
    assert_eq!(codes.len(), 5, "codes were reused: {:?}", codes);

    drop_table(&db, &table).await;
}

#[tokio::test]
#[serial]
async fn complex_codes_are_scoped_by_prefix() {
    let Some(db) = common::try_database().await else {
        return;
    };
    let table = scratch_table(&db).await;

    sqlx::query(&format!("INSERT INTO {} (code) VALUES ($1), ($2)", table))
        .bind("CUST-0005")
        .bind("OTHER-0099")
        .execute(db.pool())
        .await
        .expect("Failed to seed codes");

    let mut tx = db.pool().begin().await.expect("begin");
    let code = generate_complex_code(&mut tx, "CUST", &table, "code", false)
        .await
        .expect("Failed to generate complex code");
    tx.commit().await.expect("commit");

    assert_eq!(code, "CUST-0006");

    drop_table(&db, &table).await;
}

#[tokio::test]
#[serial]
async fn year_prefixed_codes_fold_in_the_current_year() {
    let Some(db) = common::try_database().await else {
        return;
    };
    let table = scratch_table(&db).await;

    // A code from an earlier year sits in its own scope.
    sqlx::query(&format!("INSERT INTO {} (code) VALUES ($1)", table))
        .bind("INV2020-0007")
        .execute(db.pool())
        .await
        .expect("Failed to seed old-year code");

    let mut tx = db.pool().begin().await.expect("begin");
    let code = generate_complex_code(&mut tx, "INV", &table, "code", true)
        .await
        .expect("Failed to generate year code");
    tx.commit().await.expect("commit");

    let expected = format!("INV{}-0001", Utc::now().year());
    assert_eq!(code, expected);

    drop_table(&db, &table).await;
}

#[tokio::test]
#[serial]
async fn fresh_company_document_numbers_start_at_one() {
    let Some(db) = common::try_database().await else {
        return;
    };
    let company_id = Uuid::new_v4();

    let mut tx = db.pool().begin().await.expect("begin");
    let po_no = generate_po_number(&mut tx, company_id)
        .await
        .expect("Failed to generate PO number");
    let so_no = generate_so_number(&mut tx, company_id)
        .await
        .expect("Failed to generate SO number");
    tx.rollback().await.expect("rollback");

    assert_eq!(po_no, "PO-0001");
    assert_eq!(so_no, "SO-0001");
}

#[tokio::test]
#[serial]
async fn invalid_scope_identifiers_are_rejected() {
    let Some(db) = common::try_database().await else {
        return;
    };

    let mut tx = db.pool().begin().await.expect("begin");

    let err = generate_code(&mut tx, "CMP", "no_such_table_here", "code")
        .await
        .expect_err("Unknown table should fail");
    assert!(matches!(err, AppError::InvalidScope(_)), "got {:?}", err);

    let err = generate_code(&mut tx, "CMP", "customers; DROP TABLE customers", "code")
        .await
        .expect_err("Malformed identifier should fail");
    assert!(matches!(err, AppError::InvalidScope(_)), "got {:?}", err);

    tx.rollback().await.expect("rollback");
}
