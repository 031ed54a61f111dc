//! Common test utilities for backoffice-service integration tests.
//!
//! Integration tests need a PostgreSQL instance and are skipped when
//! TEST_DATABASE_URL is not set, so the pure-logic suite still runs
//! everywhere.

#![allow(dead_code)]

use backoffice_service::models::{AuditFields, BalanceType, CreateCustomer, CreateSupplier};
use backoffice_service::services::Database;
use rust_decimal::Decimal;
use std::sync::Once;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,backoffice_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Connect to the test database, or return `None` to skip the test when
/// TEST_DATABASE_URL is not set.
pub async fn try_database() -> Option<Database> {
    init_tracing();

    let database_url = std::env::var("TEST_DATABASE_URL").ok()?;
    let db = Database::new(&database_url, 5, 1)
        .await
        .expect("Failed to connect to test database");
    db.run_migrations()
        .await
        .expect("Failed to run migrations");
    Some(db)
}

/// Customer input with the given opening balance.
pub fn customer_input(
    company_id: Uuid,
    name: &str,
    opening_balance: Option<Decimal>,
    balance_type: BalanceType,
) -> CreateCustomer {
    CreateCustomer {
        company_id,
        name: name.to_string(),
        email: None,
        phone: None,
        address: None,
        opening_balance,
        balance_type,
        audit: AuditFields::default(),
    }
}

/// Supplier input with the given opening balance.
pub fn supplier_input(
    company_id: Uuid,
    name: &str,
    opening_balance: Option<Decimal>,
    balance_type: BalanceType,
) -> CreateSupplier {
    CreateSupplier {
        company_id,
        name: name.to_string(),
        email: None,
        phone: None,
        address: None,
        opening_balance,
        balance_type,
        audit: AuditFields::default(),
    }
}

/// Insert a product row to satisfy foreign keys.
pub async fn seed_product(db: &Database, company_id: Uuid) -> Uuid {
    let product_id = Uuid::new_v4();
    sqlx::query("INSERT INTO products (product_id, company_id, name) VALUES ($1, $2, $3)")
        .bind(product_id)
        .bind(company_id)
        .bind(format!("Test Product {}", product_id.simple()))
        .execute(db.pool())
        .await
        .expect("Failed to seed product");
    product_id
}
