//! Customer and supplier operations.
//!
//! Creation allocates the party code and mirrors the opening balance
//! into the party's ledger inside a single transaction. Updates re-sync
//! the ledger from the persisted row so both always agree.

use backoffice_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::{
    stamp_create, stamp_restore, stamp_soft_delete, stamp_update, CreateCustomer, CreateSupplier,
    Customer, PartyKind, Supplier, UpdateCustomer, UpdateSupplier,
};
use crate::services::database::Database;
use crate::services::ledger::sync_opening_balance;
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::sequence::generate_code;

const CUSTOMER_COLUMNS: &str = "customer_id, company_id, code, name, email, phone, address, \
     opening_balance, balance_type, slug, created_by, updated_by, deleted_by, deleted_at, created_utc";

const SUPPLIER_COLUMNS: &str = "supplier_id, company_id, code, name, email, phone, address, \
     opening_balance, balance_type, slug, created_by, updated_by, deleted_by, deleted_at, created_utc";

impl Database {
    /// Create a customer, allocate its code, and sync the opening
    /// balance ledger entry in one transaction.
    #[instrument(skip(self, input), fields(company_id = %input.company_id))]
    pub async fn create_customer(
        &self,
        input: &CreateCustomer,
        actor: Uuid,
    ) -> Result<Customer, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_customer"])
            .start_timer();

        let mut input = input.clone();
        stamp_create(&mut input, actor);

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let code = generate_code(&mut tx, "CST", "customers", "code").await?;

        let sql = format!(
            r#"
            INSERT INTO customers (customer_id, company_id, code, name, email, phone, address,
                                   opening_balance, balance_type, slug, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        );
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(Uuid::new_v4())
            .bind(input.company_id)
            .bind(&code)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(input.opening_balance)
            .bind(input.balance_type.as_str())
            .bind(&input.audit.slug)
            .bind(input.audit.created_by)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if e.as_database_error()
                    .map(|d| d.is_unique_violation())
                    .unwrap_or(false)
                {
                    AppError::Conflict(anyhow::anyhow!("Customer code {} already exists", code))
                } else {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to create customer: {}", e))
                }
            })?;

        sync_opening_balance(
            &mut tx,
            PartyKind::Customer,
            customer.company_id,
            customer.customer_id,
            customer.opening_balance,
            customer.parsed_balance_type(),
        )
        .await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        info!(customer_id = %customer.customer_id, code = %customer.code, "Created customer");
        Ok(customer)
    }

    /// Fetch a customer by id, excluding soft-deleted rows.
    #[instrument(skip(self))]
    pub async fn get_customer(
        &self,
        company_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Customer, AppError> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE company_id = $1 AND customer_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Customer>(&sql)
            .bind(company_id)
            .bind(customer_id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to fetch customer: {}", e))
            })?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer {} not found", customer_id)))
    }

    /// Update a customer and re-sync its opening balance ledger entry.
    /// `None` fields keep their stored values; the slug and code are
    /// never rewritten.
    #[instrument(skip(self, input))]
    pub async fn update_customer(
        &self,
        company_id: Uuid,
        customer_id: Uuid,
        input: &UpdateCustomer,
        actor: Uuid,
    ) -> Result<Customer, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_customer"])
            .start_timer();

        let mut input = input.clone();
        stamp_update(&mut input, actor);

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let sql = format!(
            r#"
            UPDATE customers
            SET name = COALESCE($3, name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                address = COALESCE($6, address),
                opening_balance = COALESCE($7, opening_balance),
                balance_type = COALESCE($8, balance_type),
                updated_by = $9
            WHERE company_id = $1 AND customer_id = $2 AND deleted_at IS NULL
            RETURNING {CUSTOMER_COLUMNS}
            "#
        );
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(company_id)
            .bind(customer_id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(input.opening_balance)
            .bind(input.balance_type.map(|b| b.as_str()))
            .bind(input.audit.updated_by)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to update customer: {}", e))
            })?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Customer {} not found", customer_id))
            })?;

        sync_opening_balance(
            &mut tx,
            PartyKind::Customer,
            customer.company_id,
            customer.customer_id,
            customer.opening_balance,
            customer.parsed_balance_type(),
        )
        .await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        info!(customer_id = %customer.customer_id, "Updated customer");
        Ok(customer)
    }

    /// Soft-delete a customer, recording who deleted it and when.
    #[instrument(skip(self))]
    pub async fn delete_customer(
        &self,
        company_id: Uuid,
        customer_id: Uuid,
        actor: Uuid,
    ) -> Result<(), AppError> {
        let mut customer = self.get_customer(company_id, customer_id).await?;
        stamp_soft_delete(&mut customer, actor);

        let result = sqlx::query(
            "UPDATE customers SET deleted_by = $3, deleted_at = $4 \
             WHERE company_id = $1 AND customer_id = $2 AND deleted_at IS NULL",
        )
        .bind(company_id)
        .bind(customer_id)
        .bind(customer.audit.deleted_by)
        .bind(customer.audit.deleted_at)
        .execute(self.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to delete customer: {}", e))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Customer {} not found",
                customer_id
            )));
        }
        info!(customer_id = %customer_id, "Soft-deleted customer");
        Ok(())
    }

    /// Restore a soft-deleted customer, clearing the delete stamps.
    #[instrument(skip(self))]
    pub async fn restore_customer(
        &self,
        company_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Customer, AppError> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE company_id = $1 AND customer_id = $2 AND deleted_at IS NOT NULL"
        );
        let mut customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(company_id)
            .bind(customer_id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to fetch customer: {}", e))
            })?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Deleted customer {} not found", customer_id))
            })?;
        stamp_restore(&mut customer);

        let sql = format!(
            "UPDATE customers SET deleted_by = $3, deleted_at = $4 \
             WHERE company_id = $1 AND customer_id = $2 \
             RETURNING {CUSTOMER_COLUMNS}"
        );
        sqlx::query_as::<_, Customer>(&sql)
            .bind(company_id)
            .bind(customer_id)
            .bind(customer.audit.deleted_by)
            .bind(customer.audit.deleted_at)
            .fetch_one(self.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to restore customer: {}", e))
            })
    }

    /// Create a supplier, allocate its code, and sync the opening
    /// balance ledger entry in one transaction.
    #[instrument(skip(self, input), fields(company_id = %input.company_id))]
    pub async fn create_supplier(
        &self,
        input: &CreateSupplier,
        actor: Uuid,
    ) -> Result<Supplier, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_supplier"])
            .start_timer();

        let mut input = input.clone();
        stamp_create(&mut input, actor);

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let code = generate_code(&mut tx, "SUP", "suppliers", "code").await?;

        let sql = format!(
            r#"
            INSERT INTO suppliers (supplier_id, company_id, code, name, email, phone, address,
                                   opening_balance, balance_type, slug, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {SUPPLIER_COLUMNS}
            "#
        );
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(Uuid::new_v4())
            .bind(input.company_id)
            .bind(&code)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(input.opening_balance)
            .bind(input.balance_type.as_str())
            .bind(&input.audit.slug)
            .bind(input.audit.created_by)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if e.as_database_error()
                    .map(|d| d.is_unique_violation())
                    .unwrap_or(false)
                {
                    AppError::Conflict(anyhow::anyhow!("Supplier code {} already exists", code))
                } else {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to create supplier: {}", e))
                }
            })?;

        sync_opening_balance(
            &mut tx,
            PartyKind::Supplier,
            supplier.company_id,
            supplier.supplier_id,
            supplier.opening_balance,
            supplier.parsed_balance_type(),
        )
        .await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        info!(supplier_id = %supplier.supplier_id, code = %supplier.code, "Created supplier");
        Ok(supplier)
    }

    /// Fetch a supplier by id, excluding soft-deleted rows.
    #[instrument(skip(self))]
    pub async fn get_supplier(
        &self,
        company_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<Supplier, AppError> {
        let sql = format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers \
             WHERE company_id = $1 AND supplier_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Supplier>(&sql)
            .bind(company_id)
            .bind(supplier_id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to fetch supplier: {}", e))
            })?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Supplier {} not found", supplier_id)))
    }

    /// Update a supplier and re-sync its opening balance ledger entry.
    #[instrument(skip(self, input))]
    pub async fn update_supplier(
        &self,
        company_id: Uuid,
        supplier_id: Uuid,
        input: &UpdateSupplier,
        actor: Uuid,
    ) -> Result<Supplier, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_supplier"])
            .start_timer();

        let mut input = input.clone();
        stamp_update(&mut input, actor);

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let sql = format!(
            r#"
            UPDATE suppliers
            SET name = COALESCE($3, name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                address = COALESCE($6, address),
                opening_balance = COALESCE($7, opening_balance),
                balance_type = COALESCE($8, balance_type),
                updated_by = $9
            WHERE company_id = $1 AND supplier_id = $2 AND deleted_at IS NULL
            RETURNING {SUPPLIER_COLUMNS}
            "#
        );
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(company_id)
            .bind(supplier_id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(input.opening_balance)
            .bind(input.balance_type.map(|b| b.as_str()))
            .bind(input.audit.updated_by)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to update supplier: {}", e))
            })?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Supplier {} not found", supplier_id))
            })?;

        sync_opening_balance(
            &mut tx,
            PartyKind::Supplier,
            supplier.company_id,
            supplier.supplier_id,
            supplier.opening_balance,
            supplier.parsed_balance_type(),
        )
        .await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        info!(supplier_id = %supplier.supplier_id, "Updated supplier");
        Ok(supplier)
    }

    /// Soft-delete a supplier, recording who deleted it and when.
    #[instrument(skip(self))]
    pub async fn delete_supplier(
        &self,
        company_id: Uuid,
        supplier_id: Uuid,
        actor: Uuid,
    ) -> Result<(), AppError> {
        let mut supplier = self.get_supplier(company_id, supplier_id).await?;
        stamp_soft_delete(&mut supplier, actor);

        let result = sqlx::query(
            "UPDATE suppliers SET deleted_by = $3, deleted_at = $4 \
             WHERE company_id = $1 AND supplier_id = $2 AND deleted_at IS NULL",
        )
        .bind(company_id)
        .bind(supplier_id)
        .bind(supplier.audit.deleted_by)
        .bind(supplier.audit.deleted_at)
        .execute(self.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to delete supplier: {}", e))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Supplier {} not found",
                supplier_id
            )));
        }
        info!(supplier_id = %supplier_id, "Soft-deleted supplier");
        Ok(())
    }

    /// Restore a soft-deleted supplier, clearing the delete stamps.
    #[instrument(skip(self))]
    pub async fn restore_supplier(
        &self,
        company_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<Supplier, AppError> {
        let sql = format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers \
             WHERE company_id = $1 AND supplier_id = $2 AND deleted_at IS NOT NULL"
        );
        let mut supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(company_id)
            .bind(supplier_id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to fetch supplier: {}", e))
            })?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Deleted supplier {} not found", supplier_id))
            })?;
        stamp_restore(&mut supplier);

        let sql = format!(
            "UPDATE suppliers SET deleted_by = $3, deleted_at = $4 \
             WHERE company_id = $1 AND supplier_id = $2 \
             RETURNING {SUPPLIER_COLUMNS}"
        );
        sqlx::query_as::<_, Supplier>(&sql)
            .bind(company_id)
            .bind(supplier_id)
            .bind(supplier.audit.deleted_by)
            .bind(supplier.audit.deleted_at)
            .fetch_one(self.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to restore supplier: {}", e))
            })
    }
}
