//! Purchase and sale document orchestration.
//!
//! A document is a header plus its lines, written in one transaction.
//! The document number is allocated inside that same transaction, so a
//! failed write rolls back without consuming a number.

use backoffice_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::{
    stamp_create, CreatePurchase, CreateSale, Purchase, PurchaseDetail, Sale, SaleDetail,
};
use crate::services::database::Database;
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::sequence::{generate_po_number, generate_so_number};

const PURCHASE_COLUMNS: &str = "purchase_id, company_id, supplier_id, po_no, purchase_date, \
     grand_total, notes, slug, created_by, updated_by, deleted_by, deleted_at, created_utc";

const SALE_COLUMNS: &str = "sale_id, company_id, customer_id, so_no, sale_date, \
     grand_total, notes, slug, created_by, updated_by, deleted_by, deleted_at, created_utc";

const PURCHASE_DETAIL_COLUMNS: &str = "purchase_detail_id, purchase_id, product_id, quantity, \
     unit_price, discount, weight, subtotal, total, total_weight, created_utc";

const SALE_DETAIL_COLUMNS: &str = "sale_detail_id, sale_id, product_id, quantity, \
     unit_price, discount, weight, subtotal, total, total_weight, created_utc";

impl Database {
    /// Create a purchase document. The PO number is allocated and the
    /// header and every line are written in a single transaction.
    #[instrument(skip(self, input), fields(company_id = %input.company_id))]
    pub async fn create_purchase(
        &self,
        input: &CreatePurchase,
        actor: Uuid,
    ) -> Result<(Purchase, Vec<PurchaseDetail>), AppError> {
        if input.lines.is_empty() {
            return Err(AppError::Validation(anyhow::anyhow!(
                "A purchase needs at least one line"
            )));
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_purchase"])
            .start_timer();

        let mut input = input.clone();
        stamp_create(&mut input, actor);

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let po_no = generate_po_number(&mut tx, input.company_id).await?;

        let sql = format!(
            r#"
            INSERT INTO purchases (purchase_id, company_id, supplier_id, po_no, purchase_date,
                                   grand_total, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PURCHASE_COLUMNS}
            "#
        );
        let purchase = sqlx::query_as::<_, Purchase>(&sql)
            .bind(Uuid::new_v4())
            .bind(input.company_id)
            .bind(input.supplier_id)
            .bind(&po_no)
            .bind(input.purchase_date)
            .bind(input.grand_total)
            .bind(&input.notes)
            .bind(input.audit.created_by)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if e.as_database_error()
                    .map(|d| d.is_unique_violation())
                    .unwrap_or(false)
                {
                    AppError::Conflict(anyhow::anyhow!("PO number {} already exists", po_no))
                } else {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to create purchase: {}", e))
                }
            })?;

        let detail_sql = format!(
            r#"
            INSERT INTO purchase_details (purchase_detail_id, purchase_id, product_id, quantity,
                                          unit_price, discount, weight, subtotal, total, total_weight)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PURCHASE_DETAIL_COLUMNS}
            "#
        );
        let mut details = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let detail = sqlx::query_as::<_, PurchaseDetail>(&detail_sql)
                .bind(Uuid::new_v4())
                .bind(purchase.purchase_id)
                .bind(line.product_id)
                .bind(line.quantity)
                .bind(line.unit_price)
                .bind(line.discount)
                .bind(line.weight)
                .bind(line.subtotal())
                .bind(line.total())
                .bind(line.total_weight())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!(
                        "Failed to create purchase line: {}",
                        e
                    ))
                })?;
            details.push(detail);
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        info!(
            purchase_id = %purchase.purchase_id,
            po_no = %purchase.po_no,
            lines = details.len(),
            "Created purchase"
        );
        Ok((purchase, details))
    }

    /// Fetch a purchase with its lines.
    #[instrument(skip(self))]
    pub async fn get_purchase(
        &self,
        company_id: Uuid,
        purchase_id: Uuid,
    ) -> Result<(Purchase, Vec<PurchaseDetail>), AppError> {
        let sql = format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases \
             WHERE company_id = $1 AND purchase_id = $2 AND deleted_at IS NULL"
        );
        let purchase = sqlx::query_as::<_, Purchase>(&sql)
            .bind(company_id)
            .bind(purchase_id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to fetch purchase: {}", e))
            })?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Purchase {} not found", purchase_id))
            })?;

        let detail_sql = format!(
            "SELECT {PURCHASE_DETAIL_COLUMNS} FROM purchase_details \
             WHERE purchase_id = $1 ORDER BY created_utc"
        );
        let details = sqlx::query_as::<_, PurchaseDetail>(&detail_sql)
            .bind(purchase_id)
            .fetch_all(self.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to fetch purchase lines: {}", e))
            })?;

        Ok((purchase, details))
    }

    /// Create a sale document. The SO number is taken from the caller
    /// when supplied (checked unique within the company) and allocated
    /// by the sequence generator otherwise, in the same transaction as
    /// the header and lines.
    #[instrument(skip(self, input), fields(company_id = %input.company_id))]
    pub async fn create_sale(
        &self,
        input: &CreateSale,
        actor: Uuid,
    ) -> Result<(Sale, Vec<SaleDetail>), AppError> {
        if input.lines.is_empty() {
            return Err(AppError::Validation(anyhow::anyhow!(
                "A sale needs at least one line"
            )));
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_sale"])
            .start_timer();

        let mut input = input.clone();
        stamp_create(&mut input, actor);

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let so_no = match &input.so_no {
            Some(supplied) => supplied.clone(),
            None => generate_so_number(&mut tx, input.company_id).await?,
        };

        let sql = format!(
            r#"
            INSERT INTO sales (sale_id, company_id, customer_id, so_no, sale_date,
                               grand_total, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {SALE_COLUMNS}
            "#
        );
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(Uuid::new_v4())
            .bind(input.company_id)
            .bind(input.customer_id)
            .bind(&so_no)
            .bind(input.sale_date)
            .bind(input.grand_total)
            .bind(&input.notes)
            .bind(input.audit.created_by)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if e.as_database_error()
                    .map(|d| d.is_unique_violation())
                    .unwrap_or(false)
                {
                    AppError::Conflict(anyhow::anyhow!("SO number {} already exists", so_no))
                } else {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to create sale: {}", e))
                }
            })?;

        let detail_sql = format!(
            r#"
            INSERT INTO sale_details (sale_detail_id, sale_id, product_id, quantity,
                                      unit_price, discount, weight, subtotal, total, total_weight)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {SALE_DETAIL_COLUMNS}
            "#
        );
        let mut details = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let detail = sqlx::query_as::<_, SaleDetail>(&detail_sql)
                .bind(Uuid::new_v4())
                .bind(sale.sale_id)
                .bind(line.product_id)
                .bind(line.quantity)
                .bind(line.unit_price)
                .bind(line.discount)
                .bind(line.weight)
                .bind(line.subtotal())
                .bind(line.total())
                .bind(line.total_weight())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to create sale line: {}", e))
                })?;
            details.push(detail);
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        info!(
            sale_id = %sale.sale_id,
            so_no = %sale.so_no,
            lines = details.len(),
            "Created sale"
        );
        Ok((sale, details))
    }

    /// Fetch a sale with its lines.
    #[instrument(skip(self))]
    pub async fn get_sale(
        &self,
        company_id: Uuid,
        sale_id: Uuid,
    ) -> Result<(Sale, Vec<SaleDetail>), AppError> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE company_id = $1 AND sale_id = $2 AND deleted_at IS NULL"
        );
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(company_id)
            .bind(sale_id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to fetch sale: {}", e)))?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Sale {} not found", sale_id)))?;

        let detail_sql = format!(
            "SELECT {SALE_DETAIL_COLUMNS} FROM sale_details \
             WHERE sale_id = $1 ORDER BY created_utc"
        );
        let details = sqlx::query_as::<_, SaleDetail>(&detail_sql)
            .bind(sale_id)
            .fetch_all(self.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to fetch sale lines: {}", e))
            })?;

        Ok((sale, details))
    }
}
