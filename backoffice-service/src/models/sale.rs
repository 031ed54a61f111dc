//! Sale document: header plus ordered line items.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::audit::{AuditFields, Auditable};

/// Sale header. `so_no` is either supplied by the caller (checked unique
/// within the company) or allocated by the sequence generator.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sale {
    pub sale_id: Uuid,
    pub company_id: Uuid,
    pub customer_id: Uuid,
    pub so_no: String,
    pub sale_date: NaiveDate,
    pub grand_total: Decimal,
    pub notes: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditFields,
    pub created_utc: DateTime<Utc>,
}

impl Auditable for Sale {
    fn display_name(&self) -> Option<&str> {
        None
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}

/// Persisted sale line with denormalized totals.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SaleDetail {
    pub sale_detail_id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub weight: Decimal,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub total_weight: Decimal,
    pub created_utc: DateTime<Utc>,
}

/// Input line for a new sale.
#[derive(Debug, Clone)]
pub struct CreateSaleLine {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Discount percentage applied to the line subtotal.
    pub discount: Decimal,
    /// Unit weight; the line's total weight scales with quantity.
    pub weight: Decimal,
}

impl CreateSaleLine {
    pub fn subtotal(&self) -> Decimal {
        self.quantity * self.unit_price
    }

    pub fn discount_amount(&self) -> Decimal {
        self.subtotal() * self.discount / Decimal::from(100)
    }

    pub fn total(&self) -> Decimal {
        self.subtotal() - self.discount_amount()
    }

    pub fn total_weight(&self) -> Decimal {
        self.weight * self.quantity
    }
}

/// Input for creating a sale document.
#[derive(Debug, Clone)]
pub struct CreateSale {
    pub company_id: Uuid,
    pub customer_id: Uuid,
    /// Caller-supplied order number; generated when absent.
    pub so_no: Option<String>,
    pub sale_date: NaiveDate,
    pub grand_total: Decimal,
    pub notes: Option<String>,
    pub lines: Vec<CreateSaleLine>,
    pub audit: AuditFields,
}

impl Auditable for CreateSale {
    fn display_name(&self) -> Option<&str> {
        None
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}
