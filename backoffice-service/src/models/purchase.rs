//! Purchase document: header plus ordered line items.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::audit::{AuditFields, Auditable};

/// Purchase header. `po_no` is allocated by the sequence generator in
/// the same transaction that persists the document. `grand_total` is
/// caller-supplied and trusted; only per-line totals are derived here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Purchase {
    pub purchase_id: Uuid,
    pub company_id: Uuid,
    pub supplier_id: Uuid,
    pub po_no: String,
    pub purchase_date: NaiveDate,
    pub grand_total: Decimal,
    pub notes: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditFields,
    pub created_utc: DateTime<Utc>,
}

impl Auditable for Purchase {
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

/// Persisted purchase line with denormalized totals.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PurchaseDetail {
    pub purchase_detail_id: Uuid,
    pub purchase_id: Uuid,
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

/// Input line for a new purchase. Totals are computed from these inputs
/// only, never supplied from outside.
#[derive(Debug, Clone)]
pub struct CreatePurchaseLine {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Discount percentage applied to the line subtotal.
    pub discount: Decimal,
    /// Unit weight; the line's total weight scales with quantity.
    pub weight: Decimal,
}

impl CreatePurchaseLine {
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

/// Input for creating a purchase document.
#[derive(Debug, Clone)]
pub struct CreatePurchase {
    pub company_id: Uuid,
    pub supplier_id: Uuid,
    pub purchase_date: NaiveDate,
    pub grand_total: Decimal,
    pub notes: Option<String>,
    pub lines: Vec<CreatePurchaseLine>,
    pub audit: AuditFields,
}

impl Auditable for CreatePurchase {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i64, unit_price: i64, discount: i64) -> CreatePurchaseLine {
        CreatePurchaseLine {
            product_id: Uuid::new_v4(),
            quantity: Decimal::from(quantity),
            unit_price: Decimal::from(unit_price),
            discount: Decimal::from(discount),
            // 1.5 per unit
            weight: Decimal::new(15, 1),
        }
    }

    #[test]
    fn line_totals_follow_quantity_price_and_discount() {
        let line = line(2, 50, 10);

        assert_eq!(line.subtotal(), Decimal::from(100));
        assert_eq!(line.discount_amount(), Decimal::from(10));
        assert_eq!(line.total(), Decimal::from(90));
        assert_eq!(line.total_weight(), Decimal::from(3));
    }

    #[test]
    fn zero_discount_keeps_total_equal_to_subtotal() {
        let line = line(4, 25, 0);

        assert_eq!(line.total(), line.subtotal());
        assert_eq!(line.total_weight(), Decimal::from(6));
    }
}
