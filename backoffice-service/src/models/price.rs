//! Sell-price schedule model.
//!
//! A schedule binds a product to a price over an optional date interval.
//! Null bounds mean open-ended; the validation layer (not a database
//! constraint) keeps active schedules of one product non-overlapping.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::audit::{AuditFields, Auditable};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SellPrice {
    pub sell_price_id: Uuid,
    pub company_id: Uuid,
    pub product_id: Uuid,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sell_price: Decimal,
    pub market_price: Decimal,
    pub discount: Decimal,
    pub active: bool,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditFields,
    pub created_utc: DateTime<Utc>,
}

impl Auditable for SellPrice {
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

/// Input for creating a price schedule. When `discount` is absent it is
/// derived from the sell and market prices.
#[derive(Debug, Clone)]
pub struct CreateSellPrice {
    pub company_id: Uuid,
    pub product_id: Uuid,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sell_price: Decimal,
    pub market_price: Decimal,
    pub discount: Option<Decimal>,
    pub active: bool,
    pub audit: AuditFields,
}

impl Auditable for CreateSellPrice {
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

/// Input for updating a price schedule.
///
/// `start_date` keeps its stored value when `None`; `end_date` is
/// replaced wholesale so a schedule can be reopened (cleared back to
/// never-ending). `discount` left `None` is re-derived whenever either
/// price changes.
#[derive(Debug, Clone, Default)]
pub struct UpdateSellPrice {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sell_price: Option<Decimal>,
    pub market_price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub active: Option<bool>,
    pub audit: AuditFields,
}

impl Auditable for UpdateSellPrice {
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
