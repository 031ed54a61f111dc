//! Supplier model. Mirrors the customer side: generated code, opening
//! balance synchronized into `supplier_ledgers`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::audit::{AuditFields, Auditable};
use super::ledger::BalanceType;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Supplier {
    pub supplier_id: Uuid,
    pub company_id: Uuid,
    pub code: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub opening_balance: Option<Decimal>,
    pub balance_type: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditFields,
    pub created_utc: DateTime<Utc>,
}

impl Supplier {
    pub fn parsed_balance_type(&self) -> BalanceType {
        BalanceType::from_string(&self.balance_type)
    }
}

impl Auditable for Supplier {
    fn display_name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}

/// Input for creating a supplier.
#[derive(Debug, Clone)]
pub struct CreateSupplier {
    pub company_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub opening_balance: Option<Decimal>,
    pub balance_type: BalanceType,
    pub audit: AuditFields,
}

impl Auditable for CreateSupplier {
    fn display_name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}

/// Input for updating a supplier. `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateSupplier {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub opening_balance: Option<Decimal>,
    pub balance_type: Option<BalanceType>,
    pub audit: AuditFields,
}

impl Auditable for UpdateSupplier {
    fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}
