//! Customer model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::audit::{AuditFields, Auditable};
use super::ledger::BalanceType;

/// Customer record. The `code` is allocated by the sequence generator at
/// creation; the opening balance is mirrored into `customer_ledgers`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub customer_id: Uuid,
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

impl Customer {
    pub fn parsed_balance_type(&self) -> BalanceType {
        BalanceType::from_string(&self.balance_type)
    }
}

impl Auditable for Customer {
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

/// Input for creating a customer.
#[derive(Debug, Clone)]
pub struct CreateCustomer {
    pub company_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub opening_balance: Option<Decimal>,
    pub balance_type: BalanceType,
    pub audit: AuditFields,
}

impl Auditable for CreateCustomer {
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

/// Input for updating a customer. `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub opening_balance: Option<Decimal>,
    pub balance_type: Option<BalanceType>,
    pub audit: AuditFields,
}

impl Auditable for UpdateCustomer {
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
