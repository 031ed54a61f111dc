//! Ledger entry model mirroring party opening balances.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Reference text identifying the synthetic opening-balance row.
pub const OPENING_BALANCE_REFERENCE: &str = "Opening Balance";

/// Side of the ledger an opening balance sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceType {
    Debit,
    Credit,
}

impl BalanceType {
    /// Get string representation for database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "credit" => Self::Credit,
            _ => Self::Debit,
        }
    }
}

impl std::fmt::Display for BalanceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which party family a ledger entry belongs to. Customers and suppliers
/// keep symmetric ledgers in separate tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyKind {
    Customer,
    Supplier,
}

impl PartyKind {
    /// Ledger table backing this party family.
    pub fn ledger_table(&self) -> &'static str {
        match self {
            Self::Customer => "customer_ledgers",
            Self::Supplier => "supplier_ledgers",
        }
    }

    /// Foreign-key column naming the owning party.
    pub fn party_column(&self) -> &'static str {
        match self {
            Self::Customer => "customer_id",
            Self::Supplier => "supplier_id",
        }
    }
}

/// One ledger row. `party_id` aliases the customer_id/supplier_id column
/// of the backing table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LedgerEntry {
    pub ledger_id: Uuid,
    pub company_id: Uuid,
    pub party_id: Uuid,
    pub reference: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub balance: Decimal,
    pub balance_type: String,
    pub entry_date: NaiveDate,
    pub created_utc: DateTime<Utc>,
}

impl LedgerEntry {
    /// Get parsed balance type.
    pub fn parsed_balance_type(&self) -> BalanceType {
        BalanceType::from_string(&self.balance_type)
    }
}
