//! Domain models for backoffice-service.

mod audit;
mod customer;
mod ledger;
mod price;
mod purchase;
mod sale;
mod supplier;

pub use audit::{
    slugify, stamp_create, stamp_restore, stamp_soft_delete, stamp_update, AuditFields, Auditable,
};
pub use customer::{CreateCustomer, Customer, UpdateCustomer};
pub use ledger::{BalanceType, LedgerEntry, PartyKind, OPENING_BALANCE_REFERENCE};
pub use price::{CreateSellPrice, SellPrice, UpdateSellPrice};
pub use purchase::{CreatePurchase, CreatePurchaseLine, Purchase, PurchaseDetail};
pub use sale::{CreateSale, CreateSaleLine, Sale, SaleDetail};
pub use supplier::{CreateSupplier, Supplier, UpdateSupplier};
