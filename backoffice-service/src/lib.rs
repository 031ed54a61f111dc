//! Back-office numbering and ledger consistency core.
//!
//! Sequential document numbers (purchase/sales orders, entity codes),
//! opening-balance ledger mirroring for customers and suppliers,
//! price-schedule overlap validation, and audit stamping.

pub mod config;
pub mod models;
pub mod services;
