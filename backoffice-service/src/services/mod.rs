//! Services module for backoffice-service.

pub mod database;
pub mod documents;
pub mod ledger;
pub mod metrics;
pub mod overlap;
pub mod parties;
pub mod prices;
pub mod sequence;

pub use database::Database;
pub use metrics::{get_metrics, init_metrics};
