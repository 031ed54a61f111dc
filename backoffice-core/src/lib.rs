//! backoffice-core: Shared infrastructure for the back-office services.
pub mod error;
pub mod observability;

pub use anyhow;
pub use tracing;
