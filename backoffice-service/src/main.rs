//! Entrypoint: load configuration, connect, migrate, report readiness.
//!
//! The subsystem itself is consumed in-process as a library; this binary
//! exists so deployments can run migrations and verify connectivity.

use backoffice_core::error::AppError;
use backoffice_core::observability::init_tracing;
use backoffice_service::config::BackofficeConfig;
use backoffice_service::services::database::Database;
use backoffice_service::services::metrics;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = BackofficeConfig::load()?;
    init_tracing(&config.service_name, &config.log_level);
    metrics::init_metrics();

    let db = Database::new(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;

    db.run_migrations().await?;
    db.health_check().await?;

    info!(service = %config.service_name, "backoffice-service ready");
    Ok(())
}
