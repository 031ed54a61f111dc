//! Prometheus metrics for backoffice-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "backoffice_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Allocated document numbers by scope kind.
pub static DOCUMENT_NUMBERS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "backoffice_document_numbers_total",
        "Total number of allocated sequence codes by scope kind",
        &["kind"] // plain, complex, purchase, sale
    )
    .expect("Failed to register document_numbers_total")
});

/// Opening-balance ledger synchronizations by outcome.
pub static LEDGER_SYNCS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "backoffice_ledger_syncs_total",
        "Total number of opening balance syncs by outcome",
        &["outcome"] // created, updated, removed
    )
    .expect("Failed to register ledger_syncs_total")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&DOCUMENT_NUMBERS_TOTAL);
    Lazy::force(&LEDGER_SYNCS_TOTAL);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
