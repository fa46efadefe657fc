use once_cell::sync::Lazy;
use prometheus::{register_counter, register_histogram, Counter, Histogram};

pub static RECORDS_ACCEPTED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "etl_records_accepted_total",
        "Total number of records that validated, extracted and enriched successfully."
    )
    .expect("Failed to register RECORDS_ACCEPTED_TOTAL counter")
});

pub static RECORDS_REJECTED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "etl_records_rejected_total",
        "Total number of records routed to the dead-letter sink."
    )
    .expect("Failed to register RECORDS_REJECTED_TOTAL counter")
});

pub static BATCHES_COMPLETED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "etl_batches_completed_total",
        "Total number of batches that reached the Done state."
    )
    .expect("Failed to register BATCHES_COMPLETED_TOTAL counter")
});

pub static BATCHES_FAILED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "etl_batches_failed_total",
        "Total number of batches that ended in the Failed state."
    )
    .expect("Failed to register BATCHES_FAILED_TOTAL counter")
});

pub static NOTIFICATIONS_PUBLISHED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "etl_notifications_published_total",
        "Total number of batch-completed notifications published downstream."
    )
    .expect("Failed to register NOTIFICATIONS_PUBLISHED_TOTAL counter")
});

pub static BATCH_PROCESSING_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "etl_batch_processing_duration_seconds",
        "Histogram of end-to-end batch processing latencies."
    )
    .expect("Failed to register BATCH_PROCESSING_DURATION_SECONDS histogram")
});
