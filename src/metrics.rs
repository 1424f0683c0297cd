use std::sync::LazyLock;

use prometheus::*;

static METRIC_INGEST_IMAGE_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "facesearch_ingest_image_count",
        "count of the images seen during ingestion",
        &["status"]
    )
    .unwrap()
});

static METRIC_STORE_RECORD_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "facesearch_store_record_count",
        "count of the face records written to the index",
        &["status"]
    )
    .unwrap()
});

static METRIC_SEARCH_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "facesearch_search_count",
        "count of the searches by outcome",
        &["outcome"]
    )
    .unwrap()
});

static METRIC_SEARCH_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!("facesearch_search_duration", "duration of the per-image search in seconds")
        .unwrap()
});

/// Count images with and without faces of one batch
pub fn inc_ingest_images(processed: usize, failed: usize) {
    METRIC_INGEST_IMAGE_COUNT.with_label_values(&["processed"]).inc_by(processed as u64);
    METRIC_INGEST_IMAGE_COUNT.with_label_values(&["failed"]).inc_by(failed as u64);
}

pub fn inc_store_record(ok: bool) {
    let status = if ok { "stored" } else { "failed" };
    METRIC_STORE_RECORD_COUNT.with_label_values(&[status]).inc();
}

pub fn inc_search(outcome: &str, duration: f32) {
    METRIC_SEARCH_COUNT.with_label_values(&[outcome]).inc();
    METRIC_SEARCH_DURATION.observe(duration as f64);
}
