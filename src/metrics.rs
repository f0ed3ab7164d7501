use std::time::Duration;

use metrics::{counter, gauge, histogram};

use crate::error::StoreClientError;

pub(crate) fn record_backend_query_bytes_total(backend: &str, op: &str, bytes: usize) {
    counter!(
        "semstore_backend_query_bytes_total",
        "backend" => backend.to_string(),
        "op" => op.to_string()
    )
    .increment(bytes as u64);
}

pub(crate) fn record_backend_result_bytes_total(backend: &str, op: &str, bytes: usize) {
    counter!(
        "semstore_backend_result_bytes_total",
        "backend" => backend.to_string(),
        "op" => op.to_string()
    )
    .increment(bytes as u64);
}

pub(crate) fn record_backend_permit_wait(backend: &str, op: &str, wait: Duration) {
    histogram!(
        "semstore_backend_permit_wait_seconds",
        "backend" => backend.to_string(),
        "op" => op.to_string()
    )
    .record(wait.as_secs_f64());
}

pub(crate) fn record_backend_permit_snapshot(backend: &str, max: usize, available: usize) {
    gauge!(
        "semstore_backend_permits_max",
        "backend" => backend.to_string()
    )
    .set(max as f64);
    gauge!(
        "semstore_backend_permits_available",
        "backend" => backend.to_string()
    )
    .set(available as f64);
}

pub(crate) fn record_backend_operation(
    backend: &str,
    op: &str,
    error: Option<&StoreClientError>,
    duration: Duration,
) {
    let status = if error.is_some() { "error" } else { "ok" };
    let error_class = error.map_or("none", classify_error);

    counter!(
        "semstore_backend_operations_total",
        "backend" => backend.to_string(),
        "op" => op.to_string(),
        "status" => status.to_string(),
        "error_class" => error_class.to_string()
    )
    .increment(1);
    histogram!(
        "semstore_backend_operation_duration_seconds",
        "backend" => backend.to_string(),
        "op" => op.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
}

fn classify_error(error: &StoreClientError) -> &'static str {
    match error {
        StoreClientError::SemaphoreClosed => "semaphore_closed",
        StoreClientError::Http(_) => "http",
        StoreClientError::Io(_) => "io",
        StoreClientError::Backend { status, .. } if *status >= 500 => "backend_5xx",
        StoreClientError::Backend { status, .. } if *status >= 400 => "backend_4xx",
        StoreClientError::Backend { .. } => "backend_other",
        StoreClientError::ConnectionFailed { .. } => "connection_failed",
        StoreClientError::Parse { .. } => "parse_error",
        StoreClientError::MalformedRequest { .. } => "malformed_request",
        StoreClientError::PartialMutation { .. } => "partial_mutation",
        StoreClientError::NotSupported { .. } => "not_supported",
    }
}
