// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Metric recording through the `metrics` facade.
//!
//! Calls are no-ops until the host installs a recorder.

use std::time::Duration;

/// Count a finished query and record its latency.
pub fn record_query(operation: &'static str, ok: bool, elapsed: Duration) {
    let status = if ok { "ok" } else { "error" };
    metrics::counter!("ft_core_queries_total", "operation" => operation, "status" => status)
        .increment(1);
    metrics::histogram!("ft_core_query_latency_seconds", "operation" => operation)
        .record(elapsed.as_secs_f64());
}

/// Count a load attempt.
pub fn record_model_load(ok: bool) {
    let status = if ok { "ok" } else { "error" };
    metrics::counter!("ft_core_model_loads_total", "status" => status).increment(1);
}

/// Publish the number of registered models.
pub fn set_models_loaded(count: usize) {
    metrics::gauge!("ft_core_models_loaded").set(count as f64);
}
