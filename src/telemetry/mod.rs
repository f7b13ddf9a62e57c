// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Telemetry module for FT-CORE.
//!
//! Provides structured logging, per-query tracing spans, and metrics
//! recorded through the `metrics` facade. No exporter is installed here;
//! the embedding process decides where metrics go.

mod logging;
mod metrics;
mod spans;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use self::metrics::{record_model_load, record_query, set_models_loaded};
pub use spans::{QuerySpan, SpanExt};
