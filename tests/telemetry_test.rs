//! Telemetry tests: log configuration and per-query spans.

mod common;

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use common::{path_str, Fixtures};
use ft_core::config::CoreConfig;
use ft_core::telemetry::{LogConfig, LogError, LogFormat, QuerySpan, SpanExt};
use ft_core::Runtime;
use tracing_subscriber::fmt::format::FmtSpan;

// =============================================================================
// LogConfig Tests
// =============================================================================

#[test]
fn log_config_default_is_json() {
    let config = LogConfig::default();
    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, "info");
    assert!(config.output_path.is_none());
}

#[test]
fn log_config_with_output_path() {
    let config = LogConfig {
        format: LogFormat::Json,
        level: "ft_core=trace".to_string(),
        output_path: Some(PathBuf::from("/tmp/ft-core.log")),
    };
    assert_eq!(config.output_path, Some(PathBuf::from("/tmp/ft-core.log")));
}

#[test]
fn log_config_follows_runtime_config() {
    let config = CoreConfig {
        log_level: "ft_core=trace".to_string(),
        log_format: LogFormat::Pretty,
        ..CoreConfig::default()
    };
    let log = LogConfig::from(&config);
    assert_eq!(log.level, "ft_core=trace");
    assert_eq!(log.format, LogFormat::Pretty);
    assert!(log.output_path.is_none());
}

#[test]
fn runtime_rejects_invalid_configured_filter() {
    let runtime = Runtime::new(CoreConfig {
        log_level: "ft_core=loud".to_string(),
        ..CoreConfig::default()
    });
    assert!(matches!(runtime.init_logging(), Err(LogError::InvalidFilter(_))));
}

#[test]
fn runtime_installs_configured_file_logger() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("ft-core.log");
    let runtime = Runtime::new(CoreConfig {
        log_level: "trace".to_string(),
        log_format: LogFormat::Json,
        log_file: Some(log_path.clone()),
        ..CoreConfig::default()
    });

    runtime.init_logging().unwrap();
    assert!(matches!(runtime.init_logging(), Err(LogError::AlreadyInitialized)));

    let logs = std::fs::read_to_string(&log_path).unwrap();
    assert!(logs.contains("logging initialized"), "{}", logs);
    assert!(logs.contains("ft-core.log"), "{}", logs);
}

#[test]
fn log_error_display() {
    let error = LogError::InvalidFilter("bad filter".to_string());
    assert!(error.to_string().contains("Invalid log filter"));
    assert!(error.to_string().contains("bad filter"));
    assert!(LogError::AlreadyInitialized.to_string().contains("already initialized"));
}

// =============================================================================
// Span Tests
// =============================================================================

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Capture {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

fn capturing_subscriber(capture: &Capture) -> impl tracing::Subscriber + Send + Sync {
    let writer = capture.clone();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(false)
        .without_time()
        .with_writer(move || writer.clone())
        .finish()
}

#[test]
fn span_records_result_status() {
    let capture = Capture::default();
    tracing::subscriber::with_default(capturing_subscriber(&capture), || {
        let span = QuerySpan::new("m1", "instance-1", "predict");
        let result: Result<(), String> = Err("boom".to_string());
        span.record_result(&result);
    });

    let logs = capture.text();
    assert!(logs.contains("model_query"), "{}", logs);
    assert!(logs.contains("status=\"error\""), "{}", logs);
    assert!(logs.contains("boom"), "{}", logs);
}

#[test]
fn queries_and_registry_changes_are_logged() {
    let fixtures = Fixtures::new();
    let capture = Capture::default();

    tracing::subscriber::with_default(capturing_subscriber(&capture), || {
        let runtime = Runtime::default();
        runtime.registry().load("m1", path_str(&fixtures.classifier)).unwrap();
        runtime.pipeline("m1").unwrap().predict_top_k("a b", 1).unwrap();
        runtime.registry().unload("m1");
    });

    let logs = capture.text();
    assert!(logs.contains("model loaded"), "{}", logs);
    assert!(logs.contains("model removed"), "{}", logs);
    assert!(logs.contains("model_query"), "{}", logs);
    assert!(logs.contains("operation=\"predict\""), "{}", logs);
    assert!(logs.contains("status=\"ok\""), "{}", logs);
    assert!(logs.contains("results=1"), "{}", logs);
}

#[test]
fn failed_load_is_logged_as_warning() {
    let fixtures = Fixtures::new();
    let capture = Capture::default();

    tracing::subscriber::with_default(capturing_subscriber(&capture), || {
        let runtime = Runtime::default();
        assert!(runtime.registry().load("m1", path_str(&fixtures.path("absent.bin"))).is_err());
    });

    let logs = capture.text();
    assert!(logs.contains("WARN"), "{}", logs);
    assert!(logs.contains("model load failed"), "{}", logs);
}
