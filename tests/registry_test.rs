//! Registry lifecycle tests: load, replace, remove, concurrency.

mod common;

use std::sync::Arc;
use std::thread;

use common::{path_str, Fixtures, ModelBuilder};
use ft_core::engine::fasttext::FormatError;
use ft_core::engine::QueryLimits;
use ft_core::engine::PredictionPipeline;
use ft_core::error::CoreError;
use ft_core::models::{LoadError, ModelLoader, ModelRegistry};

// ============================================================================
// Load and replace
// ============================================================================

#[test]
fn test_load_records_metadata() {
    let fixtures = Fixtures::new();
    let registry = ModelRegistry::new(ModelLoader::new(None, true));

    let handle = registry.load("m1", path_str(&fixtures.classifier)).unwrap();
    let meta = handle.metadata();
    assert_eq!(meta.name, "m1");
    assert_eq!(meta.size_bytes, std::fs::metadata(&fixtures.classifier).unwrap().len());
    assert_eq!(meta.sha256.as_ref().map(String::len), Some(64));
    assert!(registry.contains("m1"));
    assert_eq!(registry.count(), 1);
}

#[test]
fn test_digest_skipped_when_disabled() {
    let fixtures = Fixtures::new();
    let registry = ModelRegistry::new(ModelLoader::new(None, false));
    let handle = registry.load("m1", path_str(&fixtures.classifier)).unwrap();
    assert!(handle.metadata().sha256.is_none());
}

#[test]
fn test_reload_replaces_mapping() {
    let fixtures = Fixtures::new();
    let registry = ModelRegistry::default();

    let first = registry.load("m", path_str(&fixtures.classifier)).unwrap();
    let second = registry.load("m", path_str(&fixtures.embeddings)).unwrap();

    assert_ne!(first.instance_id(), second.instance_id());
    assert_eq!(registry.count(), 1);
    let current = registry.lookup("m").unwrap();
    assert_eq!(current.instance_id(), second.instance_id());
    assert_eq!(current.model().dimension(), 4);
}

#[test]
fn test_resolved_handle_outlives_replacement_and_removal() {
    let fixtures = Fixtures::new();
    let registry = ModelRegistry::default();
    registry.load("m", path_str(&fixtures.classifier)).unwrap();

    let in_flight = PredictionPipeline::new(registry.lookup("m").unwrap(), QueryLimits::default());

    registry.load("m", path_str(&fixtures.embeddings)).unwrap();
    assert_eq!(in_flight.dimension(), 100);
    assert_eq!(in_flight.predict_top_k("a b c", 2).unwrap().len(), 2);

    registry.unload("m");
    assert!(!registry.contains("m"));
    assert_eq!(in_flight.vocabulary().unwrap().len(), 4);
}

#[test]
fn test_failed_load_keeps_previous_model() {
    let fixtures = Fixtures::new();
    let registry = ModelRegistry::default();
    let original = registry.load("m", path_str(&fixtures.classifier)).unwrap();

    let garbage = fixtures.path("garbage.bin");
    std::fs::write(&garbage, b"definitely not a model").unwrap();
    let err = registry.load("m", path_str(&garbage)).unwrap_err();
    assert!(matches!(err, LoadError::InvalidFormat(_)));

    let missing = registry.load("m", path_str(&fixtures.path("missing.bin"))).unwrap_err();
    assert!(matches!(missing, LoadError::NotFound(_)));

    assert_eq!(registry.lookup("m").unwrap().instance_id(), original.instance_id());
}

#[test]
fn test_truncated_file_is_a_load_failure() {
    let fixtures = Fixtures::new();
    let bytes = ModelBuilder::classifier().to_bytes();
    let path = fixtures.path("truncated.bin");
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    let registry = ModelRegistry::default();
    let err = registry.load("t", path_str(&path)).unwrap_err();
    assert!(matches!(err, LoadError::InvalidFormat(_)));
    assert!(matches!(CoreError::from(err), CoreError::LoadFailure(_)));
    assert_eq!(registry.count(), 0);
}

#[test]
fn test_quantized_model_is_rejected() {
    let fixtures = Fixtures::new();
    let mut builder = ModelBuilder::classifier();
    builder.quantized = true;
    let path = builder.write_to(fixtures.dir.path(), "quantized.ftz");

    let err = ModelRegistry::default().load("q", path_str(&path)).unwrap_err();
    assert!(matches!(err, LoadError::InvalidFormat(FormatError::Quantized)));
}

#[test]
fn test_quantized_output_matrix_is_rejected() {
    let fixtures = Fixtures::new();
    let mut builder = ModelBuilder::classifier();
    builder.quantized_output = true;
    let path = builder.write_to(fixtures.dir.path(), "qout.bin");

    let err = ModelRegistry::default().load("q", path_str(&path)).unwrap_err();
    assert!(matches!(err, LoadError::InvalidFormat(FormatError::Quantized)));
}

#[test]
fn test_non_utf8_words_load_as_distinct_entries() {
    let fixtures = Fixtures::new();
    let path = ModelBuilder::embeddings()
        .with_word_bytes(3, b"apple\xFF")
        .with_word_bytes(4, b"apple\xFE")
        .write_to(fixtures.dir.path(), "raw.bin");

    let registry = ModelRegistry::default();
    let handle = registry.load("raw", path_str(&path)).unwrap();
    let pipeline = PredictionPipeline::new(handle, QueryLimits::default());
    assert_eq!(pipeline.vocabulary_size(), 5);

    let vocabulary = pipeline.vocabulary().unwrap();
    assert_eq!(vocabulary[3], "apple\u{FFFD}");
    assert_eq!(vocabulary[4], "apple\u{FFFD}");
}

#[test]
fn test_empty_name_is_rejected() {
    let fixtures = Fixtures::new();
    let err = ModelRegistry::default().load("", path_str(&fixtures.classifier)).unwrap_err();
    assert!(matches!(err, LoadError::InvalidName(_)));
}

// ============================================================================
// Digest and path policy
// ============================================================================

#[test]
fn test_digest_mismatch_is_rejected() {
    let fixtures = Fixtures::new();
    let registry = ModelRegistry::default();
    let err = registry
        .load_verified("m", path_str(&fixtures.classifier), Some(&"0".repeat(64)))
        .unwrap_err();
    assert!(matches!(err, LoadError::HashMismatch { .. }));
    assert!(!registry.contains("m"));
}

#[test]
fn test_matching_digest_is_accepted_case_insensitively() {
    let fixtures = Fixtures::new();
    let registry = ModelRegistry::default();
    let digest = registry
        .load("first", path_str(&fixtures.classifier))
        .unwrap()
        .metadata()
        .sha256
        .clone()
        .unwrap();

    registry
        .load_verified("m", path_str(&fixtures.classifier), Some(&digest.to_uppercase()))
        .unwrap();
    assert!(registry.contains("m"));
}

#[test]
fn test_paths_outside_root_are_rejected() {
    let fixtures = Fixtures::new();
    let root = fixtures.path("models");
    std::fs::create_dir(&root).unwrap();
    ModelBuilder::embeddings().write_to(&root, "inside.bin");

    let registry = ModelRegistry::new(ModelLoader::new(Some(root.clone()), false));
    registry.load("inside", "inside.bin").unwrap();

    let err = registry.load("outside", path_str(&fixtures.classifier)).unwrap_err();
    assert!(matches!(err, LoadError::PathNotAllowed(_)));

    let err = registry.load("escape", "../classifier.bin").unwrap_err();
    assert!(matches!(err, LoadError::PathNotAllowed(_)));
}

// ============================================================================
// Removal and listing
// ============================================================================

#[test]
fn test_unload_absent_name_is_harmless() {
    let registry = ModelRegistry::default();
    assert!(!registry.unload("never-loaded"));
    assert!(matches!(registry.lookup("never-loaded"), Err(CoreError::ModelNotFound(_))));
}

#[test]
fn test_list_is_sorted_and_serializable() {
    let fixtures = Fixtures::new();
    let registry = ModelRegistry::default();
    registry.load("zeta", path_str(&fixtures.embeddings)).unwrap();
    registry.load("alpha", path_str(&fixtures.classifier)).unwrap();

    let infos = registry.list();
    let names: Vec<&str> = infos.iter().map(|i| i.metadata.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
    assert_eq!(registry.names(), vec!["alpha".to_string(), "zeta".to_string()]);

    let json: serde_json::Value = serde_json::to_value(&infos).unwrap();
    assert_eq!(json[0]["name"], "alpha");
    assert_eq!(json[0]["label_count"], 2);
    assert_eq!(json[1]["dimension"], 4);
    assert_eq!(json[1]["capabilities"], serde_json::json!(["embedding"]));
}

#[test]
fn test_clear_removes_everything() {
    let fixtures = Fixtures::new();
    let registry = ModelRegistry::default();
    registry.load("a", path_str(&fixtures.classifier)).unwrap();
    registry.load("b", path_str(&fixtures.embeddings)).unwrap();
    let held = registry.lookup("a").unwrap();

    registry.clear();
    assert_eq!(registry.count(), 0);
    assert_eq!(held.model().label_count(), 2);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_queries_run_while_models_are_swapped() {
    let fixtures = Fixtures::new();
    let registry = Arc::new(ModelRegistry::default());
    registry.load("m", path_str(&fixtures.classifier)).unwrap();
    let classifier = path_str(&fixtures.classifier).to_string();

    let writer = {
        let registry = registry.clone();
        thread::spawn(move || {
            for i in 0..20 {
                registry.load("m", &classifier).unwrap();
                if i % 5 == 0 {
                    registry.unload("m");
                    registry.load("m", &classifier).unwrap();
                }
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || {
                let mut answered = 0;
                for _ in 0..50 {
                    match registry.lookup("m") {
                        Ok(handle) => {
                            let pipeline = PredictionPipeline::new(handle, QueryLimits::default());
                            let predictions = pipeline.predict_top_k("a b", 2).unwrap();
                            assert_eq!(predictions[0].label, "__label__pos");
                            answered += 1;
                        }
                        Err(CoreError::ModelNotFound(_)) => {}
                        Err(e) => panic!("unexpected error: {}", e),
                    }
                }
                answered
            })
        })
        .collect();

    writer.join().unwrap();
    let answered: usize = readers.into_iter().map(|r| r.join().unwrap()).sum();
    assert!(answered > 0);
    assert!(registry.contains("m"));
}
