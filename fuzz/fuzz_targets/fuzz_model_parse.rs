//! Fuzz target for fastText binary model parsing.
//!
//! Arbitrary bytes must parse to a model or an error, never a panic, and
//! any model that parses must answer queries without panicking.

#![no_main]

use ft_core::engine::{FastTextModel, TextModel};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(model) = FastTextModel::from_bytes(data) else {
        return;
    };
    // keep parsed models cheap to query
    if model.dimension() > 1024 || model.vocabulary_size() > 4096 {
        return;
    }
    let _ = model.predict("a b c", 3, 0.0);
    assert_eq!(model.word_vector("fuzz").len(), model.dimension());
    assert_eq!(model.word_vector("__label__fuzz").len(), model.dimension());
    let _ = model.nearest_neighbors("a", 2);
});
