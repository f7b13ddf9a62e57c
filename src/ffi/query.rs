// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Query functions for FFI.
//!
//! List-shaped results are written through `BufferMarshaller`: the caller
//! passes `max_count` string buffers of `capacity` bytes each (plus a score
//! array for scored results). `out_count` receives how many entries were
//! written; the optional `out_total` receives how many the query produced.
//! When either number of entries or any string was cut, the call returns
//! `BufferTooSmall` with the written data still in place.

use std::ffi::c_char;

use super::error::{fail, guard, set_last_error, str_arg, FtStatus};
use super::marshal::{copy_floats, BufferMarshaller, MarshalReport, StringSlots};
use super::registry::{registry_arg, FtRegistry};
use crate::engine::{InferenceError, PredictionPipeline, ScoredText};
use crate::error::CoreError;

/// Caller buffers for a list-shaped result.
struct ListOutput {
    strings: *const *mut c_char,
    scores: *mut f32,
    max_count: usize,
    capacity: usize,
    out_count: *mut usize,
    out_total: *mut usize,
}

impl ListOutput {
    /// Validate the buffers and zero the counts.
    unsafe fn prepare(&self, scored: bool) -> Result<BufferMarshaller<'_>, FtStatus> {
        if self.out_count.is_null() || (scored && self.max_count > 0 && self.scores.is_null()) {
            set_last_error("null pointer argument");
            return Err(FtStatus::NullPointer);
        }
        *self.out_count = 0;
        if !self.out_total.is_null() {
            *self.out_total = 0;
        }

        let slots = StringSlots::from_raw(self.strings, self.max_count, self.capacity).map_err(|e| {
            set_last_error(e.to_string());
            FtStatus::InvalidParams
        })?;
        if !scored {
            return Ok(BufferMarshaller::new(slots));
        }
        let scores: &mut [f32] = if self.max_count == 0 {
            &mut []
        } else {
            std::slice::from_raw_parts_mut(self.scores, self.max_count)
        };
        Ok(BufferMarshaller::with_scores(slots, scores))
    }

    unsafe fn finish(&self, report: MarshalReport) -> FtStatus {
        *self.out_count = report.written;
        if !self.out_total.is_null() {
            *self.out_total = report.produced;
        }
        match report.into_result() {
            Ok(_) => FtStatus::Ok,
            Err(e) => fail(&e),
        }
    }
}

/// Resolve registry, model name and query text.
unsafe fn resolve<'a>(
    registry: *const FtRegistry,
    name: *const c_char,
    text: *const c_char,
    what: &str,
) -> Result<(PredictionPipeline, &'a str), FtStatus> {
    let reg = registry_arg(registry)?;
    let name = str_arg(name, "name")?;
    let text = str_arg(text, what)?;
    let pipeline = reg.runtime.pipeline(name).map_err(|e| fail(&e))?;
    Ok((pipeline, text))
}

fn k_arg(k: i32) -> Result<usize, FtStatus> {
    usize::try_from(k).map_err(|_| {
        set_last_error(format!("k must not be negative, got {}", k));
        FtStatus::InvalidParams
    })
}

unsafe fn scored_query<T: ScoredText>(
    output: &ListOutput,
    resolved: Result<(PredictionPipeline, &str), FtStatus>,
    run: impl FnOnce(&PredictionPipeline, &str) -> Result<Vec<T>, InferenceError>,
) -> FtStatus {
    let mut marshaller = match output.prepare(true) {
        Ok(m) => m,
        Err(status) => return status,
    };
    let (pipeline, text) = match resolved {
        Ok(resolved) => resolved,
        Err(status) => return status,
    };
    let results = match run(&pipeline, text) {
        Ok(results) => results,
        Err(e) => return fail(&CoreError::from(e)),
    };
    match marshaller.copy_scored(&results) {
        Ok(report) => output.finish(report),
        Err(e) => {
            set_last_error(e.to_string());
            FtStatus::InvalidParams
        }
    }
}

/// Top-`k` labels for `query`, most probable first.
///
/// # Safety
/// `registry` must be live; strings must be NUL-terminated; `labels` must
/// hold `max_count` buffers of `label_capacity` bytes; `probs` must hold
/// `max_count` floats; `out_count` must be writable; `out_total` may be null.
#[no_mangle]
pub unsafe extern "C" fn ft_predict(
    registry: *const FtRegistry,
    name: *const c_char,
    query: *const c_char,
    k: i32,
    labels: *const *mut c_char,
    probs: *mut f32,
    max_count: usize,
    label_capacity: usize,
    out_count: *mut usize,
    out_total: *mut usize,
) -> FtStatus {
    guard("ft_predict", || {
        let output = ListOutput {
            strings: labels,
            scores: probs,
            max_count,
            capacity: label_capacity,
            out_count,
            out_total,
        };
        let k = match k_arg(k) {
            Ok(k) => k,
            Err(status) => return status,
        };
        scored_query(&output, resolve(registry, name, query, "query"), |pipeline, line| {
            pipeline.predict_top_k(line, k)
        })
    })
}

/// Every label ranked for `query`, most probable first. Size the buffers
/// with `ft_get_label_count` to avoid truncation.
///
/// # Safety
/// As for `ft_predict`.
#[no_mangle]
pub unsafe extern "C" fn ft_predict_max_intention(
    registry: *const FtRegistry,
    name: *const c_char,
    query: *const c_char,
    labels: *const *mut c_char,
    probs: *mut f32,
    max_count: usize,
    label_capacity: usize,
    out_count: *mut usize,
    out_total: *mut usize,
) -> FtStatus {
    guard("ft_predict_max_intention", || {
        let output = ListOutput {
            strings: labels,
            scores: probs,
            max_count,
            capacity: label_capacity,
            out_count,
            out_total,
        };
        scored_query(&output, resolve(registry, name, query, "query"), |pipeline, line| {
            pipeline.predict_max_intention(line)
        })
    })
}

/// Up to `k` nearest vocabulary words to `word` by cosine similarity.
///
/// # Safety
/// As for `ft_predict`, with `words`/`similarities` as the output arrays.
#[no_mangle]
pub unsafe extern "C" fn ft_get_nearest_neighbors(
    registry: *const FtRegistry,
    name: *const c_char,
    word: *const c_char,
    k: i32,
    words: *const *mut c_char,
    similarities: *mut f32,
    max_count: usize,
    word_capacity: usize,
    out_count: *mut usize,
    out_total: *mut usize,
) -> FtStatus {
    guard("ft_get_nearest_neighbors", || {
        let output = ListOutput {
            strings: words,
            scores: similarities,
            max_count,
            capacity: word_capacity,
            out_count,
            out_total,
        };
        let k = match k_arg(k) {
            Ok(k) => k,
            Err(status) => return status,
        };
        scored_query(&output, resolve(registry, name, word, "word"), |pipeline, word| {
            pipeline.nearest_neighbors(word, k)
        })
    })
}

/// The model's vocabulary in model order.
///
/// # Safety
/// `registry` must be live; `name` NUL-terminated; `words` must hold
/// `max_count` buffers of `word_capacity` bytes; `out_count` writable;
/// `out_total` may be null.
#[no_mangle]
pub unsafe extern "C" fn ft_list_vocabulary(
    registry: *const FtRegistry,
    name: *const c_char,
    words: *const *mut c_char,
    max_count: usize,
    word_capacity: usize,
    out_count: *mut usize,
    out_total: *mut usize,
) -> FtStatus {
    guard("ft_list_vocabulary", || {
        let output = ListOutput {
            strings: words,
            scores: std::ptr::null_mut(),
            max_count,
            capacity: word_capacity,
            out_count,
            out_total,
        };
        let mut marshaller = match output.prepare(false) {
            Ok(m) => m,
            Err(status) => return status,
        };
        let pipeline = match registry_arg(registry)
            .and_then(|reg| Ok((reg, str_arg(name, "name")?)))
            .and_then(|(reg, name)| reg.runtime.pipeline(name).map_err(|e| fail(&e)))
        {
            Ok(pipeline) => pipeline,
            Err(status) => return status,
        };
        match pipeline.vocabulary() {
            Ok(vocabulary) => output.finish(marshaller.copy_strings(&vocabulary)),
            Err(e) => fail(&CoreError::from(e)),
        }
    })
}

/// Vector for `word`. Unknown words are built from character n-grams, so
/// any word yields a vector.
///
/// `out_dim` receives the model dimension. Passing `capacity == 0` (with
/// `out` null) only queries the dimension. A shorter buffer receives a
/// prefix and `BufferTooSmall`.
///
/// # Safety
/// `registry` must be live; strings NUL-terminated; `out` must hold
/// `capacity` floats; `out_dim` must be writable.
#[no_mangle]
pub unsafe extern "C" fn ft_get_vector(
    registry: *const FtRegistry,
    name: *const c_char,
    word: *const c_char,
    out: *mut f32,
    capacity: usize,
    out_dim: *mut usize,
) -> FtStatus {
    guard("ft_get_vector", || {
        if out_dim.is_null() || (capacity > 0 && out.is_null()) {
            set_last_error("null pointer argument");
            return FtStatus::NullPointer;
        }
        *out_dim = 0;
        let (pipeline, word) = match resolve(registry, name, word, "word") {
            Ok(resolved) => resolved,
            Err(status) => return status,
        };
        let vector = match pipeline.word_vector(word) {
            Ok(vector) => vector,
            Err(e) => return fail(&CoreError::from(e)),
        };
        let out: &mut [f32] = if capacity == 0 {
            &mut []
        } else {
            std::slice::from_raw_parts_mut(out, capacity)
        };
        let report = copy_floats(&vector, out);
        *out_dim = report.produced;
        match report.into_result() {
            Ok(_) => FtStatus::Ok,
            Err(e) => fail(&e),
        }
    })
}

unsafe fn model_size(
    registry: *const FtRegistry,
    name: *const c_char,
    out: *mut usize,
    size: impl FnOnce(&PredictionPipeline) -> usize,
) -> FtStatus {
    if out.is_null() {
        set_last_error("null pointer argument");
        return FtStatus::NullPointer;
    }
    let reg = match registry_arg(registry) {
        Ok(reg) => reg,
        Err(status) => return status,
    };
    let name = match str_arg(name, "name") {
        Ok(name) => name,
        Err(status) => return status,
    };
    match reg.runtime.pipeline(name) {
        Ok(pipeline) => {
            *out = size(&pipeline);
            FtStatus::Ok
        }
        Err(e) => fail(&e),
    }
}

/// Embedding dimension of `name`.
///
/// # Safety
/// `registry` must be live; `name` NUL-terminated; `out` writable.
#[no_mangle]
pub unsafe extern "C" fn ft_get_dimension(
    registry: *const FtRegistry,
    name: *const c_char,
    out: *mut usize,
) -> FtStatus {
    guard("ft_get_dimension", || {
        model_size(registry, name, out, PredictionPipeline::dimension)
    })
}

/// Number of vocabulary words of `name`, labels excluded.
///
/// # Safety
/// As for `ft_get_dimension`.
#[no_mangle]
pub unsafe extern "C" fn ft_get_vocabulary_size(
    registry: *const FtRegistry,
    name: *const c_char,
    out: *mut usize,
) -> FtStatus {
    guard("ft_get_vocabulary_size", || {
        model_size(registry, name, out, PredictionPipeline::vocabulary_size)
    })
}

/// Number of labels of `name`; zero for unsupervised models.
///
/// # Safety
/// As for `ft_get_dimension`.
#[no_mangle]
pub unsafe extern "C" fn ft_get_label_count(
    registry: *const FtRegistry,
    name: *const c_char,
    out: *mut usize,
) -> FtStatus {
    guard("ft_get_label_count", || {
        model_size(registry, name, out, PredictionPipeline::label_count)
    })
}
