// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Model management functions for FFI

use std::ffi::c_char;

use super::error::{fail, guard, set_last_error, str_arg, FtStatus};
use super::marshal::copy_text;
use super::registry::{registry_arg, FtRegistry};
use crate::error::CoreError;

/// Load the model at `path` under `name`, replacing any model already
/// registered there. On failure the previous model stays in place.
///
/// # Safety
/// `registry` must be live; `name` and `path` must be NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn ft_load_model(
    registry: *const FtRegistry,
    name: *const c_char,
    path: *const c_char,
) -> FtStatus {
    guard("ft_load_model", || load(registry, name, path, None))
}

/// Like `ft_load_model`, also requiring the file's SHA-256 (hex) to match.
///
/// # Safety
/// As for `ft_load_model`; `sha256` must be a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn ft_load_model_verified(
    registry: *const FtRegistry,
    name: *const c_char,
    path: *const c_char,
    sha256: *const c_char,
) -> FtStatus {
    guard("ft_load_model_verified", || {
        let digest = match str_arg(sha256, "sha256") {
            Ok(digest) => digest,
            Err(status) => return status,
        };
        load(registry, name, path, Some(digest))
    })
}

unsafe fn load(
    registry: *const FtRegistry,
    name: *const c_char,
    path: *const c_char,
    sha256: Option<&str>,
) -> FtStatus {
    let (reg, name, path) = match (registry_arg(registry), str_arg(name, "name"), str_arg(path, "path")) {
        (Ok(reg), Ok(name), Ok(path)) => (reg, name, path),
        (Err(status), _, _) | (_, Err(status), _) | (_, _, Err(status)) => return status,
    };
    match reg.runtime.registry().load_verified(name, path, sha256) {
        Ok(_) => FtStatus::Ok,
        Err(e) => fail(&CoreError::LoadFailure(e)),
    }
}

/// Remove `name` from the registry. Removing an unknown name succeeds.
/// Queries already running on the model finish normally.
///
/// # Safety
/// `registry` must be live; `name` must be a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn ft_remove_model(registry: *const FtRegistry, name: *const c_char) -> FtStatus {
    guard("ft_remove_model", || {
        let (reg, name) = match (registry_arg(registry), str_arg(name, "name")) {
            (Ok(reg), Ok(name)) => (reg, name),
            (Err(status), _) | (_, Err(status)) => return status,
        };
        reg.runtime.registry().unload(name);
        FtStatus::Ok
    })
}

/// Number of loaded models.
///
/// # Safety
/// `registry` must be live; `out_count` must be valid for a write.
#[no_mangle]
pub unsafe extern "C" fn ft_model_count(registry: *const FtRegistry, out_count: *mut usize) -> FtStatus {
    guard("ft_model_count", || {
        let reg = match registry_arg(registry) {
            Ok(reg) => reg,
            Err(status) => return status,
        };
        if out_count.is_null() {
            set_last_error("null pointer argument");
            return FtStatus::NullPointer;
        }
        *out_count = reg.runtime.registry().count();
        FtStatus::Ok
    })
}

/// Write a JSON array describing every loaded model into `buffer`.
///
/// `out_len` (nullable) receives the full JSON length in bytes, excluding
/// the terminator. A short buffer gets a NUL-terminated prefix and
/// `BufferTooSmall`.
///
/// # Safety
/// `registry` must be live; `buffer` must be valid for `capacity` bytes.
#[no_mangle]
pub unsafe extern "C" fn ft_list_models_json(
    registry: *const FtRegistry,
    buffer: *mut c_char,
    capacity: usize,
    out_len: *mut usize,
) -> FtStatus {
    guard("ft_list_models_json", || {
        let reg = match registry_arg(registry) {
            Ok(reg) => reg,
            Err(status) => return status,
        };
        if buffer.is_null() {
            set_last_error("null pointer argument");
            return FtStatus::NullPointer;
        }
        let json = match serde_json::to_string(&reg.runtime.registry().list()) {
            Ok(json) => json,
            Err(e) => {
                set_last_error(format!("model listing: {}", e));
                return FtStatus::Internal;
            }
        };
        if !out_len.is_null() {
            *out_len = json.len();
        }
        let out = std::slice::from_raw_parts_mut(buffer.cast::<u8>(), capacity);
        match copy_text(&json, out) {
            Ok(report) => match report.into_result() {
                Ok(_) => FtStatus::Ok,
                Err(e) => fail(&e),
            },
            Err(e) => {
                set_last_error(e.to_string());
                FtStatus::InvalidParams
            }
        }
    })
}
