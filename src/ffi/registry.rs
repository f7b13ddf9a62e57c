// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Registry lifecycle and process setup over the C ABI.

use std::ffi::c_char;

use super::error::{guard, set_last_error, str_arg, FtStatus};
use crate::config::{self, CoreConfig};
use crate::telemetry::{init_logging, LogConfig, LogError, LogFormat};
use crate::Runtime;

/// Opaque registry handle owned by the caller between create and destroy.
pub struct FtRegistry {
    pub(crate) runtime: Runtime,
}

fn create(config: CoreConfig, out: *mut *mut FtRegistry) -> FtStatus {
    let runtime = match Runtime::with_preload(config) {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::warn!(error = %e, "registry preload failed");
            set_last_error(e.to_string());
            return FtStatus::from(&e);
        }
    };
    let registry = Box::new(FtRegistry { runtime });
    // SAFETY: checked non-null by the caller of this helper.
    unsafe { *out = Box::into_raw(registry) };
    FtStatus::Ok
}

/// Create a registry configured from `FT_CORE_CONFIG` and `FT_CORE_*`
/// variables, preloading the configured manifest if any.
///
/// # Safety
/// `out` must be valid for a pointer write.
#[no_mangle]
pub unsafe extern "C" fn ft_registry_create(out: *mut *mut FtRegistry) -> FtStatus {
    guard("ft_registry_create", || {
        if out.is_null() {
            set_last_error("null pointer argument");
            return FtStatus::NullPointer;
        }
        match config::load() {
            Ok(config) => create(config, out),
            Err(e) => {
                set_last_error(e.to_string());
                FtStatus::InvalidParams
            }
        }
    })
}

/// Create a registry from an inline TOML document, then apply `FT_CORE_*`
/// overrides.
///
/// # Safety
/// `toml` must be a NUL-terminated string; `out` must be valid for a
/// pointer write.
#[no_mangle]
pub unsafe extern "C" fn ft_registry_create_with_config(
    toml: *const c_char,
    out: *mut *mut FtRegistry,
) -> FtStatus {
    guard("ft_registry_create_with_config", || {
        if out.is_null() {
            set_last_error("null pointer argument");
            return FtStatus::NullPointer;
        }
        let text = match str_arg(toml, "config") {
            Ok(text) => text,
            Err(status) => return status,
        };
        match CoreConfig::from_toml_str(text) {
            Ok(config) => create(config.apply_env(), out),
            Err(e) => {
                set_last_error(e.to_string());
                FtStatus::InvalidParams
            }
        }
    })
}

/// Destroy a registry. Null is ignored.
///
/// # Safety
/// `registry` must come from `ft_registry_create*` and must not be used
/// afterwards or concurrently with this call.
#[no_mangle]
pub unsafe extern "C" fn ft_registry_destroy(registry: *mut FtRegistry) {
    if registry.is_null() {
        return;
    }
    guard("ft_registry_destroy", || {
        drop(Box::from_raw(registry));
        FtStatus::Ok
    });
}

fn logging_status(result: Result<(), LogError>) -> FtStatus {
    match result {
        Ok(()) => FtStatus::Ok,
        Err(e) => {
            set_last_error(e.to_string());
            match e {
                LogError::InvalidFilter(_) | LogError::InvalidFormat(_) => FtStatus::InvalidParams,
                LogError::FileOpen { .. } | LogError::AlreadyInitialized => FtStatus::Internal,
            }
        }
    }
}

/// Install the global log subscriber with an explicit filter and format.
/// A null `level` takes the level and log file from `FT_CORE_CONFIG` and
/// the `FT_CORE_LOG_*` variables; `json` still picks the format.
///
/// # Safety
/// `level` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn ft_init_logging(level: *const c_char, json: bool) -> FtStatus {
    guard("ft_init_logging", || {
        let mut config = if level.is_null() {
            match LogConfig::from_env() {
                Ok(config) => config,
                Err(e) => {
                    set_last_error(e.to_string());
                    return FtStatus::InvalidParams;
                }
            }
        } else {
            match str_arg(level, "level") {
                Ok(level) => LogConfig { level: level.to_string(), ..LogConfig::default() },
                Err(status) => return status,
            }
        };
        config.format = if json { LogFormat::Json } else { LogFormat::Pretty };
        logging_status(init_logging(&config))
    })
}

/// Install the global log subscriber from the registry's own configuration.
///
/// # Safety
/// `registry` must be a live pointer from `ft_registry_create*`.
#[no_mangle]
pub unsafe extern "C" fn ft_registry_init_logging(registry: *const FtRegistry) -> FtStatus {
    guard("ft_registry_init_logging", || match registry_arg(registry) {
        Ok(reg) => logging_status(reg.runtime.init_logging()),
        Err(status) => status,
    })
}

/// Borrow the registry behind a C handle.
///
/// # Safety
/// `registry` must be null or a live pointer from `ft_registry_create*`.
pub(crate) unsafe fn registry_arg<'a>(registry: *const FtRegistry) -> Result<&'a FtRegistry, FtStatus> {
    registry.as_ref().ok_or_else(|| {
        set_last_error("registry is null");
        FtStatus::NullPointer
    })
}
