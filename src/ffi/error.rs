// Copyright 2024-2026 FT-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Status codes and the per-thread last error message.

use std::cell::RefCell;
use std::ffi::{c_char, CStr, CString};
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::CoreError;
use crate::models::PreloadError;

/// Result status of every `ft_*` function.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtStatus {
    Ok = 0,
    NullPointer = -1,
    InvalidParams = -2,
    ModelNotFound = -7,
    LoadFailure = -8,
    InferenceFailure = -9,
    BufferTooSmall = -10,
    Internal = -99,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

pub(crate) fn set_last_error(msg: impl Into<String>) {
    let mut msg = msg.into();
    // interior NULs would make the message unrepresentable
    msg.retain(|c| c != '\0');
    let msg = CString::new(msg).unwrap_or_default();
    LAST_ERROR.with(|e| *e.borrow_mut() = Some(msg));
}

pub(crate) fn clear_last_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
}

/// Record `err` as the last error and return its status.
pub(crate) fn fail(err: &CoreError) -> FtStatus {
    set_last_error(err.to_string());
    FtStatus::from(err)
}

impl From<&CoreError> for FtStatus {
    fn from(err: &CoreError) -> Self {
        match err {
            CoreError::ModelNotFound(_) => FtStatus::ModelNotFound,
            CoreError::LoadFailure(_) => FtStatus::LoadFailure,
            CoreError::InferenceFailure(e) if e.is_caller_error() => FtStatus::InvalidParams,
            CoreError::InferenceFailure(_) => FtStatus::InferenceFailure,
            CoreError::BufferTooSmall { .. } => FtStatus::BufferTooSmall,
        }
    }
}

impl From<&PreloadError> for FtStatus {
    fn from(_: &PreloadError) -> Self {
        FtStatus::LoadFailure
    }
}

/// Run an entry point body, turning a panic into `Internal`. Clears the
/// previous error first, so a successful call leaves none behind.
///
/// Registry state stays consistent across a panic: locks do not poison and
/// loaded models are immutable.
pub(crate) fn guard<F>(operation: &str, body: F) -> FtStatus
where
    F: FnOnce() -> FtStatus,
{
    clear_last_error();
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(status) => status,
        Err(_) => {
            tracing::error!(operation, "panic at C boundary");
            set_last_error(format!("internal error in {}", operation));
            FtStatus::Internal
        }
    }
}

/// Borrow a C string argument as UTF-8.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn str_arg<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, FtStatus> {
    if ptr.is_null() {
        set_last_error(format!("{} is null", what));
        return Err(FtStatus::NullPointer);
    }
    CStr::from_ptr(ptr).to_str().map_err(|_| {
        set_last_error(format!("invalid UTF-8 in {}", what));
        FtStatus::InvalidParams
    })
}

/// Message of the last failed call on this thread, or null.
///
/// The pointer stays valid until the next `ft_*` call on the same thread.
#[no_mangle]
pub extern "C" fn ft_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(msg) => msg.as_ptr(),
        None => std::ptr::null(),
    })
}

/// Clear the last error message on this thread.
#[no_mangle]
pub extern "C" fn ft_clear_last_error() {
    clear_last_error();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::InferenceError;

    fn last_error() -> Option<String> {
        let ptr = ft_last_error();
        if ptr.is_null() {
            None
        } else {
            Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
        }
    }

    #[test]
    fn core_errors_map_to_distinct_statuses() {
        let not_found = CoreError::ModelNotFound("m".into());
        let inference = CoreError::InferenceFailure(InferenceError::ModelError("nan".into()));
        let caller = CoreError::InferenceFailure(InferenceError::InputValidation("long".into()));
        let small = CoreError::BufferTooSmall { produced: 3, written: 1, truncated_strings: 0 };

        assert_eq!(FtStatus::from(&not_found), FtStatus::ModelNotFound);
        assert_eq!(FtStatus::from(&inference), FtStatus::InferenceFailure);
        assert_eq!(FtStatus::from(&caller), FtStatus::InvalidParams);
        assert_eq!(FtStatus::from(&small), FtStatus::BufferTooSmall);
    }

    #[test]
    fn last_error_is_per_thread() {
        ft_clear_last_error();
        set_last_error("boom\0tail");
        assert_eq!(last_error().as_deref(), Some("boomtail"));

        let other = std::thread::spawn(last_error).join().unwrap();
        assert!(other.is_none());

        ft_clear_last_error();
        assert!(last_error().is_none());
    }

    #[test]
    fn guard_converts_panics() {
        let status = guard("test", || panic!("kaboom"));
        assert_eq!(status, FtStatus::Internal);
        assert!(last_error().unwrap().contains("test"));
    }

    #[test]
    fn null_string_argument_is_reported() {
        let err = unsafe { str_arg(std::ptr::null(), "name") }.unwrap_err();
        assert_eq!(err, FtStatus::NullPointer);
    }
}
