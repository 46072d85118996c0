//! FFI bindings for Synheart Voice
//!
//! This module provides C-compatible functions for calling the scorer from other
//! languages. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `voice_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::inference::SelfReportEstimator;
use crate::pipeline::{score_check_in_json, CheckInProcessor};
use crate::types::{FeatureVector, SelfReport};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Read a required string argument, recording an error when it is unusable
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Option<String> {
    let value = cstr_to_string(ptr);
    if value.is_none() {
        set_last_error(&format!("Invalid {name} string pointer"));
    }
    value
}

// ============================================================================
// Stateless API
// ============================================================================

/// Score a check-in and return the flags as a JSON array.
///
/// # Safety
/// - `features`, `self_report`, and `baseline` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `voice_free_string`.
/// - Returns NULL on error; call `voice_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn voice_score_check_in(
    features: *const c_char,
    self_report: *const c_char,
    baseline: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(features) = required_arg(features, "features") else {
        return ptr::null_mut();
    };
    let Some(self_report) = required_arg(self_report, "self_report") else {
        return ptr::null_mut();
    };
    let Some(baseline) = required_arg(baseline, "baseline") else {
        return ptr::null_mut();
    };

    match score_check_in_json(&features, &self_report, &baseline) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Infer a self-report (`{"stress", "fatigue"}`) from features JSON.
///
/// # Safety
/// - `features` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `voice_free_string`.
/// - Returns NULL on error; call `voice_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn voice_estimate_self_report(features: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(features) = required_arg(features, "features") else {
        return ptr::null_mut();
    };

    let result = serde_json::from_str::<FeatureVector>(&features)
        .map(|f| SelfReportEstimator::default().estimate(&f))
        .and_then(|report| serde_json::to_string(&report));

    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a CheckInProcessor
pub struct VoiceProcessorHandle {
    processor: CheckInProcessor,
}

/// Create a processor backed by the database file at `db_path`.
///
/// # Safety
/// - `db_path` must be a valid null-terminated C string, or NULL for an in-memory store.
/// - Must be freed with `voice_processor_free`.
#[no_mangle]
pub unsafe extern "C" fn voice_processor_new(db_path: *const c_char) -> *mut VoiceProcessorHandle {
    clear_last_error();

    let processor = match cstr_to_string(db_path) {
        Some(path) => CheckInProcessor::open(path),
        None => CheckInProcessor::new(),
    };
    Box::into_raw(Box::new(VoiceProcessorHandle { processor }))
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `voice_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn voice_processor_free(processor: *mut VoiceProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Record and score a check-in. Returns the outcome as JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `voice_processor_new`.
/// - `features` must be a valid null-terminated C string.
/// - `self_report` may be NULL, in which case it is inferred from the features.
/// - Returns a newly allocated string that must be freed with `voice_free_string`.
/// - Returns NULL on error; call `voice_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn voice_processor_submit(
    processor: *mut VoiceProcessorHandle,
    features: *const c_char,
    self_report: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &mut *processor;

    let Some(features) = required_arg(features, "features") else {
        return ptr::null_mut();
    };

    let result = (|| {
        let features: FeatureVector = serde_json::from_str(&features)?;
        let outcome = match cstr_to_string(self_report) {
            Some(json) => {
                let report: SelfReport = serde_json::from_str(&json)?;
                handle.processor.submit(features, report)?
            }
            None => handle.processor.submit_inferred(features)?,
        };
        Ok::<_, crate::error::ComputeError>(serde_json::to_string(&outcome)?)
    })();

    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Current baseline as JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `voice_processor_new`.
/// - Returns a newly allocated string that must be freed with `voice_free_string`.
/// - Returns NULL on error; call `voice_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn voice_processor_baseline(
    processor: *mut VoiceProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    match handle.processor.baseline().to_json() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Free a string returned by any `voice_*` function.
///
/// # Safety
/// - `s` must be a pointer returned by a `voice_*` function, or NULL.
#[no_mangle]
pub unsafe extern "C" fn voice_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Last error message for the calling thread, or NULL.
///
/// # Safety
/// - The returned pointer is valid until the next `voice_*` call on this thread.
/// - Do not free the returned pointer.
#[no_mangle]
pub unsafe extern "C" fn voice_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Library version string.
///
/// # Safety
/// - The returned pointer is static and must not be freed.
#[no_mangle]
pub unsafe extern "C" fn voice_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
