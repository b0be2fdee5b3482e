//! FFI bindings for Trackwise
//!
//! This module provides C-compatible functions for calling the insight engine
//! from mobile and desktop hosts. Inputs are null-terminated JSON strings and
//! results are allocated JSON strings that must be freed by the caller using
//! `trackwise_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use serde::Serialize;

use crate::analysis::{correlate_metrics, metric_trend};
use crate::config::DEFAULT_TREND_WINDOW;
use crate::error::InsightError;
use crate::report::generate_insight_report;
use crate::types::{parse_entries, parse_metrics, MetricId};

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

/// Read a required string argument, recording an error naming it when invalid
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Option<String> {
    let value = cstr_to_string(ptr);
    if value.is_none() {
        set_last_error(&format!("Invalid {} string pointer", name));
    }
    value
}

/// Serialize a result to an allocated JSON string, or record the error
fn respond<T: Serialize>(result: Result<T, InsightError>) -> *mut c_char {
    match result.and_then(|value| Ok(serde_json::to_string(&value)?)) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Build an insight report from entries and metrics JSON arrays.
///
/// # Safety
/// - `entries_json` and `metrics_json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `trackwise_free_string`.
/// - Returns NULL on error; call `trackwise_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn trackwise_generate_report(
    entries_json: *const c_char,
    metrics_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(entries_str) = required_arg(entries_json, "entries JSON") else {
        return ptr::null_mut();
    };
    let Some(metrics_str) = required_arg(metrics_json, "metrics JSON") else {
        return ptr::null_mut();
    };

    respond(parse_entries(&entries_str).and_then(|entries| {
        let metrics = parse_metrics(&metrics_str)?;
        Ok(generate_insight_report(&entries, &metrics))
    }))
}

/// Compute the moving-average trend of one metric.
///
/// A `window_size` of zero or less uses the default window of 7. The JSON
/// result is `null` when the metric has fewer than two numeric values.
///
/// # Safety
/// - `entries_json` and `metric_id` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `trackwise_free_string`.
/// - Returns NULL on error; call `trackwise_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn trackwise_metric_trend(
    entries_json: *const c_char,
    metric_id: *const c_char,
    window_size: i32,
) -> *mut c_char {
    clear_last_error();

    let Some(entries_str) = required_arg(entries_json, "entries JSON") else {
        return ptr::null_mut();
    };
    let Some(metric_str) = required_arg(metric_id, "metric_id") else {
        return ptr::null_mut();
    };

    let window = if window_size <= 0 {
        DEFAULT_TREND_WINDOW
    } else {
        window_size as usize
    };

    respond(
        parse_entries(&entries_str)
            .map(|entries| metric_trend(&entries, &MetricId::new(metric_str), window)),
    )
}

/// Correlate two metrics.
///
/// The JSON result is `null` when fewer than three entries carry both metrics.
///
/// # Safety
/// - `entries_json`, `metric_a` and `metric_b` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `trackwise_free_string`.
/// - Returns NULL on error; call `trackwise_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn trackwise_correlate(
    entries_json: *const c_char,
    metric_a: *const c_char,
    metric_b: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(entries_str) = required_arg(entries_json, "entries JSON") else {
        return ptr::null_mut();
    };
    let Some(a) = required_arg(metric_a, "metric_a") else {
        return ptr::null_mut();
    };
    let Some(b) = required_arg(metric_b, "metric_b") else {
        return ptr::null_mut();
    };

    respond(parse_entries(&entries_str).map(|entries| {
        correlate_metrics(&entries, &MetricId::new(a), &MetricId::new(b))
    }))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Trackwise functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Trackwise function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn trackwise_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Trackwise function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn trackwise_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the Trackwise library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn trackwise_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entries() -> CString {
        CString::new(
            r#"[
            {"id": "e1", "timestamp": "2024-01-15T01:00:00Z",
             "values": {"mood": {"kind": "number", "value": 3}, "energy": {"kind": "number", "value": 2}}},
            {"id": "e2", "timestamp": "2024-01-15T01:10:00Z",
             "values": {"mood": {"kind": "number", "value": 4}, "energy": {"kind": "number", "value": 3}}},
            {"id": "e3", "timestamp": "2024-01-15T01:20:00Z",
             "values": {"mood": {"kind": "number", "value": 6}, "energy": {"kind": "number", "value": 5}}}
        ]"#,
        )
        .unwrap()
    }

    fn sample_metrics() -> CString {
        CString::new(
            r#"[
            {"id": "mood", "name": "Mood", "kind": "scale", "min": 1, "max": 10},
            {"id": "energy", "name": "Energy", "kind": "scale", "min": 1, "max": 10}
        ]"#,
        )
        .unwrap()
    }

    unsafe fn take_json(ptr: *mut c_char) -> serde_json::Value {
        assert!(!ptr.is_null());
        let json = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        trackwise_free_string(ptr);
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_ffi_generate_report() {
        let entries = sample_entries();
        let metrics = sample_metrics();

        unsafe {
            let report = take_json(trackwise_generate_report(entries.as_ptr(), metrics.as_ptr()));
            assert_eq!(report["entry_count"], 3);
            assert_eq!(report["sufficient_data"], true);
            assert_eq!(report["concerns"][0]["kind"], "late_night_activity");
            assert!(trackwise_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_metric_trend() {
        let entries = sample_entries();
        let mood = CString::new("mood").unwrap();
        let missing = CString::new("sleep").unwrap();

        unsafe {
            let trend = take_json(trackwise_metric_trend(entries.as_ptr(), mood.as_ptr(), 0));
            assert_eq!(trend["window_size"], 7);
            assert_eq!(trend["current"], 6.0);

            let none = take_json(trackwise_metric_trend(entries.as_ptr(), missing.as_ptr(), 2));
            assert!(none.is_null());
        }
    }

    #[test]
    fn test_ffi_correlate() {
        let entries = sample_entries();
        let mood = CString::new("mood").unwrap();
        let energy = CString::new("energy").unwrap();

        unsafe {
            let result = take_json(trackwise_correlate(
                entries.as_ptr(),
                mood.as_ptr(),
                energy.as_ptr(),
            ));
            assert_eq!(result["strength"], "strong");
            assert_eq!(result["direction"], "positive");
            assert_eq!(result["sample_size"], 3);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let invalid = CString::new("not json").unwrap();
        let metrics = sample_metrics();

        unsafe {
            let result = trackwise_generate_report(invalid.as_ptr(), metrics.as_ptr());
            assert!(result.is_null());

            let error = trackwise_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.starts_with("Failed to parse input"));

            let result = trackwise_generate_report(ptr::null(), metrics.as_ptr());
            assert!(result.is_null());
            let error_str = CStr::from_ptr(trackwise_last_error()).to_str().unwrap();
            assert_eq!(error_str, "Invalid entries JSON string pointer");
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = trackwise_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, env!("CARGO_PKG_VERSION"));
        }
    }
}
