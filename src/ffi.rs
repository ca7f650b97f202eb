//! FFI bindings for Cycle Intel
//!
//! This module provides C-compatible functions for calling the engine from a
//! host app. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `cycle_free_string`.
//!
//! Logs cross the boundary as a JSON object mapping `YYYY-MM-DD` to a log
//! entry, the same document the JSON file store writes.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::notify::{Clock, SystemClock};
use crate::pipeline::{analyze_logs, Analysis};
use crate::report::render_text;
use crate::types::{parse_date, LogMap};

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

/// Parse the log document and analyze it.
///
/// A missing `today` means the host's current local date.
fn analyze_json(logs_json: &str, today: Option<&str>) -> Result<(LogMap, Analysis), EngineError> {
    let logs: LogMap = if logs_json.trim().is_empty() {
        LogMap::new()
    } else {
        serde_json::from_str(logs_json)?
    };
    let today = match today {
        Some(s) => parse_date(s)?,
        None => SystemClock.today(),
    };
    let analysis = analyze_logs(&logs, today, &EngineConfig::default())?;
    Ok((logs, analysis))
}

/// Shared argument handling for the stateless entry points
unsafe fn with_logs<F>(logs_json: *const c_char, today: *const c_char, render: F) -> *mut c_char
where
    F: FnOnce(&LogMap, &Analysis) -> Result<String, EngineError>,
{
    clear_last_error();

    let logs_str = match cstr_to_string(logs_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid logs JSON string pointer");
            return ptr::null_mut();
        }
    };

    let today_str = if today.is_null() {
        None
    } else {
        match cstr_to_string(today) {
            Some(s) => Some(s),
            None => {
                set_last_error("Invalid today string pointer");
                return ptr::null_mut();
            }
        }
    };

    let result = analyze_json(&logs_str, today_str.as_deref())
        .and_then(|(logs, analysis)| render(&logs, &analysis));

    match result {
        Ok(out) => string_to_cstr(&out),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Analyze a log document and return the analysis as JSON.
///
/// # Safety
/// - `logs_json` must be a valid null-terminated C string.
/// - `today` must be a valid null-terminated `YYYY-MM-DD` C string, or NULL
///   for the host's local date.
/// - Returns a newly allocated string that must be freed with `cycle_free_string`.
/// - Returns NULL on error; call `cycle_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cycle_analyze_json(
    logs_json: *const c_char,
    today: *const c_char,
) -> *mut c_char {
    with_logs(logs_json, today, |_, analysis| {
        Ok(serde_json::to_string(analysis)?)
    })
}

/// Render the plain-text report for a log document.
///
/// # Safety
/// - `logs_json` must be a valid null-terminated C string.
/// - `today` must be a valid null-terminated `YYYY-MM-DD` C string, or NULL.
/// - Returns a newly allocated string that must be freed with `cycle_free_string`.
/// - Returns NULL on error; call `cycle_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cycle_report_text(
    logs_json: *const c_char,
    today: *const c_char,
) -> *mut c_char {
    with_logs(logs_json, today, |logs, analysis| Ok(render_text(logs, analysis)))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Cycle Intel functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Cycle Intel function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn cycle_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Cycle Intel call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn cycle_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn cycle_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_logs_json() -> CString {
        CString::new(
            r#"{
                "2024-01-01": {"flow": "heavy"},
                "2024-01-29": {"flow": "heavy", "physical_symptoms": ["cramps"]},
                "2024-02-26": {"flow": "heavy", "energy": "low"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ffi_analyze_json() {
        let logs = sample_logs_json();
        let today = CString::new("2024-03-01").unwrap();

        unsafe {
            let result = cycle_analyze_json(logs.as_ptr(), today.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let value: serde_json::Value = serde_json::from_str(result_str).unwrap();
            assert_eq!(value["cycle"]["observed_lengths"], serde_json::json!([28, 28]));
            assert_eq!(value["prediction"]["period_window"]["start_date"], "2024-03-25");

            cycle_free_string(result);
        }
    }

    #[test]
    fn test_ffi_report_text() {
        let logs = sample_logs_json();
        let today = CString::new("2024-03-01").unwrap();

        unsafe {
            let result = cycle_report_text(logs.as_ptr(), today.as_ptr());
            assert!(!result.is_null());

            let text = CStr::from_ptr(result).to_str().unwrap();
            assert!(text.starts_with("Cycle & Symptom Report"));
            assert!(text.contains("Symptoms: Cramps"));

            cycle_free_string(result);
        }
    }

    #[test]
    fn test_ffi_null_today_uses_host_date() {
        let logs = CString::new("{}").unwrap();

        unsafe {
            let result = cycle_analyze_json(logs.as_ptr(), ptr::null());
            assert!(!result.is_null());
            assert!(cycle_last_error().is_null());
            cycle_free_string(result);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            let result = cycle_analyze_json(invalid_json.as_ptr(), ptr::null());
            assert!(result.is_null());

            let error = cycle_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.starts_with("Invalid JSON"));

            let logs = sample_logs_json();
            let bad_date = CString::new("03/01/2024").unwrap();
            let result = cycle_report_text(logs.as_ptr(), bad_date.as_ptr());
            assert!(result.is_null());
            assert!(!cycle_last_error().is_null());

            let result = cycle_analyze_json(ptr::null(), ptr::null());
            assert!(result.is_null());
        }
    }

    #[test]
    fn test_ffi_far_future_log_reports_error() {
        let logs = CString::new(r#"{"+262142-12-20": {"flow": "heavy"}}"#).unwrap();
        let today = CString::new("2024-03-01").unwrap();

        unsafe {
            let result = cycle_analyze_json(logs.as_ptr(), today.as_ptr());
            assert!(result.is_null());

            let error_str = CStr::from_ptr(cycle_last_error()).to_str().unwrap();
            assert!(error_str.starts_with("Date out of range"));
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = cycle_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, crate::ENGINE_VERSION);
        }
    }
}
