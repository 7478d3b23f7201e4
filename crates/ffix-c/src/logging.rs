// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Logging initialization for FFIX C FFI

use std::ffi::CStr;
use std::os::raw::c_char;
use std::sync::Once;

use super::FfixError;

/// Log level for FFIX logging
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfixLogLevel {
    FfixLogOff = 0,
    FfixLogError = 1,
    FfixLogWarn = 2,
    FfixLogInfo = 3,
    FfixLogDebug = 4,
    FfixLogTrace = 5,
}

impl From<FfixLogLevel> for log::LevelFilter {
    fn from(level: FfixLogLevel) -> Self {
        match level {
            FfixLogLevel::FfixLogOff => log::LevelFilter::Off,
            FfixLogLevel::FfixLogError => log::LevelFilter::Error,
            FfixLogLevel::FfixLogWarn => log::LevelFilter::Warn,
            FfixLogLevel::FfixLogInfo => log::LevelFilter::Info,
            FfixLogLevel::FfixLogDebug => log::LevelFilter::Debug,
            FfixLogLevel::FfixLogTrace => log::LevelFilter::Trace,
        }
    }
}

/// Initialize FFIX logging with console output
///
/// # Safety
/// Must be called from a single thread during initialization.
///
/// # Arguments
/// * `level` - Minimum log level to display
///
/// # Returns
/// `FfixError::FfixOk` on success, `FfixError::FfixOperationFailed` if already initialized
///
/// # Example (C)
/// ```c
/// ffix_logging_init(FFIX_LOG_INFO);
/// ```
#[no_mangle]
pub unsafe extern "C" fn ffix_logging_init(level: FfixLogLevel) -> FfixError {
    let filter: log::LevelFilter = level.into();

    match env_logger::Builder::new()
        .filter_level(filter)
        .format_timestamp_millis()
        .try_init()
    {
        Ok(()) => FfixError::FfixOk,
        Err(_) => FfixError::FfixOperationFailed, // Already initialized
    }
}

/// Initialize FFIX logging with environment variable override
///
/// Reads `RUST_LOG` environment variable if set, otherwise uses provided level.
///
/// # Safety
/// Must be called from a single thread during initialization.
///
/// # Arguments
/// * `default_level` - Default log level if `RUST_LOG` is not set
///
/// # Returns
/// `FfixError::FfixOk` on success
#[no_mangle]
pub unsafe extern "C" fn ffix_logging_init_env(default_level: FfixLogLevel) -> FfixError {
    let filter: log::LevelFilter = default_level.into();

    match env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(filter.to_string()),
    )
    .format_timestamp_millis()
    .try_init()
    {
        Ok(()) => FfixError::FfixOk,
        Err(_) => FfixError::FfixOperationFailed,
    }
}

/// Initialize FFIX logging with custom filter string
///
/// # Safety
/// - `filter` must be a valid null-terminated C string or NULL.
///
/// # Arguments
/// * `filter` - Log filter string (e.g., "ffix=debug,info")
///
/// # Returns
/// `FfixError::FfixOk` on success
///
/// # Example (C)
/// ```c
/// ffix_logging_init_with_filter("ffix=debug");
/// ```
#[no_mangle]
pub unsafe extern "C" fn ffix_logging_init_with_filter(filter: *const c_char) -> FfixError {
    if filter.is_null() {
        return FfixError::FfixInvalidArgument;
    }

    let Ok(filter_str) = CStr::from_ptr(filter).to_str() else {
        return FfixError::FfixInvalidArgument;
    };

    match env_logger::Builder::new()
        .parse_filters(filter_str)
        .format_timestamp_millis()
        .try_init()
    {
        Ok(()) => FfixError::FfixOk,
        Err(_) => FfixError::FfixOperationFailed,
    }
}

/// Fallback used by the operations that log: the first call wires up an
/// env-driven logger unless the embedder installed one already.
pub(crate) fn ensure_init() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or("info"),
        )
        .format_timestamp_millis()
        .try_init();
    });
}
