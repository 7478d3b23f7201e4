// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic call harness over C FFI
//!
//! One process-wide harness lives behind a mutex. The flow mirrors the Rust
//! API: open a library, register struct shapes, bind symbols, then stage,
//! write, call, and read.

use std::ffi::CStr;
use std::os::raw::{c_char, c_void};
use std::slice;
use std::sync::{Mutex, MutexGuard, OnceLock};

use ffix::dyncall::{Harness, TypeId};

use super::{logging, FfixError};

fn harness() -> &'static Mutex<Harness> {
    static HARNESS: OnceLock<Mutex<Harness>> = OnceLock::new();
    HARNESS.get_or_init(|| Mutex::new(Harness::new()))
}

fn lock_harness() -> MutexGuard<'static, Harness> {
    harness().lock().unwrap_or_else(|err| err.into_inner())
}

// =============================================================================
// Library Lifecycle
// =============================================================================

/// Open a shared library for dynamic calls
///
/// Replaces any previously opened library and drops its bindings and the
/// staged frame. Registered struct shapes stay.
///
/// # Safety
/// - `path` must be a valid null-terminated C string.
/// - Loading a shared library runs its initialization code; the caller must trust it.
#[no_mangle]
pub unsafe extern "C" fn ffix_dyn_open(path: *const c_char) -> FfixError {
    logging::ensure_init();

    if path.is_null() {
        return FfixError::FfixInvalidArgument;
    }

    let Ok(path_str) = CStr::from_ptr(path).to_str() else {
        return FfixError::FfixInvalidArgument;
    };

    match lock_harness().open_library(path_str) {
        Ok(()) => FfixError::FfixOk,
        Err(err) => {
            log::warn!("[FFIX-C] ffix_dyn_open failed: {}", err);
            FfixError::from(&err)
        }
    }
}

/// Close the open library
///
/// Drops the library, its bindings, and the staged frame. No-op when no
/// library is open.
#[no_mangle]
pub extern "C" fn ffix_dyn_close() {
    lock_harness().close();
}

// =============================================================================
// Type Registration
// =============================================================================

/// Register a struct shape from member type ids
///
/// Scalar ids are fixed: 0 void, 1 u8, 2 u16, 3 u32, 4 u64, 5 i8, 6 i16,
/// 7 i32, 8 i64, 9 f32, 10 f64, 11 pointer. Struct ids count up from 12 in
/// registration order and may themselves appear as members.
///
/// # Safety
/// - `member_ids` must point to `member_count` ids, or be NULL only if `member_count` is 0.
///
/// # Returns
/// The non-negative id of the new shape, or the negated `FfixError` code on failure
#[no_mangle]
pub unsafe extern "C" fn ffix_dyn_register_struct(
    member_ids: *const u32,
    member_count: usize,
) -> i32 {
    if member_ids.is_null() && member_count > 0 {
        return -(FfixError::FfixInvalidArgument as i32);
    }

    let members: Vec<TypeId> = if member_count == 0 {
        Vec::new()
    } else {
        slice::from_raw_parts(member_ids, member_count)
            .iter()
            .map(|raw| TypeId::from_raw(*raw))
            .collect()
    };

    match lock_harness().register_struct(&members) {
        Ok(id) => id.raw() as i32,
        Err(err) => {
            log::warn!("[FFIX-C] ffix_dyn_register_struct failed: {}", err);
            -(FfixError::from(&err) as i32)
        }
    }
}

// =============================================================================
// Binding and Invocation
// =============================================================================

/// Bind an exported symbol under a declared signature
///
/// # Safety
/// - `symbol` must be a valid null-terminated C string.
/// - `arg_ids` must point to `arg_count` ids, or be NULL only if `arg_count` is 0.
/// - The named export must be an `extern "C"` function whose true signature
///   matches the declared one.
#[no_mangle]
pub unsafe extern "C" fn ffix_dyn_bind(
    symbol: *const c_char,
    arg_ids: *const u32,
    arg_count: usize,
    ret_id: u32,
) -> FfixError {
    if symbol.is_null() || (arg_ids.is_null() && arg_count > 0) {
        return FfixError::FfixInvalidArgument;
    }

    let Ok(symbol_str) = CStr::from_ptr(symbol).to_str() else {
        return FfixError::FfixInvalidArgument;
    };

    let args: Vec<TypeId> = if arg_count == 0 {
        Vec::new()
    } else {
        slice::from_raw_parts(arg_ids, arg_count)
            .iter()
            .map(|raw| TypeId::from_raw(*raw))
            .collect()
    };

    match lock_harness().bind(symbol_str, &args, TypeId::from_raw(ret_id)) {
        Ok(()) => FfixError::FfixOk,
        Err(err) => {
            log::warn!("[FFIX-C] ffix_dyn_bind failed: {}", err);
            FfixError::from(&err)
        }
    }
}

/// Stage a call frame for a bound symbol, replacing any previous frame
///
/// # Safety
/// - `symbol` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn ffix_dyn_stage(symbol: *const c_char) -> FfixError {
    if symbol.is_null() {
        return FfixError::FfixInvalidArgument;
    }

    let Ok(symbol_str) = CStr::from_ptr(symbol).to_str() else {
        return FfixError::FfixInvalidArgument;
    };

    match lock_harness().stage(symbol_str) {
        Ok(()) => FfixError::FfixOk,
        Err(err) => {
            log::warn!("[FFIX-C] ffix_dyn_stage failed: {}", err);
            FfixError::from(&err)
        }
    }
}

/// Invoke the staged frame's symbol
///
/// The frame keeps its contents afterwards; read the results with the
/// `ffix_dyn_read_*` functions, or reset and rewrite it for another call.
#[no_mangle]
pub extern "C" fn ffix_dyn_call() -> FfixError {
    match lock_harness().call() {
        Ok(()) => FfixError::FfixOk,
        Err(err) => {
            log::warn!("[FFIX-C] ffix_dyn_call failed: {}", err);
            FfixError::from(&err)
        }
    }
}

/// Rewind the staged frame's cursors and zero its buffers
#[no_mangle]
pub extern "C" fn ffix_dyn_reset() -> FfixError {
    match lock_harness().frame_mut() {
        Ok(frame) => {
            frame.reset();
            FfixError::FfixOk
        }
        Err(err) => FfixError::from(&err),
    }
}

// =============================================================================
// Scalar Traffic: Argument Writes
// =============================================================================

/// Write the next argument slot as `u8`
#[no_mangle]
pub extern "C" fn ffix_dyn_write_u8(value: u8) -> FfixError {
    match lock_harness()
        .frame_mut()
        .and_then(|frame| frame.write_u8(value))
    {
        Ok(()) => FfixError::FfixOk,
        Err(err) => FfixError::from(&err),
    }
}

/// Write the next argument slot as `u16`
#[no_mangle]
pub extern "C" fn ffix_dyn_write_u16(value: u16) -> FfixError {
    match lock_harness()
        .frame_mut()
        .and_then(|frame| frame.write_u16(value))
    {
        Ok(()) => FfixError::FfixOk,
        Err(err) => FfixError::from(&err),
    }
}

/// Write the next argument slot as `u32`
#[no_mangle]
pub extern "C" fn ffix_dyn_write_u32(value: u32) -> FfixError {
    match lock_harness()
        .frame_mut()
        .and_then(|frame| frame.write_u32(value))
    {
        Ok(()) => FfixError::FfixOk,
        Err(err) => FfixError::from(&err),
    }
}

/// Write the next argument slot as `u64`
#[no_mangle]
pub extern "C" fn ffix_dyn_write_u64(value: u64) -> FfixError {
    match lock_harness()
        .frame_mut()
        .and_then(|frame| frame.write_u64(value))
    {
        Ok(()) => FfixError::FfixOk,
        Err(err) => FfixError::from(&err),
    }
}

/// Write the next argument slot as `i8`
#[no_mangle]
pub extern "C" fn ffix_dyn_write_i8(value: i8) -> FfixError {
    match lock_harness()
        .frame_mut()
        .and_then(|frame| frame.write_i8(value))
    {
        Ok(()) => FfixError::FfixOk,
        Err(err) => FfixError::from(&err),
    }
}

/// Write the next argument slot as `i16`
#[no_mangle]
pub extern "C" fn ffix_dyn_write_i16(value: i16) -> FfixError {
    match lock_harness()
        .frame_mut()
        .and_then(|frame| frame.write_i16(value))
    {
        Ok(()) => FfixError::FfixOk,
        Err(err) => FfixError::from(&err),
    }
}

/// Write the next argument slot as `i32`
#[no_mangle]
pub extern "C" fn ffix_dyn_write_i32(value: i32) -> FfixError {
    match lock_harness()
        .frame_mut()
        .and_then(|frame| frame.write_i32(value))
    {
        Ok(()) => FfixError::FfixOk,
        Err(err) => FfixError::from(&err),
    }
}

/// Write the next argument slot as `i64`
#[no_mangle]
pub extern "C" fn ffix_dyn_write_i64(value: i64) -> FfixError {
    match lock_harness()
        .frame_mut()
        .and_then(|frame| frame.write_i64(value))
    {
        Ok(()) => FfixError::FfixOk,
        Err(err) => FfixError::from(&err),
    }
}

/// Write the next argument slot as `f32`
#[no_mangle]
pub extern "C" fn ffix_dyn_write_f32(value: f32) -> FfixError {
    match lock_harness()
        .frame_mut()
        .and_then(|frame| frame.write_f32(value))
    {
        Ok(()) => FfixError::FfixOk,
        Err(err) => FfixError::from(&err),
    }
}

/// Write the next argument slot as `f64`
#[no_mangle]
pub extern "C" fn ffix_dyn_write_f64(value: f64) -> FfixError {
    match lock_harness()
        .frame_mut()
        .and_then(|frame| frame.write_f64(value))
    {
        Ok(()) => FfixError::FfixOk,
        Err(err) => FfixError::from(&err),
    }
}

/// Write the next argument slot as a pointer
#[no_mangle]
pub extern "C" fn ffix_dyn_write_ptr(value: *mut c_void) -> FfixError {
    match lock_harness()
        .frame_mut()
        .and_then(|frame| frame.write_ptr(value))
    {
        Ok(()) => FfixError::FfixOk,
        Err(err) => FfixError::from(&err),
    }
}

// =============================================================================
// Scalar Traffic: Result Reads
// =============================================================================

/// Read the next return slot as `u8`
///
/// # Safety
/// - `out` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ffix_dyn_read_u8(out: *mut u8) -> FfixError {
    if out.is_null() {
        return FfixError::FfixInvalidArgument;
    }

    match lock_harness().frame_mut().and_then(|frame| frame.read_u8()) {
        Ok(value) => {
            *out = value;
            FfixError::FfixOk
        }
        Err(err) => FfixError::from(&err),
    }
}

/// Read the next return slot as `u16`
///
/// # Safety
/// - `out` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ffix_dyn_read_u16(out: *mut u16) -> FfixError {
    if out.is_null() {
        return FfixError::FfixInvalidArgument;
    }

    match lock_harness()
        .frame_mut()
        .and_then(|frame| frame.read_u16())
    {
        Ok(value) => {
            *out = value;
            FfixError::FfixOk
        }
        Err(err) => FfixError::from(&err),
    }
}

/// Read the next return slot as `u32`
///
/// # Safety
/// - `out` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ffix_dyn_read_u32(out: *mut u32) -> FfixError {
    if out.is_null() {
        return FfixError::FfixInvalidArgument;
    }

    match lock_harness()
        .frame_mut()
        .and_then(|frame| frame.read_u32())
    {
        Ok(value) => {
            *out = value;
            FfixError::FfixOk
        }
        Err(err) => FfixError::from(&err),
    }
}

/// Read the next return slot as `u64`
///
/// # Safety
/// - `out` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ffix_dyn_read_u64(out: *mut u64) -> FfixError {
    if out.is_null() {
        return FfixError::FfixInvalidArgument;
    }

    match lock_harness()
        .frame_mut()
        .and_then(|frame| frame.read_u64())
    {
        Ok(value) => {
            *out = value;
            FfixError::FfixOk
        }
        Err(err) => FfixError::from(&err),
    }
}

/// Read the next return slot as `i8`
///
/// # Safety
/// - `out` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ffix_dyn_read_i8(out: *mut i8) -> FfixError {
    if out.is_null() {
        return FfixError::FfixInvalidArgument;
    }

    match lock_harness().frame_mut().and_then(|frame| frame.read_i8()) {
        Ok(value) => {
            *out = value;
            FfixError::FfixOk
        }
        Err(err) => FfixError::from(&err),
    }
}

/// Read the next return slot as `i16`
///
/// # Safety
/// - `out` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ffix_dyn_read_i16(out: *mut i16) -> FfixError {
    if out.is_null() {
        return FfixError::FfixInvalidArgument;
    }

    match lock_harness()
        .frame_mut()
        .and_then(|frame| frame.read_i16())
    {
        Ok(value) => {
            *out = value;
            FfixError::FfixOk
        }
        Err(err) => FfixError::from(&err),
    }
}

/// Read the next return slot as `i32`
///
/// # Safety
/// - `out` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ffix_dyn_read_i32(out: *mut i32) -> FfixError {
    if out.is_null() {
        return FfixError::FfixInvalidArgument;
    }

    match lock_harness()
        .frame_mut()
        .and_then(|frame| frame.read_i32())
    {
        Ok(value) => {
            *out = value;
            FfixError::FfixOk
        }
        Err(err) => FfixError::from(&err),
    }
}

/// Read the next return slot as `i64`
///
/// # Safety
/// - `out` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ffix_dyn_read_i64(out: *mut i64) -> FfixError {
    if out.is_null() {
        return FfixError::FfixInvalidArgument;
    }

    match lock_harness()
        .frame_mut()
        .and_then(|frame| frame.read_i64())
    {
        Ok(value) => {
            *out = value;
            FfixError::FfixOk
        }
        Err(err) => FfixError::from(&err),
    }
}

/// Read the next return slot as `f32`
///
/// # Safety
/// - `out` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ffix_dyn_read_f32(out: *mut f32) -> FfixError {
    if out.is_null() {
        return FfixError::FfixInvalidArgument;
    }

    match lock_harness()
        .frame_mut()
        .and_then(|frame| frame.read_f32())
    {
        Ok(value) => {
            *out = value;
            FfixError::FfixOk
        }
        Err(err) => FfixError::from(&err),
    }
}

/// Read the next return slot as `f64`
///
/// # Safety
/// - `out` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ffix_dyn_read_f64(out: *mut f64) -> FfixError {
    if out.is_null() {
        return FfixError::FfixInvalidArgument;
    }

    match lock_harness()
        .frame_mut()
        .and_then(|frame| frame.read_f64())
    {
        Ok(value) => {
            *out = value;
            FfixError::FfixOk
        }
        Err(err) => FfixError::from(&err),
    }
}

/// Read the next return slot as a pointer
///
/// # Safety
/// - `out` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ffix_dyn_read_ptr(out: *mut *mut c_void) -> FfixError {
    if out.is_null() {
        return FfixError::FfixInvalidArgument;
    }

    match lock_harness()
        .frame_mut()
        .and_then(|frame| frame.read_ptr())
    {
        Ok(value) => {
            *out = value;
            FfixError::FfixOk
        }
        Err(err) => FfixError::from(&err),
    }
}
