// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Layout introspection for the fixture records over C FFI

use std::os::raw::c_char;
use std::ptr;

use ffix::layout::{AbiRecord, TypeLayout};
use ffix::{BigOuter, Inner, Outer, PairNarrow};

use super::FfixError;

/// Fixture record selector for the layout introspection functions
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfixFixtureType {
    FfixTypePairNarrow = 0,
    FfixTypeInner = 1,
    FfixTypeOuter = 2,
    FfixTypeBigOuter = 3,
}

fn layout_of(ty: FfixFixtureType) -> &'static TypeLayout {
    match ty {
        FfixFixtureType::FfixTypePairNarrow => PairNarrow::layout(),
        FfixFixtureType::FfixTypeInner => Inner::layout(),
        FfixFixtureType::FfixTypeOuter => Outer::layout(),
        FfixFixtureType::FfixTypeBigOuter => BigOuter::layout(),
    }
}

/// Size in bytes of a fixture record
#[no_mangle]
pub extern "C" fn ffix_type_size(ty: FfixFixtureType) -> usize {
    layout_of(ty).size
}

/// Alignment in bytes of a fixture record
#[no_mangle]
pub extern "C" fn ffix_type_alignment(ty: FfixFixtureType) -> usize {
    layout_of(ty).alignment
}

/// Number of scalar leaves in a fixture record
#[no_mangle]
pub extern "C" fn ffix_type_scalar_count(ty: FfixFixtureType) -> usize {
    layout_of(ty).scalar_count()
}

/// Padding bytes in a fixture record (size minus the scalar coverage)
#[no_mangle]
pub extern "C" fn ffix_type_padding_bytes(ty: FfixFixtureType) -> usize {
    layout_of(ty).padding_bytes()
}

/// Flattened scalar offsets of a fixture record, in declaration order
///
/// Writes up to `cap` offsets to `out` and stores the full count in
/// `out_len`. When `cap` is too small, the leading `cap` offsets are still
/// written.
///
/// # Safety
/// - `out` must point to a buffer of at least `cap` elements, or be NULL only if `cap` is 0.
/// - `out_len` must be a valid pointer.
///
/// # Returns
/// `FfixError::FfixOk` on success, `FfixError::FfixBufferTooSmall` if only a prefix fit
#[no_mangle]
pub unsafe extern "C" fn ffix_type_scalar_offsets(
    ty: FfixFixtureType,
    out: *mut usize,
    cap: usize,
    out_len: *mut usize,
) -> FfixError {
    if out_len.is_null() || (out.is_null() && cap > 0) {
        return FfixError::FfixInvalidArgument;
    }

    let offsets = layout_of(ty).flattened_scalar_offsets();
    *out_len = offsets.len();

    let n = offsets.len().min(cap);
    if n > 0 {
        ptr::copy_nonoverlapping(offsets.as_ptr(), out, n);
    }
    if cap < offsets.len() {
        return FfixError::FfixBufferTooSmall;
    }

    FfixError::FfixOk
}

/// Type name of a fixture record
///
/// # Safety
/// - `buf` must point to a buffer of at least `buf_len` bytes.
/// - `out_len` must be a valid pointer.
///
/// # Returns
/// `FfixError::FfixOk` on success, writes the null-terminated name to `buf`
#[no_mangle]
pub unsafe extern "C" fn ffix_type_name(
    ty: FfixFixtureType,
    buf: *mut c_char,
    buf_len: usize,
    out_len: *mut usize,
) -> FfixError {
    if buf.is_null() || out_len.is_null() {
        return FfixError::FfixInvalidArgument;
    }

    let name = layout_of(ty).type_name;

    let name_len = name.len();
    *out_len = name_len;

    if buf_len < name_len + 1 {
        return FfixError::FfixBufferTooSmall;
    }

    ptr::copy_nonoverlapping(name.as_ptr(), buf.cast::<u8>(), name_len);
    *buf.add(name_len) = 0; // Null terminator

    FfixError::FfixOk
}
