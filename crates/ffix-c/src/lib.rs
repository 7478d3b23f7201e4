// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # FFIX C FFI Bindings
//!
//! This crate provides C-compatible FFI bindings for the FFIX struct ABI
//! fixture: the fixture operations themselves, layout introspection for the
//! fixture records and, behind the `dyncall` feature, the libffi-driven
//! dynamic call harness.
//!
//! # Safety
//!
//! Functions taking raw pointers are `unsafe` and require the caller to
//! uphold the invariants documented in each function's safety comment.

#[cfg(feature = "dyncall")]
mod dyncall_ffi;
mod layout_ffi;
mod logging;

#[cfg(feature = "dyncall")]
pub use dyncall_ffi::*;
pub use layout_ffi::*;
pub use logging::*;

use std::os::raw::c_char;

use ffix::fixture::{add, decrement, sum_inner, sum_outer, swap_pair, touch_big_outer};
use ffix::fixture::{BigOuter, Inner, Outer, PairNarrow};

/// Error codes (C-compatible enum)
///
/// # Error Code Categories
///
/// - **0-9**: Success and generic errors
/// - **10-19**: Type registry errors
/// - **20-29**: Library and binding errors
/// - **30-39**: Call frame errors
/// - **40-49**: Invocation errors
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfixError {
    /// Operation completed successfully
    FfixOk = 0,
    /// Invalid argument provided (null pointer, invalid value)
    FfixInvalidArgument = 1,
    /// Requested resource not found
    FfixNotFound = 2,
    /// Generic operation failure
    FfixOperationFailed = 3,
    /// Buffer too small for the requested data
    FfixBufferTooSmall = 4,

    // === Type registry errors (10-19) ===
    /// Type id names no registered type
    FfixUnknownType = 10,
    /// Struct registration with no members
    FfixEmptyStruct = 11,
    /// Struct registration with a void member
    FfixVoidMember = 12,
    /// libffi rejected the struct shape
    FfixOffsetProbeFailed = 13,

    // === Library and binding errors (20-29) ===
    /// Shared library could not be opened
    FfixLibraryOpenFailed = 20,
    /// Operation needs an open library
    FfixLibraryNotOpen = 21,
    /// Symbol lookup failed in the open library
    FfixSymbolNotFound = 22,
    /// Symbol has not been bound
    FfixUnboundFunction = 23,

    // === Call frame errors (30-39) ===
    /// No staged call frame
    FfixNoFrame = 30,
    /// Cursor ran past the last slot
    FfixSlotExhausted = 31,
    /// Slot kind does not match the access
    FfixSlotMismatch = 32,

    // === Invocation errors (40-49) ===
    /// libffi call interface preparation failed
    FfixCifPrepFailed = 40,
}

#[cfg(feature = "dyncall")]
impl From<&ffix::dyncall::DynError> for FfixError {
    fn from(err: &ffix::dyncall::DynError) -> Self {
        use ffix::dyncall::DynError;
        match err {
            DynError::UnknownType { .. } => FfixError::FfixUnknownType,
            DynError::VoidMember { .. } => FfixError::FfixVoidMember,
            DynError::EmptyStruct => FfixError::FfixEmptyStruct,
            DynError::OffsetProbe { .. } => FfixError::FfixOffsetProbeFailed,
            DynError::LibraryOpen { .. } => FfixError::FfixLibraryOpenFailed,
            DynError::LibraryNotOpen => FfixError::FfixLibraryNotOpen,
            DynError::SymbolNotFound { .. } => FfixError::FfixSymbolNotFound,
            DynError::UnboundFunction { .. } => FfixError::FfixUnboundFunction,
            DynError::NoFrame => FfixError::FfixNoFrame,
            DynError::SlotExhausted { .. } => FfixError::FfixSlotExhausted,
            DynError::SlotMismatch { .. } => FfixError::FfixSlotMismatch,
            DynError::CifPrep { .. } => FfixError::FfixCifPrepFailed,
        }
    }
}

// =============================================================================
// Fixture Records (C view)
// =============================================================================

/// C view of the narrow pair record, field for field identical to the
/// fixture's own.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FfixPairNarrow {
    pub a: u32,
    pub b: u16,
    pub c: u32,
    pub d: u16,
}

/// C view of the inner record.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FfixInner {
    pub a: u32,
    pub b: u32,
}

/// C view of the outer record.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FfixOuter {
    pub a: FfixInner,
    pub b: FfixInner,
}

/// C view of the big outer record.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FfixBigOuter {
    pub a: FfixOuter,
    pub troll_a: u8,
    pub troll_b: u8,
    pub b: FfixOuter,
}

impl From<FfixPairNarrow> for PairNarrow {
    fn from(value: FfixPairNarrow) -> Self {
        PairNarrow {
            a: value.a,
            b: value.b,
            c: value.c,
            d: value.d,
        }
    }
}

impl From<PairNarrow> for FfixPairNarrow {
    fn from(value: PairNarrow) -> Self {
        FfixPairNarrow {
            a: value.a,
            b: value.b,
            c: value.c,
            d: value.d,
        }
    }
}

impl From<FfixInner> for Inner {
    fn from(value: FfixInner) -> Self {
        Inner {
            a: value.a,
            b: value.b,
        }
    }
}

impl From<Inner> for FfixInner {
    fn from(value: Inner) -> Self {
        FfixInner {
            a: value.a,
            b: value.b,
        }
    }
}

impl From<FfixOuter> for Outer {
    fn from(value: FfixOuter) -> Self {
        Outer {
            a: value.a.into(),
            b: value.b.into(),
        }
    }
}

impl From<Outer> for FfixOuter {
    fn from(value: Outer) -> Self {
        FfixOuter {
            a: value.a.into(),
            b: value.b.into(),
        }
    }
}

impl From<FfixBigOuter> for BigOuter {
    fn from(value: FfixBigOuter) -> Self {
        BigOuter {
            a: value.a.into(),
            troll_a: value.troll_a,
            troll_b: value.troll_b,
            b: value.b.into(),
        }
    }
}

impl From<BigOuter> for FfixBigOuter {
    fn from(value: BigOuter) -> Self {
        FfixBigOuter {
            a: value.a.into(),
            troll_a: value.troll_a,
            troll_b: value.troll_b,
            b: value.b.into(),
        }
    }
}

// =============================================================================
// Fixture Operations
// =============================================================================

/// Swap the halves of a narrow pair: returns `{in.c, in.d, in.a, in.b}`
///
/// Logs one line with the four input values before swapping.
#[no_mangle]
pub extern "C" fn ffix_swap_pair(pair: FfixPairNarrow) -> FfixPairNarrow {
    logging::ensure_init();
    swap_pair(pair.into()).into()
}

/// Subtract 10 from a counter, wrapping below zero
#[no_mangle]
pub extern "C" fn ffix_decrement(value: u32) -> u32 {
    decrement(value)
}

/// Sum the two fields of an inner record, wrapping
#[no_mangle]
pub extern "C" fn ffix_sum_inner(inner: FfixInner) -> u32 {
    sum_inner(inner.into())
}

/// Wrapping add of two counters
#[no_mangle]
pub extern "C" fn ffix_add(a: u32, b: u32) -> u32 {
    add(a, b)
}

/// Sum all four leaves of an outer record left to right, wrapping
#[no_mangle]
pub extern "C" fn ffix_sum_outer(outer: FfixOuter) -> u32 {
    sum_outer(outer.into())
}

/// Take a big outer record by value and log a fixed diagnostic line
#[no_mangle]
pub extern "C" fn ffix_touch_big_outer(big: FfixBigOuter) {
    logging::ensure_init();
    touch_big_outer(big.into());
}

/// Get FFIX library version string
///
/// # Safety
/// The returned pointer is valid for the lifetime of the process (static storage).
#[no_mangle]
pub unsafe extern "C" fn ffix_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr().cast::<c_char>()
}
