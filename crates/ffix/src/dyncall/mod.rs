// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime struct description and dynamic invocation through libffi.
//!
//! The [`TypeRegistry`] assigns numeric ids to scalar kinds and registered
//! struct shapes, letting a caller spell out an exported function's
//! signature at runtime. Staging a bound function builds a [`CallFrame`]:
//! one contiguous argument buffer plus a return buffer, each addressed
//! through a cursor of typed scalar slots. Invocation goes through
//! `libffi`'s low layer with pointers into the frame.
//!
//! Shapes registered here are cross-checked against the compile-time
//! [`crate::layout`] descriptors in tests; agreement between the two is the
//! property the whole fixture exists to demonstrate.

pub mod frame;
pub mod harness;
pub mod registry;

pub use frame::CallFrame;
pub use harness::Harness;
pub use registry::{ScalarSlot, TypeId, TypeRegistry};

use std::fmt;

use crate::layout::ScalarKind;

/// Untyped foreign entry point, as stored in a binding.
pub type RawFn = unsafe extern "C" fn();

/// Errors from shape registration, binding, staging, and invocation.
#[derive(Debug, Clone)]
pub enum DynError {
    UnknownType { id: u32 },
    VoidMember { index: usize },
    EmptyStruct,
    OffsetProbe { status: u32 },
    LibraryOpen { path: String, reason: String },
    LibraryNotOpen,
    SymbolNotFound { symbol: String, reason: String },
    UnboundFunction { symbol: String },
    NoFrame,
    SlotExhausted { index: usize },
    SlotMismatch { index: usize, expected: ScalarKind, found: ScalarKind },
    CifPrep { symbol: String },
}

impl fmt::Display for DynError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynError::UnknownType { id } => write!(f, "unknown type id {}", id),
            DynError::VoidMember { index } => write!(f, "struct member {} is void", index),
            DynError::EmptyStruct => write!(f, "struct needs at least one member"),
            DynError::OffsetProbe { status } => {
                write!(f, "libffi offset probe failed with status {}", status)
            }
            DynError::LibraryOpen { path, reason } => {
                write!(f, "cannot open library {}: {}", path, reason)
            }
            DynError::LibraryNotOpen => write!(f, "no library open"),
            DynError::SymbolNotFound { symbol, reason } => {
                write!(f, "symbol {} not found: {}", symbol, reason)
            }
            DynError::UnboundFunction { symbol } => write!(f, "function {} not bound", symbol),
            DynError::NoFrame => write!(f, "no staged call frame"),
            DynError::SlotExhausted { index } => write!(f, "no scalar slot at cursor {}", index),
            DynError::SlotMismatch {
                index,
                expected,
                found,
            } => write!(
                f,
                "slot {} holds {}, got {}",
                index,
                expected.name(),
                found.name()
            ),
            DynError::CifPrep { symbol } => {
                write!(f, "libffi cif preparation failed for {}", symbol)
            }
        }
    }
}

impl std::error::Error for DynError {}

pub type DynResult<T> = core::result::Result<T, DynError>;
