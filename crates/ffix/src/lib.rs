// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # FFIX - Struct-passing ABI fixture
//!
//! A small fixture for exercising a foreign-function boundary: plain
//! `#[repr(C)]` value records whose field orderings force padding, a set of
//! pure operations over them, and (behind the `dyncall` feature) a libffi
//! driven harness that describes the same shapes at runtime and invokes
//! exported functions without compile-time signatures.
//!
//! Correctness here means memory-layout agreement between caller and callee,
//! not computation. [`layout`] holds the compile-time descriptors, the
//! harness recomputes the same offsets through libffi, and tests cross-check
//! the two.
//!
//! ## Quick Start
//!
//! ```rust
//! use ffix::fixture::{self, PairNarrow};
//! use ffix::layout::AbiRecord;
//!
//! let swapped = fixture::swap_pair(PairNarrow { a: 1, b: 2, c: 3, d: 4 });
//! assert_eq!(swapped, PairNarrow { a: 3, b: 4, c: 1, d: 2 });
//!
//! let layout = PairNarrow::layout();
//! assert_eq!(layout.size, 16);
//! assert_eq!(layout.flattened_scalar_offsets(), vec![0, 4, 8, 12]);
//! ```
//!
//! ## Modules Overview
//!
//! - [`fixture`] - the value records and pure operations under test
//! - [`layout`] - compile-time field layout descriptors and reports
//! - [`dyncall`] - runtime shape registry and libffi invocation (feature `dyncall`)

/// Runtime struct description, call frames, and libffi invocation.
#[cfg(feature = "dyncall")]
pub mod dyncall;
/// The value records and pure operations crossing the boundary.
pub mod fixture;
/// Compile-time layout descriptors for the fixture records.
pub mod layout;

pub use fixture::{BigOuter, Inner, Outer, PairNarrow};
pub use layout::{AbiRecord, FieldKind, FieldLayout, LayoutError, ScalarKind, TypeLayout};

#[cfg(feature = "dyncall")]
pub use dyncall::{CallFrame, DynError, DynResult, Harness, TypeId, TypeRegistry};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
