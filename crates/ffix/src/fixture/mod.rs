// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The fixture surface: plain value records and the pure operations over
//! them.
//!
//! Everything here is stateless. A record is built by the caller, crosses
//! the boundary by value, and is gone when the call returns. The two
//! operations that produce diagnostics do so through the `log` facade, so
//! a host decides whether the lines go anywhere.

mod ops;
mod types;

pub use ops::{add, decrement, sum_inner, sum_outer, swap_pair, touch_big_outer};
pub use types::{layouts, BigOuter, Inner, Outer, PairNarrow};
