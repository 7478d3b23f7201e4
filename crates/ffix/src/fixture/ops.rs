// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pure operations over the fixture records.
//!
//! Every function is total: wraparound arithmetic is the defined result,
//! never an error. Nothing here retains state between calls.

use super::types::{BigOuter, Inner, Outer, PairNarrow};

/// Swap the wide and narrow halves of the record.
///
/// Returns `{a: p.c, b: p.d, c: p.a, d: p.b}`; applying it twice restores
/// the input. Logs the four input fields before swapping.
pub fn swap_pair(pair: PairNarrow) -> PairNarrow {
    log::info!(
        "[FIXTURE] swap_pair: {} {} {} {}",
        pair.a,
        pair.b,
        pair.c,
        pair.d
    );
    PairNarrow {
        a: pair.c,
        b: pair.d,
        c: pair.a,
        d: pair.b,
    }
}

/// Subtract 10, wrapping below zero.
pub fn decrement(value: u32) -> u32 {
    value.wrapping_sub(10)
}

/// Wrapping sum of both fields.
pub fn sum_inner(inner: Inner) -> u32 {
    inner.a.wrapping_add(inner.b)
}

/// Wrapping addition of two scalars.
pub fn add(lhs: u32, rhs: u32) -> u32 {
    lhs.wrapping_add(rhs)
}

/// Left-to-right wrapping sum of all four leaf fields.
pub fn sum_outer(outer: Outer) -> u32 {
    outer
        .a
        .a
        .wrapping_add(outer.a.b)
        .wrapping_add(outer.b.a)
        .wrapping_add(outer.b.b)
}

/// Accept the large record and log one fixed acknowledgement line.
///
/// The record is received by value and dropped; the padding around the
/// byte pair must not disturb any field on the way in.
pub fn touch_big_outer(_big: BigOuter) {
    log::info!("[FIXTURE] touch_big_outer: received");
}
