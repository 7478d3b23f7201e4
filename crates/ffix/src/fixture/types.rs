// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value records crossing the boundary.
//!
//! Declared field order is the contract: each record is `#[repr(C)]` and a
//! peer must reproduce the order and widths below bit-exactly. Where the
//! compiler put each field on this target is captured by the static
//! [`TypeLayout`] descriptors and pinned by tests.

use core::mem;

use crate::layout::{AbiRecord, FieldKind, FieldLayout, ScalarKind, TypeLayout};

/// Interleaved 32/16-bit record.
///
/// The narrow fields force two padding gaps (after `b` and after `d`) on
/// common 64-bit targets: 16 bytes total for 12 bytes of data.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairNarrow {
    pub a: u32,
    pub b: u16,
    pub c: u32,
    pub d: u16,
}

/// Smallest nested building block: two 32-bit fields, no padding.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inner {
    pub a: u32,
    pub b: u32,
}

/// One level of nesting: two [`Inner`] records back to back.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outer {
    pub a: Inner,
    pub b: Inner,
}

/// Nested records separated by a pair of single-byte fields.
///
/// The byte pair knocks the second [`Outer`] off its alignment, so the
/// compiler inserts padding before `b`. The record exists to prove that
/// padding crosses the boundary without disturbing any field.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BigOuter {
    pub a: Outer,
    pub troll_a: u8,
    pub troll_b: u8,
    pub b: Outer,
}

static PAIR_NARROW_LAYOUT: TypeLayout = TypeLayout {
    type_name: "PairNarrow",
    size: mem::size_of::<PairNarrow>(),
    alignment: mem::align_of::<PairNarrow>(),
    fields: &[
        FieldLayout {
            name: "a",
            offset: mem::offset_of!(PairNarrow, a),
            kind: FieldKind::Scalar(ScalarKind::U32),
        },
        FieldLayout {
            name: "b",
            offset: mem::offset_of!(PairNarrow, b),
            kind: FieldKind::Scalar(ScalarKind::U16),
        },
        FieldLayout {
            name: "c",
            offset: mem::offset_of!(PairNarrow, c),
            kind: FieldKind::Scalar(ScalarKind::U32),
        },
        FieldLayout {
            name: "d",
            offset: mem::offset_of!(PairNarrow, d),
            kind: FieldKind::Scalar(ScalarKind::U16),
        },
    ],
};

static INNER_LAYOUT: TypeLayout = TypeLayout {
    type_name: "Inner",
    size: mem::size_of::<Inner>(),
    alignment: mem::align_of::<Inner>(),
    fields: &[
        FieldLayout {
            name: "a",
            offset: mem::offset_of!(Inner, a),
            kind: FieldKind::Scalar(ScalarKind::U32),
        },
        FieldLayout {
            name: "b",
            offset: mem::offset_of!(Inner, b),
            kind: FieldKind::Scalar(ScalarKind::U32),
        },
    ],
};

static OUTER_LAYOUT: TypeLayout = TypeLayout {
    type_name: "Outer",
    size: mem::size_of::<Outer>(),
    alignment: mem::align_of::<Outer>(),
    fields: &[
        FieldLayout {
            name: "a",
            offset: mem::offset_of!(Outer, a),
            kind: FieldKind::Struct(&INNER_LAYOUT),
        },
        FieldLayout {
            name: "b",
            offset: mem::offset_of!(Outer, b),
            kind: FieldKind::Struct(&INNER_LAYOUT),
        },
    ],
};

static BIG_OUTER_LAYOUT: TypeLayout = TypeLayout {
    type_name: "BigOuter",
    size: mem::size_of::<BigOuter>(),
    alignment: mem::align_of::<BigOuter>(),
    fields: &[
        FieldLayout {
            name: "a",
            offset: mem::offset_of!(BigOuter, a),
            kind: FieldKind::Struct(&OUTER_LAYOUT),
        },
        FieldLayout {
            name: "troll_a",
            offset: mem::offset_of!(BigOuter, troll_a),
            kind: FieldKind::Scalar(ScalarKind::U8),
        },
        FieldLayout {
            name: "troll_b",
            offset: mem::offset_of!(BigOuter, troll_b),
            kind: FieldKind::Scalar(ScalarKind::U8),
        },
        FieldLayout {
            name: "b",
            offset: mem::offset_of!(BigOuter, b),
            kind: FieldKind::Struct(&OUTER_LAYOUT),
        },
    ],
};

impl AbiRecord for PairNarrow {
    fn layout() -> &'static TypeLayout {
        &PAIR_NARROW_LAYOUT
    }
}

impl AbiRecord for Inner {
    fn layout() -> &'static TypeLayout {
        &INNER_LAYOUT
    }
}

impl AbiRecord for Outer {
    fn layout() -> &'static TypeLayout {
        &OUTER_LAYOUT
    }
}

impl AbiRecord for BigOuter {
    fn layout() -> &'static TypeLayout {
        &BIG_OUTER_LAYOUT
    }
}

/// All fixture layouts, in the order the records build on each other.
pub fn layouts() -> [&'static TypeLayout; 4] {
    [
        PairNarrow::layout(),
        Inner::layout(),
        Outer::layout(),
        BigOuter::layout(),
    ]
}
