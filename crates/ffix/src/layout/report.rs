// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Row-oriented rendering of [`TypeLayout`] descriptors.
//!
//! The dump tool and the C introspection surface consume these flat rows
//! instead of walking the descriptor tree themselves.

use super::{FieldKind, ScalarKind, TypeLayout};

/// One scalar leaf with its dotted path, e.g. `b.a.b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarRow {
    pub path: String,
    pub offset: usize,
    pub kind: ScalarKind,
}

/// One run of bytes not covered by any scalar leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaddingGap {
    pub start: usize,
    pub len: usize,
}

impl PaddingGap {
    /// First byte past the gap.
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Flattened view of a single record layout.
#[derive(Debug)]
pub struct LayoutReport {
    pub type_name: &'static str,
    pub size: usize,
    pub alignment: usize,
    pub rows: Vec<ScalarRow>,
    pub gaps: Vec<PaddingGap>,
}

impl LayoutReport {
    /// Build the flattened view of `layout`.
    pub fn of(layout: &'static TypeLayout) -> Self {
        let mut rows = Vec::with_capacity(layout.scalar_count());
        collect_rows(layout, 0, "", &mut rows);
        let gaps = find_gaps(layout.size, &rows);
        LayoutReport {
            type_name: layout.type_name,
            size: layout.size,
            alignment: layout.alignment,
            rows,
            gaps,
        }
    }

    /// Total padding bytes across all gaps.
    pub fn padding_bytes(&self) -> usize {
        self.gaps.iter().map(|gap| gap.len).sum()
    }
}

fn collect_rows(layout: &TypeLayout, base: usize, prefix: &str, out: &mut Vec<ScalarRow>) {
    for field in layout.fields {
        let path = if prefix.is_empty() {
            field.name.to_string()
        } else {
            format!("{}.{}", prefix, field.name)
        };
        match field.kind {
            FieldKind::Scalar(kind) => out.push(ScalarRow {
                path,
                offset: base + field.offset,
                kind,
            }),
            FieldKind::Struct(nested) => collect_rows(nested, base + field.offset, &path, out),
        }
    }
}

// Rows arrive in ascending offset order for repr(C) records, so a single
// cursor sweep finds every gap including the tail.
fn find_gaps(size: usize, rows: &[ScalarRow]) -> Vec<PaddingGap> {
    let mut gaps = Vec::new();
    let mut cursor = 0usize;
    for row in rows {
        if row.offset > cursor {
            gaps.push(PaddingGap {
                start: cursor,
                len: row.offset - cursor,
            });
        }
        cursor = row.offset + row.kind.size_bytes();
    }
    if size > cursor {
        gaps.push(PaddingGap {
            start: cursor,
            len: size - cursor,
        });
    }
    gaps
}
