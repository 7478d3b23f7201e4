// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compile-time field layout descriptors.
//!
//! Each fixture record carries a static [`TypeLayout`] built from
//! `mem::offset_of!`, so the crate can report exactly how the compiler laid
//! the record out on the current target and cross-check that against what a
//! peer (or the libffi probe) computes for the same shape.

pub mod report;

use std::fmt;

/// Scalar leaf categories a record field can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Pointer,
}

impl ScalarKind {
    /// Width in bytes on the current target.
    pub const fn size_bytes(self) -> usize {
        match self {
            ScalarKind::U8 | ScalarKind::I8 => 1,
            ScalarKind::U16 | ScalarKind::I16 => 2,
            ScalarKind::U32 | ScalarKind::I32 | ScalarKind::F32 => 4,
            ScalarKind::U64 | ScalarKind::I64 | ScalarKind::F64 => 8,
            ScalarKind::Pointer => std::mem::size_of::<*const ()>(),
        }
    }

    /// Natural alignment in bytes (same as the width on 64-bit targets).
    pub const fn alignment(self) -> usize {
        self.size_bytes()
    }

    /// Short lowercase name, as printed in layout reports.
    pub const fn name(self) -> &'static str {
        match self {
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Pointer => "ptr",
        }
    }
}

/// What a single declared field holds.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Scalar(ScalarKind),
    Struct(&'static TypeLayout),
}

/// Layout of a single declared field.
#[derive(Debug, Clone, Copy)]
pub struct FieldLayout {
    pub name: &'static str,
    pub offset: usize,
    pub kind: FieldKind,
}

impl FieldLayout {
    /// Bytes this field occupies, including a nested record's own padding.
    pub fn size_bytes(&self) -> usize {
        match self.kind {
            FieldKind::Scalar(kind) => kind.size_bytes(),
            FieldKind::Struct(layout) => layout.size,
        }
    }

    fn alignment(&self) -> usize {
        match self.kind {
            FieldKind::Scalar(kind) => kind.alignment(),
            FieldKind::Struct(layout) => layout.alignment,
        }
    }
}

/// Compiled layout of one record type on the current target.
#[derive(Debug)]
pub struct TypeLayout {
    pub type_name: &'static str,
    pub size: usize,
    pub alignment: usize,
    pub fields: &'static [FieldLayout],
}

impl TypeLayout {
    /// Number of scalar leaves, counting through nested records.
    pub fn scalar_count(&self) -> usize {
        self.fields
            .iter()
            .map(|field| match field.kind {
                FieldKind::Scalar(_) => 1,
                FieldKind::Struct(layout) => layout.scalar_count(),
            })
            .sum()
    }

    /// Absolute byte offset and kind of every scalar leaf, depth-first in
    /// declaration order.
    pub fn flattened_scalars(&self) -> Vec<(usize, ScalarKind)> {
        let mut out = Vec::with_capacity(self.scalar_count());
        self.collect_scalars(0, &mut out);
        out
    }

    fn collect_scalars(&self, base: usize, out: &mut Vec<(usize, ScalarKind)>) {
        for field in self.fields {
            match field.kind {
                FieldKind::Scalar(kind) => out.push((base + field.offset, kind)),
                FieldKind::Struct(layout) => layout.collect_scalars(base + field.offset, out),
            }
        }
    }

    /// Absolute scalar offsets only (see [`flattened_scalars`](Self::flattened_scalars)).
    pub fn flattened_scalar_offsets(&self) -> Vec<usize> {
        self.flattened_scalars()
            .into_iter()
            .map(|(offset, _)| offset)
            .collect()
    }

    /// Bytes of the record not covered by any scalar leaf.
    pub fn padding_bytes(&self) -> usize {
        let covered: usize = self
            .flattened_scalars()
            .iter()
            .map(|(_, kind)| kind.size_bytes())
            .sum();
        self.size - covered
    }

    /// Check the descriptor against itself: every field in bounds, aligned
    /// to its natural alignment, and non-overlapping in declaration order.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let mut last_end = 0usize;
        for field in self.fields {
            let end = field.offset + field.size_bytes();
            if end > self.size {
                return Err(LayoutError::FieldBeyondSize {
                    type_name: self.type_name,
                    field: field.name,
                    end,
                    size: self.size,
                });
            }
            if field.offset % field.alignment() != 0 {
                return Err(LayoutError::MisalignedField {
                    type_name: self.type_name,
                    field: field.name,
                    offset: field.offset,
                    alignment: field.alignment(),
                });
            }
            if field.offset < last_end {
                return Err(LayoutError::OverlappingFields {
                    type_name: self.type_name,
                    field: field.name,
                    offset: field.offset,
                    prev_end: last_end,
                });
            }
            if let FieldKind::Struct(layout) = field.kind {
                layout.validate()?;
            }
            last_end = end;
        }
        Ok(())
    }
}

/// Link between a record type and its compiled layout descriptor.
pub trait AbiRecord {
    /// The static layout of this record on the current target.
    fn layout() -> &'static TypeLayout;
}

/// Descriptor self-check failure.
#[derive(Debug, Clone)]
pub enum LayoutError {
    FieldBeyondSize {
        type_name: &'static str,
        field: &'static str,
        end: usize,
        size: usize,
    },
    MisalignedField {
        type_name: &'static str,
        field: &'static str,
        offset: usize,
        alignment: usize,
    },
    OverlappingFields {
        type_name: &'static str,
        field: &'static str,
        offset: usize,
        prev_end: usize,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::FieldBeyondSize {
                type_name,
                field,
                end,
                size,
            } => write!(
                f,
                "{}.{} ends at byte {} beyond type size {}",
                type_name, field, end, size
            ),
            LayoutError::MisalignedField {
                type_name,
                field,
                offset,
                alignment,
            } => write!(
                f,
                "{}.{} at offset {} breaks {}-byte alignment",
                type_name, field, offset, alignment
            ),
            LayoutError::OverlappingFields {
                type_name,
                field,
                offset,
                prev_end,
            } => write!(
                f,
                "{}.{} at offset {} overlaps previous field ending at {}",
                type_name, field, offset, prev_end
            ),
        }
    }
}

impl std::error::Error for LayoutError {}

#[cfg(test)]
mod tests {
    use super::*;

    static NESTED: TypeLayout = TypeLayout {
        type_name: "Nested",
        size: 8,
        alignment: 4,
        fields: &[
            FieldLayout {
                name: "x",
                offset: 0,
                kind: FieldKind::Scalar(ScalarKind::U32),
            },
            FieldLayout {
                name: "y",
                offset: 4,
                kind: FieldKind::Scalar(ScalarKind::U32),
            },
        ],
    };

    static WRAPPER: TypeLayout = TypeLayout {
        type_name: "Wrapper",
        size: 12,
        alignment: 4,
        fields: &[
            FieldLayout {
                name: "head",
                offset: 0,
                kind: FieldKind::Scalar(ScalarKind::U16),
            },
            FieldLayout {
                name: "body",
                offset: 4,
                kind: FieldKind::Struct(&NESTED),
            },
        ],
    };

    #[test]
    fn flattening_recurses_depth_first() {
        assert_eq!(WRAPPER.flattened_scalar_offsets(), vec![0, 4, 8]);
        assert_eq!(WRAPPER.scalar_count(), 3);
    }

    #[test]
    fn padding_counts_uncovered_bytes() {
        assert_eq!(WRAPPER.padding_bytes(), 2);
        assert_eq!(NESTED.padding_bytes(), 0);
    }

    #[test]
    fn validate_accepts_well_formed() {
        WRAPPER.validate().expect("wrapper layout should validate");
    }

    #[test]
    fn validate_rejects_field_past_end() {
        static BROKEN: TypeLayout = TypeLayout {
            type_name: "Broken",
            size: 2,
            alignment: 4,
            fields: &[FieldLayout {
                name: "x",
                offset: 0,
                kind: FieldKind::Scalar(ScalarKind::U32),
            }],
        };
        match BROKEN.validate() {
            Err(LayoutError::FieldBeyondSize {
                field: "x",
                end: 4,
                size: 2,
                ..
            }) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn validate_rejects_misaligned_field() {
        static BROKEN: TypeLayout = TypeLayout {
            type_name: "Broken",
            size: 8,
            alignment: 4,
            fields: &[FieldLayout {
                name: "x",
                offset: 1,
                kind: FieldKind::Scalar(ScalarKind::U32),
            }],
        };
        match BROKEN.validate() {
            Err(LayoutError::MisalignedField {
                offset: 1,
                alignment: 4,
                ..
            }) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn validate_rejects_overlap() {
        static BROKEN: TypeLayout = TypeLayout {
            type_name: "Broken",
            size: 8,
            alignment: 4,
            fields: &[
                FieldLayout {
                    name: "x",
                    offset: 0,
                    kind: FieldKind::Scalar(ScalarKind::U32),
                },
                FieldLayout {
                    name: "y",
                    offset: 2,
                    kind: FieldKind::Scalar(ScalarKind::U16),
                },
            ],
        };
        match BROKEN.validate() {
            Err(LayoutError::OverlappingFields {
                field: "y",
                offset: 2,
                prev_end: 4,
                ..
            }) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn layout_error_display_variants() {
        let err = LayoutError::FieldBeyondSize {
            type_name: "Broken",
            field: "x",
            end: 4,
            size: 2,
        };
        assert_eq!(format!("{}", err), "Broken.x ends at byte 4 beyond type size 2");

        let err = LayoutError::MisalignedField {
            type_name: "Broken",
            field: "x",
            offset: 1,
            alignment: 4,
        };
        assert_eq!(format!("{}", err), "Broken.x at offset 1 breaks 4-byte alignment");
    }
}
