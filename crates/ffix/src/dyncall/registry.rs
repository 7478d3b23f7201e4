// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Numeric type table: libffi's primitives pre-seeded in a fixed id order,
//! plus user-registered struct shapes probed for platform offsets.

use std::ptr;

use libffi::low::type_tag;
use libffi::raw::{
    ffi_abi_FFI_DEFAULT_ABI, ffi_get_struct_offsets, ffi_status_FFI_OK, ffi_type,
    ffi_type_double, ffi_type_float, ffi_type_pointer, ffi_type_sint16, ffi_type_sint32,
    ffi_type_sint64, ffi_type_sint8, ffi_type_uint16, ffi_type_uint32, ffi_type_uint64,
    ffi_type_uint8, ffi_type_void,
};

use super::{DynError, DynResult};
use crate::layout::ScalarKind;

/// Identifier of a registered type.
///
/// Scalar ids are fixed; struct ids are handed out by
/// [`TypeRegistry::register_struct`], counting up from right after
/// [`TypeId::POINTER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

impl TypeId {
    pub const VOID: TypeId = TypeId(0);
    pub const U8: TypeId = TypeId(1);
    pub const U16: TypeId = TypeId(2);
    pub const U32: TypeId = TypeId(3);
    pub const U64: TypeId = TypeId(4);
    pub const I8: TypeId = TypeId(5);
    pub const I16: TypeId = TypeId(6);
    pub const I32: TypeId = TypeId(7);
    pub const I64: TypeId = TypeId(8);
    pub const F32: TypeId = TypeId(9);
    pub const F64: TypeId = TypeId(10);
    pub const POINTER: TypeId = TypeId(11);

    /// Wire value of this id (what the C surface passes around).
    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn from_raw(raw: u32) -> TypeId {
        TypeId(raw)
    }

    const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A typed scalar position inside a call frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarSlot {
    pub offset: usize,
    pub kind: ScalarKind,
}

#[derive(Debug, Clone, Copy)]
enum Entry {
    Void,
    Scalar(ScalarKind),
    Struct(usize),
}

struct StructShape {
    ffi_type: ffi_type,
    /// Null-terminated member array `ffi_type.elements` points into.
    elements: Vec<*mut ffi_type>,
    /// Direct member offsets as probed by `ffi_get_struct_offsets`.
    offsets: Vec<usize>,
    members: Vec<Entry>,
}

// Element pointers target libffi's static primitive descriptors or boxed
// shapes owned by the same registry, never another allocation.
unsafe impl Send for StructShape {}

/// Id-indexed table of scalar kinds and registered struct shapes.
pub struct TypeRegistry {
    entries: Vec<Entry>,
    shapes: Vec<Box<StructShape>>,
}

impl TypeRegistry {
    /// Registry with the twelve scalar entries pre-seeded in id order.
    pub fn new() -> Self {
        TypeRegistry {
            entries: vec![
                Entry::Void,
                Entry::Scalar(ScalarKind::U8),
                Entry::Scalar(ScalarKind::U16),
                Entry::Scalar(ScalarKind::U32),
                Entry::Scalar(ScalarKind::U64),
                Entry::Scalar(ScalarKind::I8),
                Entry::Scalar(ScalarKind::I16),
                Entry::Scalar(ScalarKind::I32),
                Entry::Scalar(ScalarKind::I64),
                Entry::Scalar(ScalarKind::F32),
                Entry::Scalar(ScalarKind::F64),
                Entry::Scalar(ScalarKind::Pointer),
            ],
            shapes: Vec::new(),
        }
    }

    fn entry(&self, id: TypeId) -> DynResult<Entry> {
        self.entries
            .get(id.index())
            .copied()
            .ok_or(DynError::UnknownType { id: id.raw() })
    }

    /// True if `id` names void, a scalar, or a registered struct.
    pub fn contains(&self, id: TypeId) -> bool {
        id.index() < self.entries.len()
    }

    /// Register a struct shape from member ids, in declaration order.
    ///
    /// Probes the platform member offsets through `ffi_get_struct_offsets`,
    /// which also fixes the shape's size and alignment. Returns the id the
    /// new shape answers to.
    pub fn register_struct(&mut self, members: &[TypeId]) -> DynResult<TypeId> {
        if members.is_empty() {
            return Err(DynError::EmptyStruct);
        }
        let mut resolved = Vec::with_capacity(members.len());
        for (index, id) in members.iter().enumerate() {
            match self.entry(*id)? {
                Entry::Void => return Err(DynError::VoidMember { index }),
                entry => resolved.push(entry),
            }
        }

        let mut elements: Vec<*mut ffi_type> = Vec::with_capacity(members.len() + 1);
        for id in members {
            elements.push(self.ffi_type_ptr(*id)?);
        }
        elements.push(ptr::null_mut());

        // The element array must not move once ffi_type points into it,
        // hence the box before wiring up the pointer.
        let mut shape = Box::new(StructShape {
            ffi_type: ffi_type::default(),
            elements,
            offsets: vec![0; members.len()],
            members: resolved,
        });
        shape.ffi_type = ffi_type {
            type_: type_tag::STRUCT,
            elements: shape.elements.as_mut_ptr(),
            ..ffi_type::default()
        };

        let status = unsafe {
            ffi_get_struct_offsets(
                ffi_abi_FFI_DEFAULT_ABI,
                ptr::addr_of_mut!(shape.ffi_type),
                shape.offsets.as_mut_ptr(),
            )
        };
        if status != ffi_status_FFI_OK {
            return Err(DynError::OffsetProbe { status });
        }

        let shape_idx = self.shapes.len();
        self.shapes.push(shape);
        let id = TypeId(self.entries.len() as u32);
        self.entries.push(Entry::Struct(shape_idx));
        Ok(id)
    }

    /// Size in bytes of `id` (0 for void, probed size for structs).
    pub fn size_of(&self, id: TypeId) -> DynResult<usize> {
        Ok(match self.entry(id)? {
            Entry::Void => 0,
            Entry::Scalar(kind) => kind.size_bytes(),
            Entry::Struct(idx) => self.shapes[idx].ffi_type.size,
        })
    }

    /// Alignment in bytes of `id` (1 for void).
    pub fn alignment_of(&self, id: TypeId) -> DynResult<usize> {
        Ok(match self.entry(id)? {
            Entry::Void => 1,
            Entry::Scalar(kind) => kind.alignment(),
            Entry::Struct(idx) => self.shapes[idx].ffi_type.alignment as usize,
        })
    }

    /// Append the typed scalar slots of `id`, offset relative to `base`,
    /// depth-first in declaration order.
    ///
    /// Void contributes nothing, a scalar contributes one slot at `base`,
    /// and a struct contributes one slot per leaf at `base` plus the probed
    /// member offsets.
    pub fn scalar_slots(
        &self,
        id: TypeId,
        base: usize,
        out: &mut Vec<ScalarSlot>,
    ) -> DynResult<()> {
        let entry = self.entry(id)?;
        self.entry_slots(entry, base, out);
        Ok(())
    }

    fn entry_slots(&self, entry: Entry, base: usize, out: &mut Vec<ScalarSlot>) {
        match entry {
            Entry::Void => {}
            Entry::Scalar(kind) => out.push(ScalarSlot { offset: base, kind }),
            Entry::Struct(idx) => {
                let shape = &self.shapes[idx];
                for (member, offset) in shape.members.iter().zip(&shape.offsets) {
                    self.entry_slots(*member, base + offset, out);
                }
            }
        }
    }

    /// Absolute scalar offsets of `id`, depth-first in declaration order.
    ///
    /// The registry-side counterpart of
    /// [`TypeLayout::flattened_scalar_offsets`](crate::layout::TypeLayout::flattened_scalar_offsets).
    pub fn flattened_offsets(&self, id: TypeId) -> DynResult<Vec<usize>> {
        let mut slots = Vec::new();
        self.scalar_slots(id, 0, &mut slots)?;
        Ok(slots.into_iter().map(|slot| slot.offset).collect())
    }

    /// Raw `ffi_type` pointer for `id`.
    ///
    /// Struct pointers stay valid for the registry's lifetime: shapes are
    /// boxed and never dropped or reordered once registered.
    pub(crate) fn ffi_type_ptr(&mut self, id: TypeId) -> DynResult<*mut ffi_type> {
        Ok(match self.entry(id)? {
            Entry::Void => unsafe { ptr::addr_of_mut!(ffi_type_void) },
            Entry::Scalar(kind) => scalar_ffi_type(kind),
            Entry::Struct(idx) => ptr::addr_of_mut!(self.shapes[idx].ffi_type),
        })
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn scalar_ffi_type(kind: ScalarKind) -> *mut ffi_type {
    unsafe {
        match kind {
            ScalarKind::U8 => ptr::addr_of_mut!(ffi_type_uint8),
            ScalarKind::U16 => ptr::addr_of_mut!(ffi_type_uint16),
            ScalarKind::U32 => ptr::addr_of_mut!(ffi_type_uint32),
            ScalarKind::U64 => ptr::addr_of_mut!(ffi_type_uint64),
            ScalarKind::I8 => ptr::addr_of_mut!(ffi_type_sint8),
            ScalarKind::I16 => ptr::addr_of_mut!(ffi_type_sint16),
            ScalarKind::I32 => ptr::addr_of_mut!(ffi_type_sint32),
            ScalarKind::I64 => ptr::addr_of_mut!(ffi_type_sint64),
            ScalarKind::F32 => ptr::addr_of_mut!(ffi_type_float),
            ScalarKind::F64 => ptr::addr_of_mut!(ffi_type_double),
            ScalarKind::Pointer => ptr::addr_of_mut!(ffi_type_pointer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_ids_follow_seeding_order() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.size_of(TypeId::VOID).expect("void"), 0);
        assert_eq!(registry.size_of(TypeId::U8).expect("u8"), 1);
        assert_eq!(registry.size_of(TypeId::U16).expect("u16"), 2);
        assert_eq!(registry.size_of(TypeId::U32).expect("u32"), 4);
        assert_eq!(registry.size_of(TypeId::I64).expect("i64"), 8);
        assert_eq!(
            registry.size_of(TypeId::POINTER).expect("pointer"),
            std::mem::size_of::<*const ()>()
        );
        assert_eq!(TypeId::POINTER.raw(), 11);
    }

    #[test]
    fn register_struct_probes_interleaved_shape() {
        let mut registry = TypeRegistry::new();
        let id = registry
            .register_struct(&[TypeId::U32, TypeId::U16, TypeId::U32, TypeId::U16])
            .expect("register");
        assert_eq!(id.raw(), 12);
        assert_eq!(registry.size_of(id).expect("size"), 16);
        assert_eq!(registry.alignment_of(id).expect("alignment"), 4);
        assert_eq!(
            registry.flattened_offsets(id).expect("offsets"),
            vec![0, 4, 8, 12]
        );
    }

    #[test]
    fn nested_struct_flattens_deep_offsets() {
        let mut registry = TypeRegistry::new();
        let inner = registry
            .register_struct(&[TypeId::U32, TypeId::U32])
            .expect("inner");
        let outer = registry.register_struct(&[inner, inner]).expect("outer");
        let big = registry
            .register_struct(&[outer, TypeId::U8, TypeId::U8, outer])
            .expect("big");

        assert_eq!(registry.size_of(inner).expect("inner size"), 8);
        assert_eq!(registry.size_of(outer).expect("outer size"), 16);
        assert_eq!(registry.size_of(big).expect("big size"), 36);
        assert_eq!(
            registry.flattened_offsets(big).expect("big offsets"),
            vec![0, 4, 8, 12, 16, 17, 20, 24, 28, 32]
        );
    }

    #[test]
    fn register_struct_rejects_bad_members() {
        let mut registry = TypeRegistry::new();
        match registry.register_struct(&[]) {
            Err(DynError::EmptyStruct) => {}
            other => panic!("unexpected result {:?}", other),
        }
        match registry.register_struct(&[TypeId::U32, TypeId::VOID]) {
            Err(DynError::VoidMember { index: 1 }) => {}
            other => panic!("unexpected result {:?}", other),
        }
        match registry.register_struct(&[TypeId::from_raw(99)]) {
            Err(DynError::UnknownType { id: 99 }) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn scalar_slot_of_plain_scalar_sits_at_base() {
        let registry = TypeRegistry::new();
        let mut slots = Vec::new();
        registry
            .scalar_slots(TypeId::U32, 24, &mut slots)
            .expect("slots");
        assert_eq!(
            slots,
            vec![ScalarSlot {
                offset: 24,
                kind: ScalarKind::U32,
            }]
        );
    }
}
