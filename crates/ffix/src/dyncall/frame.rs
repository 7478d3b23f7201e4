// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Staged call frame: typed cursor access over the raw argument and return
//! buffers the harness laid out for one bound symbol.

use std::mem;
use std::os::raw::c_void;
use std::ptr;

use super::registry::ScalarSlot;
use super::{DynError, DynResult};
use crate::layout::ScalarKind;

/// One staged invocation of a bound symbol.
///
/// Arguments are written scalar by scalar through the `write_*` cursor and
/// must arrive in flattened declaration order; results are drained the same
/// way through `read_*`. Cursor position and slot kind are both checked, so
/// a frame rejects out-of-order or wrongly typed traffic instead of
/// corrupting the buffer.
#[derive(Debug)]
pub struct CallFrame {
    symbol: String,
    arg_bases: Vec<usize>,
    args: Vec<u8>,
    write_slots: Vec<ScalarSlot>,
    write_idx: usize,
    ret: Vec<u8>,
    read_slots: Vec<ScalarSlot>,
    read_idx: usize,
}

macro_rules! frame_scalar {
    ($write:ident, $read:ident, $ty:ty, $kind:expr) => {
        #[doc = concat!("Write the next argument slot as `", stringify!($ty), "`.")]
        pub fn $write(&mut self, value: $ty) -> DynResult<()> {
            self.write_scalar($kind, value)
        }

        #[doc = concat!("Read the next return slot as `", stringify!($ty), "`.")]
        pub fn $read(&mut self) -> DynResult<$ty> {
            self.read_scalar($kind)
        }
    };
}

impl CallFrame {
    pub(crate) fn new(
        symbol: &str,
        arg_bases: Vec<usize>,
        args_len: usize,
        write_slots: Vec<ScalarSlot>,
        ret_len: usize,
        read_slots: Vec<ScalarSlot>,
    ) -> Self {
        CallFrame {
            symbol: symbol.to_string(),
            arg_bases,
            args: vec![0; args_len],
            write_slots,
            write_idx: 0,
            ret: vec![0; ret_len],
            read_slots,
            read_idx: 0,
        }
    }

    /// Symbol this frame was staged for.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Argument slots not yet written.
    pub fn remaining_writes(&self) -> usize {
        self.write_slots.len() - self.write_idx
    }

    /// Return slots not yet read.
    pub fn remaining_reads(&self) -> usize {
        self.read_slots.len() - self.read_idx
    }

    /// Rewind both cursors and zero both buffers, keeping the staged shape.
    pub fn reset(&mut self) {
        self.write_idx = 0;
        self.read_idx = 0;
        self.args.fill(0);
        self.ret.fill(0);
    }

    /// Raw argument buffer, each argument at its 8-byte-aligned base.
    pub fn arg_bytes(&self) -> &[u8] {
        &self.args
    }

    /// Raw return buffer.
    pub fn ret_bytes(&self) -> &[u8] {
        &self.ret
    }

    frame_scalar!(write_u8, read_u8, u8, ScalarKind::U8);
    frame_scalar!(write_u16, read_u16, u16, ScalarKind::U16);
    frame_scalar!(write_u32, read_u32, u32, ScalarKind::U32);
    frame_scalar!(write_u64, read_u64, u64, ScalarKind::U64);
    frame_scalar!(write_i8, read_i8, i8, ScalarKind::I8);
    frame_scalar!(write_i16, read_i16, i16, ScalarKind::I16);
    frame_scalar!(write_i32, read_i32, i32, ScalarKind::I32);
    frame_scalar!(write_i64, read_i64, i64, ScalarKind::I64);
    frame_scalar!(write_f32, read_f32, f32, ScalarKind::F32);
    frame_scalar!(write_f64, read_f64, f64, ScalarKind::F64);
    frame_scalar!(write_ptr, read_ptr, *mut c_void, ScalarKind::Pointer);

    fn write_scalar<T: Copy>(&mut self, kind: ScalarKind, value: T) -> DynResult<()> {
        let index = self.write_idx;
        let slot = self
            .write_slots
            .get(index)
            .copied()
            .ok_or(DynError::SlotExhausted { index })?;
        if slot.kind != kind {
            return Err(DynError::SlotMismatch {
                index,
                expected: slot.kind,
                found: kind,
            });
        }
        debug_assert!(slot.offset + mem::size_of::<T>() <= self.args.len());
        // Slot offsets come from the libffi probe and may be unaligned
        // relative to the buffer start.
        unsafe {
            ptr::write_unaligned(self.args.as_mut_ptr().add(slot.offset).cast::<T>(), value);
        }
        self.write_idx = index + 1;
        Ok(())
    }

    fn read_scalar<T: Copy>(&mut self, kind: ScalarKind) -> DynResult<T> {
        let index = self.read_idx;
        let slot = self
            .read_slots
            .get(index)
            .copied()
            .ok_or(DynError::SlotExhausted { index })?;
        if slot.kind != kind {
            return Err(DynError::SlotMismatch {
                index,
                expected: slot.kind,
                found: kind,
            });
        }
        debug_assert!(slot.offset + mem::size_of::<T>() <= self.ret.len());
        let value =
            unsafe { ptr::read_unaligned(self.ret.as_ptr().add(slot.offset).cast::<T>()) };
        self.read_idx = index + 1;
        Ok(value)
    }

    /// One pointer per argument, aimed at that argument's base in the
    /// argument buffer. Feeds `ffi_call`'s avalue array.
    pub(crate) fn arg_value_ptrs(&mut self) -> Vec<*mut c_void> {
        let base = self.args.as_mut_ptr();
        self.arg_bases
            .iter()
            .map(|offset| unsafe { base.add(*offset).cast::<c_void>() })
            .collect()
    }

    pub(crate) fn ret_ptr(&mut self) -> *mut c_void {
        self.ret.as_mut_ptr().cast::<c_void>()
    }
}
