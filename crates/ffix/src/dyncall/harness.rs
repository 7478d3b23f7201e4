// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Harness tying the pieces together: a loaded library, symbol bindings
//! made against it, and the staged call frame libffi invokes through.

use std::collections::HashMap;
use std::mem;

use libffi::low::prep_cif;
use libffi::raw::{ffi_abi_FFI_DEFAULT_ABI, ffi_arg, ffi_call, ffi_cif};
use libloading::Library;

use super::frame::CallFrame;
use super::registry::{TypeId, TypeRegistry};
use super::{DynError, DynResult, RawFn};

struct Binding {
    args: Vec<TypeId>,
    ret: TypeId,
    fn_: RawFn,
}

/// Dynamic call harness over a loaded shared library.
///
/// A harness owns a [`TypeRegistry`], at most one open library, the symbol
/// bindings made against it, and at most one staged [`CallFrame`]. The flow
/// is open, register struct shapes, bind symbols, then stage and call as
/// often as needed.
pub struct Harness {
    registry: TypeRegistry,
    library: Option<Library>,
    bindings: HashMap<String, Binding>,
    frame: Option<CallFrame>,
}

impl Harness {
    /// Harness with a fresh registry and no library open.
    pub fn new() -> Self {
        Harness {
            registry: TypeRegistry::new(),
            library: None,
            bindings: HashMap::new(),
            frame: None,
        }
    }

    /// Open a shared library and return a harness bound to it.
    ///
    /// # Safety
    ///
    /// Loading a shared library runs its initialization code. The caller
    /// must trust the library at `path`.
    pub unsafe fn open(path: &str) -> DynResult<Self> {
        let mut harness = Harness::new();
        harness.open_library(path)?;
        Ok(harness)
    }

    /// Open a shared library on this harness.
    ///
    /// Any previous library, its bindings, and the staged frame are
    /// dropped. Registered struct shapes stay.
    ///
    /// # Safety
    ///
    /// Loading a shared library runs its initialization code. The caller
    /// must trust the library at `path`.
    pub unsafe fn open_library(&mut self, path: &str) -> DynResult<()> {
        let library = Library::new(path).map_err(|err| DynError::LibraryOpen {
            path: path.to_string(),
            reason: err.to_string(),
        })?;
        self.close();
        self.library = Some(library);
        Ok(())
    }

    /// Drop the open library together with everything bound against it.
    pub fn close(&mut self) {
        self.frame = None;
        self.bindings.clear();
        self.library = None;
    }

    /// Shared view of the type registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Register a struct shape from member ids. See
    /// [`TypeRegistry::register_struct`].
    pub fn register_struct(&mut self, members: &[TypeId]) -> DynResult<TypeId> {
        self.registry.register_struct(members)
    }

    /// Bind an exported symbol of the open library under the declared
    /// signature.
    ///
    /// # Safety
    ///
    /// The exported symbol must be an `extern "C"` function whose true
    /// signature matches `args` and `ret` as described to the registry.
    pub unsafe fn bind(&mut self, symbol: &str, args: &[TypeId], ret: TypeId) -> DynResult<()> {
        self.check_signature(args, ret)?;
        let library = self.library.as_ref().ok_or(DynError::LibraryNotOpen)?;
        let fn_ = library
            .get::<RawFn>(symbol.as_bytes())
            .map_err(|err| DynError::SymbolNotFound {
                symbol: symbol.to_string(),
                reason: err.to_string(),
            })?;
        // The raw pointer stays valid while the library stays open;
        // close() drops bindings together with the library.
        let fn_ = *fn_;
        self.bindings.insert(
            symbol.to_string(),
            Binding {
                args: args.to_vec(),
                ret,
                fn_,
            },
        );
        Ok(())
    }

    /// Bind a function pointer directly, without going through a library.
    ///
    /// # Safety
    ///
    /// `fn_` must be an `extern "C"` function whose true signature matches
    /// `args` and `ret` as described to the registry.
    pub unsafe fn bind_ptr(
        &mut self,
        symbol: &str,
        args: &[TypeId],
        ret: TypeId,
        fn_: RawFn,
    ) -> DynResult<()> {
        self.check_signature(args, ret)?;
        self.bindings.insert(
            symbol.to_string(),
            Binding {
                args: args.to_vec(),
                ret,
                fn_,
            },
        );
        Ok(())
    }

    fn check_signature(&self, args: &[TypeId], ret: TypeId) -> DynResult<()> {
        for id in args.iter().copied().chain([ret]) {
            if !self.registry.contains(id) {
                return Err(DynError::UnknownType { id: id.raw() });
            }
        }
        Ok(())
    }

    /// Stage a call frame for a bound symbol, replacing any previous frame.
    ///
    /// Arguments are packed left to right at 8-byte strides, so every
    /// argument starts on its own slot boundary regardless of type. The
    /// return buffer never goes below `ffi_arg` width: libffi widens small
    /// integral returns to a full word.
    pub fn stage(&mut self, symbol: &str) -> DynResult<()> {
        let binding = self
            .bindings
            .get(symbol)
            .ok_or_else(|| DynError::UnboundFunction {
                symbol: symbol.to_string(),
            })?;

        let mut arg_bases = Vec::with_capacity(binding.args.len());
        let mut write_slots = Vec::new();
        let mut args_len = 0;
        for id in &binding.args {
            arg_bases.push(args_len);
            self.registry.scalar_slots(*id, args_len, &mut write_slots)?;
            args_len += self.registry.size_of(*id)?.next_multiple_of(8);
        }

        let mut read_slots = Vec::new();
        self.registry.scalar_slots(binding.ret, 0, &mut read_slots)?;
        let ret_len = self
            .registry
            .size_of(binding.ret)?
            .max(mem::size_of::<ffi_arg>());

        self.frame = Some(CallFrame::new(
            symbol, arg_bases, args_len, write_slots, ret_len, read_slots,
        ));
        Ok(())
    }

    /// The staged call frame.
    pub fn frame_mut(&mut self) -> DynResult<&mut CallFrame> {
        self.frame.as_mut().ok_or(DynError::NoFrame)
    }

    /// Invoke the staged frame's symbol through libffi.
    ///
    /// The frame keeps its contents afterwards, so results can be read and
    /// the same frame reset and reused.
    pub fn call(&mut self) -> DynResult<()> {
        let frame = self.frame.as_mut().ok_or(DynError::NoFrame)?;
        let binding = self
            .bindings
            .get(frame.symbol())
            .ok_or_else(|| DynError::UnboundFunction {
                symbol: frame.symbol().to_string(),
            })?;

        let mut arg_types = Vec::with_capacity(binding.args.len());
        for id in &binding.args {
            arg_types.push(self.registry.ffi_type_ptr(*id)?);
        }
        let ret_type = self.registry.ffi_type_ptr(binding.ret)?;

        // Soundness rests on the bind-time contract: the cif built from the
        // declared signature matches the symbol's true signature.
        unsafe {
            let mut cif = ffi_cif::default();
            prep_cif(
                &mut cif,
                ffi_abi_FFI_DEFAULT_ABI,
                arg_types.len(),
                ret_type,
                arg_types.as_mut_ptr(),
            )
            .map_err(|_| DynError::CifPrep {
                symbol: frame.symbol().to_string(),
            })?;

            let mut arg_values = frame.arg_value_ptrs();
            ffi_call(
                &mut cif,
                Some(binding.fn_),
                frame.ret_ptr(),
                arg_values.as_mut_ptr(),
            );
        }
        Ok(())
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{swap_pair, Inner, PairNarrow};
    use std::sync::atomic::{AtomicU32, Ordering};

    extern "C" fn double_it(value: u32) -> u32 {
        value.wrapping_mul(2)
    }

    extern "C" fn swap(pair: PairNarrow) -> PairNarrow {
        swap_pair(pair)
    }

    extern "C" fn offset_sum(bias: u32, inner: Inner) -> u32 {
        bias.wrapping_add(inner.a).wrapping_add(inner.b)
    }

    static LAST_NOTE: AtomicU32 = AtomicU32::new(0);

    extern "C" fn note(value: u32) {
        LAST_NOTE.store(value, Ordering::SeqCst);
    }

    #[test]
    fn scalar_roundtrip_through_bound_pointer() {
        let mut harness = Harness::new();
        let fn_ = unsafe { mem::transmute::<extern "C" fn(u32) -> u32, RawFn>(double_it) };
        unsafe { harness.bind_ptr("double_it", &[TypeId::U32], TypeId::U32, fn_) }
            .expect("bind");

        harness.stage("double_it").expect("stage");
        harness
            .frame_mut()
            .expect("frame")
            .write_u32(21)
            .expect("write");
        harness.call().expect("call");
        assert_eq!(
            harness.frame_mut().expect("frame").read_u32().expect("read"),
            42
        );
    }

    #[test]
    fn struct_argument_and_return_marshal() {
        let mut harness = Harness::new();
        let pair = harness
            .register_struct(&[TypeId::U32, TypeId::U16, TypeId::U32, TypeId::U16])
            .expect("register");
        let fn_ =
            unsafe { mem::transmute::<extern "C" fn(PairNarrow) -> PairNarrow, RawFn>(swap) };
        unsafe { harness.bind_ptr("swap", &[pair], pair, fn_) }.expect("bind");

        harness.stage("swap").expect("stage");
        {
            let frame = harness.frame_mut().expect("frame");
            frame.write_u32(1).expect("a");
            frame.write_u16(2).expect("b");
            frame.write_u32(3).expect("c");
            frame.write_u16(4).expect("d");
        }
        harness.call().expect("call");

        let frame = harness.frame_mut().expect("frame");
        assert_eq!(frame.read_u32().expect("a"), 3);
        assert_eq!(frame.read_u16().expect("b"), 4);
        assert_eq!(frame.read_u32().expect("c"), 1);
        assert_eq!(frame.read_u16().expect("d"), 2);
    }

    #[test]
    fn struct_after_scalar_lands_on_its_own_slot() {
        let mut harness = Harness::new();
        let inner = harness
            .register_struct(&[TypeId::U32, TypeId::U32])
            .expect("register");
        let fn_ =
            unsafe { mem::transmute::<extern "C" fn(u32, Inner) -> u32, RawFn>(offset_sum) };
        unsafe { harness.bind_ptr("offset_sum", &[TypeId::U32, inner], TypeId::U32, fn_) }
            .expect("bind");

        harness.stage("offset_sum").expect("stage");
        {
            let frame = harness.frame_mut().expect("frame");
            frame.write_u32(100).expect("bias");
            frame.write_u32(7).expect("inner.a");
            frame.write_u32(8).expect("inner.b");
        }
        harness.call().expect("call");
        assert_eq!(
            harness.frame_mut().expect("frame").read_u32().expect("sum"),
            115
        );
    }

    #[test]
    fn void_return_leaves_nothing_to_read() {
        let mut harness = Harness::new();
        let fn_ = unsafe { mem::transmute::<extern "C" fn(u32), RawFn>(note) };
        unsafe { harness.bind_ptr("note", &[TypeId::U32], TypeId::VOID, fn_) }.expect("bind");

        harness.stage("note").expect("stage");
        harness
            .frame_mut()
            .expect("frame")
            .write_u32(42)
            .expect("write");
        harness.call().expect("call");

        assert_eq!(LAST_NOTE.load(Ordering::SeqCst), 42);
        match harness.frame_mut().expect("frame").read_u32() {
            Err(DynError::SlotExhausted { index: 0 }) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn stage_requires_binding() {
        let mut harness = Harness::new();
        match harness.stage("missing") {
            Err(DynError::UnboundFunction { symbol }) => assert_eq!(symbol, "missing"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn call_requires_staged_frame() {
        let mut harness = Harness::new();
        match harness.call() {
            Err(DynError::NoFrame) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn bind_without_library_fails() {
        let mut harness = Harness::new();
        match unsafe { harness.bind("fn_a", &[], TypeId::VOID) } {
            Err(DynError::LibraryNotOpen) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn open_rejects_missing_path() {
        match unsafe { Harness::open("/nonexistent/libmissing.so") } {
            Err(DynError::LibraryOpen { path, .. }) => {
                assert_eq!(path, "/nonexistent/libmissing.so");
            }
            Err(other) => panic!("unexpected error {:?}", other),
            Ok(_) => panic!("open unexpectedly succeeded"),
        }
    }
}
