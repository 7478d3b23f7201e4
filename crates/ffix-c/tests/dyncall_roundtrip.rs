// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// End-to-end dynamic calls against the fixture operations: register the
// record shapes, bind the exported entry points, then drive them through
// staged frames and compare with direct calls.

#![cfg(feature = "dyncall")]

use std::ffi::CString;
use std::mem;
use std::ptr;

use ffix::dyncall::{Harness, RawFn, TypeId};
use ffix::layout::AbiRecord;
use ffix::{BigOuter, Inner, Outer, PairNarrow};
use ffix_c::{
    ffix_decrement, ffix_dyn_bind, ffix_dyn_call, ffix_dyn_close, ffix_dyn_open,
    ffix_dyn_read_u32, ffix_dyn_register_struct, ffix_dyn_stage, ffix_dyn_write_u32,
    ffix_swap_pair, ffix_sum_inner, ffix_sum_outer, ffix_touch_big_outer, FfixBigOuter,
    FfixError, FfixInner, FfixOuter, FfixPairNarrow,
};

#[test]
fn registry_layouts_agree_with_descriptors() {
    let mut harness = Harness::new();
    let pair = harness
        .register_struct(&[TypeId::U32, TypeId::U16, TypeId::U32, TypeId::U16])
        .expect("pair shape");
    let inner = harness
        .register_struct(&[TypeId::U32, TypeId::U32])
        .expect("inner shape");
    let outer = harness.register_struct(&[inner, inner]).expect("outer shape");
    let big = harness
        .register_struct(&[outer, TypeId::U8, TypeId::U8, outer])
        .expect("big shape");

    let registry = harness.registry();
    let cases = [
        (pair, PairNarrow::layout()),
        (inner, Inner::layout()),
        (outer, Outer::layout()),
        (big, BigOuter::layout()),
    ];
    for (id, layout) in cases {
        assert_eq!(registry.size_of(id).expect("size"), layout.size);
        assert_eq!(
            registry.alignment_of(id).expect("alignment"),
            layout.alignment
        );
        assert_eq!(
            registry.flattened_offsets(id).expect("offsets"),
            layout.flattened_scalar_offsets()
        );
    }
}

#[test]
fn staged_swap_matches_direct_call() {
    let mut harness = Harness::new();
    let pair = harness
        .register_struct(&[TypeId::U32, TypeId::U16, TypeId::U32, TypeId::U16])
        .expect("pair shape");
    let fn_ = unsafe {
        mem::transmute::<extern "C" fn(FfixPairNarrow) -> FfixPairNarrow, RawFn>(ffix_swap_pair)
    };
    unsafe { harness.bind_ptr("ffix_swap_pair", &[pair], pair, fn_) }.expect("bind");

    harness.stage("ffix_swap_pair").expect("stage");
    {
        let frame = harness.frame_mut().expect("frame");
        frame.write_u32(11).expect("a");
        frame.write_u16(22).expect("b");
        frame.write_u32(33).expect("c");
        frame.write_u16(44).expect("d");
    }
    harness.call().expect("call");

    let direct = ffix_swap_pair(FfixPairNarrow {
        a: 11,
        b: 22,
        c: 33,
        d: 44,
    });
    let frame = harness.frame_mut().expect("frame");
    assert_eq!(frame.read_u32().expect("a"), direct.a);
    assert_eq!(frame.read_u16().expect("b"), direct.b);
    assert_eq!(frame.read_u32().expect("c"), direct.c);
    assert_eq!(frame.read_u16().expect("d"), direct.d);
}

#[test]
fn staged_scalar_op_matches_direct_call() {
    let mut harness = Harness::new();
    let fn_ = unsafe { mem::transmute::<extern "C" fn(u32) -> u32, RawFn>(ffix_decrement) };
    unsafe { harness.bind_ptr("ffix_decrement", &[TypeId::U32], TypeId::U32, fn_) }
        .expect("bind");

    harness.stage("ffix_decrement").expect("stage");
    harness
        .frame_mut()
        .expect("frame")
        .write_u32(7)
        .expect("write");
    harness.call().expect("call");
    assert_eq!(
        harness.frame_mut().expect("frame").read_u32().expect("read"),
        ffix_decrement(7)
    );
}

#[test]
fn staged_sums_fold_nested_records() {
    let mut harness = Harness::new();
    let inner = harness
        .register_struct(&[TypeId::U32, TypeId::U32])
        .expect("inner shape");
    let outer = harness.register_struct(&[inner, inner]).expect("outer shape");

    let si = unsafe { mem::transmute::<extern "C" fn(FfixInner) -> u32, RawFn>(ffix_sum_inner) };
    let so = unsafe { mem::transmute::<extern "C" fn(FfixOuter) -> u32, RawFn>(ffix_sum_outer) };
    unsafe { harness.bind_ptr("ffix_sum_inner", &[inner], TypeId::U32, si) }.expect("bind");
    unsafe { harness.bind_ptr("ffix_sum_outer", &[outer], TypeId::U32, so) }.expect("bind");

    harness.stage("ffix_sum_inner").expect("stage");
    {
        let frame = harness.frame_mut().expect("frame");
        frame.write_u32(7).expect("a");
        frame.write_u32(8).expect("b");
    }
    harness.call().expect("call");
    assert_eq!(
        harness.frame_mut().expect("frame").read_u32().expect("read"),
        15
    );

    harness.stage("ffix_sum_outer").expect("stage");
    {
        let frame = harness.frame_mut().expect("frame");
        for value in [1, 2, 3, 4] {
            frame.write_u32(value).expect("leaf");
        }
    }
    harness.call().expect("call");
    assert_eq!(
        harness.frame_mut().expect("frame").read_u32().expect("read"),
        10
    );
}

#[test]
fn staged_touch_takes_ten_leaves_and_returns_nothing() {
    let mut harness = Harness::new();
    let inner = harness
        .register_struct(&[TypeId::U32, TypeId::U32])
        .expect("inner shape");
    let outer = harness.register_struct(&[inner, inner]).expect("outer shape");
    let big = harness
        .register_struct(&[outer, TypeId::U8, TypeId::U8, outer])
        .expect("big shape");

    let touch =
        unsafe { mem::transmute::<extern "C" fn(FfixBigOuter), RawFn>(ffix_touch_big_outer) };
    unsafe { harness.bind_ptr("ffix_touch_big_outer", &[big], TypeId::VOID, touch) }
        .expect("bind");

    harness.stage("ffix_touch_big_outer").expect("stage");
    {
        let frame = harness.frame_mut().expect("frame");
        assert_eq!(frame.remaining_writes(), 10);
        for value in [1, 2, 3, 4] {
            frame.write_u32(value).expect("first outer");
        }
        frame.write_u8(0xAA).expect("troll_a");
        frame.write_u8(0x55).expect("troll_b");
        for value in [5, 6, 7, 8] {
            frame.write_u32(value).expect("second outer");
        }
        assert_eq!(frame.remaining_writes(), 0);
    }
    harness.call().expect("call");
    assert_eq!(harness.frame_mut().expect("frame").remaining_reads(), 0);
}

fn companion_cdylib() -> Option<String> {
    let exe = std::env::current_exe().ok()?;
    let debug_dir = exe.parent()?.parent()?;
    let candidate = debug_dir.join(if cfg!(target_os = "macos") {
        "libffix_c.dylib"
    } else {
        "libffix_c.so"
    });
    if candidate.exists() {
        candidate.to_str().map(str::to_string)
    } else {
        None
    }
}

// The C surface drives one process-global harness, so everything touching
// it lives in a single test.
#[test]
fn c_surface_walks_the_full_flow() {
    let symbol = CString::new("ffix_decrement").expect("symbol");

    // No library open yet: binding fails, registration still works.
    let err = unsafe { ffix_dyn_bind(symbol.as_ptr(), [3u32].as_ptr(), 1, 3) };
    assert_eq!(err, FfixError::FfixLibraryNotOpen);

    let id = unsafe { ffix_dyn_register_struct([3u32, 2, 3, 2].as_ptr(), 4) };
    assert_eq!(id, 12);

    let bad = unsafe { ffix_dyn_register_struct([0u32].as_ptr(), 1) };
    assert_eq!(bad, -(FfixError::FfixVoidMember as i32));

    let empty = unsafe { ffix_dyn_register_struct(ptr::null(), 0) };
    assert_eq!(empty, -(FfixError::FfixEmptyStruct as i32));

    let missing = CString::new("/nonexistent/libmissing.so").expect("path");
    assert_eq!(
        unsafe { ffix_dyn_open(missing.as_ptr()) },
        FfixError::FfixLibraryOpenFailed
    );

    assert_eq!(
        unsafe { ffix_dyn_open(ptr::null()) },
        FfixError::FfixInvalidArgument
    );
    assert_eq!(
        unsafe { ffix_dyn_stage(ptr::null()) },
        FfixError::FfixInvalidArgument
    );

    // No staged frame: traffic and calls report it.
    assert_eq!(ffix_dyn_call(), FfixError::FfixNoFrame);
    assert_eq!(ffix_dyn_write_u32(1), FfixError::FfixNoFrame);
    let mut out = 0u32;
    assert_eq!(unsafe { ffix_dyn_read_u32(&mut out) }, FfixError::FfixNoFrame);

    // When the companion cdylib is on disk, walk the whole flow over the
    // real dlopen path. Skipped quietly when only the rlib was built.
    if let Some(library) = companion_cdylib() {
        let path = CString::new(library).expect("path");
        assert_eq!(unsafe { ffix_dyn_open(path.as_ptr()) }, FfixError::FfixOk);

        let err = unsafe { ffix_dyn_bind(symbol.as_ptr(), [3u32].as_ptr(), 1, 3) };
        assert_eq!(err, FfixError::FfixOk);
        assert_eq!(unsafe { ffix_dyn_stage(symbol.as_ptr()) }, FfixError::FfixOk);
        assert_eq!(ffix_dyn_write_u32(15), FfixError::FfixOk);
        assert_eq!(ffix_dyn_call(), FfixError::FfixOk);

        let mut result = 0u32;
        assert_eq!(unsafe { ffix_dyn_read_u32(&mut result) }, FfixError::FfixOk);
        assert_eq!(result, 5);

        ffix_dyn_close();
        assert_eq!(
            unsafe { ffix_dyn_stage(symbol.as_ptr()) },
            FfixError::FfixUnboundFunction
        );
    }

    ffix_dyn_close();
}
