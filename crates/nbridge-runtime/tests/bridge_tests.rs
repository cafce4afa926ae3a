//! End-to-end bridge tests against the compiled `native` test library
//!
//! Tests cover:
//! - Loading by logical name through a search path override
//! - Calls through explicit signatures and typed bindings
//! - Symbol resolution failures and caching

use nbridge_config::ArgLiteral;
use nbridge_runtime::{
    BridgeError, CallError, FunctionSignature, LibraryHandle, LibraryLoader, NativeBridge,
    NativeKind, NativeValue,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

// ============================================================================
// Test Helpers
// ============================================================================

fn fixture_loader() -> LibraryLoader {
    LibraryLoader::with_search_paths(vec![nbridge_fixture::library_dir().to_path_buf()])
}

fn load_native(loader: &LibraryLoader) -> LibraryHandle {
    loader
        .load(nbridge_fixture::LIBRARY_NAME)
        .expect("fixture library should load")
}

fn signature(name: &str, params: &[NativeKind], returns: NativeKind) -> FunctionSignature {
    FunctionSignature::new(name, params.to_vec(), returns).unwrap()
}

fn add_signature() -> FunctionSignature {
    signature("add", &[NativeKind::I32, NativeKind::I32], NativeKind::I32)
}

// ============================================================================
// Invoke
// ============================================================================

#[test]
fn test_add_twenty_and_forty() {
    let loader = fixture_loader();
    let native = load_native(&loader);
    let bridge = NativeBridge::new();

    let result = unsafe {
        bridge.invoke(
            &native,
            &add_signature(),
            &[NativeValue::I32(20), NativeValue::I32(40)],
        )
    };
    assert_eq!(result, Ok(NativeValue::I32(60)));
}

#[rstest]
#[case(
    "add",
    vec![NativeKind::I32, NativeKind::I32],
    NativeKind::I32,
    vec![NativeValue::I32(-7), NativeValue::I32(3)],
    NativeValue::I32(-4),
)]
#[case(
    "mul",
    vec![NativeKind::I32, NativeKind::I32],
    NativeKind::I32,
    vec![NativeValue::I32(6), NativeValue::I32(7)],
    NativeValue::I32(42),
)]
#[case(
    "scale",
    vec![NativeKind::I64, NativeKind::I32],
    NativeKind::I64,
    vec![NativeValue::I64(1 << 33), NativeValue::I32(4)],
    NativeValue::I64(1 << 35),
)]
#[case(
    "mean",
    vec![NativeKind::F64, NativeKind::F64],
    NativeKind::F64,
    vec![NativeValue::F64(1.0), NativeValue::F64(4.0)],
    NativeValue::F64(2.5),
)]
#[case(
    "checksum",
    vec![NativeKind::U8, NativeKind::U8],
    NativeKind::U8,
    vec![NativeValue::U8(250), NativeValue::U8(10)],
    NativeValue::U8(4),
)]
fn test_fixture_functions(
    #[case] name: &str,
    #[case] params: Vec<NativeKind>,
    #[case] returns: NativeKind,
    #[case] args: Vec<NativeValue>,
    #[case] expected: NativeValue,
) {
    let loader = fixture_loader();
    let native = load_native(&loader);
    let bridge = NativeBridge::new();

    let result = unsafe { bridge.invoke(&native, &signature(name, &params, returns), &args) };
    assert_eq!(result, Ok(expected));
}

#[test]
fn test_config_literals_drive_a_call() {
    let loader = fixture_loader();
    let native = load_native(&loader);
    let bridge = NativeBridge::new();

    let sig = signature("mean", &[NativeKind::F64, NativeKind::F64], NativeKind::F64);
    let args = sig
        .values_from_literals(&[ArgLiteral::Integer(3), ArgLiteral::Float(4.0)])
        .unwrap();

    let result = unsafe { bridge.invoke(&native, &sig, &args) };
    assert_eq!(result, Ok(NativeValue::F64(3.5)));
}

#[test]
fn test_mismatched_args_never_reach_native_code() {
    let loader = fixture_loader();
    let native = load_native(&loader);
    let bridge = NativeBridge::new();

    let result = unsafe { bridge.invoke(&native, &add_signature(), &[NativeValue::I32(1)]) };
    assert!(matches!(result, Err(CallError::SignatureMismatch { .. })));
    assert_eq!(bridge.resolved_count(), 0);
}

// ============================================================================
// Symbol Resolution
// ============================================================================

#[test]
fn test_missing_symbol() {
    let loader = fixture_loader();
    let native = load_native(&loader);
    let bridge = NativeBridge::new();

    let sig = signature(
        "subtract",
        &[NativeKind::I32, NativeKind::I32],
        NativeKind::I32,
    );
    let result =
        unsafe { bridge.invoke(&native, &sig, &[NativeValue::I32(1), NativeValue::I32(2)]) };

    assert_eq!(
        result,
        Err(CallError::SymbolNotFound {
            library: "native".to_string(),
            symbol: "subtract".to_string(),
        })
    );
    insta::assert_snapshot!(
        result.unwrap_err().to_string(),
        @"symbol 'subtract' not found in library 'native'"
    );
    assert_eq!(bridge.resolved_count(), 0);
}

#[test]
fn test_missing_symbol_is_stable() {
    let loader = fixture_loader();
    let native = load_native(&loader);
    let bridge = NativeBridge::new();
    let sig = signature("not_exported", &[], NativeKind::I32);

    for _ in 0..3 {
        assert!(matches!(
            bridge.resolve(&native, &sig),
            Err(CallError::SymbolNotFound { .. })
        ));
    }
    assert!(!native.has_symbol("not_exported"));
    assert!(native.has_symbol("add"));
}

#[test]
fn test_resolution_is_cached_per_signature() {
    let loader = fixture_loader();
    let native = load_native(&loader);
    let bridge = NativeBridge::new();

    let first = bridge.resolve(&native, &add_signature()).unwrap();
    let second = bridge.resolve(&native, &add_signature()).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(bridge.resolved_count(), 1);

    // Same symbol, different declared signature: separate entry
    let widened = signature("add", &[NativeKind::I32, NativeKind::I32], NativeKind::I64);
    bridge.resolve(&native, &widened).unwrap();
    assert_eq!(bridge.resolved_count(), 2);
}

#[test]
fn test_resolved_function_keeps_library_alive() {
    let bridge = NativeBridge::new();
    let function = {
        let loader = fixture_loader();
        let native = load_native(&loader);
        bridge.resolve(&native, &add_signature()).unwrap()
    };

    assert_eq!(function.library().map(|l| l.name()), Some("native"));
    let result = unsafe { function.call(&[NativeValue::I32(2), NativeValue::I32(3)]) };
    assert_eq!(result, Ok(NativeValue::I32(5)));
}

// ============================================================================
// Load Idempotence
// ============================================================================

#[test]
fn test_double_load_shares_state() {
    let loader = fixture_loader();
    let first = load_native(&loader);
    let second = load_native(&loader);
    assert!(first.same_library(&second));
    assert_eq!(loader.loaded_count(), 1);

    let bridge = NativeBridge::new();
    let bump = signature("bump", &[], NativeKind::Void);
    let bumps = signature("bumps", &[], NativeKind::I32);

    let before = unsafe { bridge.invoke(&second, &bumps, &[]) }.unwrap();
    let result = unsafe { bridge.invoke(&first, &bump, &[]) };
    assert_eq!(result, Ok(NativeValue::Void));
    let after = unsafe { bridge.invoke(&second, &bumps, &[]) }.unwrap();

    match (before, after) {
        (NativeValue::I32(b), NativeValue::I32(a)) => assert_eq!(a, b + 1),
        other => panic!("unexpected values {:?}", other),
    }
}

// ============================================================================
// Typed Binding
// ============================================================================

#[test]
fn test_typed_binding() {
    let loader = fixture_loader();
    let native = load_native(&loader);
    let bridge = NativeBridge::new();

    let add = unsafe { bridge.bind::<(i32, i32), i32>(&native, "add") }.unwrap();
    assert_eq!(add.call((20, 40)), 60);

    let scale = unsafe { bridge.bind::<(i64, i32), i64>(&native, "scale") }.unwrap();
    assert_eq!(scale.call((-5, 3)), -15);
}

#[test]
fn test_typed_binding_missing_symbol() {
    let loader = fixture_loader();
    let native = load_native(&loader);
    let bridge = NativeBridge::new();

    let result = unsafe { bridge.bind::<(i32, i32), i32>(&native, "divide") };
    assert!(matches!(
        result,
        Err(BridgeError::Call(CallError::SymbolNotFound { .. }))
    ));
}

#[test]
fn test_typed_binding_shares_cache_with_invoke() {
    let loader = fixture_loader();
    let native = load_native(&loader);
    let bridge = NativeBridge::new();

    let args = [NativeValue::I32(1), NativeValue::I32(1)];
    unsafe { bridge.invoke(&native, &add_signature(), &args) }.unwrap();
    let _add = unsafe { bridge.bind::<(i32, i32), i32>(&native, "add") }.unwrap();
    assert_eq!(bridge.resolved_count(), 1);
}

#[test]
fn test_concurrent_calls() {
    let loader = fixture_loader();
    let native = load_native(&loader);
    let bridge = NativeBridge::new();

    std::thread::scope(|scope| {
        for t in 0..4 {
            let native = native.clone();
            let bridge = &bridge;
            scope.spawn(move || {
                for i in 0..100 {
                    let result = unsafe {
                        bridge.invoke(
                            &native,
                            &add_signature(),
                            &[NativeValue::I32(t), NativeValue::I32(i)],
                        )
                    };
                    assert_eq!(result, Ok(NativeValue::I32(t + i)));
                }
            });
        }
    });
    assert_eq!(bridge.resolved_count(), 1);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_add_matches_wrapping_add(a: i32, b: i32) {
        let loader = fixture_loader();
        let native = load_native(&loader);
        let bridge = NativeBridge::new();

        let args = [NativeValue::I32(a), NativeValue::I32(b)];
        let result = unsafe { bridge.invoke(&native, &add_signature(), &args) };
        prop_assert_eq!(result, Ok(NativeValue::I32(a.wrapping_add(b))));
    }

    #[test]
    fn prop_typed_mul_matches_wrapping_mul(a: i32, b: i32) {
        let loader = fixture_loader();
        let native = load_native(&loader);
        let bridge = NativeBridge::new();

        let mul = unsafe { bridge.bind::<(i32, i32), i32>(&native, "mul") }.unwrap();
        prop_assert_eq!(mul.call((a, b)), a.wrapping_mul(b));
    }
}
