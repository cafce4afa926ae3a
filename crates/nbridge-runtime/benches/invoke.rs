//! Native call benchmarks
//!
//! Measures the per-call cost of the bridge against the fixture library:
//! - Dynamic invoke with a cached resolution
//! - Typed binding calls
//! - First resolution of a symbol

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nbridge_runtime::{FunctionSignature, LibraryLoader, NativeBridge, NativeKind, NativeValue};

fn add_signature() -> FunctionSignature {
    FunctionSignature::new(
        "add",
        vec![NativeKind::I32, NativeKind::I32],
        NativeKind::I32,
    )
    .expect("valid signature")
}

fn fixture_loader() -> LibraryLoader {
    LibraryLoader::with_search_paths(vec![nbridge_fixture::library_dir().to_path_buf()])
}

// ============================================================================
// Call Overhead
// ============================================================================

fn bench_invoke_cached(c: &mut Criterion) {
    let loader = fixture_loader();
    let native = loader.load(nbridge_fixture::LIBRARY_NAME).expect("fixture loads");
    let bridge = NativeBridge::new();
    let signature = add_signature();
    let args = [NativeValue::I32(20), NativeValue::I32(40)];

    c.bench_function("invoke_add_cached", |b| {
        b.iter(|| unsafe {
            bridge.invoke(&native, black_box(&signature), black_box(&args))
        })
    });
}

fn bench_typed_call(c: &mut Criterion) {
    let loader = fixture_loader();
    let native = loader.load(nbridge_fixture::LIBRARY_NAME).expect("fixture loads");
    let bridge = NativeBridge::new();
    let add = unsafe { bridge.bind::<(i32, i32), i32>(&native, "add") }.expect("add binds");

    c.bench_function("typed_add", |b| {
        b.iter(|| add.call((black_box(20), black_box(40))))
    });
}

// ============================================================================
// Resolution
// ============================================================================

fn bench_first_resolution(c: &mut Criterion) {
    let loader = fixture_loader();
    let native = loader.load(nbridge_fixture::LIBRARY_NAME).expect("fixture loads");
    let signature = add_signature();

    c.bench_function("resolve_add_uncached", |b| {
        b.iter(|| {
            let bridge = NativeBridge::new();
            bridge.resolve(&native, black_box(&signature)).map(|_| ())
        })
    });
}

criterion_group!(
    benches,
    bench_invoke_cached,
    bench_typed_call,
    bench_first_resolution
);
criterion_main!(benches);
