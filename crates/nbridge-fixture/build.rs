//! Build script for the native test library
//!
//! Compiles `native/native.c` into a shared library named `native` with the
//! host C compiler and exports its location to the crate through
//! `NBRIDGE_FIXTURE_DIR` and `NBRIDGE_FIXTURE_FILE`.

use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=native/native.c");

    let lib_dir = out_dir.join("native");
    fs::create_dir_all(&lib_dir).expect("Failed to create fixture output directory");

    let filename = match target_os.as_str() {
        "windows" => "native.dll",
        "macos" | "ios" => "libnative.dylib",
        _ => "libnative.so",
    };
    let lib_path = lib_dir.join(filename);
    let source = PathBuf::from("native").join("native.c");

    let compiler = cc::Build::new()
        .opt_level(2)
        .try_get_compiler()
        .expect("No C compiler available for the native test library");

    let mut cmd = compiler.to_command();
    if compiler.is_like_msvc() {
        cmd.arg("/LD")
            .arg(&source)
            .arg(format!("/Fo{}\\", lib_dir.display()))
            .arg(format!("/Fe{}", lib_path.display()));
    } else {
        if target_os == "macos" || target_os == "ios" {
            cmd.arg("-dynamiclib");
        } else {
            cmd.arg("-shared");
        }
        cmd.arg("-fPIC").arg("-o").arg(&lib_path).arg(&source);
    }

    let status = cmd
        .status()
        .unwrap_or_else(|e| panic!("Failed to run C compiler: {}", e));
    if !status.success() {
        panic!(
            "Compiling native test library failed with status: {}",
            status
        );
    }

    println!("cargo:rustc-env=NBRIDGE_FIXTURE_DIR={}", lib_dir.display());
    println!(
        "cargo:rustc-env=NBRIDGE_FIXTURE_FILE={}",
        lib_path.display()
    );
}
