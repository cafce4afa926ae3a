//! Native test library for the nbridge test suites
//!
//! The build script compiles a small C library exporting:
//!
//! | symbol     | signature               |
//! |------------|-------------------------|
//! | `add`      | `(i32, i32) -> i32`     |
//! | `mul`      | `(i32, i32) -> i32`     |
//! | `scale`    | `(i64, i32) -> i64`     |
//! | `mean`     | `(f64, f64) -> f64`     |
//! | `checksum` | `(u8, u8) -> u8`        |
//! | `bump`     | `() -> void`            |
//! | `bumps`    | `() -> i32`             |
//!
//! Integer arithmetic wraps. `bump` increments a counter that `bumps` reads,
//! which lets tests observe whether two handles share one mapping.

use std::path::{Path, PathBuf};

/// Logical name of the test library
pub const LIBRARY_NAME: &str = "native";

/// Directory holding the compiled test library
pub fn library_dir() -> &'static Path {
    Path::new(env!("NBRIDGE_FIXTURE_DIR"))
}

/// Full path of the compiled test library
pub fn library_path() -> PathBuf {
    PathBuf::from(env!("NBRIDGE_FIXTURE_FILE"))
}

/// Platform file name of the test library (e.g. `libnative.so`)
pub fn library_file_name() -> String {
    library_path()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
