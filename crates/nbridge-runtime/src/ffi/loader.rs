//! Dynamic library loading
//!
//! Resolves logical library names to platform files and maps each file once.
//! Handles platform-specific library naming conventions and search paths.

use crate::error::{CallError, LoadError};
use crate::log;
use libloading::Library;
use nbridge_config::LibraryConfig;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ffi::c_void;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Handle to a mapped native library
///
/// Cheap to clone. The library stays mapped while any clone is alive; the
/// loader keeps one clone for its own lifetime.
#[derive(Clone)]
pub struct LibraryHandle {
    inner: Arc<LoadedLibrary>,
}

struct LoadedLibrary {
    name: String,
    path: PathBuf,
    library: Library,
}

impl Drop for LoadedLibrary {
    fn drop(&mut self) {
        log!(trace, "Unmapping `{}` ({})", self.name, self.path.display());
    }
}

impl LibraryHandle {
    /// Logical name the library was first loaded under
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// File the library was mapped from
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Whether both handles refer to the same mapping
    pub fn same_library(&self, other: &LibraryHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Identity of the mapping, stable while any clone is alive
    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    /// Whether the library exports `symbol`
    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.symbol_ptr(symbol).is_ok()
    }

    /// Address of an exported symbol
    pub(crate) fn symbol_ptr(&self, symbol: &str) -> Result<*mut c_void, CallError> {
        // SAFETY: the symbol is only read as an address here; what it points
        // at is interpreted by the caller through a signature.
        let address = unsafe {
            self.inner
                .library
                .get::<*mut c_void>(symbol.as_bytes())
                .map(|sym| *sym)
        };

        address.map_err(|e| {
            log!(
                debug,
                "Lookup of `{}` in `{}` failed: {}",
                symbol,
                self.name(),
                e
            );
            CallError::SymbolNotFound {
                library: self.name().to_string(),
                symbol: symbol.to_string(),
            }
        })
    }
}

impl fmt::Debug for LibraryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryHandle")
            .field("name", &self.inner.name)
            .field("path", &self.inner.path)
            .finish()
    }
}

#[derive(Default)]
struct LoaderCache {
    /// Handles by logical name
    by_name: HashMap<String, LibraryHandle>,
    /// Handles by resolved file
    by_path: HashMap<PathBuf, LibraryHandle>,
}

/// Dynamic library loader with caching and platform-specific path resolution
///
/// # Safety
///
/// Loading a dynamic library runs its initialisation code inside this
/// process. Only load libraries you trust.
pub struct LibraryLoader {
    /// Process-level overrides, searched first
    overrides: Vec<PathBuf>,
    /// Working directory, executable directory and platform directories
    defaults: Vec<PathBuf>,
    /// Ask the platform loader when no search path has the library
    system_fallback: bool,
    cache: Mutex<LoaderCache>,
}

impl LibraryLoader {
    /// Create a new library loader with default search paths
    pub fn new() -> Self {
        Self {
            overrides: Vec::new(),
            defaults: Self::default_search_paths(),
            system_fallback: true,
            cache: Mutex::new(LoaderCache::default()),
        }
    }

    /// Create a loader whose overrides are `paths`, searched in the given order
    pub fn with_search_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        Self {
            overrides: paths.into_iter().collect(),
            ..Self::new()
        }
    }

    /// Create a loader from the `[library]` table of a config file
    pub fn from_config(config: &LibraryConfig) -> Self {
        let mut loader = Self::with_search_paths(config.search_paths.iter().cloned());
        loader.set_system_fallback(config.system_fallback);
        loader
    }

    /// Get platform-specific default library search paths
    ///
    /// - All platforms: current working directory, then the executable's directory
    /// - Linux: /usr/local/lib, /usr/lib, /lib (and lib64 variants on 64-bit)
    /// - macOS: /usr/local/lib, /usr/lib, /opt/homebrew/lib
    /// - Windows: %SystemRoot%\System32
    fn default_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }

        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            if !paths.contains(&exe_dir) {
                paths.push(exe_dir);
            }
        }

        #[cfg(target_os = "linux")]
        {
            paths.push(PathBuf::from("/usr/local/lib"));
            paths.push(PathBuf::from("/usr/lib"));
            paths.push(PathBuf::from("/lib"));

            if cfg!(target_pointer_width = "64") {
                paths.push(PathBuf::from("/usr/lib64"));
                paths.push(PathBuf::from("/lib64"));
            }
        }

        #[cfg(target_os = "macos")]
        {
            paths.push(PathBuf::from("/usr/local/lib"));
            paths.push(PathBuf::from("/usr/lib"));
            paths.push(PathBuf::from("/opt/homebrew/lib"));
        }

        #[cfg(target_os = "windows")]
        {
            let root = std::env::var("SystemRoot").unwrap_or_else(|_| "C:\\Windows".to_string());
            paths.push(PathBuf::from(root).join("System32"));
        }

        paths
    }

    /// Candidate file names for a logical name, in priority order
    ///
    /// - Linux: lib{name}.so, {name}.so
    /// - macOS: lib{name}.dylib, lib{name}.so, {name}.dylib, {name}.so
    /// - Windows: {name}.dll, lib{name}.dll
    pub fn platform_file_names(name: &str) -> Vec<String> {
        let extensions: &[&str] = if cfg!(target_os = "windows") {
            &["dll"]
        } else if cfg!(target_os = "macos") {
            &["dylib", "so"]
        } else {
            &["so"]
        };

        let prefixes: &[&str] = if cfg!(target_os = "windows") {
            &["", "lib"]
        } else {
            &["lib", ""]
        };

        prefixes
            .iter()
            .flat_map(|prefix| {
                extensions
                    .iter()
                    .map(move |ext| format!("{}{}.{}", prefix, name, ext))
            })
            .collect()
    }

    /// Search locations in the order they are probed
    pub fn search_paths(&self) -> Vec<PathBuf> {
        self.overrides
            .iter()
            .chain(self.defaults.iter())
            .cloned()
            .collect()
    }

    /// Add a custom search path (searched before all others)
    pub fn add_search_path(&mut self, path: PathBuf) {
        self.overrides.insert(0, path);
    }

    /// Enable or disable resolution through the platform loader
    pub fn set_system_fallback(&mut self, enabled: bool) {
        self.system_fallback = enabled;
    }

    /// Resolve a library name to a file on the search paths
    ///
    /// A name that is already a path (absolute, or containing a separator) is
    /// returned as-is when the file exists.
    pub fn resolve_library_path(&self, name: &str) -> Option<PathBuf> {
        if is_path_like(name) {
            let path = PathBuf::from(name);
            return path.is_file().then_some(path);
        }

        let file_names = Self::platform_file_names(name);
        for dir in self.overrides.iter().chain(self.defaults.iter()) {
            for file_name in &file_names {
                let candidate = dir.join(file_name);
                log!(trace, "Probing {}", candidate.display());
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }

        None
    }

    /// Load a library by logical name or path
    ///
    /// Returns the cached handle if the name, or the file it resolves to, is
    /// already loaded. A failed load leaves nothing behind.
    pub fn load(&self, name: &str) -> Result<LibraryHandle, LoadError> {
        let mut cache = self.cache.lock();

        if let Some(handle) = cache.by_name.get(name) {
            log!(trace, "Library `{}` already loaded", name);
            return Ok(handle.clone());
        }

        let handle = match self.resolve_library_path(name) {
            Some(path) => self.map_file(&mut cache, name, path)?,
            None if self.system_fallback && !is_path_like(name) => {
                self.map_from_system(&mut cache, name)?
            }
            None => {
                return Err(LoadError::NotFound {
                    name: name.to_string(),
                    searched: self.search_paths(),
                })
            }
        };

        cache.by_name.insert(name.to_string(), handle.clone());
        Ok(handle)
    }

    /// Get the number of distinct libraries mapped
    pub fn loaded_count(&self) -> usize {
        self.cache.lock().by_path.len()
    }

    /// Whether `name` has been loaded through this loader
    pub fn is_loaded(&self, name: &str) -> bool {
        self.cache.lock().by_name.contains_key(name)
    }

    fn map_file(
        &self,
        cache: &mut LoaderCache,
        name: &str,
        path: PathBuf,
    ) -> Result<LibraryHandle, LoadError> {
        let key = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        if let Some(handle) = cache.by_path.get(&key) {
            log!(
                debug,
                "`{}` resolves to already mapped {}",
                name,
                key.display()
            );
            return Ok(handle.clone());
        }

        // Map through the canonical path so a relative name is never matched
        // against a different file by the platform loader
        // SAFETY: see the type-level safety note; the library is trusted.
        let library = unsafe { Library::new(&key) }.map_err(|e| LoadError::LoadFailed {
            name: name.to_string(),
            path: path.clone(),
            reason: error_chain(&e),
        })?;

        log!(debug, "Loaded `{}` from {}", name, path.display());
        let handle = LibraryHandle {
            inner: Arc::new(LoadedLibrary {
                name: name.to_string(),
                path,
                library,
            }),
        };
        cache.by_path.insert(key, handle.clone());
        Ok(handle)
    }

    fn map_from_system(
        &self,
        cache: &mut LoaderCache,
        name: &str,
    ) -> Result<LibraryHandle, LoadError> {
        let file_name = PathBuf::from(libloading::library_filename(name));
        if let Some(handle) = cache.by_path.get(&file_name) {
            return Ok(handle.clone());
        }

        log!(
            debug,
            "Asking the platform loader for {}",
            file_name.display()
        );
        // SAFETY: see the type-level safety note; the library is trusted.
        let library = unsafe { Library::new(&file_name) }.map_err(|e| {
            let reason = error_chain(&e);
            log!(
                debug,
                "Platform loader could not open {}: {}",
                file_name.display(),
                reason
            );
            if is_missing_file(&file_name, &reason) {
                LoadError::NotFound {
                    name: name.to_string(),
                    searched: self.search_paths(),
                }
            } else {
                LoadError::LoadFailed {
                    name: name.to_string(),
                    path: file_name.clone(),
                    reason,
                }
            }
        })?;

        log!(debug, "Loaded `{}` through the platform loader", name);
        let handle = LibraryHandle {
            inner: Arc::new(LoadedLibrary {
                name: name.to_string(),
                path: file_name.clone(),
                library,
            }),
        };
        cache.by_path.insert(file_name, handle.clone());
        Ok(handle)
    }
}

impl Default for LibraryLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn is_path_like(name: &str) -> bool {
    let path = Path::new(name);
    path.is_absolute() || path.components().count() > 1
}

/// Loader error message including its sources
fn error_chain(err: &libloading::Error) -> String {
    let mut reason = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        reason.push_str(": ");
        reason.push_str(&cause.to_string());
        source = cause.source();
    }
    reason
}

/// Whether a platform loader failure means `file_name` itself was absent
///
/// A missing transitive dependency names the dependency, not `file_name`,
/// and is reported as a mapping failure.
fn is_missing_file(file_name: &Path, reason: &str) -> bool {
    if cfg!(windows) {
        // ERROR_MOD_NOT_FOUND
        return reason.contains("os error 126");
    }
    let reason = reason.to_lowercase();
    let file_name = file_name.to_string_lossy().to_lowercase();
    reason.contains(&file_name) && reason.contains("no such file")
}
