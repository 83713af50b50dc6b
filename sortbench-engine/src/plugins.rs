//! Dynamic algorithm plugins, loaded through a stable C ABI (spec.md §4.5,
//! §6). Grounded on `libloading`, the standard idiomatic crate for
//! `dlopen`-style loading in Rust — no repo in the retrieval pack loads
//! plugins dynamically, so this dependency is a deliberate, narrowly scoped
//! addition (see DESIGN.md).

use std::{
    collections::HashMap,
    ffi::{c_char, c_int, CStr},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use libloading::{Library, Symbol};

use crate::types::{ElemType, EngineError};

/// `{name, run_int}` as exported by a v1 (int-only) plugin.
#[repr(C)]
pub struct RawAlgoEntryV1 {
    pub name: *const c_char,
    pub run_int: unsafe extern "C" fn(*mut i32, usize),
}

type GetAlgorithmsV1 = unsafe extern "C" fn(*mut *const RawAlgoEntryV1, *mut usize) -> c_int;

/// Per-type entry points exported by a v2 plugin. Any pointer may be null,
/// meaning the plugin doesn't support that element type.
#[repr(C)]
pub struct RawAlgoTableV2 {
    pub name: *const c_char,
    pub run_i32: Option<unsafe extern "C" fn(*mut i32, usize)>,
    pub run_u32: Option<unsafe extern "C" fn(*mut u32, usize)>,
    pub run_i64: Option<unsafe extern "C" fn(*mut i64, usize)>,
    pub run_u64: Option<unsafe extern "C" fn(*mut u64, usize)>,
    pub run_f32: Option<unsafe extern "C" fn(*mut f32, usize)>,
    pub run_f64: Option<unsafe extern "C" fn(*mut f64, usize)>,
}

type GetAlgorithmsV2 = unsafe extern "C" fn(*mut *const RawAlgoTableV2, *mut usize) -> c_int;

/// One algorithm discovered from a plugin, resolved down to the single
/// function pointer usable for a specific `ElemType` (v1 entries are only
/// ever usable for `ElemType::I32`, per spec.md §4.5's fallback rule).
#[derive(Clone)]
pub struct PluginAlgorithm {
    pub name: String,
    pub elem_type: ElemType,
    source: Arc<Library>,
    entry: PluginEntryPoint,
}

#[derive(Clone, Copy)]
enum PluginEntryPoint {
    I32(unsafe extern "C" fn(*mut i32, usize)),
    U32(unsafe extern "C" fn(*mut u32, usize)),
    I64(unsafe extern "C" fn(*mut i64, usize)),
    U64(unsafe extern "C" fn(*mut u64, usize)),
    F32(unsafe extern "C" fn(*mut f32, usize)),
    F64(unsafe extern "C" fn(*mut f64, usize)),
}

impl PluginAlgorithm {
    /// Runs this plugin algorithm in place. The caller must ensure
    /// `elem_type` matches `self.elem_type`.
    pub fn run_i32(&self, data: &mut [i32]) {
        if let PluginEntryPoint::I32(f) = self.entry {
            unsafe { f(data.as_mut_ptr(), data.len()) }
        }
    }
    pub fn run_u32(&self, data: &mut [u32]) {
        if let PluginEntryPoint::U32(f) = self.entry {
            unsafe { f(data.as_mut_ptr(), data.len()) }
        }
    }
    pub fn run_i64(&self, data: &mut [i64]) {
        if let PluginEntryPoint::I64(f) = self.entry {
            unsafe { f(data.as_mut_ptr(), data.len()) }
        }
    }
    pub fn run_u64(&self, data: &mut [u64]) {
        if let PluginEntryPoint::U64(f) = self.entry {
            unsafe { f(data.as_mut_ptr(), data.len()) }
        }
    }
    pub fn run_f32(&self, data: &mut [f32]) {
        if let PluginEntryPoint::F32(f) = self.entry {
            unsafe { f(data.as_mut_ptr(), data.len()) }
        }
    }
    pub fn run_f64(&self, data: &mut [f64]) {
        if let PluginEntryPoint::F64(f) = self.entry {
            unsafe { f(data.as_mut_ptr(), data.len()) }
        }
    }

    /// Kept alive only so the `Arc<Library>` this algorithm's function
    /// pointer belongs to isn't dropped while the algorithm is registered —
    /// per spec.md §9's "Plugin lifetime" note.
    pub fn keeps_library_alive(&self) -> &Arc<Library> {
        &self.source
    }
}

/// Process-global cache of loaded libraries, keyed by canonical path, so a
/// plugin requested by two concurrent calls is only `dlopen`ed once. Entries
/// are dropped (and the library unloaded) once no `PluginAlgorithm` created
/// from them is still referenced.
#[derive(Default)]
pub struct PluginLoader {
    loaded: Mutex<HashMap<PathBuf, Arc<Library>>>,
}

impl PluginLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discovers algorithms from `path` usable for `elem_type`. Loader
    /// errors are non-fatal to the caller's request (spec.md §4.5): this
    /// returns `Err` only to let the caller log a diagnostic and skip the
    /// plugin, never aborting discovery of the rest.
    pub fn discover(
        &self,
        path: &Path,
        elem_type: ElemType,
    ) -> Result<Vec<PluginAlgorithm>, EngineError> {
        let lib = self.get_or_load(path)?;
        let algos = discover_v2(&lib, elem_type)
            .or_else(|| discover_v1(&lib, elem_type))
            .unwrap_or_default();

        if algos.is_empty() {
            self.release_if_unused(path);
        }
        Ok(algos)
    }

    fn get_or_load(&self, path: &Path) -> Result<Arc<Library>, EngineError> {
        let canonical = path
            .canonicalize()
            .map_err(|e| EngineError::PluginLoad(format!("{}: {e}", path.display())))?;

        let mut loaded = self.loaded.lock().expect("plugin loader lock poisoned");
        if let Some(lib) = loaded.get(&canonical) {
            return Ok(Arc::clone(lib));
        }

        // SAFETY: plugins are loaded with immediate symbol resolution per
        // spec.md §4.5/§6; the caller is responsible for only pointing this
        // at trusted plugin binaries.
        let lib = unsafe { Library::new(&canonical) }
            .map_err(|e| EngineError::PluginLoad(format!("{}: {e}", canonical.display())))?;
        let lib = Arc::new(lib);
        loaded.insert(canonical, Arc::clone(&lib));
        Ok(lib)
    }

    fn release_if_unused(&self, path: &Path) {
        if let Ok(canonical) = path.canonicalize() {
            let mut loaded = self.loaded.lock().expect("plugin loader lock poisoned");
            if let Some(lib) = loaded.get(&canonical) {
                // Only this cache and the (now empty) discovery result hold
                // a reference, so it's safe to drop and unload.
                if Arc::strong_count(lib) <= 1 {
                    loaded.remove(&canonical);
                }
            }
        }
    }
}

fn discover_v2(lib: &Arc<Library>, elem_type: ElemType) -> Option<Vec<PluginAlgorithm>> {
    let get_algorithms: Symbol<GetAlgorithmsV2> =
        unsafe { lib.get(b"get_algorithms_v2\0") }.ok()?;

    let mut ptr: *const RawAlgoTableV2 = std::ptr::null();
    let mut count: usize = 0;
    let rc = unsafe { get_algorithms(&mut ptr, &mut count) };
    if rc != 0 || ptr.is_null() {
        return None;
    }

    let entries = unsafe { std::slice::from_raw_parts(ptr, count) };
    let mut out = Vec::new();
    for raw in entries {
        let Some(name) = read_name(raw.name) else {
            continue;
        };
        let entry = match elem_type {
            ElemType::I32 => raw.run_i32.map(PluginEntryPoint::I32),
            ElemType::U32 => raw.run_u32.map(PluginEntryPoint::U32),
            ElemType::I64 => raw.run_i64.map(PluginEntryPoint::I64),
            ElemType::U64 => raw.run_u64.map(PluginEntryPoint::U64),
            ElemType::F32 => raw.run_f32.map(PluginEntryPoint::F32),
            ElemType::F64 => raw.run_f64.map(PluginEntryPoint::F64),
            ElemType::Str => None,
        };
        if let Some(entry) = entry {
            out.push(PluginAlgorithm {
                name,
                elem_type,
                source: Arc::clone(lib),
                entry,
            });
        }
    }
    Some(out)
}

/// v1 plugins only ever expose `i32` algorithms, per spec.md §4.5.
fn discover_v1(lib: &Arc<Library>, elem_type: ElemType) -> Option<Vec<PluginAlgorithm>> {
    if elem_type != ElemType::I32 {
        return None;
    }
    let get_algorithms: Symbol<GetAlgorithmsV1> =
        unsafe { lib.get(b"get_algorithms_v1\0") }.ok()?;

    let mut ptr: *const RawAlgoEntryV1 = std::ptr::null();
    let mut count: usize = 0;
    let rc = unsafe { get_algorithms(&mut ptr, &mut count) };
    if rc != 0 || ptr.is_null() {
        return None;
    }

    let entries = unsafe { std::slice::from_raw_parts(ptr, count) };
    let mut out = Vec::new();
    for raw in entries {
        let Some(name) = read_name(raw.name) else {
            continue;
        };
        out.push(PluginAlgorithm {
            name,
            elem_type: ElemType::I32,
            source: Arc::clone(lib),
            entry: PluginEntryPoint::I32(raw.run_int),
        });
    }
    Some(out)
}

fn read_name(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok().map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_plugin_file_is_a_load_error() {
        let loader = PluginLoader::new();
        let result = loader.discover(Path::new("/nonexistent/plugin.so"), ElemType::I32);
        assert!(result.is_err());
    }
}
