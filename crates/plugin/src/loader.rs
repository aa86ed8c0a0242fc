//! Dynamic executor loading from shared libraries (`spec.md` §4.6).
//!
//! Each plugin is a shared library (`.dll` / `.so` / `.dylib`) exporting a
//! `register_executors` symbol that returns the executors it provides. The
//! loader instantiates them and registers each with a
//! [`nebula_wf_node::ExecutorRegistry`], overriding any prior registration
//! for the same node type (`spec.md` §4.6 — "Collisions ... are logged as
//! warnings and override the prior registration").

#![allow(unsafe_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use libloading::{Library, Symbol};
use nebula_wf_node::{ExecutorRegistry, NodeExecutor};
use tracing::{info, warn};

use crate::error::PluginLoadError;

type RegisterFn = fn() -> Vec<Arc<dyn NodeExecutor>>;

/// Scans a directory for executor artifacts and registers them with a
/// [`ExecutorRegistry`] at startup and on explicit [`PluginLoader::reload`].
pub struct PluginLoader {
    path: PathBuf,
    cache: Mutex<HashMap<String, Vec<Arc<dyn NodeExecutor>>>>,
    /// Libraries must stay alive while their executors are in use.
    libraries: Mutex<Vec<Library>>,
}

impl PluginLoader {
    /// Create a loader pointing at `path`. The directory need not exist
    /// yet; [`PluginLoader::load_all`] treats a missing directory as "no
    /// plugins" per `spec.md` §4.6's "may be a no-op stub" allowance.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            cache: Mutex::new(HashMap::new()),
            libraries: Mutex::new(Vec::new()),
        }
    }

    /// The directory this loader scans.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load a single artifact by name, returning its executors. Cached
    /// after the first successful load.
    ///
    /// # Safety contract
    /// Calls into an external shared library via FFI; the library must
    /// export `register_executors` with the expected signature.
    pub fn load(&self, name: &str) -> Result<Vec<Arc<dyn NodeExecutor>>, PluginLoadError> {
        {
            let cache = self.cache.lock().unwrap();
            if let Some(cached) = cache.get(name) {
                return Ok(cached.clone());
            }
        }

        let lib_path = self.lib_path(name);
        if !lib_path.exists() {
            return Err(PluginLoadError::Load {
                name: name.to_owned(),
                reason: format!("library not found at {}", lib_path.display()),
            });
        }

        let result = std::panic::catch_unwind(|| {
            // SAFETY: trusts the artifact to export `register_executors`
            // with the ABI declared by `RegisterFn`.
            unsafe {
                let lib = Library::new(&lib_path).map_err(|e| PluginLoadError::Load {
                    name: name.to_owned(),
                    reason: e.to_string(),
                })?;

                let register: Symbol<RegisterFn> =
                    lib.get(b"register_executors").map_err(|e| PluginLoadError::SymbolNotFound {
                        name: name.to_owned(),
                        reason: e.to_string(),
                    })?;

                let executors = register();
                self.libraries.lock().unwrap().push(lib);
                Ok::<_, PluginLoadError>(executors)
            }
        });

        match result {
            Ok(Ok(executors)) => {
                self.cache.lock().unwrap().insert(name.to_owned(), executors.clone());
                Ok(executors)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(PluginLoadError::Panic(name.to_owned())),
        }
    }

    /// Load every artifact in the directory and register their executors
    /// with `registry`. A load failure for one artifact is logged and
    /// skipped; it does not abort the scan (`spec.md` §4.6).
    pub fn load_all(&self, registry: &ExecutorRegistry) -> Result<usize, PluginLoadError> {
        let entries = match std::fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(PluginLoadError::DirectoryRead(e.to_string())),
        };

        let mut registered = 0;
        for entry in entries {
            let path = entry.map_err(|e| PluginLoadError::DirectoryRead(e.to_string()))?.path();
            let Some(name) = self.extract_plugin_name(&path).filter(|_| self.is_plugin_library(&path)) else {
                continue;
            };

            match self.load(&name) {
                Ok(executors) => {
                    for executor in executors {
                        registry.register_or_replace(executor);
                        registered += 1;
                    }
                    info!(name, "plugin loaded");
                }
                Err(e) => warn!(name, error = %e, "skipping plugin that failed to load"),
            }
        }
        Ok(registered)
    }

    /// Clear the cache and re-scan the directory, re-registering every
    /// artifact's executors (`spec.md` §4.6 "explicit `Reload()`").
    pub fn reload(&self, registry: &ExecutorRegistry) -> Result<usize, PluginLoadError> {
        self.cache.lock().unwrap().clear();
        self.load_all(registry)
    }

    fn lib_path(&self, name: &str) -> PathBuf {
        self.path.join(format!("nebula_wf_{name}.{}", Self::lib_ext()))
    }

    fn lib_ext() -> &'static str {
        if cfg!(target_os = "windows") {
            "dll"
        } else if cfg!(target_os = "macos") {
            "dylib"
        } else {
            "so"
        }
    }

    fn is_plugin_library(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()).is_some_and(|ext| ext == Self::lib_ext())
            && path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.starts_with("nebula_wf_"))
    }

    fn extract_plugin_name(&self, path: &Path) -> Option<String> {
        path.file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| s.starts_with("nebula_wf_"))
            .map(|s| s.strip_prefix("nebula_wf_").unwrap().to_owned())
    }
}

impl std::fmt::Debug for PluginLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginLoader")
            .field("path", &self.path)
            .field("cached", &self.cache.lock().unwrap().keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lib_path_format() {
        let loader = PluginLoader::new(PathBuf::from("/plugins"));
        let ext = PluginLoader::lib_ext();
        assert!(loader
            .lib_path("slack")
            .to_str()
            .unwrap()
            .ends_with(&format!("nebula_wf_slack.{ext}")));
    }

    #[test]
    fn is_plugin_library_checks_prefix_and_extension() {
        let loader = PluginLoader::new(PathBuf::from("/plugins"));
        let ext = PluginLoader::lib_ext();

        assert!(loader.is_plugin_library(&PathBuf::from(format!("/plugins/nebula_wf_slack.{ext}"))));
        assert!(!loader.is_plugin_library(&PathBuf::from(format!("/plugins/utils.{ext}"))));
        assert!(!loader.is_plugin_library(&PathBuf::from("/plugins/nebula_wf_slack.txt")));
    }

    #[test]
    fn extract_plugin_name_strips_prefix() {
        let loader = PluginLoader::new(PathBuf::from("/plugins"));
        let ext = PluginLoader::lib_ext();

        let path = PathBuf::from(format!("/plugins/nebula_wf_http_request.{ext}"));
        assert_eq!(loader.extract_plugin_name(&path), Some("http_request".into()));
        assert_eq!(loader.extract_plugin_name(&PathBuf::from("/plugins/utils.so")), None);
    }

    #[test]
    fn load_all_on_missing_directory_is_a_no_op() {
        let loader = PluginLoader::new(PathBuf::from("/does/not/exist"));
        let registry = ExecutorRegistry::new();
        assert_eq!(loader.load_all(&registry).unwrap(), 0);
    }

    #[test]
    fn load_nonexistent_artifact_returns_error() {
        let loader = PluginLoader::new(PathBuf::from("/nonexistent"));
        assert!(loader.load("missing").is_err());
    }
}
