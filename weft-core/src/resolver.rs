//! Module resolver
//!
//! Loads the module targeted for weaving and lazily resolves external
//! type references through the configured search paths. Nothing outside
//! the module is read until a weaver actually dereferences an external
//! name; loaded externals and misses are cached for the rest of the pass.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};
use weft_config::SearchPaths;
use weft_model::{decode_module, CompiledModule, DebugSymbols, TypeDeclaration};
use weft_vfs::VirtualFileSystem;

use crate::error::ModuleLoadError;

/// Extension of the debug-symbol sidecar next to a module file.
pub const SYMBOL_EXTENSION: &str = "wdbg";

/// Resolves the module under weaving and external references around it.
pub struct ModuleResolver {
    fs: Arc<dyn VirtualFileSystem>,
    search: SearchPaths,
    /// Loaded external modules keyed by file path; `None` records a file
    /// that was absent or undecodable so it is probed only once.
    external_modules: HashMap<PathBuf, Option<CompiledModule>>,
    /// Resolution results keyed by full type name, misses included.
    resolved_types: HashMap<String, Option<TypeDeclaration>>,
}

impl ModuleResolver {
    pub fn new(fs: Arc<dyn VirtualFileSystem>, search: SearchPaths) -> Self {
        Self {
            fs,
            search,
            external_modules: HashMap::new(),
            resolved_types: HashMap::new(),
        }
    }

    pub fn search_paths(&self) -> &SearchPaths {
        &self.search
    }

    /// Load the module targeted for weaving, along with its debug-symbol
    /// sidecar when one is present. A missing sidecar is not an error; an
    /// unreadable or unparsable one is tolerated with a warning.
    pub fn load(&mut self, path: &Path) -> Result<CompiledModule, ModuleLoadError> {
        debug!(target: "weft::resolver", "loading module {}", path.display());
        let bytes = self
            .fs
            .read_file(path)
            .map_err(|source| ModuleLoadError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;
        let mut module = decode_module(bytes).map_err(|source| ModuleLoadError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;

        let sidecar = path.with_extension(SYMBOL_EXTENSION);
        if self.fs.is_file(&sidecar) {
            match self
                .fs
                .read_file(&sidecar)
                .map_err(|e| e.to_string())
                .and_then(|bytes| DebugSymbols::from_json(&bytes).map_err(|e| e.to_string()))
            {
                Ok(symbols) => {
                    debug!(
                        target: "weft::resolver",
                        "loaded {} symbol entries from {}",
                        symbols.methods.len(),
                        sidecar.display()
                    );
                    module.debug_symbols = Some(symbols);
                }
                Err(reason) => {
                    warn!(
                        target: "weft::resolver",
                        "ignoring unusable symbol sidecar {}: {}",
                        sidecar.display(),
                        reason
                    );
                }
            }
        }

        Ok(module)
    }

    /// Resolve a type declared outside the module under weaving.
    ///
    /// Candidate module files are derived from progressively shorter
    /// namespace prefixes of the sought name (`acme.ui.Widget` probes
    /// `acme.ui.wmod`, then `acme.wmod`), tried in each search directory
    /// in priority order. The returned declaration is a detached copy;
    /// its ids are only meaningful inside the module it came from, but
    /// its names, members, and base reference are what hierarchy walks
    /// need.
    pub fn resolve_external(&mut self, full_name: &str) -> Option<TypeDeclaration> {
        if let Some(cached) = self.resolved_types.get(full_name) {
            return cached.clone();
        }

        let stems = candidate_stems(full_name);
        let dirs: Vec<PathBuf> = self.search.ordered().into_iter().cloned().collect();
        for dir in &dirs {
            for stem in &stems {
                let candidate = dir.join(format!("{}.wmod", stem));
                if let Some(found) = self.probe_module(&candidate, full_name) {
                    debug!(
                        target: "weft::resolver",
                        "resolved external {} via {}",
                        full_name,
                        candidate.display()
                    );
                    self.resolved_types
                        .insert(full_name.to_string(), Some(found.clone()));
                    return Some(found);
                }
            }
        }

        trace!(target: "weft::resolver", "external {} unresolved", full_name);
        self.resolved_types.insert(full_name.to_string(), None);
        None
    }

    /// Load (or fetch from cache) one candidate module file and look the
    /// sought type up inside it.
    fn probe_module(&mut self, path: &Path, full_name: &str) -> Option<TypeDeclaration> {
        if !self.external_modules.contains_key(path) {
            let loaded = if self.fs.is_file(path) {
                match self.fs.read_file(path).map(decode_module) {
                    Ok(Ok(module)) => Some(module),
                    Ok(Err(e)) => {
                        warn!(
                            target: "weft::resolver",
                            "skipping undecodable dependency {}: {}",
                            path.display(),
                            e
                        );
                        None
                    }
                    Err(e) => {
                        warn!(
                            target: "weft::resolver",
                            "skipping unreadable dependency {}: {}",
                            path.display(),
                            e
                        );
                        None
                    }
                }
            } else {
                None
            };
            self.external_modules.insert(path.to_path_buf(), loaded);
        }

        let module = self.external_modules.get(path)?.as_ref()?;
        let id = module.find_type(full_name)?;
        Some(module.type_decl(id).clone())
    }
}

/// Namespace prefixes of a full type name, longest first, used as module
/// file stems. The nested-type part after `/` never contributes.
fn candidate_stems(full_name: &str) -> Vec<String> {
    let root = full_name.split('/').next().unwrap_or(full_name);
    let segments: Vec<&str> = root.split('.').collect();
    (1..segments.len())
        .rev()
        .map(|n| segments[..n].join("."))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_model::encode_module;
    use weft_vfs::MemoryFileSystem;

    fn external_lib() -> CompiledModule {
        let mut lib = CompiledModule::new("lib");
        let base = lib.add_type("lib.ext", "Base", None);
        lib.type_decl_mut(base).base = None;
        lib
    }

    fn resolver_with(files: Vec<(&str, Vec<u8>)>) -> ModuleResolver {
        let fs = Arc::new(MemoryFileSystem::with_files(files));
        let search = SearchPaths {
            module_dir: Some(PathBuf::from("/out")),
            intermediate_dir: None,
            base_library_dirs: vec![PathBuf::from("/libs")],
        };
        ModuleResolver::new(fs, search)
    }

    #[test]
    fn test_candidate_stems() {
        assert_eq!(
            candidate_stems("acme.ui.Widget"),
            vec!["acme.ui".to_string(), "acme".to_string()]
        );
        assert_eq!(
            candidate_stems("acme.ui.Panel/Row"),
            vec!["acme.ui".to_string(), "acme".to_string()]
        );
        assert!(candidate_stems("Loose").is_empty());
    }

    #[test]
    fn test_load_missing_module() {
        let mut resolver = resolver_with(vec![]);
        let err = resolver.load(Path::new("/out/game.wmod")).unwrap_err();
        assert!(matches!(err, ModuleLoadError::Unreadable { .. }));
    }

    #[test]
    fn test_load_corrupt_module() {
        let mut resolver = resolver_with(vec![("/out/game.wmod", b"garbage".to_vec())]);
        let err = resolver.load(Path::new("/out/game.wmod")).unwrap_err();
        assert!(matches!(err, ModuleLoadError::Corrupt { .. }));
    }

    #[test]
    fn test_load_with_sidecar() {
        let module = external_lib();
        let symbols = DebugSymbols::default();
        let mut resolver = resolver_with(vec![
            ("/out/game.wmod", encode_module(&module)),
            ("/out/game.wdbg", symbols.to_json().unwrap()),
        ]);
        let loaded = resolver.load(Path::new("/out/game.wmod")).unwrap();
        assert!(loaded.debug_symbols.is_some());
    }

    #[test]
    fn test_load_tolerates_bad_sidecar() {
        let module = external_lib();
        let mut resolver = resolver_with(vec![
            ("/out/game.wmod", encode_module(&module)),
            ("/out/game.wdbg", b"{not json".to_vec()),
        ]);
        let loaded = resolver.load(Path::new("/out/game.wmod")).unwrap();
        assert!(loaded.debug_symbols.is_none());
    }

    #[test]
    fn test_resolve_external_by_namespace_prefix() {
        let lib = external_lib();
        let mut resolver = resolver_with(vec![("/libs/lib.ext.wmod", encode_module(&lib))]);

        let found = resolver.resolve_external("lib.ext.Base").unwrap();
        assert_eq!(found.name, "Base");

        // second hit is served from the cache, not the file system
        assert!(resolver.resolve_external("lib.ext.Base").is_some());
    }

    #[test]
    fn test_resolve_external_miss_is_cached() {
        let mut resolver = resolver_with(vec![]);
        assert!(resolver.resolve_external("ghost.Base").is_none());
        assert!(resolver.resolved_types.contains_key("ghost.Base"));
        assert!(resolver.resolve_external("ghost.Base").is_none());
    }

    #[test]
    fn test_resolve_external_skips_undecodable_dependency() {
        let mut resolver = resolver_with(vec![("/libs/lib.wmod", b"junk".to_vec())]);
        assert!(resolver.resolve_external("lib.Base").is_none());
    }
}
