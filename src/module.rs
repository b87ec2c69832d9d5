//! Modules imported with `use <...>` and the loaders that find their source.

use crate::environment::Environment;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory, relative to the working directory, that holds module files.
pub const MODULE_DIR: &str = "nofex_modules";

pub type Exports = BTreeMap<String, Value>;

/// What an import leaves behind: the module's exports and the environment its
/// functions run against.
#[derive(Clone, Debug)]
pub struct Module {
    pub exports: Exports,
    pub environment: Environment,
}

#[derive(Debug, Default)]
pub struct ModuleTable {
    modules: BTreeMap<String, Module>,
}

impl ModuleTable {
    pub fn new() -> ModuleTable {
        ModuleTable {
            modules: BTreeMap::new(),
        }
    }
    pub fn get(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }
    pub fn insert(&mut self, name: String, module: Module) {
        self.modules.insert(name, module);
    }
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }
    pub fn len(&self) -> usize {
        self.modules.len()
    }
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Name a module is stored under: the reference without its extension.
pub fn module_key(reference: &str) -> String {
    match reference.rfind('.') {
        Some(idx) => reference[..idx].to_string(),
        None => reference.to_string(),
    }
}

/// `a.b.lib.nfex` names the file `lib.nfex` in directory `a/b` under `root`.
pub fn module_path(root: &Path, reference: &str) -> PathBuf {
    let mut segments: Vec<&str> = reference.split('.').collect();
    let file = match (segments.pop(), segments.pop()) {
        (Some(extension), Some(stem)) => format!("{}.{}", stem, extension),
        _ => reference.to_string(),
    };
    let mut path = root.to_path_buf();
    for segment in segments {
        path.push(segment);
    }
    path.push(file);
    path
}

pub trait ModuleLoader {
    /// Where the module named by a file reference lives.
    fn resolve(&self, reference: &str) -> PathBuf;
    /// The module's source, or `None` if there is nothing at `path`.
    fn read(&self, path: &Path) -> Option<String>;
}

pub struct FsModuleLoader {
    root: PathBuf,
}

impl FsModuleLoader {
    pub fn new<P: Into<PathBuf>>(root: P) -> FsModuleLoader {
        FsModuleLoader { root: root.into() }
    }
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for FsModuleLoader {
    fn default() -> Self {
        let root = std::env::current_dir()
            .map(|dir| dir.join(MODULE_DIR))
            .unwrap_or_else(|_| PathBuf::from(MODULE_DIR));
        FsModuleLoader::new(root)
    }
}

impl ModuleLoader for FsModuleLoader {
    fn resolve(&self, reference: &str) -> PathBuf {
        module_path(&self.root, reference)
    }
    fn read(&self, path: &Path) -> Option<String> {
        match fs::read_to_string(path) {
            Ok(source) => Some(source),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "module read failed");
                None
            }
        }
    }
}

/// Module sources held in memory, keyed the same way the file loader
/// resolves them.
#[derive(Debug, Default)]
pub struct MemoryModuleLoader {
    sources: BTreeMap<PathBuf, String>,
}

impl MemoryModuleLoader {
    pub fn new() -> MemoryModuleLoader {
        MemoryModuleLoader {
            sources: BTreeMap::new(),
        }
    }
    pub fn with_module(mut self, reference: &str, source: &str) -> Self {
        self.insert(reference, source);
        self
    }
    pub fn insert(&mut self, reference: &str, source: &str) {
        let path = self.resolve(reference);
        self.sources.insert(path, source.to_string());
    }
}

impl ModuleLoader for MemoryModuleLoader {
    fn resolve(&self, reference: &str) -> PathBuf {
        module_path(Path::new(MODULE_DIR), reference)
    }
    fn read(&self, path: &Path) -> Option<String> {
        self.sources.get(path).cloned()
    }
}
