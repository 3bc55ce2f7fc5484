//! The driver's three pieces of durable shared state: the set of absorbed
//! source files, the set of discovered packages, and the lexical scopes those
//! packages and nested blocks own.
//!
//! Mirrors the shape of an editor's state container that owns a collection of
//! buffers plus auxiliary indices: a single struct per registry, a facade of
//! narrow mutation methods, and `tracing` spans on the operations that matter
//! for diagnosing a stuck compile.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use onyxc_text::SourceFile;

pub mod scope;
pub use scope::{Scope, ScopeId, ScopeTable};

/// Identifies one entry in the `LoadedFileRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u32);

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("file already loaded: {0}")]
    AlreadyLoaded(PathBuf),
}

/// Deduplicated set of absorbed source files, keyed by resolved absolute path.
///
/// Duplicates are rejected on insert: the second `use` of the same
/// resolved path is a no-op from the loader's point of view, not an error, so
/// callers check `contains` before treating a load as new work.
#[derive(Debug, Default)]
pub struct LoadedFileRegistry {
    by_path: HashMap<PathBuf, SourceId>,
    files: Vec<SourceFile>,
}

impl LoadedFileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.by_path.contains_key(path)
    }

    pub fn get(&self, id: SourceId) -> &SourceFile {
        &self.files[id.0 as usize]
    }

    pub fn path_of(&self, id: SourceId) -> &Path {
        &self.files[id.0 as usize].path
    }

    pub fn lookup(&self, path: &Path) -> Option<SourceId> {
        self.by_path.get(path).copied()
    }

    /// Register a newly read file. Fails if the resolved path is already
    /// present; callers should use `lookup`/`contains` first when a duplicate
    /// is expected to be a legitimate no-op rather than a bug.
    pub fn insert(&mut self, file: SourceFile) -> Result<SourceId, RegistryError> {
        if self.by_path.contains_key(&file.path) {
            return Err(RegistryError::AlreadyLoaded(file.path));
        }
        let id = SourceId(self.files.len() as u32);
        self.by_path.insert(file.path.clone(), id);
        tracing::debug!(target: "driver.registries", path = %self.files_path_display(&file), "file_registered");
        self.files.push(file);
        Ok(id)
    }

    fn files_path_display(&self, file: &SourceFile) -> String {
        file.path.display().to_string()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Identifies one entry in the `PackageRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(u32);

#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub scope: ScopeId,
}

/// Name-to-package mapping. Each package owns exactly one top-level
/// scope that declarations within it are introduced into.
#[derive(Debug, Default)]
pub struct PackageRegistry {
    by_name: HashMap<String, PackageId>,
    packages: Vec<Package>,
}

impl PackageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a package by name, or create it (and its scope) if this is the
    /// first time it has been referenced. Packages are discovered dynamically
    /// during parsing, so "get or create" is the only entry point.
    pub fn get_or_create(&mut self, name: &str, scopes: &mut ScopeTable) -> PackageId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let scope = scopes.create_root(name);
        let id = PackageId(self.packages.len() as u32);
        self.packages.push(Package {
            name: name.to_string(),
            scope,
        });
        self.by_name.insert(name.to_string(), id);
        tracing::debug!(target: "driver.registries", package = name, "package_registered");
        id
    }

    pub fn get(&self, id: PackageId) -> &Package {
        &self.packages[id.0 as usize]
    }

    pub fn find(&self, name: &str) -> Option<PackageId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
