//! The load expander: turns `LoadFile`/`LoadAll`/`LoadPath` entities
//! into registered source files, parsed entities, and search-path updates.

use std::path::{Path, PathBuf};

use onyxc_collab::Parser;
use onyxc_entity::EntityTemplate;
use onyxc_registries::{LoadedFileRegistry, PackageId, RegistryError, ScopeId, SourceId};
use onyxc_text::{resolve_relative, SourceFile, SOURCE_EXTENSION};

use crate::fs::FileSystem;

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("could not resolve source for \"{0}\"")]
    NotFound(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What happened when expanding one load-type entity.
pub enum ExpandOutcome {
    /// The path was already in the registry; treated as success with no new
    /// entities.
    AlreadyLoaded,
    /// Freshly absorbed and parsed.
    Loaded {
        source_id: SourceId,
        entities: Vec<EntityTemplate>,
    },
    /// Not found, and not yet a confirmed error: the caller should yield
    /// (re-insert) rather than fail, to support speculative path probing
    ///. Carries no diagnostic.
    NotYetAvailable,
}

pub struct LoadExpander<F: FileSystem, P: Parser> {
    fs: F,
    parser: P,
    search_paths: Vec<PathBuf>,
}

impl<F: FileSystem, P: Parser> LoadExpander<F, P> {
    pub fn new(fs: F, parser: P) -> Self {
        Self {
            fs,
            parser,
            search_paths: Vec::new(),
        }
    }

    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.search_paths.push(path.into());
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// The underlying filesystem, for callers that need it after expansion
    /// is done (finalization writing the module through the same instance).
    pub fn fs_mut(&mut self) -> &mut F {
        &mut self.fs
    }

    /// Resolve `name` relative to `base_dir`, then each search path in
    /// order, appending the source extension if the name doesn't already
    /// carry one. Returns the first candidate that exists.
    pub fn resolve(&self, name: &str, base_dir: &Path) -> Option<PathBuf> {
        let mut bases = Vec::with_capacity(1 + self.search_paths.len());
        bases.push(base_dir.to_path_buf());
        bases.extend(self.search_paths.iter().cloned());

        for base in bases {
            for candidate in candidates(&base, name) {
                if self.fs.exists(&candidate) {
                    return Some(candidate);
                }
            }
        }
        None
    }

    /// Expand a `use "name";` load.
    pub fn expand_load_file(
        &mut self,
        name: &str,
        base_dir: &Path,
        registry: &mut LoadedFileRegistry,
        scope: ScopeId,
        package: Option<PackageId>,
    ) -> Result<ExpandOutcome, LoaderError> {
        let Some(resolved) = self.resolve(name, base_dir) else {
            return Ok(ExpandOutcome::NotYetAvailable);
        };

        let text = self
            .fs
            .read_to_string(&resolved)
            .map_err(|source| LoaderError::Io {
                path: resolved.clone(),
                source,
            })?;
        let source = SourceFile::new(resolved.clone(), text);

        let source_id = match registry.insert(source.clone()) {
            Ok(id) => id,
            Err(RegistryError::AlreadyLoaded(_)) => return Ok(ExpandOutcome::AlreadyLoaded),
        };

        let entities = self.parser.parse(&source, scope, package);
        tracing::debug!(
            target: "driver.loader",
            path = %resolved.display(),
            entities = entities.len(),
            "file_loaded"
        );
        Ok(ExpandOutcome::Loaded {
            source_id,
            entities,
        })
    }

    /// Expand a `use_all "name";` load: one `LoadFile` name per source file
    /// found under the directory, descending into subdirectories (skipping
    /// `.`/`..`, which never appear from `read_dir` anyway) when `recursive`
    ///.
    pub fn expand_load_all(
        &self,
        name: &str,
        base_dir: &Path,
        recursive: bool,
    ) -> Result<Vec<String>, LoaderError> {
        let Some(dir) = self.resolve_dir(name, base_dir) else {
            return Err(LoaderError::NotFound(name.to_string()));
        };
        let mut names = Vec::new();
        self.collect_load_names(&dir, recursive, &mut names)?;
        Ok(names)
    }

    fn resolve_dir(&self, name: &str, base_dir: &Path) -> Option<PathBuf> {
        let direct = resolve_relative(base_dir, Path::new(name));
        if self.fs.is_dir(&direct) {
            return Some(direct);
        }
        for search in &self.search_paths {
            let candidate = resolve_relative(search, Path::new(name));
            if self.fs.is_dir(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    fn collect_load_names(
        &self,
        dir: &Path,
        recursive: bool,
        out: &mut Vec<String>,
    ) -> Result<(), LoaderError> {
        let entries = self.fs.read_dir(dir).map_err(|source| LoaderError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        for entry in entries {
            if self.fs.is_dir(&entry) {
                if recursive {
                    self.collect_load_names(&entry, recursive, out)?;
                }
            } else {
                out.push(entry.to_string_lossy().into_owned());
            }
        }
        Ok(())
    }
}

fn candidates(base: &Path, name: &str) -> Vec<PathBuf> {
    let direct = resolve_relative(base, Path::new(name));
    if direct.extension().is_some() {
        vec![direct]
    } else {
        let mut with_ext = direct.clone();
        with_ext.set_extension(SOURCE_EXTENSION);
        vec![with_ext, direct]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use onyxc_collab::MinimalParser;
    use onyxc_registries::ScopeTable;

    fn expander(fs: MemoryFileSystem) -> LoadExpander<MemoryFileSystem, MinimalParser> {
        LoadExpander::new(fs, MinimalParser::new())
    }

    #[test]
    fn resolves_name_without_extension_in_base_dir() {
        let fs = MemoryFileSystem::new().with_file("/src/other.onyx", "");
        let expander = expander(fs);
        let resolved = expander.resolve("other", Path::new("/src"));
        assert_eq!(resolved, Some(PathBuf::from("/src/other.onyx")));
    }

    #[test]
    fn falls_back_to_search_path() {
        let fs = MemoryFileSystem::new().with_file("/lib/other.onyx", "");
        let mut expander = expander(fs);
        expander.add_search_path("/lib");
        let resolved = expander.resolve("other", Path::new("/src"));
        assert_eq!(resolved, Some(PathBuf::from("/lib/other.onyx")));
    }

    #[test]
    fn unresolvable_name_yields_not_yet_available() {
        let fs = MemoryFileSystem::new();
        let mut expander = expander(fs);
        let mut registry = LoadedFileRegistry::new();
        let scope = ScopeTable::new().create_root("main");
        let outcome = expander
            .expand_load_file("missing", Path::new("/src"), &mut registry, scope, None)
            .unwrap();
        assert!(matches!(outcome, ExpandOutcome::NotYetAvailable));
    }

    #[test]
    fn loading_same_file_twice_is_a_no_op_the_second_time() {
        let fs = MemoryFileSystem::new().with_file("/src/a.onyx", "foo :: 1;\n");
        let mut expander = expander(fs);
        let mut registry = LoadedFileRegistry::new();
        let scope = ScopeTable::new().create_root("main");
        let first = expander
            .expand_load_file("a", Path::new("/src"), &mut registry, scope, None)
            .unwrap();
        assert!(matches!(first, ExpandOutcome::Loaded { .. }));
        let second = expander
            .expand_load_file("a", Path::new("/src"), &mut registry, scope, None)
            .unwrap();
        assert!(matches!(second, ExpandOutcome::AlreadyLoaded));
    }

    #[test]
    fn load_all_lists_files_non_recursively() {
        let fs = MemoryFileSystem::new()
            .with_file("/src/a.onyx", "")
            .with_file("/src/sub/b.onyx", "");
        let expander1 = expander(fs);
        let names = expander1
            .expand_load_all("dir", Path::new("/does-not-exist"), false)
            .err();
        assert!(names.is_some());

        let fs2 = MemoryFileSystem::new()
            .with_file("/src/a.onyx", "")
            .with_file("/src/sub/b.onyx", "");
        let expander2 = expander(fs2);
        let names = expander2
            .expand_load_all("src", Path::new("/"), false)
            .unwrap();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn load_all_recursive_descends_into_subdirectories() {
        let fs = MemoryFileSystem::new()
            .with_file("/src/a.onyx", "")
            .with_file("/src/sub/b.onyx", "");
        let expander = expander(fs);
        let names = expander
            .expand_load_all("src", Path::new("/"), true)
            .unwrap();
        assert_eq!(names.len(), 2);
    }
}
