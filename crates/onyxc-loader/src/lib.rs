//! The load expander and its filesystem abstraction: turns
//! `use`/`use_all`/`#load_path` entities into registered source files,
//! parsed entities, and search-path state.

mod expander;
mod fs;

pub use expander::{ExpandOutcome, LoadExpander, LoaderError};
pub use fs::{FileSystem, MemoryFileSystem, RealFileSystem};
