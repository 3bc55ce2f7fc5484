//! Command-line parsing and the raw/effective compile-options split.

mod cli;
mod options;

pub use cli::{Cli, Command, CompileArgs, ErrorFormat, PackageArgs, RuntimeName};
pub use options::{Action, CompileOptions, OptionsError};
