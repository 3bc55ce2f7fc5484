//! Command-line surface: subcommands and the flag set shared by
//! `build`/`check`/`run`/`watch`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "onyxc", about = "Onyx-to-WebAssembly compiler driver")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print help, optionally for one subcommand.
    Help { subcommand: Option<String> },
    /// Print the compiler version.
    Version,
    /// Compile inputs to a WebAssembly module.
    #[command(alias = "compile")]
    Build(CompileArgs),
    /// Run every phase up to and including type checking, skip code generation.
    Check(CompileArgs),
    /// Compile, then execute the resulting module.
    Run(CompileArgs),
    /// Recompile whenever a watched input changes.
    Watch(CompileArgs),
    /// Package a compiled module for distribution.
    Package(PackageArgs),
    /// Invoke a named tool script installed under `<install>/tools/<name>.wasm`.
    #[command(external_subcommand)]
    Script(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RuntimeName {
    A,
    B,
    C,
    /// The user-supplied runtime: the boot sequencer skips generating
    /// runtime-info modules for it, since there is no built-in module to
    /// generate them from.
    D,
}

impl RuntimeName {
    pub fn is_custom(self) -> bool {
        matches!(self, RuntimeName::D)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ErrorFormat {
    V1,
    V2,
}

#[derive(Debug, Clone, clap::Args)]
pub struct CompileArgs {
    /// Source files to compile.
    pub inputs: Vec<PathBuf>,

    #[arg(short = 'o', long = "output", default_value = "out.wasm")]
    pub output: PathBuf,

    #[arg(short = 'I', action = clap::ArgAction::Append)]
    pub include: Vec<PathBuf>,

    #[arg(short = 'r', long = "runtime")]
    pub runtime: Option<RuntimeName>,

    #[arg(short = 'V', action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[arg(long = "multi-threaded")]
    pub multi_threaded: bool,
    #[arg(long = "wasm-mvp")]
    pub wasm_mvp: bool,
    #[arg(long = "no-core")]
    pub no_core: bool,
    #[arg(long = "no-stale-code")]
    pub no_stale_code: bool,
    #[arg(long = "no-type-info")]
    pub no_type_info: bool,
    #[arg(long = "generate-method-info")]
    pub generate_method_info: bool,
    #[arg(long = "generate-foreign-info")]
    pub generate_foreign_info: bool,
    #[arg(long = "stack-trace")]
    pub stack_trace: bool,

    #[arg(long = "doc")]
    pub doc: Option<PathBuf>,
    #[arg(long = "tag")]
    pub tag: bool,
    #[arg(long = "syminfo")]
    pub syminfo: Option<PathBuf>,
    #[arg(long = "lspinfo")]
    pub lspinfo: Option<PathBuf>,

    #[arg(short = 'D', action = clap::ArgAction::Append)]
    pub defines: Vec<String>,

    #[arg(long = "error-format")]
    pub error_format: Option<ErrorFormat>,
    #[arg(long = "show-all-errors")]
    pub show_all_errors: bool,
    #[arg(long = "no-colors")]
    pub no_colors: bool,
    #[arg(long = "no-file-contents")]
    pub no_file_contents: bool,

    #[arg(long = "feature")]
    pub feature: Vec<String>,

    #[arg(long = "debug")]
    pub debug: bool,
    #[arg(long = "debug-info")]
    pub debug_info: bool,
    #[arg(long = "perf")]
    pub perf: bool,

    #[arg(last = true)]
    pub passthrough: Vec<String>,
}

#[derive(Debug, Clone, clap::Args)]
pub struct PackageArgs {
    pub inputs: Vec<PathBuf>,
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}
