//! `onyxc` entrypoint: parses the command line, wires up logging, and hands
//! off to the driver crate for every subcommand that actually compiles.

use std::path::{Path, PathBuf};
use std::sync::Once;

use anyhow::{bail, Context, Result};
use clap::Parser as _;
use crossbeam_channel::RecvTimeoutError;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use onyxc_collab::MinimalParser;
use onyxc_driver::CompileReport;
use onyxc_loader::RealFileSystem;
use onyxc_options::{Action, Cli, Command, CompileArgs, CompileOptions, PackageArgs};

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join("onyxc.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, "onyxc.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .try_init()
    {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn require_onyx_path() -> Result<PathBuf> {
    match std::env::var_os("ONYX_PATH") {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => bail!("ONYX_PATH must be set to the compiler installation root"),
    }
}

fn main() -> Result<()> {
    let _log_guard = configure_logging();
    install_panic_hook();

    let cli = Cli::parse();
    info!(target: "runtime", command = ?cli.command, "startup");

    let install_root = match &cli.command {
        Command::Help { .. } | Command::Version => None,
        _ => Some(require_onyx_path()?),
    };

    if let Ok(format) = std::env::var("ONYX_ERROR_FORMAT") {
        info!(target: "driver.options", format = %format, "error_format_override_requested");
    }

    let exit_code = match cli.command {
        Command::Help { subcommand } => {
            print_help(subcommand.as_deref());
            0
        }
        Command::Version => {
            println!("onyxc {}", env!("CARGO_PKG_VERSION"));
            0
        }
        Command::Build(args) => run_compile(Action::Build, args)?,
        Command::Check(args) => run_compile(Action::Check, args)?,
        Command::Run(args) => run_compile(Action::Run, args)?,
        Command::Watch(args) => run_watch(args)?,
        Command::Package(args) => run_package(args)?,
        Command::Script(argv) => run_script(&install_root.expect("checked above"), &argv)?,
    };

    std::process::exit(exit_code);
}

fn print_help(subcommand: Option<&str>) {
    match subcommand {
        Some(name) => println!("no detailed help is registered for subcommand \"{name}\""),
        None => println!(
            "onyxc: help [subcommand] | version | build | check | run | watch | package | <script>"
        ),
    }
}

/// Build effective options, run one compilation, report diagnostics, and
/// return the process exit code.
fn run_compile(action: Action, args: CompileArgs) -> Result<i32> {
    let passthrough = args.passthrough.clone();
    let options = CompileOptions::from_args(action, args).context("invalid compile options")?;
    let report = compile_once(&options)?;
    report_diagnostics(&report);

    if report.succeeded && options.action == Action::Run {
        info!(
            target: "runtime",
            argv = ?passthrough,
            "would_execute_module_but_runtime_is_out_of_scope"
        );
    }

    Ok(exit_code_for(&report))
}

fn compile_once(options: &CompileOptions) -> Result<CompileReport> {
    let base_dir = std::env::current_dir().context("resolving current directory")?;
    let fs = RealFileSystem::new();
    let parser = MinimalParser::new();
    Ok(onyxc_driver::compile(
        options.clone(),
        base_dir,
        fs,
        parser,
        &[],
    ))
}

fn report_diagnostics(report: &CompileReport) {
    for diagnostic in &report.diagnostics {
        match diagnostic.severity {
            onyxc_collab::Severity::Warning => {
                warn!(target: "driver.finalize", message = %diagnostic.message, "warning")
            }
            onyxc_collab::Severity::Error => {
                error!(target: "driver.finalize", message = %diagnostic.message, "error")
            }
        }
        eprintln!("{}: {}", diagnostic.position, diagnostic.message);
    }
}

fn exit_code_for(report: &CompileReport) -> i32 {
    if report.succeeded {
        0
    } else {
        1
    }
}

/// Recompile on every change to an input file or its directory, until the
/// watcher's receive channel disconnects (the process simply being killed,
/// in this minimal implementation).
fn run_watch(args: CompileArgs) -> Result<i32> {
    use notify::{RecursiveMode, Watcher};

    let inputs = args.inputs.clone();
    let options = CompileOptions::from_args(Action::Watch, args).context("invalid compile options")?;

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
        if let Ok(event) = event {
            let _ = tx.send(event);
        }
    })
    .context("starting filesystem watcher")?;

    let watched_dirs = watch_directories(&inputs, &options.search_paths);
    for dir in &watched_dirs {
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("watching {}", dir.display()))?;
    }

    info!(target: "driver.loader", dirs = ?watched_dirs, "watch_started");
    let mut last_exit = 0;
    loop {
        let report = compile_once(&options)?;
        report_diagnostics(&report);
        last_exit = exit_code_for(&report);

        match rx.recv_timeout(std::time::Duration::from_secs(3600)) {
            Ok(_) => continue,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(last_exit)
}

fn watch_directories(inputs: &[PathBuf], search_paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = inputs
        .iter()
        .filter_map(|p| p.parent().map(|d| d.to_path_buf()))
        .collect();
    dirs.extend(search_paths.iter().cloned());
    dirs.sort();
    dirs.dedup();
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }
    dirs
}

/// Package a previously-compiled module for distribution. Out of scope for
/// this driver beyond copying the module bytes to the package output path;
/// real packaging (manifests, dependency bundling) lives elsewhere.
fn run_package(args: PackageArgs) -> Result<i32> {
    let Some(input) = args.inputs.first() else {
        bail!("package requires at least one input module");
    };
    let output = args
        .output
        .unwrap_or_else(|| input.with_extension("package.wasm"));
    std::fs::copy(input, &output)
        .with_context(|| format!("packaging {} into {}", input.display(), output.display()))?;
    info!(target: "driver.finalize", input = %input.display(), output = %output.display(), "packaged");
    Ok(0)
}

/// Dispatch to a named tool script under `<install>/tools/<name>.wasm`.
/// Running the resulting module requires a WebAssembly runtime, which this
/// driver does not implement.
fn run_script(install_root: &Path, argv: &[String]) -> Result<i32> {
    let Some(name) = argv.first() else {
        bail!("no script name given");
    };
    let script_path = install_root.join("tools").join(format!("{name}.wasm"));
    if !script_path.exists() {
        bail!("no tool script named \"{name}\" at {}", script_path.display());
    }
    bail!(
        "found tool script {} but executing it requires a WebAssembly runtime, which this driver does not implement",
        script_path.display()
    );
}
