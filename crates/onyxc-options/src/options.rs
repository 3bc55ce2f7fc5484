//! Raw CLI arguments versus effective compile options: mirrors the
//! config crate's raw/effective split, but built from parsed flags instead
//! of a file, since this driver has no persistent configuration.

use std::path::PathBuf;

use crate::cli::{CompileArgs, ErrorFormat, RuntimeName};

#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("malformed -D argument \"{0}\": expected key=value")]
    MalformedDefine(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Build,
    Check,
    Run,
    Watch,
}

/// The effective options a compilation runs with, after runtime-forced
/// defaults are applied ("runtime A forces multithreading on").
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub action: Action,
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub search_paths: Vec<PathBuf>,
    pub runtime: RuntimeName,
    pub verbosity: u8,
    pub multithreaded: bool,
    pub wasm_mvp: bool,
    pub no_core: bool,
    pub no_stale_code: bool,
    pub no_type_info: bool,
    pub generate_method_info: bool,
    pub generate_foreign_info: bool,
    pub stack_trace: bool,
    pub doc: Option<PathBuf>,
    pub tag: bool,
    pub syminfo: Option<PathBuf>,
    pub lspinfo: Option<PathBuf>,
    pub defines: Vec<(String, String)>,
    pub error_format: ErrorFormat,
    pub show_all_errors: bool,
    pub no_colors: bool,
    pub no_file_contents: bool,
    pub optional_semicolons: bool,
    pub debug: bool,
    pub debug_info: bool,
    pub perf: bool,
    pub passthrough: Vec<String>,
}

impl CompileOptions {
    /// Build effective options from the raw parsed arguments, then
    /// apply runtime-forced defaults ("unknown runtime -> warning,
    /// default to A; runtime A forces multithreading on").
    pub fn from_args(action: Action, args: CompileArgs) -> Result<Self, OptionsError> {
        let mut defines = Vec::with_capacity(args.defines.len());
        for raw in &args.defines {
            let (key, value) = raw
                .split_once('=')
                .ok_or_else(|| OptionsError::MalformedDefine(raw.clone()))?;
            defines.push((key.to_string(), value.to_string()));
        }

        let runtime = args.runtime.unwrap_or(RuntimeName::A);
        let mut options = Self {
            action,
            inputs: args.inputs,
            output: args.output,
            search_paths: args.include,
            runtime,
            verbosity: args.verbose.min(3),
            multithreaded: args.multi_threaded,
            wasm_mvp: args.wasm_mvp,
            no_core: args.no_core,
            no_stale_code: args.no_stale_code,
            no_type_info: args.no_type_info,
            generate_method_info: args.generate_method_info,
            generate_foreign_info: args.generate_foreign_info,
            stack_trace: args.stack_trace,
            doc: args.doc,
            tag: args.tag,
            syminfo: args.syminfo,
            lspinfo: args.lspinfo,
            defines,
            error_format: args.error_format.unwrap_or(ErrorFormat::V2),
            show_all_errors: args.show_all_errors,
            no_colors: args.no_colors,
            no_file_contents: args.no_file_contents,
            optional_semicolons: args.feature.iter().any(|f| f == "optional-semicolons"),
            debug: args.debug,
            debug_info: args.debug_info,
            perf: args.perf,
            passthrough: args.passthrough,
        };
        options.apply_runtime_context();
        Ok(options)
    }

    /// Recompute runtime-derived effective flags. Called once from
    /// `from_args`, and exposed so a caller that flips `runtime` afterward
    /// (unlikely, but mirrors the config crate's `recompute_*` re-entry
    /// points) can bring the rest of the struct back in sync.
    pub fn apply_runtime_context(&mut self) {
        if self.runtime == RuntimeName::A && !self.multithreaded {
            tracing::info!(
                target: "driver.options",
                runtime = ?self.runtime,
                "runtime_forces_multithreading"
            );
            self.multithreaded = true;
        }
    }

    pub fn needs_data_companion(&self) -> bool {
        self.multithreaded && self.wasm_mvp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CompileArgs;

    fn args() -> CompileArgs {
        CompileArgs {
            inputs: vec![PathBuf::from("main.onyx")],
            output: PathBuf::from("out.wasm"),
            include: vec![],
            runtime: None,
            verbose: 0,
            multi_threaded: false,
            wasm_mvp: false,
            no_core: false,
            no_stale_code: false,
            no_type_info: false,
            generate_method_info: false,
            generate_foreign_info: false,
            stack_trace: false,
            doc: None,
            tag: false,
            syminfo: None,
            lspinfo: None,
            defines: vec![],
            error_format: None,
            show_all_errors: false,
            no_colors: false,
            no_file_contents: false,
            feature: vec![],
            debug: false,
            debug_info: false,
            perf: false,
            passthrough: vec![],
        }
    }

    #[test]
    fn unspecified_runtime_defaults_to_a_and_forces_multithreading() {
        let options = CompileOptions::from_args(Action::Build, args()).unwrap();
        assert_eq!(options.runtime, RuntimeName::A);
        assert!(options.multithreaded);
    }

    #[test]
    fn runtime_b_does_not_force_multithreading() {
        let mut raw = args();
        raw.runtime = Some(RuntimeName::B);
        let options = CompileOptions::from_args(Action::Build, raw).unwrap();
        assert!(!options.multithreaded);
    }

    #[test]
    fn define_without_equals_is_rejected() {
        let mut raw = args();
        raw.defines.push("NO_EQUALS".to_string());
        let err = CompileOptions::from_args(Action::Build, raw).unwrap_err();
        assert!(matches!(err, OptionsError::MalformedDefine(_)));
    }

    #[test]
    fn define_with_equals_splits_key_value() {
        let mut raw = args();
        raw.defines.push("feature=on".to_string());
        let options = CompileOptions::from_args(Action::Build, raw).unwrap();
        assert_eq!(
            options.defines,
            vec![("feature".to_string(), "on".to_string())]
        );
    }

    #[test]
    fn needs_data_companion_requires_multithreaded_and_mvp() {
        let options = CompileOptions::from_args(Action::Build, args()).unwrap();
        assert!(!options.needs_data_companion());

        let mut raw = args();
        raw.wasm_mvp = true;
        let options = CompileOptions::from_args(Action::Build, raw).unwrap();
        assert!(options.needs_data_companion());
    }

    #[test]
    fn verbosity_clamps_at_three() {
        let mut raw = args();
        raw.verbose = 9;
        let options = CompileOptions::from_args(Action::Build, raw).unwrap();
        assert_eq!(options.verbosity, 3);
    }
}
