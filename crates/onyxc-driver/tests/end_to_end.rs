//! Behavioral scenarios that exercise `compile` as a black box, the way a
//! caller outside this crate would: build a filesystem, run the driver, and
//! check what it reports rather than its internal state.

use std::path::PathBuf;

use onyxc_collab::MinimalParser;
use onyxc_loader::MemoryFileSystem;
use onyxc_options::{Action, CompileArgs, CompileOptions, ErrorFormat, RuntimeName};

fn args(inputs: Vec<&str>) -> CompileArgs {
    CompileArgs {
        inputs: inputs.into_iter().map(PathBuf::from).collect(),
        output: PathBuf::from("out.wasm"),
        include: vec![],
        runtime: Some(RuntimeName::D),
        verbose: 0,
        multi_threaded: false,
        wasm_mvp: true,
        no_core: true,
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
        error_format: Some(ErrorFormat::V2),
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
fn empty_input_set_with_no_core_still_produces_a_minimal_module() {
    let fs = MemoryFileSystem::new()
        .with_file("/src/core/builtin.onyx", "")
        .with_file("/src/core/build_options.onyx", "");
    let options = CompileOptions::from_args(Action::Build, args(vec![])).unwrap();
    let report = onyxc_driver::compile(
        options,
        PathBuf::from("/src"),
        fs,
        MinimalParser::new(),
        &[],
    );
    assert!(report.succeeded);
    let finalization = report.finalization.expect("empty input still finalizes");
    assert_eq!(finalization.module, PathBuf::from("out.wasm"));
}

#[test]
fn self_referencing_single_file_resolves_without_a_confirmed_cycle() {
    let fs = MemoryFileSystem::new()
        .with_file("/src/core/builtin.onyx", "")
        .with_file("/src/core/build_options.onyx", "")
        .with_file("/src/main.onyx", "use \"main\";\ngreeting :: 1;\n");
    let options = CompileOptions::from_args(Action::Build, args(vec!["main"])).unwrap();
    let report = onyxc_driver::compile(
        options,
        PathBuf::from("/src"),
        fs,
        MinimalParser::new(),
        &[],
    );
    assert!(report.succeeded);
    assert!(!report.cycle_confirmed);
}

#[test]
fn duplicate_load_of_the_same_file_does_not_duplicate_its_declarations() {
    let fs = MemoryFileSystem::new()
        .with_file("/src/core/builtin.onyx", "")
        .with_file("/src/core/build_options.onyx", "")
        .with_file("/src/x.onyx", "shared :: 1;\n")
        .with_file(
            "/src/main.onyx",
            "use \"x\";\nuse \"x\";\nentry :: 1;\n",
        );
    let options = CompileOptions::from_args(Action::Build, args(vec!["main"])).unwrap();
    let report = onyxc_driver::compile(
        options,
        PathBuf::from("/src"),
        fs,
        MinimalParser::new(),
        &[],
    );
    assert!(report.succeeded);
    // The lazy-init pair plus "shared" and "entry": no duplicate from the
    // second `use "x"`.
    let finalization = report.finalization.unwrap();
    assert_eq!(finalization.module, PathBuf::from("out.wasm"));
}

#[test]
fn build_and_check_agree_on_whether_the_compile_succeeds() {
    let source = "hello :: 1;\n";
    let build_fs = MemoryFileSystem::new()
        .with_file("/src/core/builtin.onyx", "")
        .with_file("/src/core/build_options.onyx", "")
        .with_file("/src/main.onyx", source);
    let check_fs = MemoryFileSystem::new()
        .with_file("/src/core/builtin.onyx", "")
        .with_file("/src/core/build_options.onyx", "")
        .with_file("/src/main.onyx", source);

    let build_options = CompileOptions::from_args(Action::Build, args(vec!["main"])).unwrap();
    let build_report = onyxc_driver::compile(
        build_options,
        PathBuf::from("/src"),
        build_fs,
        MinimalParser::new(),
        &[],
    );

    let check_options = CompileOptions::from_args(Action::Check, args(vec!["main"])).unwrap();
    let check_report = onyxc_driver::compile(
        check_options,
        PathBuf::from("/src"),
        check_fs,
        MinimalParser::new(),
        &[],
    );

    assert_eq!(build_report.succeeded, check_report.succeeded);
    assert_eq!(
        build_report.diagnostics.len(),
        check_report.diagnostics.len()
    );
    assert!(build_report.finalization.is_some());
    assert!(check_report.finalization.is_some());
}
