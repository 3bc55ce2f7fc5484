//! The driver core: boot sequencing, the main dispatch loop, and
//! finalization, assembled behind one entrypoint (`compile`).

mod boot;
mod context;
mod finalize;

pub use boot::BootSequencer;
pub use context::{DriverContext, RunOutcome};
pub use finalize::{FinalizationError, FinalizationPlan, FinalizationReport};

use std::path::PathBuf;

use onyxc_collab::{Diagnostic, ModuleBuilder, Parser};
use onyxc_loader::FileSystem;
use onyxc_options::CompileOptions;

/// Everything a caller (the binary crate, or a test) needs to know about one
/// compilation.
#[derive(Debug)]
pub struct CompileReport {
    pub succeeded: bool,
    pub cycle_confirmed: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub finalization: Option<FinalizationReport>,
}

/// Run one compilation end to end: seed, dispatch to completion, and finalize
/// if nothing failed. `js_partials` stands in for whatever foreign-interface
/// JavaScript text a real code generator would have accumulated; this
/// crate's minimal emitter never produces any, so callers outside tests pass
/// an empty slice.
pub fn compile<F: FileSystem, P: Parser>(
    options: CompileOptions,
    base_dir: PathBuf,
    fs: F,
    parser: P,
    js_partials: &[String],
) -> CompileReport {
    let plan = FinalizationPlan::from_options(&options);
    let mut ctx = DriverContext::new(options, base_dir, fs, parser, ModuleBuilder::new());
    let run_outcome = ctx.run();

    let diagnostics = ctx.reporter().diagnostics().to_vec();
    let succeeded = run_outcome.succeeded;

    let finalization = if succeeded {
        let emitted_records = ctx.emitter().records().to_vec();
        match finalize::finalize(ctx.fs_mut(), &plan, &emitted_records, js_partials) {
            Ok(report) => Some(report),
            Err(err) => {
                tracing::error!(target: "driver.finalize", error = %err, "finalization_failed");
                return CompileReport {
                    succeeded: false,
                    cycle_confirmed: run_outcome.cycle_confirmed,
                    diagnostics,
                    finalization: None,
                };
            }
        }
    } else {
        None
    };

    CompileReport {
        succeeded,
        cycle_confirmed: run_outcome.cycle_confirmed,
        diagnostics,
        finalization,
    }
}
