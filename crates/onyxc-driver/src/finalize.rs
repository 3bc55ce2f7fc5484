//! Post-pipeline finalization: once the heap empties without errors,
//! write the module and whatever side artifacts the options asked for.
//!
//! Real WebAssembly emission is out of scope, so "the module" here is a
//! deterministic text rendering of the emitted-record summary; what this
//! stage actually exercises is the *sequencing* of link, primary output,
//! `.data` companion, JS partials, and optional side files, not codec
//! correctness.

use std::path::{Path, PathBuf};

use onyxc_collab::EmittedRecord;
use onyxc_loader::FileSystem;
use onyxc_options::CompileOptions;

/// The subset of effective options finalization cares about, resolved once
/// up front so this stage doesn't need the full `CompileOptions` borrowed
/// for its lifetime.
#[derive(Debug, Clone)]
pub struct FinalizationPlan {
    pub output: PathBuf,
    pub multithreaded: bool,
    pub wasm_mvp: bool,
    pub doc: Option<PathBuf>,
    pub tag: bool,
    pub syminfo: Option<PathBuf>,
    pub lspinfo: Option<PathBuf>,
}

impl FinalizationPlan {
    pub fn from_options(options: &CompileOptions) -> Self {
        Self {
            output: options.output.clone(),
            multithreaded: options.multithreaded,
            wasm_mvp: options.wasm_mvp,
            doc: options.doc.clone(),
            tag: options.tag,
            syminfo: options.syminfo.clone(),
            lspinfo: options.lspinfo.clone(),
        }
    }

    /// Whether a second `.data` module must be written alongside the primary
    /// output: preserved as a workaround for the
    /// MVP threading proposal re-copying the data segment on instantiation,
    /// which would wipe mutable globals on thread spawn. Flagged for review
    /// rather than treated as permanent policy, per the open question.
    pub fn needs_data_companion(&self) -> bool {
        self.multithreaded && self.wasm_mvp
    }
}

/// Paths finalization actually wrote, for the caller to report back.
#[derive(Debug, Default)]
pub struct FinalizationReport {
    pub module: PathBuf,
    pub data_companion: Option<PathBuf>,
    pub js_partial: Option<PathBuf>,
    pub tags: Option<PathBuf>,
    pub syminfo: Option<PathBuf>,
    pub lspinfo: Option<PathBuf>,
    pub doc: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum FinalizationError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Run every finalization step against `fs`. `js_partials` is the
/// accumulated foreign-interface JavaScript text, if any was produced during
/// code generation; empty means no `<target>.js` is written.
pub fn finalize<F: FileSystem>(
    fs: &mut F,
    plan: &FinalizationPlan,
    records: &[EmittedRecord],
    js_partials: &[String],
) -> Result<FinalizationReport, FinalizationError> {
    let mut report = FinalizationReport {
        module: plan.output.clone(),
        ..FinalizationReport::default()
    };

    // Step 1 (link) and step 2 (write): this crate has no real linker, so
    // the "link options" are implicit in which records were emitted.
    let module_text = render_module(records);
    write(fs, &plan.output, &module_text)?;

    // Step 3.
    if plan.needs_data_companion() {
        let data_path = companion_path(&plan.output, "data");
        write(fs, &data_path, &render_data_segment(records))?;
        report.data_companion = Some(data_path);
    }

    // Step 4.
    if !js_partials.is_empty() {
        let js_path = companion_path(&plan.output, "js");
        write(fs, &js_path, &js_partials.join("\n"))?;
        report.js_partial = Some(js_path);
    }

    // Step 5: optional side artifacts.
    if plan.tag {
        let tags_path = sibling_path(&plan.output, "tags");
        write(fs, &tags_path, &render_tags(records))?;
        report.tags = Some(tags_path);
    }
    if let Some(path) = &plan.syminfo {
        write(fs, path, &render_syminfo(records))?;
        report.syminfo = Some(path.clone());
    }
    if let Some(path) = &plan.lspinfo {
        write(fs, path, &render_lspinfo(records))?;
        report.lspinfo = Some(path.clone());
    }
    if let Some(path) = &plan.doc {
        write(fs, path, &render_doc(records))?;
        report.doc = Some(path.clone());
    }

    Ok(report)
}

fn write<F: FileSystem>(fs: &mut F, path: &Path, contents: &str) -> Result<(), FinalizationError> {
    fs.write(path, contents).map_err(|source| FinalizationError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn companion_path(output: &Path, extension: &str) -> PathBuf {
    let mut path = output.to_path_buf();
    let stem = path.file_stem().map(|s| s.to_owned());
    if let Some(stem) = stem {
        path.set_file_name(format!("{}.{extension}", stem.to_string_lossy()));
    }
    path
}

fn sibling_path(output: &Path, file_name: &str) -> PathBuf {
    output
        .parent()
        .map(|p| p.join(file_name))
        .unwrap_or_else(|| PathBuf::from(file_name))
}

fn render_module(records: &[EmittedRecord]) -> String {
    let mut out = String::from("(module\n");
    for record in records {
        out.push_str(&format!("  ;; {:?} {}\n", record.kind, record.name));
    }
    out.push(')');
    out
}

fn render_data_segment(records: &[EmittedRecord]) -> String {
    format!("(data-companion entries={})\n", records.len())
}

fn render_tags(records: &[EmittedRecord]) -> String {
    records
        .iter()
        .map(|r| format!("{}\t{:?}", r.name, r.kind))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_syminfo(records: &[EmittedRecord]) -> String {
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    serde_json::to_string_pretty(&names).unwrap_or_default()
}

fn render_lspinfo(records: &[EmittedRecord]) -> String {
    let entries: Vec<_> = records
        .iter()
        .map(|r| serde_json::json!({ "name": r.name, "kind": format!("{:?}", r.kind) }))
        .collect();
    serde_json::to_string_pretty(&entries).unwrap_or_default()
}

/// Hand-assembled Markdown (heading + list), not a CommonMark-library
/// round-trip: `--doc` just needs a readable symbol list, not a parser.
fn render_doc(records: &[EmittedRecord]) -> String {
    let mut out = String::from("# Module symbols\n\n");
    for record in records {
        out.push_str(&format!("- `{}` ({:?})\n", record.name, record.kind));
    }
    out
}
