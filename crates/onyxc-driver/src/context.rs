//! The main dispatch loop: pops the highest-priority entity, dispatches it,
//! feeds the result to the cycle detector and the boot sequencer's
//! special-globals countdown, and re-inserts or retires it.
//!
//! Collaborators are split the same way `onyxc_dispatch::DispatchContext`
//! splits them: the filesystem/parser pair is generic (the load expander is
//! built around them), the emitter is generic too since finalization needs
//! its concrete type to read back what was produced, and the remaining
//! collaborators are boxed trait objects since nothing downstream needs more
//! than their trait-level behavior.

use std::path::PathBuf;

use onyxc_collab::{
    CodeEmitter, ErrorReporter, MinimalSymbolTable, NoopTypeChecker, Parser, SymbolIntroducer,
    SymbolResolver, TypeChecker,
};
use onyxc_dispatch::{dispatch, DispatchContext};
use onyxc_entity::{Entity, EntityState};
use onyxc_loader::{FileSystem, LoadExpander};
use onyxc_options::CompileOptions;
use onyxc_registries::{LoadedFileRegistry, PackageId, PackageRegistry, ScopeId, ScopeTable};
use onyxc_scheduler::{CycleDetector, CycleSignal, EntityHeap};

use crate::boot::BootSequencer;

/// Result of running the pipeline to completion.
#[derive(Debug)]
pub struct RunOutcome {
    pub succeeded: bool,
    pub cycle_confirmed: bool,
    pub diagnostics_emitted: usize,
}

pub struct DriverContext<F: FileSystem, P: Parser, E: CodeEmitter> {
    options: CompileOptions,
    heap: EntityHeap,
    cycle: CycleDetector,
    boot: BootSequencer,
    registry: LoadedFileRegistry,
    packages: PackageRegistry,
    scopes: ScopeTable,
    expander: LoadExpander<F, P>,
    introducer: Box<dyn SymbolIntroducer>,
    resolver: Box<dyn SymbolResolver>,
    checker: Box<dyn TypeChecker>,
    emitter: E,
    reporter: ErrorReporter,
    base_dir: PathBuf,
    root_scope: Option<ScopeId>,
    root_package: Option<PackageId>,
    cycle_detected: bool,
}

impl<F, P, E> DriverContext<F, P, E>
where
    F: FileSystem,
    P: Parser,
    E: CodeEmitter,
{
    pub fn new(options: CompileOptions, base_dir: PathBuf, fs: F, parser: P, emitter: E) -> Self {
        let mut expander = LoadExpander::new(fs, parser);
        for path in &options.search_paths {
            expander.add_search_path(path.clone());
        }
        Self {
            options,
            heap: EntityHeap::new(),
            cycle: CycleDetector::new(),
            boot: BootSequencer::new(),
            registry: LoadedFileRegistry::new(),
            packages: PackageRegistry::new(),
            scopes: ScopeTable::new(),
            expander,
            introducer: Box::new(MinimalSymbolTable::new()),
            resolver: Box::new(MinimalSymbolTable::new()),
            checker: Box::new(NoopTypeChecker::new()),
            emitter,
            reporter: ErrorReporter::new(),
            base_dir,
            root_scope: None,
            root_package: None,
            cycle_detected: false,
        }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    pub fn scopes(&self) -> &ScopeTable {
        &self.scopes
    }

    pub fn packages(&self) -> &PackageRegistry {
        &self.packages
    }

    pub fn root_package(&self) -> Option<PackageId> {
        self.root_package
    }

    /// The filesystem backing the load expander, for finalization to write
    /// the module through after `run` completes.
    pub fn fs_mut(&mut self) -> &mut F {
        self.expander.fs_mut()
    }

    /// Seed the heap, then drain it to completion.
    pub fn run(&mut self) -> RunOutcome {
        let seed = self.boot.seed(&self.options, &mut self.packages, &mut self.scopes);
        self.root_scope = Some(seed.root_scope);
        self.root_package = Some(seed.root_package);

        let builtin_count = 2;
        let runtime_info_count = if self.options.runtime.is_custom() { 0 } else { 5 };
        let mut runtime_info_ids = Vec::with_capacity(runtime_info_count);
        for (idx, template) in seed.templates.into_iter().enumerate() {
            let id = self.heap.insert(template);
            if idx >= builtin_count && idx < builtin_count + runtime_info_count {
                runtime_info_ids.push(id);
            }
        }
        self.boot.track_runtime_info_ids(runtime_info_ids);

        let mut cycle_confirmed = false;
        while let Some(entity) = self.heap.remove_top() {
            self.run_lazy_parse_init(&entity);

            let outcome = self.dispatch_one(entity);
            let signal = self.cycle.observe(&outcome.entity, outcome.changed);

            for spawned in outcome.spawned {
                self.heap.insert(spawned);
            }

            match signal {
                CycleSignal::Confirmed => {
                    cycle_confirmed = true;
                    if !outcome.entity.state.is_terminal() {
                        self.heap.insert_existing(outcome.entity);
                    } else {
                        self.retire(outcome.entity);
                    }
                    self.dump_cycles();
                    break;
                }
                CycleSignal::Clear | CycleSignal::Suspected => {
                    if outcome.entity.state.is_terminal() {
                        self.retire(outcome.entity);
                    } else {
                        self.heap.insert_existing(outcome.entity);
                    }
                }
            }
        }

        RunOutcome {
            succeeded: !cycle_confirmed && !self.reporter.has_errors(),
            cycle_confirmed,
            diagnostics_emitted: self.reporter.diagnostics().len(),
        }
    }

    fn run_lazy_parse_init(&mut self, entity: &Entity) {
        if entity.state != EntityState::Parse {
            return;
        }
        let (Some(scope), Some(package)) = (self.root_scope, self.root_package) else {
            return;
        };
        let templates = self.boot.lazy_parse_init(&self.options, scope, package);
        for template in templates {
            self.heap.insert(template);
        }
    }

    fn dispatch_one(&mut self, entity: Entity) -> onyxc_dispatch::DispatchOutcome {
        let mut ctx = DispatchContext {
            registry: &mut self.registry,
            packages: &mut self.packages,
            scopes: &mut self.scopes,
            expander: &mut self.expander,
            introducer: self.introducer.as_mut(),
            resolver: self.resolver.as_mut(),
            checker: self.checker.as_mut(),
            emitter: &mut self.emitter,
            reporter: &mut self.reporter,
            base_dir: self.base_dir.clone(),
            cycle_detected: self.cycle_detected,
            check_only: self.options.action == onyxc_options::Action::Check,
        };
        dispatch(entity, &mut ctx)
    }

    fn retire(&mut self, entity: Entity) {
        entity.record_terminal();
        if entity.state == EntityState::Finalized {
            self.boot.observe_finalized(entity.id);
        }
    }

    /// Drain the heap under `cycle_detected = true` so every still-stuck
    /// entity reports its own unmet dependency, then stop.
    fn dump_cycles(&mut self) {
        self.cycle_detected = true;
        tracing::warn!(target: "driver.cycle", "cycle_confirmed_draining");

        let mut remaining = Vec::new();
        while let Some(entity) = self.heap.remove_top() {
            remaining.push(entity);
        }

        for entity in remaining {
            if entity.state >= EntityState::CodeGen {
                continue;
            }
            let outcome = self.dispatch_one(entity);
            self.retire_or_drop(outcome.entity);
        }
    }

    fn retire_or_drop(&mut self, entity: Entity) {
        if entity.state.is_terminal() {
            self.retire(entity);
        }
    }
}
