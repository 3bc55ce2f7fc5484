//! Boot sequencing: seeds the heap with built-ins, runtime-info modules, and
//! command-line inputs in the fixed order the rest of the pipeline assumes,
//! then runs the two deferred one-shot hooks (special-globals, lazy parse
//! init) as the corresponding conditions are met during the main loop.
//!
//! Modeled on the editor's startup sequencing: one struct owns the ordering
//! and the "has this already run" flags, narrow methods expose each step so
//! the orchestrating loop in `context.rs` stays a thin caller.

use onyxc_entity::{EntityId, EntityKind, EntityPayload, EntityState, EntityTemplate};
use onyxc_options::CompileOptions;
use onyxc_registries::{PackageId, PackageRegistry, ScopeId, ScopeTable};
use onyxc_text::Position;

const CORE_BUILTINS_MODULE: &str = "core/builtin";
const RUNTIME_BUILD_OPTIONS_MODULE: &str = "core/build_options";
const CORE_MODULE: &str = "core/core";

const RUNTIME_INFO_MODULES: [&str; 5] = [
    "core/runtime/type_info",
    "core/runtime/foreign_info",
    "core/runtime/procedure_tags",
    "core/runtime/global_tags",
    "core/runtime/stack_trace_info",
];

const BUILTIN_GLOBAL_SYMBOLS: [&str; 6] = [
    "__heap_start",
    "__stack_top",
    "__tls_base",
    "__tls_size",
    "__closure_base",
    "__stack_trace_ptr",
];

/// Entities the boot sequencer wants inserted, plus the scope/package they
/// should be introduced against.
pub struct SeedResult {
    pub root_scope: ScopeId,
    pub root_package: PackageId,
    pub templates: Vec<EntityTemplate>,
}

/// Owns the two deferred boot hooks: the special-globals countdown and
/// the one-shot lazy parse initializer.
#[derive(Debug, Default)]
pub struct BootSequencer {
    special_globals_remaining: Option<u8>,
    special_globals_ready: bool,
    tracked_runtime_info: Vec<EntityId>,
    parse_lazy_init_done: bool,
}

impl BootSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the heap with every entity the boot sequence produces up front
    /// and bind the built-in global symbols directly
    /// into the root scope (step 3, which needs no dispatch of its own).
    pub fn seed(
        &mut self,
        options: &CompileOptions,
        packages: &mut PackageRegistry,
        scopes: &mut ScopeTable,
    ) -> SeedResult {
        let root_package = packages.get_or_create("main", scopes);
        let root_scope = packages.get(root_package).scope;

        let mut templates = Vec::new();

        // Step 1: two ParseBuiltin entities.
        for name in [CORE_BUILTINS_MODULE, RUNTIME_BUILD_OPTIONS_MODULE] {
            templates.push(load_file_template(
                EntityState::ParseBuiltin,
                name,
                root_scope,
                Some(root_package),
            ));
        }

        // Step 2: five Parse entities for runtime-info modules, tracked by
        // id so `observe_finalized` can count them down, unless this is the
        // custom runtime (no generated runtime-info modules to wait on).
        if !options.runtime.is_custom() {
            self.special_globals_remaining = Some(RUNTIME_INFO_MODULES.len() as u8);
            for name in RUNTIME_INFO_MODULES {
                templates.push(load_file_template(
                    EntityState::Parse,
                    name,
                    root_scope,
                    Some(root_package),
                ));
            }
        }

        // Step 3: built-in global symbols, bound directly (no entity needed:
        // there is no phase sequence to run them through).
        for name in BUILTIN_GLOBAL_SYMBOLS {
            scopes.introduce(root_scope, name);
        }

        // Step 4: one LoadFile per user-supplied source file.
        for input in &options.inputs {
            templates.push(load_file_template(
                EntityState::Parse,
                &input.to_string_lossy(),
                root_scope,
                Some(root_package),
            ));
        }

        // Step 5: the core module, unless suppressed.
        if !options.no_core {
            templates.push(load_file_template(
                EntityState::Parse,
                CORE_MODULE,
                root_scope,
                Some(root_package),
            ));
        }

        tracing::info!(
            target: "driver.scheduler",
            seeded = templates.len(),
            runtime_info_tracked = self.special_globals_remaining.is_some(),
            "boot_seeded"
        );

        SeedResult {
            root_scope,
            root_package,
            templates,
        }
    }

    /// Record the ids of the five runtime-info entities the caller actually
    /// inserted, so `observe_finalized` knows which finalizations to count.
    /// Separate from `seed` because the heap (not the sequencer) assigns ids.
    pub fn track_runtime_info_ids(&mut self, ids: Vec<EntityId>) {
        self.tracked_runtime_info = ids;
    }

    /// Call once per entity that reaches `Finalized`. Decrements the
    /// special-globals countdown if `id` is one of the tracked runtime-info
    /// entities; fires the one-shot callback exactly once when the count
    /// reaches zero.
    pub fn observe_finalized(&mut self, id: EntityId) {
        if self.special_globals_ready || !self.tracked_runtime_info.contains(&id) {
            return;
        }
        let Some(remaining) = self.special_globals_remaining else {
            return;
        };
        let remaining = remaining.saturating_sub(1);
        self.special_globals_remaining = Some(remaining);
        if remaining == 0 {
            self.special_globals_ready = true;
            self.special_globals_remaining = None;
            tracing::info!(target: "driver.scheduler", "special_globals_ready");
        }
    }

    pub fn special_globals_ready(&self) -> bool {
        self.special_globals_ready || self.tracked_runtime_info.is_empty()
    }

    /// The lazy one-time initializer: runs exactly once, the
    /// first time any entity is dispatched in the `Parse` state. Introduces
    /// builtin entities proper, build options, and `-D key=value` variables
    /// as plain declarations.
    pub fn lazy_parse_init(
        &mut self,
        options: &CompileOptions,
        scope: ScopeId,
        package: PackageId,
    ) -> Vec<EntityTemplate> {
        if self.parse_lazy_init_done {
            return Vec::new();
        }
        self.parse_lazy_init_done = true;

        let mut templates = vec![
            declaration_template("__builtin_entities", scope, package),
            declaration_template("__build_options", scope, package),
        ];
        for (key, value) in &options.defines {
            templates.push(declaration_template(
                &format!("__define_{key}"),
                scope,
                package,
            ));
            let _ = value;
        }
        tracing::debug!(
            target: "driver.scheduler",
            defines = options.defines.len(),
            "lazy_parse_init_ran"
        );
        templates
    }
}

fn load_file_template(
    state: EntityState,
    name: &str,
    scope: ScopeId,
    package: Option<PackageId>,
) -> EntityTemplate {
    EntityTemplate {
        kind: EntityKind::LoadFile,
        state,
        package,
        scope,
        payload: EntityPayload::LoadFile {
            name: name.to_string(),
        },
        position: Position::internal(),
        source_span: None,
    }
}

fn declaration_template(name: &str, scope: ScopeId, package: PackageId) -> EntityTemplate {
    EntityTemplate {
        kind: EntityKind::Binding,
        state: EntityState::IntroduceSymbols,
        package: Some(package),
        scope,
        payload: EntityPayload::Declaration {
            name: name.to_string(),
            depends_on: Vec::new(),
        },
        position: Position::internal(),
        source_span: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onyxc_options::{Action, CompileArgs, ErrorFormat, RuntimeName};
    use std::path::PathBuf;

    fn args() -> CompileArgs {
        CompileArgs {
            inputs: vec![PathBuf::from("main.onyx")],
            output: PathBuf::from("out.wasm"),
            include: vec![],
            runtime: Some(RuntimeName::B),
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
            defines: vec!["feature=on".to_string()],
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
    fn seed_orders_builtins_runtime_info_then_inputs_then_core() {
        let options = CompileOptions::from_args(Action::Build, args()).unwrap();
        let mut packages = PackageRegistry::new();
        let mut scopes = ScopeTable::new();
        let mut sequencer = BootSequencer::new();
        let result = sequencer.seed(&options, &mut packages, &mut scopes);

        // 2 builtins + 5 runtime-info + 1 input + 1 core module.
        assert_eq!(result.templates.len(), 9);
        assert_eq!(result.templates[0].state, EntityState::ParseBuiltin);
        assert_eq!(result.templates[1].state, EntityState::ParseBuiltin);
        for t in &result.templates[2..7] {
            assert_eq!(t.state, EntityState::Parse);
        }
        assert!(scopes.resolve(result.root_scope, "__heap_start"));
    }

    #[test]
    fn custom_runtime_skips_runtime_info_modules() {
        let mut raw = args();
        raw.runtime = Some(RuntimeName::D);
        let options = CompileOptions::from_args(Action::Build, raw).unwrap();
        let mut packages = PackageRegistry::new();
        let mut scopes = ScopeTable::new();
        let mut sequencer = BootSequencer::new();
        let result = sequencer.seed(&options, &mut packages, &mut scopes);
        // 2 builtins + 1 input + 1 core module, no runtime-info.
        assert_eq!(result.templates.len(), 4);
        assert!(sequencer.special_globals_ready());
    }

    #[test]
    fn no_core_suppresses_core_module_load() {
        let mut raw = args();
        raw.no_core = true;
        let options = CompileOptions::from_args(Action::Build, raw).unwrap();
        let mut packages = PackageRegistry::new();
        let mut scopes = ScopeTable::new();
        let mut sequencer = BootSequencer::new();
        let result = sequencer.seed(&options, &mut packages, &mut scopes);
        assert_eq!(result.templates.len(), 8);
    }

    #[test]
    fn special_globals_callback_fires_exactly_once_at_zero() {
        let options = CompileOptions::from_args(Action::Build, args()).unwrap();
        let mut packages = PackageRegistry::new();
        let mut scopes = ScopeTable::new();
        let mut sequencer = BootSequencer::new();
        sequencer.seed(&options, &mut packages, &mut scopes);
        let mut alloc = onyxc_entity::EntityIdAllocator::new();
        let ids: Vec<EntityId> = (0..5).map(|_| alloc.next()).collect();
        sequencer.track_runtime_info_ids(ids.clone());
        assert!(!sequencer.special_globals_ready());
        for (idx, id) in ids.iter().enumerate() {
            sequencer.observe_finalized(*id);
            if idx < 4 {
                assert!(!sequencer.special_globals_ready());
            }
        }
        assert!(sequencer.special_globals_ready());
    }

    #[test]
    fn lazy_parse_init_runs_once() {
        let options = CompileOptions::from_args(Action::Build, args()).unwrap();
        let mut scopes = ScopeTable::new();
        let root = scopes.create_root("main");
        let mut packages = PackageRegistry::new();
        let package = packages.get_or_create("main", &mut scopes);
        let mut sequencer = BootSequencer::new();
        let first = sequencer.lazy_parse_init(&options, root, package);
        assert_eq!(first.len(), 3); // builtins + build options + one define
        let second = sequencer.lazy_parse_init(&options, root, package);
        assert!(second.is_empty());
    }
}
