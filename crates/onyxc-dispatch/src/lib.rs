//! The phase dispatcher: maps an entity's current state to the
//! collaborator that advances it, and folds that collaborator's verdict
//! back into a state transition.

use std::path::PathBuf;

use onyxc_collab::{CodeEmitter, Diagnostic, ErrorReporter, Parser, SymbolIntroducer,
    SymbolResolver, TypeChecker};
use onyxc_entity::{Entity, EntityPayload, EntityState, EntityTemplate};
use onyxc_loader::{ExpandOutcome, FileSystem, LoadExpander};
use onyxc_registries::{LoadedFileRegistry, PackageRegistry, ScopeTable};

/// Outcome of one dispatch: mirrors the collaborator contract directly,
/// either the entity changed and should be re-inserted under its new
/// state, or it didn't and is re-inserted unchanged.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub entity: Entity,
    pub changed: bool,
    pub spawned: Vec<EntityTemplate>,
}

impl DispatchOutcome {
    fn unchanged(entity: Entity) -> Self {
        Self {
            entity,
            changed: false,
            spawned: Vec::new(),
        }
    }

    fn changed(entity: Entity) -> Self {
        Self {
            entity,
            changed: true,
            spawned: Vec::new(),
        }
    }

    fn changed_with(entity: Entity, spawned: Vec<EntityTemplate>) -> Self {
        Self {
            entity,
            changed: true,
            spawned,
        }
    }
}

/// Everything a dispatch needs besides the entity itself: the shared
/// registries, the collaborators, and the two flags (`cycle_detected`,
/// `check_only`) that change dispatch behavior.
pub struct DispatchContext<'a, F: FileSystem, P: Parser> {
    pub registry: &'a mut LoadedFileRegistry,
    pub packages: &'a mut PackageRegistry,
    pub scopes: &'a mut ScopeTable,
    pub expander: &'a mut LoadExpander<F, P>,
    pub introducer: &'a mut dyn SymbolIntroducer,
    pub resolver: &'a mut dyn SymbolResolver,
    pub checker: &'a mut dyn TypeChecker,
    pub emitter: &'a mut dyn CodeEmitter,
    pub reporter: &'a mut ErrorReporter,
    pub base_dir: PathBuf,
    pub cycle_detected: bool,
    pub check_only: bool,
}

/// Dispatch one entity. `entity.macro_attempts` is incremented here,
/// unconditionally, matching "count of times this entity has been pulled
/// from the heap" rather than "count of times it made progress".
/// `micro_attempts` counts consecutive no-progress dispatches since the
/// entity's last state advance: bumped when the collaborator reports no
/// change, reset to zero the moment the state actually moves.
pub fn dispatch<F: FileSystem, P: Parser>(
    mut entity: Entity,
    ctx: &mut DispatchContext<'_, F, P>,
) -> DispatchOutcome {
    entity.macro_attempts += 1;

    let mut outcome = match entity.state {
        EntityState::ParseBuiltin => dispatch_builtin_load(entity, ctx),
        EntityState::Parse => dispatch_load(entity, ctx),
        EntityState::IntroduceSymbols => dispatch_introduce(entity, ctx),
        EntityState::ResolveSymbols => dispatch_resolve(entity, ctx),
        EntityState::CheckTypes => dispatch_check_types(entity, ctx),
        EntityState::CodeGen => dispatch_emit(entity, ctx),
        EntityState::Error => dispatch_error(entity, ctx),
        EntityState::Finalized | EntityState::Failed => {
            unreachable!("terminal entity {:?} must not be dispatched", entity.id)
        }
    };

    if outcome.changed {
        outcome.entity.micro_attempts = 0;
    } else {
        outcome.entity.micro_attempts += 1;
    }
    outcome
}

fn dispatch_builtin_load<F: FileSystem, P: Parser>(
    mut entity: Entity,
    ctx: &mut DispatchContext<'_, F, P>,
) -> DispatchOutcome {
    // Built-ins are guaranteed to exist by the installation; this phase
    // never yields.
    let EntityPayload::LoadFile { name } = entity.payload.clone() else {
        entity.state = EntityState::Finalized;
        return DispatchOutcome::changed(entity);
    };
    match ctx.expander.expand_load_file(
        &name,
        &ctx.base_dir,
        ctx.registry,
        entity.scope,
        entity.package,
    ) {
        Ok(ExpandOutcome::Loaded { entities, .. }) => {
            entity.state = EntityState::Finalized;
            DispatchOutcome::changed_with(entity, entities)
        }
        _ => {
            entity.state = EntityState::Finalized;
            DispatchOutcome::changed(entity)
        }
    }
}

fn dispatch_load<F: FileSystem, P: Parser>(
    mut entity: Entity,
    ctx: &mut DispatchContext<'_, F, P>,
) -> DispatchOutcome {
    match entity.payload.clone() {
        EntityPayload::LoadFile { name } => {
            match ctx.expander.expand_load_file(
                &name,
                &ctx.base_dir,
                ctx.registry,
                entity.scope,
                entity.package,
            ) {
                Ok(ExpandOutcome::Loaded { entities, .. }) => {
                    entity.state = EntityState::Finalized;
                    DispatchOutcome::changed_with(entity, entities)
                }
                Ok(ExpandOutcome::AlreadyLoaded) => {
                    entity.state = EntityState::Finalized;
                    DispatchOutcome::changed(entity)
                }
                Ok(ExpandOutcome::NotYetAvailable) => {
                    not_yet_available(entity, ctx, format!("Failed to open file {name}"))
                }
                Err(err) => fail(entity, ctx, err.to_string()),
            }
        }
        EntityPayload::LoadAll { name, recursive } => {
            match ctx.expander.expand_load_all(&name, &ctx.base_dir, recursive) {
                Ok(names) => {
                    let spawned = names
                        .into_iter()
                        .map(|child| EntityTemplate {
                            kind: onyxc_entity::EntityKind::LoadFile,
                            state: EntityState::Parse,
                            package: entity.package,
                            scope: entity.scope,
                            payload: EntityPayload::LoadFile { name: child },
                            position: entity.position,
                            source_span: None,
                        })
                        .collect();
                    entity.state = EntityState::Finalized;
                    DispatchOutcome::changed_with(entity, spawned)
                }
                Err(err) => not_yet_available(entity, ctx, err.to_string()),
            }
        }
        EntityPayload::LoadPath { name } => {
            ctx.expander.add_search_path(name);
            entity.state = EntityState::Finalized;
            DispatchOutcome::changed(entity)
        }
        _ => unreachable!("non-load payload reached the Parse state"),
    }
}

fn not_yet_available<F: FileSystem, P: Parser>(
    entity: Entity,
    ctx: &mut DispatchContext<'_, F, P>,
    message: String,
) -> DispatchOutcome {
    if ctx.cycle_detected {
        fail(entity, ctx, message)
    } else {
        DispatchOutcome::unchanged(entity)
    }
}

fn fail<F: FileSystem, P: Parser>(
    mut entity: Entity,
    ctx: &mut DispatchContext<'_, F, P>,
    message: String,
) -> DispatchOutcome {
    ctx.reporter
        .report(Diagnostic::error(entity.position, message));
    entity.state = EntityState::Failed;
    DispatchOutcome::changed(entity)
}

fn dispatch_introduce<F: FileSystem, P: Parser>(
    mut entity: Entity,
    ctx: &mut DispatchContext<'_, F, P>,
) -> DispatchOutcome {
    let outcome = ctx.introducer.introduce(&entity, ctx.scopes);
    if outcome.duplicate {
        ctx.reporter.report(Diagnostic::warning(
            entity.position,
            "duplicate declaration in this scope",
        ));
    }
    entity.state = EntityState::ResolveSymbols;
    DispatchOutcome::changed(entity)
}

fn dispatch_resolve<F: FileSystem, P: Parser>(
    mut entity: Entity,
    ctx: &mut DispatchContext<'_, F, P>,
) -> DispatchOutcome {
    if ctx.resolver.resolve(&entity, ctx.scopes) {
        entity.state = EntityState::CheckTypes;
        DispatchOutcome::changed(entity)
    } else if ctx.cycle_detected {
        fail(entity, ctx, "unresolved identifier".to_string())
    } else {
        DispatchOutcome::unchanged(entity)
    }
}

fn dispatch_check_types<F: FileSystem, P: Parser>(
    mut entity: Entity,
    ctx: &mut DispatchContext<'_, F, P>,
) -> DispatchOutcome {
    ctx.checker.check(&entity);
    entity.state = EntityState::CodeGen;
    DispatchOutcome::changed(entity)
}

fn dispatch_emit<F: FileSystem, P: Parser>(
    mut entity: Entity,
    ctx: &mut DispatchContext<'_, F, P>,
) -> DispatchOutcome {
    if !ctx.check_only {
        ctx.emitter.emit(&entity);
    }
    entity.state = EntityState::Finalized;
    DispatchOutcome::changed(entity)
}

fn dispatch_error<F: FileSystem, P: Parser>(
    mut entity: Entity,
    ctx: &mut DispatchContext<'_, F, P>,
) -> DispatchOutcome {
    let message = match &entity.payload {
        EntityPayload::Error { message } => message.clone(),
        _ => "unspecified error".to_string(),
    };
    ctx.reporter.report(Diagnostic::error(entity.position, message));
    entity.state = EntityState::Failed;
    DispatchOutcome::changed(entity)
}
