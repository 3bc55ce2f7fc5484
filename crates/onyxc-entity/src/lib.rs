//! The entity: the unit of scheduled work.
//!
//! An `Entity` is a tagged variant carrying just enough payload for the
//! driver's own bookkeeping; the *content* a parser would normally attach
//! (full AST nodes) is out of scope, so `EntityPayload` carries only the
//! minimal data the boundary contracts need to decide whether a
//! dependency is satisfied.
//!
//! Modeled after an editor's central event enum: one flat `pub enum` for the
//! tag, a handful of `AtomicU64` telemetry counters siblings can read without
//! locking, and an observer trait (`EntityHooks`) with a no-op default so
//! callers that don't care about progress don't have to wire anything up.

use std::sync::atomic::{AtomicU64, Ordering};

use onyxc_registries::{PackageId, ScopeId};
use onyxc_text::{Position, Span};

pub static ENTITIES_CREATED: AtomicU64 = AtomicU64::new(0);
pub static ENTITIES_FINALIZED: AtomicU64 = AtomicU64::new(0);
pub static ENTITIES_FAILED: AtomicU64 = AtomicU64::new(0);

/// Monotonically increasing, stable-across-reinsertion identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Allocates fresh, strictly increasing `EntityId`s. Owned by the entity heap
/// so ids are assigned exactly once, on first insertion.
#[derive(Debug, Default)]
pub struct EntityIdAllocator(u64);

impl EntityIdAllocator {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn next(&mut self) -> EntityId {
        let id = EntityId(self.0);
        self.0 += 1;
        id
    }
}

/// The tagged variant selecting which collaborator processes an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    LoadFile,
    LoadAll,
    LoadPath,
    LibraryPath,
    Binding,
    Expression,
    Function,
    OverloadedFunction,
    Polymorphic,
    StaticIf,
    StringLiteral,
    Struct,
    Enum,
    Global,
    ForeignBlock,
    Memory,
    Use,
    ProcessDirective,
    Error,
    Note,
}

/// Position in the phase sequence Parse → IntroduceSymbols → ResolveSymbols →
/// CheckTypes → CodeGen → Finalized.
///
/// Declared in ascending priority order: the heap's ordering key relies on
/// the derived `Ord` matching this sequence exactly, and the state
/// machine's monotonicity invariant relies on the discriminant only ever
/// increasing except for the terminal `Failed`/`Error` pair,
/// which are reached from any earlier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityState {
    ParseBuiltin,
    Parse,
    IntroduceSymbols,
    ResolveSymbols,
    CheckTypes,
    CodeGen,
    Error,
    Finalized,
    Failed,
}

impl EntityState {
    pub fn is_terminal(self) -> bool {
        matches!(self, EntityState::Finalized | EntityState::Failed)
    }
}

/// The kind-specific data an entity carries. Real AST nodes are out of
/// scope; this is the minimal shape the boundary contracts operate on.
#[derive(Debug, Clone)]
pub enum EntityPayload {
    /// `use "name";` or the boot sequencer's built-in/user-file loads.
    LoadFile { name: String },
    /// `use_all "name";`, optionally recursive.
    LoadAll { name: String, recursive: bool },
    /// `#load_path "name";`.
    LoadPath { name: String },
    LibraryPath { name: String },
    /// A named declaration (`name :: value`) with a recorded list of the
    /// identifiers its resolution depends on (the minimal Symbol Resolver
    /// walks this list rather than a real dependency graph).
    Declaration {
        name: String,
        depends_on: Vec<String>,
    },
    /// Anything the minimal parser doesn't specifically recognize: it has no
    /// dependencies and resolves immediately.
    Opaque,
    /// A diagnostic-only entity drained during `dump_cycles` or raised
    /// directly by a collaborator.
    Error { message: String },
}

/// The unit of scheduled work.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub state: EntityState,
    pub package: Option<PackageId>,
    pub scope: ScopeId,
    pub payload: EntityPayload,
    pub position: Position,
    pub source_span: Option<Span>,
    /// Times this entity has been pulled from the heap; the cycle
    /// detector watermarks against this.
    pub macro_attempts: u32,
    /// Times a single collaborator returned "no progress" while inspecting
    /// this entity since its last state advance; reset on every transition.
    pub micro_attempts: u32,
}

/// Everything needed to insert a new entity except its id, which the heap
/// assigns. Produced by the boot sequencer, the load expander, and the
/// minimal parser.
#[derive(Debug)]
pub struct EntityTemplate {
    pub kind: EntityKind,
    pub state: EntityState,
    pub package: Option<PackageId>,
    pub scope: ScopeId,
    pub payload: EntityPayload,
    pub position: Position,
    pub source_span: Option<Span>,
}

impl EntityTemplate {
    pub fn into_entity(self, id: EntityId) -> Entity {
        ENTITIES_CREATED.fetch_add(1, Ordering::Relaxed);
        Entity {
            id,
            kind: self.kind,
            state: self.state,
            package: self.package,
            scope: self.scope,
            payload: self.payload,
            position: self.position,
            source_span: self.source_span,
            macro_attempts: 0,
            micro_attempts: 0,
        }
    }
}

impl Entity {
    /// Record that this entity left the heap via a terminal state, for the
    /// telemetry counters progress UIs read.
    pub fn record_terminal(&self) {
        match self.state {
            EntityState::Finalized => {
                ENTITIES_FINALIZED.fetch_add(1, Ordering::Relaxed);
            }
            EntityState::Failed => {
                ENTITIES_FAILED.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }
}

/// Observer hooks fired around each dispatch, for progress reporting
/// (verbosity levels, UI, tests). Default implementations are no-ops so most
/// callers wire up nothing.
pub trait EntityHooks: Send + Sync {
    fn before_dispatch(&self, _entity: &Entity) {}
    fn after_dispatch(&self, _entity: &Entity, _changed: bool) {}
}

pub struct NoopEntityHooks;

impl EntityHooks for NoopEntityHooks {}
