//! The code emitter boundary: real WebAssembly bytes are out of
//! scope, so emission produces a deterministic, inspectable summary record
//! per entity instead, in the order entities were emitted.

use onyxc_entity::{Entity, EntityKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedRecord {
    pub name: String,
    pub kind: EntityKind,
}

pub trait CodeEmitter: Send + Sync {
    fn emit(&mut self, entity: &Entity) -> bool;
}

/// Accumulates `EmittedRecord`s in emission order, standing in for the
/// module builder a real backend would populate.
#[derive(Debug, Default)]
pub struct ModuleBuilder {
    records: Vec<EmittedRecord>,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[EmittedRecord] {
        &self.records
    }
}

impl CodeEmitter for ModuleBuilder {
    fn emit(&mut self, entity: &Entity) -> bool {
        let name = match &entity.payload {
            onyxc_entity::EntityPayload::Declaration { name, .. } => name.clone(),
            _ => format!("<{:?}#{}>", entity.kind, entity.id.raw()),
        };
        tracing::trace!(target: "driver.finalize", entity = entity.id.raw(), name = %name, "emitted");
        self.records.push(EmittedRecord {
            name,
            kind: entity.kind,
        });
        true
    }
}
