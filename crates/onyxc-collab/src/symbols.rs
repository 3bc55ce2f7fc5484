//! Symbol introduction and resolution: enough of a name table to
//! produce genuine forward-reference and cycle scenarios without a real
//! type system behind it.

use onyxc_entity::{Entity, EntityPayload};
use onyxc_registries::ScopeTable;

pub trait SymbolIntroducer: Send + Sync {
    /// Bind the entity's declared name (if any) into its scope. Returns
    /// `true` if the entity advanced (every entity advances here; only a
    /// duplicate binding is diagnosed, not stalled on, per this minimal
    /// contract: this phase never yields).
    fn introduce(&mut self, entity: &Entity, scopes: &mut ScopeTable) -> IntroduceOutcome;
}

pub struct IntroduceOutcome {
    pub duplicate: bool,
}

pub trait SymbolResolver: Send + Sync {
    /// Resolve every identifier an entity's declaration depends on. Yields
    /// (returns `false`) until all are visible in the entity's scope.
    fn resolve(&mut self, entity: &Entity, scopes: &ScopeTable) -> bool;
}

#[derive(Debug, Default)]
pub struct MinimalSymbolTable;

impl MinimalSymbolTable {
    pub fn new() -> Self {
        Self
    }
}

impl SymbolIntroducer for MinimalSymbolTable {
    fn introduce(&mut self, entity: &Entity, scopes: &mut ScopeTable) -> IntroduceOutcome {
        match &entity.payload {
            EntityPayload::Declaration { name, .. } => {
                let inserted = scopes.introduce(entity.scope, name);
                IntroduceOutcome {
                    duplicate: !inserted,
                }
            }
            _ => IntroduceOutcome { duplicate: false },
        }
    }
}

impl SymbolResolver for MinimalSymbolTable {
    fn resolve(&mut self, entity: &Entity, scopes: &ScopeTable) -> bool {
        match &entity.payload {
            EntityPayload::Declaration { depends_on, .. } => depends_on
                .iter()
                .all(|name| scopes.resolve(entity.scope, name)),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onyxc_entity::{EntityKind, EntityState, EntityTemplate};
    use onyxc_text::Position;

    fn declaration(name: &str, depends_on: &[&str], scope: onyxc_registries::ScopeId) -> Entity {
        let template = EntityTemplate {
            kind: EntityKind::Binding,
            state: EntityState::IntroduceSymbols,
            package: None,
            scope,
            payload: EntityPayload::Declaration {
                name: name.to_string(),
                depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
            },
            position: Position::internal(),
            source_span: None,
        };
        template.into_entity(onyxc_entity::EntityIdAllocator::new().next())
    }

    #[test]
    fn introduce_binds_declaration_name() {
        let mut scopes = ScopeTable::new();
        let root = scopes.create_root("main");
        let mut table = MinimalSymbolTable::new();
        let entity = declaration("foo", &[], root);
        let outcome = table.introduce(&entity, &mut scopes);
        assert!(!outcome.duplicate);
        assert!(scopes.resolve(root, "foo"));
    }

    #[test]
    fn introduce_reports_duplicate() {
        let mut scopes = ScopeTable::new();
        let root = scopes.create_root("main");
        let mut table = MinimalSymbolTable::new();
        table.introduce(&declaration("foo", &[], root), &mut scopes);
        let outcome = table.introduce(&declaration("foo", &[], root), &mut scopes);
        assert!(outcome.duplicate);
    }

    #[test]
    fn resolve_yields_until_dependency_present() {
        let mut scopes = ScopeTable::new();
        let root = scopes.create_root("main");
        let mut table = MinimalSymbolTable::new();
        let entity = declaration("foo", &["bar"], root);
        assert!(!table.resolve(&entity, &scopes));
        scopes.introduce(root, "bar");
        assert!(table.resolve(&entity, &scopes));
    }

    #[test]
    fn opaque_entities_resolve_immediately() {
        let mut scopes = ScopeTable::new();
        let root = scopes.create_root("main");
        let mut table = MinimalSymbolTable::new();
        let template = EntityTemplate {
            kind: EntityKind::Note,
            state: EntityState::ResolveSymbols,
            package: None,
            scope: root,
            payload: EntityPayload::Opaque,
            position: Position::internal(),
            source_span: None,
        };
        let entity = template.into_entity(onyxc_entity::EntityIdAllocator::new().next());
        assert!(table.resolve(&entity, &scopes));
    }
}
