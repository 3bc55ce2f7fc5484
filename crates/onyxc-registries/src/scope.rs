//! Lexical scopes. Symbol-resolution *algorithm* internals are out of scope
//! for this crate; what the driver needs is just enough of a scope tree
//! that the Symbol Introducer/Resolver boundary contracts have somewhere to
//! write and read names, and that nesting (block scopes within a package
//! scope) is representable.

use std::collections::HashMap;

/// Identifies one scope in a `ScopeTable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

#[derive(Debug)]
pub struct Scope {
    pub label: String,
    pub parent: Option<ScopeId>,
    bindings: HashMap<String, ()>,
}

/// Owns every scope created during a compilation. Scopes never move once
/// created and are never removed, matching the loaded-file registry's
/// append-only discipline.
#[derive(Debug, Default)]
pub struct ScopeTable {
    scopes: Vec<Scope>,
}

impl ScopeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_root(&mut self, label: &str) -> ScopeId {
        self.push(Scope {
            label: label.to_string(),
            parent: None,
            bindings: HashMap::new(),
        })
    }

    pub fn create_child(&mut self, parent: ScopeId, label: &str) -> ScopeId {
        self.push(Scope {
            label: label.to_string(),
            parent: Some(parent),
            bindings: HashMap::new(),
        })
    }

    fn push(&mut self, scope: Scope) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(scope);
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    /// Introduce a name into `scope`. Returns `false` if the name was already
    /// bound directly in this scope (shadowing an outer scope is fine; a
    /// duplicate within the same scope is a Symbol-Introducer concern, not
    /// this table's, but the table reports it so the collaborator can decide).
    pub fn introduce(&mut self, scope: ScopeId, name: &str) -> bool {
        self.scopes[scope.0 as usize]
            .bindings
            .insert(name.to_string(), ())
            .is_none()
    }

    /// Resolve `name` starting at `scope` and walking up through parents.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> bool {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id.0 as usize];
            if s.bindings.contains_key(name) {
                return true;
            }
            current = s.parent;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_finds_binding_in_same_scope() {
        let mut scopes = ScopeTable::new();
        let root = scopes.create_root("main");
        scopes.introduce(root, "foo");
        assert!(scopes.resolve(root, "foo"));
    }

    #[test]
    fn resolve_walks_up_to_parent() {
        let mut scopes = ScopeTable::new();
        let root = scopes.create_root("main");
        let child = scopes.create_child(root, "block");
        scopes.introduce(root, "foo");
        assert!(scopes.resolve(child, "foo"));
    }

    #[test]
    fn resolve_does_not_see_sibling_scopes() {
        let mut scopes = ScopeTable::new();
        let root = scopes.create_root("main");
        let a = scopes.create_child(root, "a");
        let b = scopes.create_child(root, "b");
        scopes.introduce(a, "only_in_a");
        assert!(!scopes.resolve(b, "only_in_a"));
    }

    #[test]
    fn introduce_reports_duplicate() {
        let mut scopes = ScopeTable::new();
        let root = scopes.create_root("main");
        assert!(scopes.introduce(root, "foo"));
        assert!(!scopes.introduce(root, "foo"));
    }
}
