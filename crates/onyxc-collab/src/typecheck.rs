//! The type checker boundary: type inference internals are out of
//! scope, so this always succeeds once resolution has. It exists purely so
//! the `CheckTypes` state is a real dispatch, not a skipped one.

use onyxc_entity::Entity;

pub trait TypeChecker: Send + Sync {
    fn check(&mut self, entity: &Entity) -> bool;
}

#[derive(Debug, Default)]
pub struct NoopTypeChecker;

impl NoopTypeChecker {
    pub fn new() -> Self {
        Self
    }
}

impl TypeChecker for NoopTypeChecker {
    fn check(&mut self, _entity: &Entity) -> bool {
        true
    }
}
