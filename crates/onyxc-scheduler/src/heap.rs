//! The entity heap: a min-heap keyed by `(state, id)` so the
//! driver always makes progress on the earliest declaration in the earliest
//! outstanding phase.
//!
//! Built on `std::collections::BinaryHeap` (a max-heap) wrapped in
//! `Reverse`, the same "adapt the standard collection, don't hand-roll one"
//! choice the rest of this stack makes for its priority structures.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use onyxc_entity::{Entity, EntityId, EntityIdAllocator, EntityKind, EntityState, EntityTemplate};

/// Wraps an `Entity` so `BinaryHeap` can order by `(state, id)` alone,
/// independent of whatever else changes on the entity between pushes.
struct HeapItem(Entity);

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.0.state == other.0.state && self.0.id == other.0.id
    }
}
impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.0.state, self.0.id).cmp(&(other.0.state, other.0.id))
    }
}

/// Observable progress counters: how many entities currently sit in
/// each state, and in each `(state, kind)` pair.
#[derive(Debug, Default, Clone)]
pub struct ProgressCounts {
    pub state_counts: HashMap<EntityState, usize>,
    pub state_kind_counts: HashMap<(EntityState, EntityKind), usize>,
}

impl ProgressCounts {
    fn record_insert(&mut self, state: EntityState, kind: EntityKind) {
        *self.state_counts.entry(state).or_insert(0) += 1;
        *self.state_kind_counts.entry((state, kind)).or_insert(0) += 1;
    }

    fn record_remove(&mut self, state: EntityState, kind: EntityKind) {
        if let Some(count) = self.state_counts.get_mut(&state) {
            *count -= 1;
            if *count == 0 {
                self.state_counts.remove(&state);
            }
        }
        if let Some(count) = self.state_kind_counts.get_mut(&(state, kind)) {
            *count -= 1;
            if *count == 0 {
                self.state_kind_counts.remove(&(state, kind));
            }
        }
    }

    pub fn total(&self) -> usize {
        self.state_counts.values().sum()
    }
}

/// The priority queue of work items.
#[derive(Default)]
pub struct EntityHeap {
    heap: BinaryHeap<Reverse<HeapItem>>,
    ids: EntityIdAllocator,
    counts: ProgressCounts,
}

impl EntityHeap {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            ids: EntityIdAllocator::new(),
            counts: ProgressCounts::default(),
        }
    }

    /// Assign a fresh id, push, and update counters.
    pub fn insert(&mut self, template: EntityTemplate) -> EntityId {
        let id = self.ids.next();
        let entity = template.into_entity(id);
        self.counts.record_insert(entity.state, entity.kind);
        tracing::trace!(
            target: "driver.scheduler",
            entity = id.raw(),
            state = ?entity.state,
            kind = ?entity.kind,
            "entity_inserted"
        );
        self.heap.push(Reverse(HeapItem(entity)));
        id
    }

    /// Re-insert without changing id: used when an entity made no
    /// progress, or only partial progress that didn't reach a new state.
    ///
    /// Panics if `entity` is in a terminal state: re-inserting a `Finalized`
    /// or `Failed` entity is a driver bug.
    pub fn insert_existing(&mut self, entity: Entity) {
        assert!(
            !entity.state.is_terminal(),
            "attempted to re-insert a terminal entity {:?}",
            entity.id
        );
        self.counts.record_insert(entity.state, entity.kind);
        self.heap.push(Reverse(HeapItem(entity)));
    }

    pub fn top(&self) -> Option<&Entity> {
        self.heap.peek().map(|Reverse(item)| &item.0)
    }

    /// Pop the highest-priority entity, updating counters. Returns `None` on
    /// an empty heap rather than leaving that case undefined: a safe API is
    /// strictly stronger and costs nothing here.
    pub fn remove_top(&mut self) -> Option<Entity> {
        let Reverse(item) = self.heap.pop()?;
        self.counts.record_remove(item.0.state, item.0.kind);
        Some(item.0)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn progress(&self) -> &ProgressCounts {
        &self.counts
    }
}
