//! Stall/cycle detection: a watermark over `macro_attempts`, not a
//! same-entity-twice-in-a-row check, because a collaborator can yield
//! "partial" progress on an entity stuck behind something else without ever
//! truly advancing it.

use onyxc_entity::{Entity, EntityId};

/// Outcome of feeding one dispatch result to the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleSignal {
    /// No reason yet to suspect a stall.
    Clear,
    /// The heap lapped back to the watermarked entity without any entity
    /// making real progress; `cycle_almost_detected` below 3.
    Suspected,
    /// `cycle_almost_detected` just reached 3: the driver should invoke
    /// `dump_cycles` and terminate with errors.
    Confirmed,
}

/// The watermark state machine for distinguishing live progress from a
/// confirmed stall.
#[derive(Debug, Default)]
pub struct CycleDetector {
    watermarked_node: Option<EntityId>,
    highest_watermark: u32,
    cycle_almost_detected: u8,
}

impl CycleDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watermarked_node(&self) -> Option<EntityId> {
        self.watermarked_node
    }

    pub fn cycle_almost_detected(&self) -> u8 {
        self.cycle_almost_detected
    }

    /// Feed the result of one dispatch. `entity` is the entity just
    /// dispatched (after `macro_attempts` was incremented for this pull);
    /// `changed` is whether the dispatch advanced its state.
    pub fn observe(&mut self, entity: &Entity, changed: bool) -> CycleSignal {
        if changed {
            self.watermarked_node = None;
            self.cycle_almost_detected = 0;
            return CycleSignal::Clear;
        }

        match self.watermarked_node {
            None => {
                self.watermarked_node = Some(entity.id);
                self.highest_watermark = self.highest_watermark.max(entity.macro_attempts);
                CycleSignal::Clear
            }
            Some(watermarked) if watermarked == entity.id => {
                if entity.macro_attempts > self.highest_watermark {
                    self.highest_watermark = entity.macro_attempts;
                    self.cycle_almost_detected = self.cycle_almost_detected.saturating_add(1);
                    if self.cycle_almost_detected >= 3 {
                        CycleSignal::Confirmed
                    } else {
                        CycleSignal::Suspected
                    }
                } else {
                    CycleSignal::Suspected
                }
            }
            Some(_) => {
                if entity.macro_attempts > self.highest_watermark {
                    self.watermarked_node = Some(entity.id);
                    self.highest_watermark = entity.macro_attempts;
                }
                CycleSignal::Suspected
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onyxc_entity::{EntityIdAllocator, EntityKind, EntityPayload, EntityState, EntityTemplate};
    use onyxc_registries::ScopeTable;

    fn new_entity(alloc: &mut EntityIdAllocator, macro_attempts: u32) -> Entity {
        let scope = ScopeTable::new().create_root("main");
        let template = EntityTemplate {
            kind: EntityKind::Binding,
            state: EntityState::Parse,
            package: None,
            scope,
            payload: EntityPayload::Opaque,
            position: onyxc_text::Position::internal(),
            source_span: None,
        };
        let mut e = template.into_entity(alloc.next());
        e.macro_attempts = macro_attempts;
        e
    }

    fn relap(entity: &Entity, macro_attempts: u32) -> Entity {
        let mut e = entity.clone();
        e.macro_attempts = macro_attempts;
        e
    }

    #[test]
    fn progress_clears_watermark() {
        let mut alloc = EntityIdAllocator::new();
        let mut detector = CycleDetector::new();
        let e = new_entity(&mut alloc, 1);
        assert_eq!(detector.observe(&e, false), CycleSignal::Clear);
        assert_eq!(detector.observe(&e, true), CycleSignal::Clear);
        assert!(detector.watermarked_node().is_none());
    }

    #[test]
    fn first_stall_sets_watermark() {
        let mut alloc = EntityIdAllocator::new();
        let mut detector = CycleDetector::new();
        let e = new_entity(&mut alloc, 1);
        detector.observe(&e, false);
        assert_eq!(detector.watermarked_node(), Some(e.id));
    }

    #[test]
    fn different_entity_with_higher_attempts_replaces_watermark() {
        let mut alloc = EntityIdAllocator::new();
        let mut detector = CycleDetector::new();
        let a = new_entity(&mut alloc, 1);
        detector.observe(&a, false);
        let b = new_entity(&mut alloc, 2);
        let signal = detector.observe(&b, false);
        assert_eq!(signal, CycleSignal::Suspected);
        assert_eq!(detector.watermarked_node(), Some(b.id));
    }

    #[test]
    fn lapping_back_without_new_attempts_stays_suspected_not_confirmed() {
        let mut alloc = EntityIdAllocator::new();
        let mut detector = CycleDetector::new();
        let a = new_entity(&mut alloc, 3);
        detector.observe(&a, false);
        // Lap back to the same entity without a higher macro_attempts: no escalation.
        let same_attempts = relap(&a, 3);
        assert_eq!(
            detector.observe(&same_attempts, false),
            CycleSignal::Suspected
        );
        assert_eq!(detector.cycle_almost_detected(), 0);
    }

    #[test]
    fn three_laps_with_rising_attempts_confirms_cycle() {
        let mut alloc = EntityIdAllocator::new();
        let mut detector = CycleDetector::new();
        let a = new_entity(&mut alloc, 1);
        detector.observe(&a, false);
        let lap1 = relap(&a, 2);
        assert_eq!(detector.observe(&lap1, false), CycleSignal::Suspected);
        let lap2 = relap(&a, 3);
        assert_eq!(detector.observe(&lap2, false), CycleSignal::Suspected);
        let lap3 = relap(&a, 4);
        assert_eq!(detector.observe(&lap3, false), CycleSignal::Confirmed);
    }
}
