//! The entity slot table and name resolution
//!
//! Slots are reused; each reuse bumps the slot's serial number so stale
//! handles stop resolving. Destruction is two-phase: `mark_for_deletion`
//! hides the entity from lookups immediately, and the world purges marked
//! slots at end of tick so nothing iterating mid-frame sees a half-dead
//! entity.
//!
//! Name searches use iterator semantics: pass the previous result to get
//! the next match, `None` to start. Patterns support exact match, leading
//! and trailing `*` wildcards, and the contextual `!activator` / `!caller`
//! tokens.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use crate::entity::handle::{EHandle, MAX_EDICTS, NUM_SERIAL_BITS};
use crate::entity::{Entity, EntityRef};
use crate::math::Vector3;

struct Slot {
    serial: u32,
    marked: bool,
    entity: Option<EntityRef>,
}

/// Dense table owning every live entity
#[derive(Default)]
pub struct EntityList {
    slots: Vec<Slot>,
    free: Vec<usize>,
    pending: Vec<EHandle>,
}

impl EntityList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live, unmarked entities
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.entity.is_some() && !s.marked)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert an entity, assigning its handle
    ///
    /// Returns `None` only when the table is full; the caller logs and
    /// skips, it does not crash (capacity is a resource error, not a bug).
    pub fn insert(&mut self, mut ent: Box<dyn Entity>) -> Option<EHandle> {
        let index = match self.free.pop() {
            Some(i) => i,
            None => {
                // Top index is reserved for the invalid sentinel.
                if self.slots.len() as u32 >= MAX_EDICTS - 1 {
                    warn!("entity table full, dropping {}", ent.base().debug_name());
                    return None;
                }
                self.slots.push(Slot {
                    serial: 1,
                    marked: false,
                    entity: None,
                });
                self.slots.len() - 1
            }
        };

        let handle = EHandle::from_parts(index as u32, self.slots[index].serial);
        ent.base_mut().handle = handle;
        self.slots[index].entity = Some(Arc::new(RwLock::new(ent)));
        Some(handle)
    }

    /// Resolve a handle to its entity
    ///
    /// Stale serials and marked-for-deletion entities both come back as
    /// `None`; from the caller's point of view the entity is gone.
    pub fn get(&self, handle: EHandle) -> Option<EntityRef> {
        if !handle.is_valid() {
            return None;
        }
        let slot = self.slots.get(handle.index() as usize)?;
        if slot.marked || slot.serial != handle.serial() {
            return None;
        }
        slot.entity.clone()
    }

    pub fn is_alive(&self, handle: EHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Queue an entity for removal; it disappears from lookups now and is
    /// actually destroyed when the pending list drains at end of tick
    pub fn mark_for_deletion(&mut self, handle: EHandle) -> bool {
        if !self.is_alive(handle) {
            return false;
        }
        self.slots[handle.index() as usize].marked = true;
        self.pending.push(handle);
        true
    }

    /// Destroy everything queued by `mark_for_deletion`; returns how many
    pub fn purge_deleted(&mut self) -> usize {
        let purged = self.pending.len();
        for handle in std::mem::take(&mut self.pending) {
            let index = handle.index() as usize;
            let slot = &mut self.slots[index];
            slot.entity = None;
            slot.marked = false;
            slot.serial = (slot.serial + 1) & ((1 << NUM_SERIAL_BITS) - 1);
            self.free.push(index);
        }
        purged
    }

    /// Snapshot of all live, unmarked handles in slot order
    pub fn handles(&self) -> Vec<EHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.entity.is_some() && !s.marked)
            .map(|(i, s)| EHandle::from_parts(i as u32, s.serial))
            .collect()
    }

    /// Does `name` match `pattern`? Supports `*` prefix/suffix wildcards.
    pub fn name_matches(pattern: &str, name: &str) -> bool {
        if pattern.is_empty() || name.is_empty() {
            return false;
        }
        if pattern == "*" {
            return true;
        }
        match (pattern.strip_prefix('*'), pattern.strip_suffix('*')) {
            (Some(rest), _) if rest.starts_with('*') => false,
            (Some(_), Some(_)) => {
                // Both ends wild: containment.
                let middle = &pattern[1..pattern.len() - 1];
                !middle.is_empty() && name.contains(middle)
            }
            (Some(suffix), None) => name.ends_with(suffix),
            (None, Some(prefix)) => name.starts_with(prefix),
            (None, None) => pattern == name,
        }
    }

    /// Find the next entity whose targetname matches `pattern`
    ///
    /// `!activator` and `!caller` resolve from the current delivery context
    /// and yield at most one result. An entity currently being dispatched
    /// holds its own write lock; such entities are skipped rather than
    /// deadlocking the search.
    pub fn find_by_name(
        &self,
        start_after: Option<EHandle>,
        pattern: &str,
        activator: EHandle,
        caller: EHandle,
    ) -> Option<EHandle> {
        match pattern {
            "!activator" => {
                return start_after
                    .is_none()
                    .then_some(activator)
                    .filter(|h| self.is_alive(*h));
            }
            "!caller" => {
                return start_after
                    .is_none()
                    .then_some(caller)
                    .filter(|h| self.is_alive(*h));
            }
            _ => {}
        }
        self.scan(start_after, |ent| {
            Self::name_matches(pattern, &ent.base().name)
        })
    }

    /// Find the next entity of the given classname (distinct search mode,
    /// exact match, no wildcards)
    pub fn find_by_classname(
        &self,
        start_after: Option<EHandle>,
        classname: &str,
    ) -> Option<EHandle> {
        self.scan(start_after, |ent| ent.base().classname == *classname)
    }

    /// Find the next entity of the given classname within `radius` of
    /// `center`
    pub fn find_by_classname_within_radius(
        &self,
        start_after: Option<EHandle>,
        classname: &str,
        center: Vector3,
        radius: f32,
    ) -> Option<EHandle> {
        self.scan(start_after, |ent| {
            ent.base().classname == *classname
                && ent.base().origin.distance_to(center) <= radius
        })
    }

    /// All matches for a name pattern, resolved against one snapshot
    pub fn collect_by_name(
        &self,
        pattern: &str,
        activator: EHandle,
        caller: EHandle,
    ) -> Vec<EHandle> {
        let mut out = Vec::new();
        let mut cursor = None;
        while let Some(h) = self.find_by_name(cursor, pattern, activator, caller) {
            out.push(h);
            cursor = Some(h);
        }
        out
    }

    /// All matches for a classname, resolved against one snapshot
    pub fn collect_by_classname(&self, classname: &str) -> Vec<EHandle> {
        let mut out = Vec::new();
        let mut cursor = None;
        while let Some(h) = self.find_by_classname(cursor, classname) {
            out.push(h);
            cursor = Some(h);
        }
        out
    }

    fn scan(
        &self,
        start_after: Option<EHandle>,
        mut pred: impl FnMut(&dyn Entity) -> bool,
    ) -> Option<EHandle> {
        let start = start_after.map(|h| h.index() as usize + 1).unwrap_or(0);
        for (i, slot) in self.slots.iter().enumerate().skip(start) {
            if slot.marked {
                continue;
            }
            let Some(arc) = &slot.entity else { continue };
            // try_read fails only for the entity currently being
            // dispatched on this thread; skip it instead of deadlocking.
            let Some(guard) = arc.try_read() else { continue };
            if pred(&**guard) {
                return Some(EHandle::from_parts(i as u32, slot.serial));
            }
        }
        None
    }
}
