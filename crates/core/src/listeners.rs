//! Entity lifecycle listeners
//!
//! Callbacks for entity creation/deletion and level start/end, keyed so
//! they can be unregistered. Deletion fires when the entity is marked, not
//! when its slot is purged; by delivery time the entity is already
//! unreachable through lookups.
//!
//! Callbacks receive handles only; they run while the world is mutably
//! borrowed and must defer any entity mutation to the next tick.

use slotmap::{new_key_type, SlotMap};

use crate::entity::EHandle;

new_key_type! {
    /// Key for registered lifecycle listeners
    pub struct ListenerKey;
}

type EntityCallback = Box<dyn FnMut(EHandle) + Send>;
type LevelCallback = Box<dyn FnMut() + Send>;

/// Registry of lifecycle callbacks, owned by the world
#[derive(Default)]
pub struct ListenerRegistry {
    entity_created: SlotMap<ListenerKey, EntityCallback>,
    entity_deleted: SlotMap<ListenerKey, EntityCallback>,
    level_start: SlotMap<ListenerKey, LevelCallback>,
    level_end: SlotMap<ListenerKey, LevelCallback>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_entity_created<F>(&mut self, callback: F) -> ListenerKey
    where
        F: FnMut(EHandle) + Send + 'static,
    {
        self.entity_created.insert(Box::new(callback))
    }

    pub fn on_entity_deleted<F>(&mut self, callback: F) -> ListenerKey
    where
        F: FnMut(EHandle) + Send + 'static,
    {
        self.entity_deleted.insert(Box::new(callback))
    }

    pub fn on_level_start<F>(&mut self, callback: F) -> ListenerKey
    where
        F: FnMut() + Send + 'static,
    {
        self.level_start.insert(Box::new(callback))
    }

    pub fn on_level_end<F>(&mut self, callback: F) -> ListenerKey
    where
        F: FnMut() + Send + 'static,
    {
        self.level_end.insert(Box::new(callback))
    }

    /// Remove a listener; true if it was found in any registry
    pub fn remove(&mut self, key: ListenerKey) -> bool {
        self.entity_created.remove(key).is_some()
            || self.entity_deleted.remove(key).is_some()
            || self.level_start.remove(key).is_some()
            || self.level_end.remove(key).is_some()
    }

    pub(crate) fn fire_entity_created(&mut self, handle: EHandle) {
        for cb in self.entity_created.values_mut() {
            cb(handle);
        }
    }

    pub(crate) fn fire_entity_deleted(&mut self, handle: EHandle) {
        for cb in self.entity_deleted.values_mut() {
            cb(handle);
        }
    }

    pub(crate) fn fire_level_start(&mut self) {
        for cb in self.level_start.values_mut() {
            cb();
        }
    }

    pub(crate) fn fire_level_end(&mut self) {
        for cb in self.level_end.values_mut() {
            cb();
        }
    }
}
