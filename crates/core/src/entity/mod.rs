//! Entities and the table that owns them
//!
//! An entity is a boxed [`Entity`] trait object living in the [`EntityList`]
//! slot table. Everything outside the table refers to entities through
//! generation-checked [`EHandle`]s; raw references never outlive a frame.

pub mod base;
pub mod class;
pub mod handle;
pub mod list;

use std::any::Any;
use std::sync::Arc;

use parking_lot::RwLock;

pub use base::{BaseEntityData, ResponseContext, BASE_INPUTS, BASE_OUTPUTS};
pub use class::{ClassRegistry, InputDef, InputFunc};
pub use handle::{EHandle, INVALID_EHANDLE, MAX_EDICTS};
pub use list::EntityList;

use crate::error::SpawnError;
use crate::io::output::EntityOutput;
use crate::world::World;

/// Shared, lockable reference to a live entity slot
pub type EntityRef = Arc<RwLock<Box<dyn Entity>>>;

/// A simulated game object
///
/// Concrete classes embed a [`BaseEntityData`] and expose it through
/// `base`/`base_mut`; the universal inputs and the user outputs live there,
/// so every class gets them without re-declaration.
///
/// `key_value` and `output_mut` cover the class's own keys and outputs and
/// fall through to the base for everything else.
pub trait Entity: Any + Send {
    fn base(&self) -> &BaseEntityData;
    fn base_mut(&mut self) -> &mut BaseEntityData;

    /// Downcast support for input handlers
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Apply a class-specific keyvalue; return false to let the base
    /// handle common keys (`targetname`, `origin`, ...).
    fn key_value(&mut self, _key: &str, _value: &str) -> bool {
        false
    }

    /// Look up a declared output slot by name
    fn output_mut(&mut self, name: &str) -> Option<&mut EntityOutput> {
        self.base_mut().output_mut(name)
    }

    /// Called once after keyvalues are applied and the entity is in the
    /// table; a failure removes the entity from the batch.
    fn spawn(&mut self, _world: &mut World) -> Result<(), SpawnError> {
        Ok(())
    }

    /// Called after the whole batch has spawned; name references are
    /// resolvable here.
    fn activate(&mut self, _world: &mut World) {}
}

/// Apply a keyvalue, class keys first, then the common base keys
///
/// Returns false if nobody recognized the key.
pub fn apply_key_value(ent: &mut dyn Entity, key: &str, value: &str) -> bool {
    if ent.key_value(key, value) {
        return true;
    }
    ent.base_mut().apply_common_key(key, value)
}
