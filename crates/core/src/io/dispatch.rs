//! Input delivery support
//!
//! The dispatch entry point itself is [`World::accept_input`]; this module
//! holds the pieces it leans on: the per-delivery context handed to
//! handlers and the parameter resolution step that turns a queued variant
//! into the declared input type.

use crate::entity::list::EntityList;
use crate::entity::EHandle;
use crate::variant::{FieldType, Variant};

#[allow(unused_imports)] // referenced by doc links
use crate::world::World;

/// Per-delivery context passed to every input handler
pub struct InputData {
    /// The resolved parameter, already coerced to the declared type
    pub value: Variant,
    /// The entity that started this chain of events
    pub activator: EHandle,
    /// The entity whose output fired this particular delivery
    pub caller: EHandle,
    /// Originating EventAction id; 0 for direct, non-queued invocations
    pub action_id: i32,
}

/// Coerce `value` to an input's declared type, resolving entity parameters
/// against the live entity set
///
/// String parameters for `Entity`-typed inputs go through name resolution
/// (including `!activator`/`!caller`); a name matching nothing produces an
/// invalid handle, not an error; the handler sees "no entity", same as a
/// stale handle. `None` means the conversion is forbidden and the input
/// must be dropped with a diagnostic.
pub fn resolve_parameter(
    list: &EntityList,
    value: Variant,
    expected: FieldType,
    activator: EHandle,
    caller: EHandle,
) -> Option<Variant> {
    if expected != FieldType::Entity {
        return value.coerce(expected);
    }
    match &value {
        Variant::Entity(_) => Some(value),
        Variant::Void => Some(Variant::Entity(EHandle::invalid())),
        Variant::String(name) => {
            let found = list.find_by_name(None, name, activator, caller);
            Some(Variant::Entity(found.unwrap_or_else(EHandle::invalid)))
        }
        _ => None,
    }
}
