//! Shared entity state and the universal input table
//!
//! Every entity class embeds a [`BaseEntityData`]. The inputs declared here
//! (`Kill`, `SetParent`, `AddContext`, `FireUser1..4`, ...) form the tail of
//! every class's composed dispatch table, so all of them are reachable on
//! every entity without per-class re-declaration. A class input with the
//! same name shadows the base entry.

use tracing::warn;

use crate::entity::class::InputDef;
use crate::entity::handle::EHandle;
use crate::entity::Entity;
use crate::io::action::EventAction;
use crate::io::dispatch::InputData;
use crate::io::output::EntityOutput;
use crate::math::{QAngle, Vector3};
use crate::strings::{intern, PooledString};
use crate::variant::{FieldType, Variant};
use crate::world::World;

/// One `name:value` response context entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseContext {
    pub name: PooledString,
    pub value: PooledString,
}

/// State common to every entity class
#[derive(Default)]
pub struct BaseEntityData {
    /// Own handle, assigned when the entity enters the table
    pub handle: EHandle,
    pub classname: PooledString,
    /// Designer-facing targetname; empty for anonymous entities
    pub name: PooledString,
    pub origin: Vector3,
    pub angles: QAngle,
    /// Resolved parent, if any
    pub parent: EHandle,
    /// Raw parent keyvalue, possibly `"name,attachment"`
    pub parent_name: PooledString,
    pub spawnflags: u32,
    pub contexts: Vec<ResponseContext>,
    /// Index of the raw map text block this entity spawned from, used by
    /// template capture
    pub map_data_index: Option<usize>,
    pub on_user1: EntityOutput,
    pub on_user2: EntityOutput,
    pub on_user3: EntityOutput,
    pub on_user4: EntityOutput,
}

impl BaseEntityData {
    pub fn has_spawnflag(&self, bit: u32) -> bool {
        self.spawnflags & bit != 0
    }

    /// `classname(targetname)` string for diagnostics
    pub fn debug_name(&self) -> String {
        if self.name.is_empty() {
            self.classname.to_string()
        } else {
            format!("{}({})", self.classname, self.name)
        }
    }

    /// Apply a keyvalue common to all classes; false if unrecognized
    pub fn apply_common_key(&mut self, key: &str, value: &str) -> bool {
        match key {
            "targetname" => {
                self.name = intern(value);
                true
            }
            "origin" => {
                if let Some(v) = Vector3::parse(value) {
                    self.origin = v;
                } else {
                    warn!("{}: bad origin {value:?}", self.debug_name());
                }
                true
            }
            "angles" => {
                if let Some(a) = QAngle::parse(value) {
                    self.angles = a;
                } else {
                    warn!("{}: bad angles {value:?}", self.debug_name());
                }
                true
            }
            "parentname" => {
                self.parent_name = intern(value);
                true
            }
            "spawnflags" => {
                self.spawnflags = value.trim().parse().unwrap_or(0);
                true
            }
            _ => false,
        }
    }

    /// Base output lookup; classes fall through to this
    pub fn output_mut(&mut self, name: &str) -> Option<&mut EntityOutput> {
        match name {
            "OnUser1" => Some(&mut self.on_user1),
            "OnUser2" => Some(&mut self.on_user2),
            "OnUser3" => Some(&mut self.on_user3),
            "OnUser4" => Some(&mut self.on_user4),
            _ => None,
        }
    }

    /// Add or replace a `name:value` context
    pub fn add_context(&mut self, name: &str, value: &str) {
        let name = intern(name);
        if let Some(entry) = self.contexts.iter_mut().find(|c| c.name == name) {
            entry.value = intern(value);
        } else {
            self.contexts.push(ResponseContext {
                name,
                value: intern(value),
            });
        }
    }

    pub fn remove_context(&mut self, name: &str) -> bool {
        let before = self.contexts.len();
        self.contexts.retain(|c| c.name != *name);
        self.contexts.len() != before
    }
}

/// Output names available on every entity
pub const BASE_OUTPUTS: &[&str] = &["OnUser1", "OnUser2", "OnUser3", "OnUser4"];

/// The universal input table, appended after every class's own entries
pub const BASE_INPUTS: &[InputDef] = &[
    InputDef {
        name: "Kill",
        ty: FieldType::Void,
        func: input_kill,
    },
    InputDef {
        name: "KillHierarchy",
        ty: FieldType::Void,
        func: input_kill_hierarchy,
    },
    InputDef {
        name: "SetParent",
        ty: FieldType::String,
        func: input_set_parent,
    },
    InputDef {
        name: "ClearParent",
        ty: FieldType::Void,
        func: input_clear_parent,
    },
    InputDef {
        name: "AddContext",
        ty: FieldType::String,
        func: input_add_context,
    },
    InputDef {
        name: "RemoveContext",
        ty: FieldType::String,
        func: input_remove_context,
    },
    InputDef {
        name: "ClearContext",
        ty: FieldType::Void,
        func: input_clear_context,
    },
    InputDef {
        name: "AddOutput",
        ty: FieldType::String,
        func: input_add_output,
    },
    InputDef {
        name: "FireUser1",
        ty: FieldType::Void,
        func: input_fire_user1,
    },
    InputDef {
        name: "FireUser2",
        ty: FieldType::Void,
        func: input_fire_user2,
    },
    InputDef {
        name: "FireUser3",
        ty: FieldType::Void,
        func: input_fire_user3,
    },
    InputDef {
        name: "FireUser4",
        ty: FieldType::Void,
        func: input_fire_user4,
    },
];

fn input_kill(ent: &mut dyn Entity, world: &mut World, _data: &InputData) {
    let handle = ent.base().handle;
    world.remove_entity(handle);
}

fn input_kill_hierarchy(ent: &mut dyn Entity, world: &mut World, _data: &InputData) {
    let handle = ent.base().handle;
    world.remove_hierarchy(handle);
}

fn input_set_parent(ent: &mut dyn Entity, world: &mut World, data: &InputData) {
    let Some(raw) = data.value.as_str() else {
        return;
    };
    let base = ent.base_mut();
    base.parent_name = intern(raw);

    // The value may carry an attachment point: "name,attachment". Only the
    // name part resolves here; attachments belong to the host's model
    // system.
    let name_part = raw.split(',').next().unwrap_or(raw);
    let parent = world.resolve_single_target(name_part, data.activator, data.caller);
    match parent {
        Some(h) if h != base.handle => base.parent = h,
        Some(_) => {
            warn!("{}: entity cannot be its own parent", base.debug_name());
            base.parent = EHandle::invalid();
        }
        None => {
            warn!(
                "{}: SetParent could not find {name_part:?}",
                base.debug_name()
            );
            base.parent = EHandle::invalid();
        }
    }
}

fn input_clear_parent(ent: &mut dyn Entity, _world: &mut World, _data: &InputData) {
    let base = ent.base_mut();
    base.parent = EHandle::invalid();
    base.parent_name = PooledString::empty();
}

fn input_add_context(ent: &mut dyn Entity, _world: &mut World, data: &InputData) {
    let Some(raw) = data.value.as_str() else {
        return;
    };
    match raw.split_once(':') {
        Some((name, value)) => ent.base_mut().add_context(name, value),
        None => warn!(
            "{}: AddContext wants \"name:value\", got {raw:?}",
            ent.base().debug_name()
        ),
    }
}

fn input_remove_context(ent: &mut dyn Entity, _world: &mut World, data: &InputData) {
    if let Some(name) = data.value.as_str() {
        ent.base_mut().remove_context(name);
    }
}

fn input_clear_context(ent: &mut dyn Entity, _world: &mut World, _data: &InputData) {
    ent.base_mut().contexts.clear();
}

/// `AddOutput` accepts two parameter forms:
///
/// - `"key value"` applies a plain keyvalue at runtime
/// - `"OutputName Target:Input:Param:Delay:Count"` wires a new connection
fn input_add_output(ent: &mut dyn Entity, _world: &mut World, data: &InputData) {
    let Some(raw) = data.value.as_str() else {
        return;
    };
    let Some((key, rest)) = raw.split_once(' ') else {
        warn!(
            "{}: AddOutput got a bare token {raw:?}",
            ent.base().debug_name()
        );
        return;
    };

    if rest.contains(':') {
        let owner = ent.base().debug_name();
        match EventAction::parse_with_delim(rest, ':') {
            Ok(action) => match ent.output_mut(key) {
                Some(output) => output.add_action(action),
                None => warn!("{owner}: AddOutput names unknown output {key:?}"),
            },
            Err(e) => warn!("{owner}: AddOutput: {e}"),
        }
    } else if !crate::entity::apply_key_value(ent, key, rest) {
        warn!(
            "{}: AddOutput keyvalue {key:?} not handled",
            ent.base().debug_name()
        );
    }
}

fn fire_user(ent: &mut dyn Entity, world: &mut World, data: &InputData, which: usize) {
    let caller = ent.base().handle;
    let base = ent.base_mut();
    let output = match which {
        1 => &mut base.on_user1,
        2 => &mut base.on_user2,
        3 => &mut base.on_user3,
        _ => &mut base.on_user4,
    };
    output.fire(world, Variant::Void, data.activator, caller, 0.0);
}

fn input_fire_user1(ent: &mut dyn Entity, world: &mut World, data: &InputData) {
    fire_user(ent, world, data, 1);
}

fn input_fire_user2(ent: &mut dyn Entity, world: &mut World, data: &InputData) {
    fire_user(ent, world, data, 2);
}

fn input_fire_user3(ent: &mut dyn Entity, world: &mut World, data: &InputData) {
    fire_user(ent, world, data, 3);
}

fn input_fire_user4(ent: &mut dyn Entity, world: &mut World, data: &InputData) {
    fire_user(ent, world, data, 4);
}
