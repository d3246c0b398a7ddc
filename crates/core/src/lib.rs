//! Entity I/O Core
//!
//! A server-side entity event system in the Source-engine mold: entities
//! expose named outputs wired by the level designer to named inputs on
//! other entities. Firing an output enqueues deliveries on a global
//! deferred event queue; the queue pumps once per simulation tick and
//! resolves target names at delivery time, so late-spawned entities
//! receive events scheduled before they existed.
//!
//! The main entry points:
//! - [`World`] - owns the entity table, event queue, templates, and clock
//! - [`EntityOutput::fire`](io::output::EntityOutput::fire) - schedules
//!   deliveries for every live connection of an output
//! - [`World::accept_input`] - the dispatch path from queue to handler
//! - [`World::load_entities`] - keyvalue text in, spawned entities out

pub mod config;
pub mod entity;
pub mod error;
pub mod io;
pub mod keyvalues;
pub mod listeners;
pub mod math;
pub mod saverestore;
pub mod spawn;
pub mod strings;
pub mod templates;
pub mod variant;
pub mod world;

// Re-export commonly used items
pub use config::{ConfigError, ConfigResult, CoreConfig};
pub use entity::{
    apply_key_value, BaseEntityData, ClassRegistry, EHandle, Entity, EntityList, EntityRef,
    InputDef, InputFunc, ResponseContext, BASE_INPUTS, BASE_OUTPUTS,
};
pub use error::{ConnectionParseError, DispatchError, KeyValuesError, SaveError, SpawnError};
pub use io::action::{EventAction, EVENT_FIRE_ALWAYS, IO_STRING_DELIMITER};
pub use io::dispatch::InputData;
pub use io::output::EntityOutput;
pub use io::queue::{EventQueue, EventTarget, QueuedEvent};
pub use keyvalues::{parse_block, parse_blocks, KeyValues};
pub use listeners::{ListenerKey, ListenerRegistry};
pub use math::{Color32, QAngle, Vector3};
pub use saverestore::{restore_level_state, save_level_state, LevelSaveState};
pub use spawn::{create_entity_from_block, spawn_hierarchical_list};
pub use strings::{intern, PooledString};
pub use templates::{TemplateDb, FIXUP_PLACEHOLDER};
pub use variant::{FieldType, Variant};
pub use world::World;
