//! The simulation context
//!
//! One [`World`] owns everything with process lifetime in the original
//! engine: the entity table, the class registry, the deferred event queue,
//! the template table, lifecycle listeners, the simulation clock, and the
//! captured map text. It is created at level init and dropped at shutdown;
//! there are no global singletons behind it.
//!
//! `tick` drives the whole system: advance the clock, pump the queue,
//! purge entities marked for deletion during the frame.

use tracing::{debug, info, trace, warn};

use crate::config::CoreConfig;
use crate::entity::class::ClassRegistry;
use crate::entity::handle::EHandle;
use crate::entity::list::EntityList;
use crate::entity::Entity;
use crate::error::{DispatchError, SpawnError};
use crate::io::dispatch::{resolve_parameter, InputData};
use crate::io::queue::{EventQueue, EventTarget, QueuedEvent};
use crate::keyvalues::parse_blocks;
use crate::listeners::ListenerRegistry;
use crate::spawn::{create_entity_from_block, spawn_hierarchical_list};
use crate::templates::TemplateDb;
use crate::variant::Variant;

/// Owner of all simulation state
pub struct World {
    pub config: CoreConfig,
    pub classes: ClassRegistry,
    pub entities: EntityList,
    pub queue: EventQueue,
    pub templates: TemplateDb,
    pub listeners: ListenerRegistry,
    /// Raw text of every loaded entity block, indexed by
    /// `BaseEntityData::map_data_index`; template capture reads this
    pub map_data: Vec<String>,
    cur_time: f32,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self::with_config(CoreConfig::default())
    }

    pub fn with_config(config: CoreConfig) -> Self {
        Self {
            config,
            classes: ClassRegistry::new(),
            entities: EntityList::new(),
            queue: EventQueue::new(),
            templates: TemplateDb::new(),
            listeners: ListenerRegistry::new(),
            map_data: Vec::new(),
            cur_time: 0.0,
        }
    }

    /// Current simulation time in seconds
    pub fn cur_time(&self) -> f32 {
        self.cur_time
    }

    pub(crate) fn set_time(&mut self, time: f32) {
        self.cur_time = time;
    }

    /// Advance the simulation by `dt` seconds
    ///
    /// Pumps the event queue at the new time, then destroys everything
    /// marked for deletion during the frame.
    pub fn tick(&mut self, dt: f32) {
        self.cur_time += dt;
        self.pump();
        self.entities.purge_deleted();
    }

    /// Deliver every queued event whose time has come
    ///
    /// `now` is re-sampled per delivery, so a zero-delay chain enqueued
    /// during delivery cascades within the same pump. The per-pump cap
    /// turns an infinite zero-delay cycle into a logged warning and a
    /// deferral to the next tick.
    fn pump(&mut self) {
        let mut delivered = 0usize;
        while delivered < self.config.max_events_per_pump {
            let Some(event) = self.queue.pop_ready(self.cur_time) else {
                return;
            };
            delivered += 1;
            self.deliver(event);
        }
        if self
            .queue
            .pending()
            .first()
            .is_some_and(|e| e.fire_time <= self.cur_time)
        {
            warn!(
                "event pump stopped after {delivered} deliveries with ready events remaining, \
                 probably a zero-delay event cycle"
            );
        }
    }

    fn deliver(&mut self, event: QueuedEvent) {
        let QueuedEvent {
            target,
            input,
            param,
            activator,
            caller,
            action_id,
            ..
        } = event;

        match target {
            EventTarget::Handle(handle) => {
                // Stale handles drop silently; the entity is simply gone.
                if self.entities.is_alive(handle) {
                    self.accept_input(handle, &input, activator, caller, param, action_id);
                }
            }
            EventTarget::Name(name) => {
                let targets = self.collect_targets(&name, activator, caller);
                if targets.is_empty() {
                    // A name matching nothing is a legal no-op.
                    trace!("no entity matches {name:?} for input {input:?}");
                    return;
                }
                for handle in targets {
                    self.accept_input(handle, &input, activator, caller, param.clone(), action_id);
                }
            }
        }
    }

    /// Resolve an event target pattern to recipients, name matches first,
    /// classname matches if no name matched
    pub fn collect_targets(
        &self,
        pattern: &str,
        activator: EHandle,
        caller: EHandle,
    ) -> Vec<EHandle> {
        let by_name = self.entities.collect_by_name(pattern, activator, caller);
        if !by_name.is_empty() {
            return by_name;
        }
        self.entities.collect_by_classname(pattern)
    }

    /// First entity matching `name`, delivery context included
    pub fn resolve_single_target(
        &self,
        name: &str,
        activator: EHandle,
        caller: EHandle,
    ) -> Option<EHandle> {
        self.entities.find_by_name(None, name, activator, caller)
    }

    /// Deliver one input to one entity, now
    ///
    /// The dispatch path: look the input up in the class's composed table,
    /// coerce the parameter to its declared type, run the handler with the
    /// entity write-locked. Unknown inputs and failed coercions warn and
    /// drop; both are designer errors, not program errors.
    pub fn accept_input(
        &mut self,
        target: EHandle,
        input: &str,
        activator: EHandle,
        caller: EHandle,
        value: Variant,
        action_id: i32,
    ) -> bool {
        let Some(arc) = self.entities.get(target) else {
            return false;
        };
        let mut guard = arc.write();

        let classname = guard.base().classname.clone();
        let Some((ty, func)) = self.classes.lookup_input(&classname, input) else {
            let e = DispatchError::UnknownInput {
                classname: classname.to_string(),
                input: input.to_string(),
            };
            warn!("{}: {e}", guard.base().debug_name());
            return false;
        };

        let got = value.field_type();
        let Some(resolved) = resolve_parameter(&self.entities, value, ty, activator, caller)
        else {
            let e = DispatchError::TypeMismatch {
                input: input.to_string(),
                expected: ty,
                got,
            };
            warn!("{}: dropping: {e}", guard.base().debug_name());
            return false;
        };

        trace!("{} <- {input:?}", guard.base().debug_name());
        func(
            &mut **guard,
            self,
            &InputData {
                value: resolved,
                activator,
                caller,
                action_id,
            },
        );
        true
    }

    /// Insert an entity into the table and notify creation listeners
    pub fn insert_entity(&mut self, ent: Box<dyn Entity>) -> Option<EHandle> {
        let handle = self.entities.insert(ent)?;
        self.listeners.fire_entity_created(handle);
        Some(handle)
    }

    /// Mark an entity for end-of-tick destruction
    ///
    /// It disappears from lookups immediately; deletion listeners fire now,
    /// while the handle still identifies what died.
    pub fn remove_entity(&mut self, handle: EHandle) -> bool {
        if self.entities.mark_for_deletion(handle) {
            self.listeners.fire_entity_deleted(handle);
            true
        } else {
            false
        }
    }

    /// Remove an entity and every entity parented to it, transitively
    pub fn remove_hierarchy(&mut self, root: EHandle) {
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            for other in self.entities.handles() {
                let Some(arc) = self.entities.get(other) else {
                    continue;
                };
                let Some(guard) = arc.try_read() else {
                    continue;
                };
                if guard.base().parent == current {
                    stack.push(other);
                }
            }
            self.remove_entity(current);
        }
    }

    /// Parse an entity lump, create every block, spawn hierarchically,
    /// activate the survivors
    ///
    /// Each block's raw text is recorded for later template capture. A
    /// block with no classname aborts the load; an unknown classname skips
    /// that block with a warning.
    pub fn load_entities(&mut self, text: &str) -> Result<Vec<EHandle>, SpawnError> {
        let blocks = parse_blocks(text)?;
        let mut created = Vec::with_capacity(blocks.len());
        for kv in &blocks {
            let index = self.map_data.len();
            self.map_data.push(kv.to_text());
            match create_entity_from_block(self, kv, Some(index)) {
                Ok(handle) => created.push(handle),
                Err(e @ SpawnError::MissingClassname) => return Err(e),
                Err(e) => warn!("skipping entity block {index}: {e}"),
            }
        }

        if created.len() > self.config.max_spawn_batch {
            warn!(
                "spawn batch of {} exceeds configured limit {}",
                created.len(),
                self.config.max_spawn_batch
            );
        }

        let survivors = spawn_hierarchical_list(self, &created, true);
        self.entities.purge_deleted();
        debug!("loaded {} entities from map data", survivors.len());
        Ok(survivors)
    }

    /// Fire level-start listeners; call once after the initial entity load
    pub fn level_init(&mut self) {
        info!("level started");
        self.listeners.fire_level_start();
    }

    /// Tear the level down: listeners, queue, entities, templates, map data
    pub fn level_shutdown(&mut self) {
        info!("level shutting down");
        self.listeners.fire_level_end();
        self.queue.clear();
        for handle in self.entities.handles() {
            self.entities.mark_for_deletion(handle);
        }
        self.entities.purge_deleted();
        self.templates.clear();
        self.map_data.clear();
        self.cur_time = 0.0;
    }
}
