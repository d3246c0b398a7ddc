//! `logic_relay`: the designer's general-purpose signal repeater
//!
//! Forwards a `Trigger` input to its `OnTrigger` connections, with
//! enable/disable gating and a refire guard: after firing, the relay waits
//! until its slowest connection has been delivered before accepting
//! another `Trigger`, unless the fast-retrigger spawnflag allows it.

use std::any::Any;

use bitflags::bitflags;
use tracing::debug;

use srcio_core::io::queue::{EventTarget, QueuedEvent};
use srcio_core::{
    BaseEntityData, ClassRegistry, Entity, EntityOutput, FieldType, InputData, InputDef, Variant,
    World,
};

bitflags! {
    /// `logic_relay` spawnflags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RelayFlags: u32 {
        /// Remove the relay after its first successful Trigger
        const ONLY_ONCE = 1;
        /// Accept Trigger again before prior deliveries finish
        const FAST_RETRIGGER = 2;
    }
}

pub struct LogicRelay {
    base: BaseEntityData,
    enabled: bool,
    wait_for_refire: bool,
    on_spawn: EntityOutput,
    on_trigger: EntityOutput,
}

impl Default for LogicRelay {
    fn default() -> Self {
        Self {
            base: BaseEntityData::default(),
            enabled: true,
            wait_for_refire: false,
            on_spawn: EntityOutput::new(),
            on_trigger: EntityOutput::new(),
        }
    }
}

impl LogicRelay {
    fn flags(&self) -> RelayFlags {
        RelayFlags::from_bits_truncate(self.base.spawnflags)
    }
}

impl Entity for LogicRelay {
    fn base(&self) -> &BaseEntityData {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseEntityData {
        &mut self.base
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn key_value(&mut self, key: &str, value: &str) -> bool {
        if key == "StartDisabled" {
            self.enabled = value.trim() != "1";
            return true;
        }
        false
    }

    fn output_mut(&mut self, name: &str) -> Option<&mut EntityOutput> {
        match name {
            "OnSpawn" => Some(&mut self.on_spawn),
            "OnTrigger" => Some(&mut self.on_trigger),
            _ => self.base.output_mut(name),
        }
    }

    fn activate(&mut self, world: &mut World) {
        let handle = self.base.handle;
        self.on_spawn.fire_event(world, handle, handle);
    }
}

fn input_trigger(ent: &mut dyn Entity, world: &mut World, data: &InputData) {
    let Some(relay) = ent.as_any_mut().downcast_mut::<LogicRelay>() else {
        return;
    };
    if !relay.enabled {
        debug!("{}: triggered while disabled", relay.base.debug_name());
        return;
    }
    if relay.wait_for_refire {
        debug!(
            "{}: triggered while waiting for refire",
            relay.base.debug_name()
        );
        return;
    }

    let handle = relay.base.handle;
    let flags = relay.flags();

    if !flags.contains(RelayFlags::FAST_RETRIGGER) {
        // Lock out retriggering until the slowest connection has been
        // delivered.
        let refire_delay = relay
            .on_trigger
            .actions()
            .iter()
            .map(|a| a.delay)
            .fold(0.0f32, f32::max);
        relay.wait_for_refire = true;
        world.queue.add(QueuedEvent {
            target: EventTarget::Handle(handle),
            input: srcio_core::intern("EnableRefire"),
            param: Variant::Void,
            activator: data.activator,
            caller: handle,
            fire_time: world.cur_time() + refire_delay,
            action_id: 0,
        });
    }

    relay
        .on_trigger
        .fire(world, Variant::Void, data.activator, handle, 0.0);

    if flags.contains(RelayFlags::ONLY_ONCE) {
        world.remove_entity(handle);
    }
}

fn input_enable(ent: &mut dyn Entity, _world: &mut World, _data: &InputData) {
    if let Some(relay) = ent.as_any_mut().downcast_mut::<LogicRelay>() {
        relay.enabled = true;
    }
}

fn input_disable(ent: &mut dyn Entity, _world: &mut World, _data: &InputData) {
    if let Some(relay) = ent.as_any_mut().downcast_mut::<LogicRelay>() {
        relay.enabled = false;
    }
}

fn input_toggle(ent: &mut dyn Entity, _world: &mut World, _data: &InputData) {
    if let Some(relay) = ent.as_any_mut().downcast_mut::<LogicRelay>() {
        relay.enabled = !relay.enabled;
    }
}

fn input_cancel_pending(ent: &mut dyn Entity, world: &mut World, _data: &InputData) {
    let handle = ent.base().handle;
    world.queue.cancel_by_caller(handle);
    if let Some(relay) = ent.as_any_mut().downcast_mut::<LogicRelay>() {
        relay.wait_for_refire = false;
    }
}

fn input_enable_refire(ent: &mut dyn Entity, _world: &mut World, _data: &InputData) {
    if let Some(relay) = ent.as_any_mut().downcast_mut::<LogicRelay>() {
        relay.wait_for_refire = false;
    }
}

const INPUTS: &[InputDef] = &[
    InputDef {
        name: "Trigger",
        ty: FieldType::Void,
        func: input_trigger,
    },
    InputDef {
        name: "Enable",
        ty: FieldType::Void,
        func: input_enable,
    },
    InputDef {
        name: "Disable",
        ty: FieldType::Void,
        func: input_disable,
    },
    InputDef {
        name: "Toggle",
        ty: FieldType::Void,
        func: input_toggle,
    },
    InputDef {
        name: "CancelPending",
        ty: FieldType::Void,
        func: input_cancel_pending,
    },
    InputDef {
        name: "EnableRefire",
        ty: FieldType::Void,
        func: input_enable_refire,
    },
];

pub fn register(classes: &mut ClassRegistry) {
    classes.register(
        "logic_relay",
        || Box::new(LogicRelay::default()) as Box<dyn Entity>,
        &[INPUTS],
        &["OnSpawn", "OnTrigger"],
    );
}
