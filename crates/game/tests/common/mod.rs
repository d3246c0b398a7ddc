//! Shared fixture: a recording sink entity class
//!
//! `test_sink` accepts a handful of door/light style inputs, records each
//! delivery with its parameter and arrival time, and relays every hit
//! through its `OnHit` output so chains can be wired in map text.
#![allow(dead_code)]

use std::any::Any;

use srcio_core::{
    BaseEntityData, ClassRegistry, EHandle, Entity, EntityOutput, FieldType, InputData, InputDef,
    Variant, World,
};
use srcio_game::register_game_entities;

pub struct TestSink {
    base: BaseEntityData,
    pub received: Vec<(String, Variant, f32)>,
    on_hit: EntityOutput,
}

impl Default for TestSink {
    fn default() -> Self {
        Self {
            base: BaseEntityData::default(),
            received: Vec::new(),
            on_hit: EntityOutput::new(),
        }
    }
}

impl Entity for TestSink {
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

    fn output_mut(&mut self, name: &str) -> Option<&mut EntityOutput> {
        match name {
            "OnHit" => Some(&mut self.on_hit),
            _ => self.base.output_mut(name),
        }
    }
}

fn record(ent: &mut dyn Entity, world: &mut World, data: &InputData, input: &str) {
    let now = world.cur_time();
    let Some(sink) = ent.as_any_mut().downcast_mut::<TestSink>() else {
        return;
    };
    sink.received
        .push((input.to_string(), data.value.clone(), now));
    let caller = sink.base.handle;
    sink.on_hit
        .fire(world, Variant::Void, data.activator, caller, 0.0);
}

fn input_open(ent: &mut dyn Entity, world: &mut World, data: &InputData) {
    record(ent, world, data, "Open");
}

fn input_close(ent: &mut dyn Entity, world: &mut World, data: &InputData) {
    record(ent, world, data, "Close");
}

fn input_turn_on(ent: &mut dyn Entity, world: &mut World, data: &InputData) {
    record(ent, world, data, "TurnOn");
}

fn input_turn_off(ent: &mut dyn Entity, world: &mut World, data: &InputData) {
    record(ent, world, data, "TurnOff");
}

fn input_ignite(ent: &mut dyn Entity, world: &mut World, data: &InputData) {
    record(ent, world, data, "Ignite");
}

fn input_hit(ent: &mut dyn Entity, world: &mut World, data: &InputData) {
    record(ent, world, data, "Hit");
}

fn input_hit_float(ent: &mut dyn Entity, world: &mut World, data: &InputData) {
    record(ent, world, data, "HitFloat");
}

const SINK_INPUTS: &[InputDef] = &[
    InputDef {
        name: "Open",
        ty: FieldType::Void,
        func: input_open,
    },
    InputDef {
        name: "Close",
        ty: FieldType::Void,
        func: input_close,
    },
    InputDef {
        name: "TurnOn",
        ty: FieldType::Void,
        func: input_turn_on,
    },
    InputDef {
        name: "TurnOff",
        ty: FieldType::Void,
        func: input_turn_off,
    },
    InputDef {
        name: "Ignite",
        ty: FieldType::Void,
        func: input_ignite,
    },
    InputDef {
        name: "Hit",
        ty: FieldType::Void,
        func: input_hit,
    },
    InputDef {
        name: "HitFloat",
        ty: FieldType::Float,
        func: input_hit_float,
    },
];

pub fn register_test_sink(classes: &mut ClassRegistry) {
    classes.register(
        "test_sink",
        || Box::new(TestSink::default()) as Box<dyn Entity>,
        &[SINK_INPUTS],
        &["OnHit"],
    );
}

/// A world with the game classes and the test sink registered
pub fn test_world() -> World {
    srcio_game::init_logging();
    let mut world = World::new();
    register_game_entities(&mut world.classes);
    register_test_sink(&mut world.classes);
    world
}

/// First live entity with this exact targetname
pub fn find(world: &World, name: &str) -> EHandle {
    let inv = EHandle::invalid();
    world
        .entities
        .find_by_name(None, name, inv, inv)
        .unwrap_or_else(|| panic!("no entity named {name:?}"))
}

/// Everything a sink has received so far
pub fn received(world: &World, handle: EHandle) -> Vec<(String, Variant, f32)> {
    let arc = world.entities.get(handle).expect("sink is gone");
    let guard = arc.read();
    guard
        .as_any()
        .downcast_ref::<TestSink>()
        .expect("not a test_sink")
        .received
        .clone()
}

/// Deliver an input directly, no queue involved
pub fn send(world: &mut World, target: EHandle, input: &str) -> bool {
    let inv = EHandle::invalid();
    world.accept_input(target, input, inv, inv, Variant::Void, 0)
}
