//! `math_counter`: an accumulator with clamped edges
//!
//! Demonstrates typed value outputs: every change fires `OutValue` with a
//! float parameter, and crossing into the configured min or max fires the
//! edge outputs once per crossing.

use std::any::Any;

use srcio_core::{
    BaseEntityData, ClassRegistry, Entity, EntityOutput, FieldType, InputData, InputDef, Variant,
    World,
};

pub struct MathCounter {
    base: BaseEntityData,
    value: f32,
    min: f32,
    max: f32,
    hit_min: bool,
    hit_max: bool,
    out_value: EntityOutput,
    on_hit_min: EntityOutput,
    on_hit_max: EntityOutput,
}

impl Default for MathCounter {
    fn default() -> Self {
        Self {
            base: BaseEntityData::default(),
            value: 0.0,
            min: 0.0,
            max: 0.0,
            hit_min: false,
            hit_max: false,
            out_value: EntityOutput::new(),
            on_hit_min: EntityOutput::new(),
            on_hit_max: EntityOutput::new(),
        }
    }
}

impl MathCounter {
    fn clamping(&self) -> bool {
        self.min != 0.0 || self.max != 0.0
    }

    /// Clamp, fire edge outputs on crossings, fire `OutValue`
    fn update_value(&mut self, world: &mut World, value: f32, activator: srcio_core::EHandle) {
        let handle = self.base.handle;
        let mut value = value;

        if self.clamping() {
            value = value.clamp(self.min, self.max);

            if value >= self.max {
                if !self.hit_max {
                    self.hit_max = true;
                    self.on_hit_max.fire_event(world, activator, handle);
                }
            } else {
                self.hit_max = false;
            }

            if value <= self.min {
                if !self.hit_min {
                    self.hit_min = true;
                    self.on_hit_min.fire_event(world, activator, handle);
                }
            } else {
                self.hit_min = false;
            }
        }

        self.value = value;
        self.out_value
            .fire(world, Variant::Float(value), activator, handle, 0.0);
    }
}

impl Entity for MathCounter {
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
        match key {
            "startvalue" => {
                self.value = value.trim().parse().unwrap_or(0.0);
                true
            }
            "min" => {
                self.min = value.trim().parse().unwrap_or(0.0);
                true
            }
            "max" => {
                self.max = value.trim().parse().unwrap_or(0.0);
                true
            }
            _ => false,
        }
    }

    fn output_mut(&mut self, name: &str) -> Option<&mut EntityOutput> {
        match name {
            "OutValue" => Some(&mut self.out_value),
            "OnHitMin" => Some(&mut self.on_hit_min),
            "OnHitMax" => Some(&mut self.on_hit_max),
            _ => self.base.output_mut(name),
        }
    }
}

fn with_counter(
    ent: &mut dyn Entity,
    world: &mut World,
    data: &InputData,
    apply: impl FnOnce(&MathCounter, f32) -> f32,
) {
    let Some(counter) = ent.as_any_mut().downcast_mut::<MathCounter>() else {
        return;
    };
    let amount = data.value.as_float().unwrap_or(0.0);
    let next = apply(counter, amount);
    counter.update_value(world, next, data.activator);
}

fn input_add(ent: &mut dyn Entity, world: &mut World, data: &InputData) {
    with_counter(ent, world, data, |c, amount| c.value + amount);
}

fn input_subtract(ent: &mut dyn Entity, world: &mut World, data: &InputData) {
    with_counter(ent, world, data, |c, amount| c.value - amount);
}

fn input_set_value(ent: &mut dyn Entity, world: &mut World, data: &InputData) {
    with_counter(ent, world, data, |_, amount| amount);
}

fn input_set_value_no_fire(ent: &mut dyn Entity, _world: &mut World, data: &InputData) {
    let Some(counter) = ent.as_any_mut().downcast_mut::<MathCounter>() else {
        return;
    };
    let mut value = data.value.as_float().unwrap_or(0.0);
    if counter.clamping() {
        value = value.clamp(counter.min, counter.max);
    }
    counter.value = value;
}

fn input_get_value(ent: &mut dyn Entity, world: &mut World, data: &InputData) {
    let Some(counter) = ent.as_any_mut().downcast_mut::<MathCounter>() else {
        return;
    };
    let handle = counter.base.handle;
    let value = counter.value;
    counter
        .out_value
        .fire(world, Variant::Float(value), data.activator, handle, 0.0);
}

const INPUTS: &[InputDef] = &[
    InputDef {
        name: "Add",
        ty: FieldType::Float,
        func: input_add,
    },
    InputDef {
        name: "Subtract",
        ty: FieldType::Float,
        func: input_subtract,
    },
    InputDef {
        name: "SetValue",
        ty: FieldType::Float,
        func: input_set_value,
    },
    InputDef {
        name: "SetValueNoFire",
        ty: FieldType::Float,
        func: input_set_value_no_fire,
    },
    InputDef {
        name: "GetValue",
        ty: FieldType::Void,
        func: input_get_value,
    },
];

pub fn register(classes: &mut ClassRegistry) {
    classes.register(
        "math_counter",
        || Box::new(MathCounter::default()) as Box<dyn Entity>,
        &[INPUTS],
        &["OutValue", "OnHitMin", "OnHitMax"],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use srcio_core::EHandle;

    fn world() -> World {
        let mut w = World::new();
        register(&mut w.classes);
        w
    }

    fn counter(w: &mut World, extra: &str) -> EHandle {
        let text = format!(
            "{{\n\"classname\" \"math_counter\"\n\"targetname\" \"c\"\n{extra}}}"
        );
        w.load_entities(&text).unwrap()[0]
    }

    fn value_of(w: &World, h: EHandle) -> f32 {
        let arc = w.entities.get(h).unwrap();
        let guard = arc.read();
        guard.as_any().downcast_ref::<MathCounter>().unwrap().value
    }

    #[test]
    fn test_add_fires_out_value() {
        let mut w = world();
        let h = counter(&mut w, "\"OutValue\" \"display,SetText,,0,-1\"\n");
        let inv = EHandle::invalid();

        // The string parameter coerces to the declared Float type.
        w.accept_input(h, "Add", inv, inv, Variant::string("4"), 0);
        assert_eq!(value_of(&w, h), 4.0);
        assert_eq!(w.queue.pending()[0].param, Variant::Float(4.0));
    }

    #[test]
    fn test_clamp_and_edge_outputs() {
        let mut w = world();
        let h = counter(
            &mut w,
            "\"min\" \"0\"\n\"max\" \"3\"\n\"OnHitMax\" \"door,Open,,0,-1\"\n",
        );
        let inv = EHandle::invalid();

        w.accept_input(h, "Add", inv, inv, Variant::Float(5.0), 0);
        assert_eq!(value_of(&w, h), 3.0);
        assert_eq!(w.queue.len(), 1); // OnHitMax only; OutValue is unwired

        // Still at max: the edge does not re-fire.
        w.accept_input(h, "Add", inv, inv, Variant::Float(1.0), 0);
        assert_eq!(w.queue.len(), 1);

        // Leaving and re-reaching max fires it again.
        w.accept_input(h, "Subtract", inv, inv, Variant::Float(2.0), 0);
        w.accept_input(h, "Add", inv, inv, Variant::Float(9.0), 0);
        assert_eq!(w.queue.len(), 2);
    }

    #[test]
    fn test_set_value_no_fire_is_silent() {
        let mut w = world();
        let h = counter(&mut w, "\"OutValue\" \"display,SetText,,0,-1\"\n");
        let inv = EHandle::invalid();
        w.accept_input(h, "SetValueNoFire", inv, inv, Variant::Float(7.0), 0);
        assert_eq!(value_of(&w, h), 7.0);
        assert!(w.queue.is_empty());

        w.accept_input(h, "GetValue", inv, inv, Variant::Void, 0);
        assert_eq!(w.queue.pending()[0].param, Variant::Float(7.0));
    }

    #[test]
    fn test_start_value_key() {
        let mut w = world();
        let h = counter(&mut w, "\"startvalue\" \"10\"\n");
        assert_eq!(value_of(&w, h), 10.0);
    }
}
