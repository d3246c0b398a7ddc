//! `logic_auto`: fires once when the map's entities have activated

use std::any::Any;

use bitflags::bitflags;

use srcio_core::{BaseEntityData, ClassRegistry, Entity, EntityOutput, World};

bitflags! {
    /// `logic_auto` spawnflags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AutoFlags: u32 {
        /// Remove the entity after firing
        const REMOVE_ON_FIRE = 1;
    }
}

#[derive(Default)]
pub struct LogicAuto {
    base: BaseEntityData,
    on_map_spawn: EntityOutput,
}

impl Entity for LogicAuto {
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
            "OnMapSpawn" => Some(&mut self.on_map_spawn),
            _ => self.base.output_mut(name),
        }
    }

    fn activate(&mut self, world: &mut World) {
        let handle = self.base.handle;
        self.on_map_spawn.fire_event(world, handle, handle);
        if AutoFlags::from_bits_truncate(self.base.spawnflags).contains(AutoFlags::REMOVE_ON_FIRE)
        {
            world.remove_entity(handle);
        }
    }
}

pub fn register(classes: &mut ClassRegistry) {
    classes.register(
        "logic_auto",
        || Box::new(LogicAuto::default()) as Box<dyn Entity>,
        &[],
        &["OnMapSpawn"],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_on_map_spawn_at_activate() {
        let mut w = World::new();
        register(&mut w.classes);
        let loaded = w
            .load_entities(
                "{\n\"classname\" \"logic_auto\"\n\"OnMapSpawn\" \"music,Play,,0,1\"\n}",
            )
            .unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(w.queue.len(), 1);
        assert_eq!(w.queue.pending()[0].input, "Play");
    }

    #[test]
    fn test_remove_on_fire() {
        let mut w = World::new();
        register(&mut w.classes);
        let loaded = w
            .load_entities(
                "{\n\"classname\" \"logic_auto\"\n\"spawnflags\" \"1\"\n\"OnMapSpawn\" \"music,Play,,0,1\"\n}",
            )
            .unwrap();
        assert!(!w.entities.is_alive(loaded[0]));
        // The scheduled event survives its caller.
        assert_eq!(w.queue.pending()[0].input, "Play");
    }
}
