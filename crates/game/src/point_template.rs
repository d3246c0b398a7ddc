//! `point_template`: captures entities at activate, re-spawns them on demand
//!
//! At activate time the named build-set entities have their original map
//! text captured into the world's template table, their transforms recorded
//! relative to this entity, and (by default) the originals destroyed.
//! `ForceSpawn` instantiates the captured group with fixed-up names, so two
//! instances of a wired group never cross-talk.

use std::any::Any;

use bitflags::bitflags;
use tracing::warn;

use srcio_core::spawn::{create_entity_from_block, spawn_hierarchical_list};
use srcio_core::{
    parse_block, BaseEntityData, ClassRegistry, Entity, EntityOutput, FieldType, InputData,
    InputDef, QAngle, Variant, Vector3, World,
};

/// Number of `TemplateNN` keyvalue slots
pub const MAX_TEMPLATES: usize = 16;

bitflags! {
    /// `point_template` spawnflags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TemplateFlags: u32 {
        /// Leave the original build-set entities in the world
        const DONT_REMOVE_ORIGINALS = 1;
        /// Skip name fixup entirely; instances keep their authored names
        const PRESERVE_NAMES = 2;
    }
}

/// Transform of one captured member, relative to the template entity
struct MemberTransform {
    offset: Vector3,
    angles: QAngle,
}

#[derive(Default)]
pub struct PointTemplate {
    base: BaseEntityData,
    /// Targetnames from the `Template01..Template16` keys, in slot order
    template_names: Vec<String>,
    /// Indices into the world's template table, filled at activate
    template_indices: Vec<usize>,
    transforms: Vec<MemberTransform>,
    on_entity_spawned: EntityOutput,
}

impl PointTemplate {
    fn flags(&self) -> TemplateFlags {
        TemplateFlags::from_bits_truncate(self.base.spawnflags)
    }
}

impl Entity for PointTemplate {
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
        let Some(digits) = key.strip_prefix("Template") else {
            return false;
        };
        let Ok(slot) = digits.parse::<usize>() else {
            return false;
        };
        if !(1..=MAX_TEMPLATES).contains(&slot) || value.is_empty() {
            warn!(
                "{}: ignoring template key {key:?}",
                self.base.debug_name()
            );
            return true;
        }
        self.template_names.push(value.to_string());
        true
    }

    fn output_mut(&mut self, name: &str) -> Option<&mut EntityOutput> {
        match name {
            "OnEntitySpawned" => Some(&mut self.on_entity_spawned),
            _ => self.base.output_mut(name),
        }
    }

    /// Capture the build set
    ///
    /// Runs at activate so every named entity has spawned. The captured
    /// originals stop resolving by name from here on unless the
    /// dont-remove spawnflag keeps them.
    fn activate(&mut self, world: &mut World) {
        let inv = srcio_core::EHandle::invalid();
        let remove = !self.flags().contains(TemplateFlags::DONT_REMOVE_ORIGINALS);

        for name in &self.template_names {
            let matches = world.entities.collect_by_name(name, inv, inv);
            if matches.is_empty() {
                warn!(
                    "{}: no entity named {name:?} to capture",
                    self.base.debug_name()
                );
                continue;
            }
            for handle in matches {
                let Some(arc) = world.entities.get(handle) else {
                    continue;
                };
                let (origin, angles, map_index) = {
                    let guard = arc.read();
                    let base = guard.base();
                    (base.origin, base.angles, base.map_data_index)
                };
                let Some(map_index) = map_index else {
                    warn!(
                        "{}: {name:?} has no captured map text, skipping",
                        self.base.debug_name()
                    );
                    continue;
                };
                let Some(text) = world.map_data.get(map_index).cloned() else {
                    warn!(
                        "{}: {name:?} points at missing map text, skipping",
                        self.base.debug_name()
                    );
                    continue;
                };
                self.template_indices.push(world.templates.add(name, &text));
                self.transforms.push(MemberTransform {
                    offset: origin - self.base.origin,
                    angles,
                });
                if remove {
                    world.remove_entity(handle);
                }
            }
        }

        if self.template_indices.is_empty() {
            warn!("{}: empty template group", self.base.debug_name());
            return;
        }
        let preserve = self.flags().contains(TemplateFlags::PRESERVE_NAMES);
        world
            .templates
            .uniquify_group(&self.template_indices, preserve);
    }
}

fn input_force_spawn(ent: &mut dyn Entity, world: &mut World, _data: &InputData) {
    let Some(pt) = ent.as_any_mut().downcast_mut::<PointTemplate>() else {
        return;
    };
    if pt.template_indices.is_empty() {
        warn!("{}: ForceSpawn with no templates", pt.base.debug_name());
        return;
    }

    world.templates.start_unique_instance();

    let mut created = Vec::with_capacity(pt.template_indices.len());
    for (slot, &index) in pt.template_indices.iter().enumerate() {
        let Some(text) = world.templates.fixed_text(index) else {
            continue;
        };
        let kv = match parse_block(&text) {
            Ok(kv) => kv,
            Err(e) => {
                warn!("{}: captured text failed to parse: {e}", pt.base.debug_name());
                continue;
            }
        };
        match create_entity_from_block(world, &kv, None) {
            Ok(handle) => {
                // Compose the stored member transform with our own.
                if let Some(arc) = world.entities.get(handle) {
                    let mut guard = arc.write();
                    let member = &pt.transforms[slot];
                    guard.base_mut().origin =
                        pt.base.origin + pt.base.angles.rotate(member.offset);
                    guard.base_mut().angles = member.angles + pt.base.angles;
                }
                created.push(handle);
            }
            Err(e) => warn!("{}: instance failed: {e}", pt.base.debug_name()),
        }
    }

    let spawned = spawn_hierarchical_list(world, &created, true);
    let caller = pt.base.handle;
    for handle in spawned {
        pt.on_entity_spawned
            .fire(world, Variant::Void, handle, caller, 0.0);
    }
}

const INPUTS: &[InputDef] = &[InputDef {
    name: "ForceSpawn",
    ty: FieldType::Void,
    func: input_force_spawn,
}];

pub fn register(classes: &mut ClassRegistry) {
    classes.register(
        "point_template",
        || Box::new(PointTemplate::default()) as Box<dyn Entity>,
        &[INPUTS],
        &["OnEntitySpawned"],
    );
}
