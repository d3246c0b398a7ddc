//! Entity creation and hierarchical batch spawning
//!
//! Creation is keyvalue-driven: a parsed block names a class, the class
//! factory builds the entity, and each pair is routed either to keyvalue
//! application or, when the key names a declared output, to connection
//! parsing. Batch spawning orders entities parents-before-children so a
//! child's parent link resolves to an already-spawned entity, and removes
//! the descendants of anything whose `Spawn()` fails.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::entity::handle::EHandle;
use crate::entity::apply_key_value;
use crate::error::SpawnError;
use crate::keyvalues::KeyValues;
use crate::world::World;

/// Classes that must spawn before everything else at equal hierarchy depth
const SPAWN_PRIORITY: &[&str] = &["phys_constraintsystem", "phys_constraint"];

/// Build an entity from a parsed keyvalue block and insert it
///
/// Keys naming a declared output of the class become connections; all other
/// keys go through normal keyvalue application. The entity is in the table
/// afterwards but has not spawned.
pub fn create_entity_from_block(
    world: &mut World,
    kv: &KeyValues,
    map_data_index: Option<usize>,
) -> Result<EHandle, SpawnError> {
    let classname = kv.classname().ok_or(SpawnError::MissingClassname)?;
    let mut ent = world
        .classes
        .create(classname)
        .ok_or_else(|| SpawnError::UnknownClass(classname.to_string()))?;

    ent.base_mut().classname = crate::strings::intern(classname);
    ent.base_mut().map_data_index = map_data_index;

    for (key, value) in &kv.pairs {
        if key == "classname" {
            continue;
        }
        if world.classes.has_output(classname, key) {
            let owner = ent.base().debug_name();
            match ent.output_mut(key) {
                Some(output) => {
                    output.parse_and_add(value, &owner);
                }
                None => warn!("{owner}: class declares output {key:?} but has no slot for it"),
            }
        } else if !apply_key_value(&mut *ent, key, value) {
            debug!("{}: unhandled key {key:?}", ent.base().debug_name());
        }
    }

    world
        .insert_entity(ent)
        .ok_or_else(|| SpawnError::SpawnFailed {
            classname: classname.to_string(),
            reason: "entity table full".to_string(),
        })
}

struct SpawnEntry {
    handle: EHandle,
    name: String,
    parent_name: String,
    depth: usize,
    priority: usize,
}

/// Spawn a freshly-created batch in hierarchy order
///
/// Depth comes from walking in-batch `parentname` chains; the sort is
/// stable, depth first, then the fixed priority table. Parent links resolve
/// just before each child spawns, so only already-spawned entities are
/// eligible. A failed `Spawn()` removes the entity and every in-batch
/// descendant that named it. Returns the surviving handles in spawn order;
/// with `activate` set, `Activate()` runs on the survivors in that order.
pub fn spawn_hierarchical_list(
    world: &mut World,
    handles: &[EHandle],
    activate: bool,
) -> Vec<EHandle> {
    let mut entries = collect_entries(world, handles);
    compute_depths(&mut entries);
    entries.sort_by_key(|e| (e.depth, e.priority));

    let mut failed_names: HashSet<String> = HashSet::new();
    let mut survivors = Vec::with_capacity(entries.len());

    for entry in &entries {
        let Some(arc) = world.entities.get(entry.handle) else {
            continue;
        };

        let parent_segment = entry.parent_name.split(',').next().unwrap_or("");
        if !parent_segment.is_empty() && failed_names.contains(parent_segment) {
            warn!(
                "removing {:?}: parent {parent_segment:?} failed to spawn",
                entry.name
            );
            world.remove_entity(entry.handle);
            if !entry.name.is_empty() {
                failed_names.insert(entry.name.clone());
            }
            continue;
        }

        let mut guard = arc.write();
        if !parent_segment.is_empty() {
            // Only already-spawned entities are visible here; a forward
            // reference to an unspawned sibling means bad depth data.
            let inv = EHandle::invalid();
            match world.entities.find_by_name(None, parent_segment, inv, inv) {
                Some(parent) if parent != entry.handle => guard.base_mut().parent = parent,
                _ => warn!(
                    "{}: could not resolve parent {parent_segment:?}",
                    guard.base().debug_name()
                ),
            }
        }

        match guard.spawn(world) {
            Ok(()) => survivors.push(entry.handle),
            Err(e) => {
                warn!("{}: {e}", guard.base().debug_name());
                drop(guard);
                world.remove_entity(entry.handle);
                if !entry.name.is_empty() {
                    failed_names.insert(entry.name.clone());
                }
            }
        }
    }

    if activate {
        for &handle in &survivors {
            if let Some(arc) = world.entities.get(handle) {
                arc.write().activate(world);
            }
        }
    }

    survivors
}

fn collect_entries(world: &World, handles: &[EHandle]) -> Vec<SpawnEntry> {
    let mut entries = Vec::with_capacity(handles.len());
    for &handle in handles {
        let Some(arc) = world.entities.get(handle) else {
            continue;
        };
        let Some(guard) = arc.try_read() else {
            continue;
        };
        let base = guard.base();
        let priority = SPAWN_PRIORITY
            .iter()
            .position(|c| base.classname == *c)
            .unwrap_or(SPAWN_PRIORITY.len());
        entries.push(SpawnEntry {
            handle,
            name: base.name.to_string(),
            parent_name: base.parent_name.to_string(),
            depth: 0,
            priority,
        });
    }
    entries
}

/// Walk in-batch parentname chains to assign each entry its depth
fn compute_depths(entries: &mut [SpawnEntry]) {
    let by_name: HashMap<String, usize> = entries
        .iter()
        .enumerate()
        .rev() // first occurrence of a duplicate name wins
        .filter(|(_, e)| !e.name.is_empty())
        .map(|(i, e)| (e.name.clone(), i))
        .collect();

    let parent_idx: Vec<Option<usize>> = entries
        .iter()
        .map(|e| {
            let segment = e.parent_name.split(',').next().unwrap_or("");
            (!segment.is_empty())
                .then(|| by_name.get(segment).copied())
                .flatten()
        })
        .collect();

    for i in 0..entries.len() {
        let mut depth = 0usize;
        let mut cursor = i;
        while let Some(parent) = parent_idx[cursor] {
            depth += 1;
            if parent == i || depth > entries.len() {
                warn!(
                    "{:?}: cyclic parent chain, truncating at depth {depth}",
                    entries[i].name
                );
                break;
            }
            cursor = parent;
        }
        entries[i].depth = depth;
    }
}
