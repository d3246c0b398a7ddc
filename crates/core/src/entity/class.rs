//! Entity class registry and composed input tables
//!
//! Each class registers a factory, its own input table chain (leaf first,
//! then declared ancestors), and its output names. The chain plus the
//! universal base table is flattened once, at registration, into a single
//! lookup map; there is no per-call table walking, and a leaf input
//! shadows a base input with the same name.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::entity::base::{BASE_INPUTS, BASE_OUTPUTS};
use crate::entity::Entity;
use crate::io::dispatch::InputData;
use crate::variant::FieldType;
use crate::world::World;

/// Input handler signature
///
/// The entity arrives already write-locked; the world is free for lookups,
/// output fires, and entity creation/removal. Handlers must not re-enter
/// `accept_input` on the entity they were invoked on; its lock is held.
pub type InputFunc = fn(&mut dyn Entity, &mut World, &InputData);

/// One declared input: name, expected parameter type, handler
#[derive(Clone, Copy)]
pub struct InputDef {
    pub name: &'static str,
    pub ty: FieldType,
    pub func: InputFunc,
}

/// A registered entity class
pub struct EntityClass {
    pub classname: &'static str,
    factory: Box<dyn Fn() -> Box<dyn Entity> + Send + Sync>,
    /// Flattened input lookup, exact-match on name
    inputs: HashMap<&'static str, (FieldType, InputFunc)>,
    /// Declared output names, base user outputs included
    outputs: Vec<&'static str>,
}

/// Classname-keyed registry of everything spawnable
#[derive(Default)]
pub struct ClassRegistry {
    classes: HashMap<&'static str, EntityClass>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class
    ///
    /// `input_chain` lists input tables leaf-first; ancestors follow. The
    /// universal base table is appended automatically. First entry for a
    /// given name wins, which is what makes subclass inputs shadow base
    /// inputs.
    pub fn register<F>(
        &mut self,
        classname: &'static str,
        factory: F,
        input_chain: &[&[InputDef]],
        outputs: &[&'static str],
    ) where
        F: Fn() -> Box<dyn Entity> + Send + Sync + 'static,
    {
        let mut inputs = HashMap::new();
        for table in input_chain.iter().copied().chain([BASE_INPUTS]) {
            for def in table {
                inputs.entry(def.name).or_insert((def.ty, def.func));
            }
        }

        let mut out: Vec<&'static str> = outputs.to_vec();
        for name in BASE_OUTPUTS {
            if !out.contains(name) {
                out.push(name);
            }
        }

        if self
            .classes
            .insert(
                classname,
                EntityClass {
                    classname,
                    factory: Box::new(factory),
                    inputs,
                    outputs: out,
                },
            )
            .is_some()
        {
            warn!("entity class {classname:?} registered twice, replacing");
        } else {
            debug!("registered entity class {classname:?}");
        }
    }

    pub fn is_registered(&self, classname: &str) -> bool {
        self.classes.contains_key(classname)
    }

    /// Instantiate a class; `None` for unknown classnames
    pub fn create(&self, classname: &str) -> Option<Box<dyn Entity>> {
        self.classes.get(classname).map(|c| (c.factory)())
    }

    /// Resolve an input name against a class's flattened table
    pub fn lookup_input(&self, classname: &str, input: &str) -> Option<(FieldType, InputFunc)> {
        self.classes
            .get(classname)
            .and_then(|c| c.inputs.get(input).copied())
    }

    /// True if the class declares an output by this name; drives the
    /// keyvalue-vs-connection split when entity blocks are parsed
    pub fn has_output(&self, classname: &str, name: &str) -> bool {
        self.classes
            .get(classname)
            .is_some_and(|c| c.outputs.contains(&name))
    }

    /// Declared output names for a class
    pub fn outputs(&self, classname: &str) -> &[&'static str] {
        self.classes
            .get(classname)
            .map(|c| c.outputs.as_slice())
            .unwrap_or(&[])
    }
}
