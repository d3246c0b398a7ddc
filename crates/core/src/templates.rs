//! Captured entity templates and name fixup
//!
//! A template is the raw keyvalue text an entity spawned from, captured so
//! the entity can be re-instantiated later. When a group of templates
//! wires to each other by name, each member's name and every reference to
//! it get a reserved `&0000` placeholder appended; instantiation replaces
//! the placeholder with a 4-digit instance counter, so separate instances
//! of the group never cross-wire.
//!
//! The counter is global: it bumps every time *any* group starts
//! instancing, which keeps names unique across groups too.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SaveError;
use crate::io::action::IO_STRING_DELIMITER;
use crate::keyvalues::parse_block;
use crate::strings::{intern, PooledString};

/// Reserved fixup marker appended to in-group names and references
pub const FIXUP_PLACEHOLDER: &str = "&0000";

/// Save format version for the template table blob
pub const TEMPLATE_SAVE_VERSION: u32 = 1;

/// One captured entity block
pub struct Template {
    /// The entity's original targetname at capture time
    pub name: PooledString,
    text: String,
    needs_fixup: bool,
    /// Fixed-up text cached for one instance-counter value
    cached: Option<(u32, String)>,
}

/// The process-wide template table
#[derive(Default)]
pub struct TemplateDb {
    templates: Vec<Template>,
    instance_counter: u32,
}

impl TemplateDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Capture a block of entity text; returns the template's index
    pub fn add(&mut self, name: &str, text: &str) -> usize {
        debug!("captured template {name:?} ({} bytes)", text.len());
        self.templates.push(Template {
            name: intern(name),
            text: text.to_string(),
            needs_fixup: false,
            cached: None,
        });
        self.templates.len() - 1
    }

    pub fn name_of(&self, index: usize) -> Option<&PooledString> {
        self.templates.get(index).map(|t| &t.name)
    }

    /// Raw captured text, before any fixup
    pub fn text_of(&self, index: usize) -> Option<&str> {
        self.templates.get(index).map(|t| t.text.as_str())
    }

    pub fn needs_fixup(&self, index: usize) -> bool {
        self.templates.get(index).is_some_and(|t| t.needs_fixup)
    }

    /// Tag cross-references within a captured group
    ///
    /// Scans every member's keyvalues (and the target/parameter fields of
    /// connection values) for the original names of other members. Each
    /// match marks both sides as needing fixup, appends the placeholder to
    /// the referencing value, and appends it to the referenced member's
    /// own targetname.
    pub fn reconnect_io_for_group(&mut self, group: &[usize]) {
        let names: Vec<(usize, String)> = group
            .iter()
            .filter_map(|&i| {
                let t = self.templates.get(i)?;
                (!t.name.is_empty()).then(|| (i, t.name.to_string()))
            })
            .collect();
        if names.is_empty() {
            return;
        }

        let mut referenced: Vec<usize> = Vec::new();

        for &index in group {
            let Some(template) = self.templates.get(index) else {
                warn!("template group names missing index {index}");
                continue;
            };
            let Ok(mut kv) = parse_block(&template.text) else {
                warn!("template {:?} has unparsable text", template.name);
                continue;
            };

            let mut changed = false;
            for (key, value) in kv.pairs.iter_mut() {
                if key == "classname" || key == "targetname" {
                    continue;
                }
                if rewrite_value(value, &names, &mut referenced) {
                    changed = true;
                }
            }

            if changed {
                let t = &mut self.templates[index];
                t.text = kv.to_text();
                t.needs_fixup = true;
                t.cached = None;
            }
        }

        for index in referenced {
            self.fixup_targetname(index);
        }
    }

    /// Uniquify a group for instancing
    ///
    /// With `preserve_names` set, members keep their original names
    /// verbatim and no fixup happens at all; simultaneous instances will
    /// share names, which is the designer's stated intent. Otherwise the
    /// cross-reference scan runs and every named member is uniquified,
    /// referenced by I/O or not.
    pub fn uniquify_group(&mut self, group: &[usize], preserve_names: bool) {
        if preserve_names {
            return;
        }
        self.reconnect_io_for_group(group);
        for &index in group {
            self.fixup_targetname(index);
        }
    }

    /// Begin a new instance of some group; bumps the global counter
    pub fn start_unique_instance(&mut self) -> u32 {
        self.instance_counter = self.instance_counter.wrapping_add(1);
        self.instance_counter
    }

    pub fn current_instance(&self) -> u32 {
        self.instance_counter
    }

    /// Captured text with the placeholder substituted for the current
    /// instance counter; cached per counter value
    pub fn fixed_text(&mut self, index: usize) -> Option<String> {
        let counter = self.instance_counter;
        let template = self.templates.get_mut(index)?;
        if !template.needs_fixup {
            return Some(template.text.clone());
        }
        if let Some((cached_counter, text)) = &template.cached {
            if *cached_counter == counter {
                return Some(text.clone());
            }
        }
        let suffix = format!("&{:04}", counter % 10000);
        let text = template.text.replace(FIXUP_PLACEHOLDER, &suffix);
        template.cached = Some((counter, text.clone()));
        Some(text)
    }

    /// Drop everything; level unload
    pub fn clear(&mut self) {
        self.templates.clear();
        self.instance_counter = 0;
    }

    /// Snapshot for a save game
    pub fn save_state(&self) -> SavedTemplates {
        SavedTemplates {
            version: TEMPLATE_SAVE_VERSION,
            instance_counter: self.instance_counter,
            templates: self
                .templates
                .iter()
                .map(|t| SavedTemplate {
                    name: t.name.to_string(),
                    text: t.text.clone(),
                    needs_fixup: t.needs_fixup,
                })
                .collect(),
        }
    }

    /// Replace the table contents from a save game
    pub fn restore_state(&mut self, saved: SavedTemplates) -> Result<usize, SaveError> {
        if saved.version != TEMPLATE_SAVE_VERSION {
            return Err(SaveError::VersionMismatch {
                expected: TEMPLATE_SAVE_VERSION,
                found: saved.version,
            });
        }
        self.instance_counter = saved.instance_counter;
        self.templates = saved
            .templates
            .into_iter()
            .map(|t| Template {
                name: intern(&t.name),
                text: t.text,
                needs_fixup: t.needs_fixup,
                cached: None,
            })
            .collect();
        Ok(self.templates.len())
    }

    fn fixup_targetname(&mut self, index: usize) {
        let Some(template) = self.templates.get_mut(index) else {
            return;
        };
        let Ok(mut kv) = parse_block(&template.text) else {
            return;
        };
        let mut changed = false;
        for (key, value) in kv.pairs.iter_mut() {
            if key == "targetname" && !value.is_empty() && !value.ends_with(FIXUP_PLACEHOLDER) {
                value.push_str(FIXUP_PLACEHOLDER);
                changed = true;
            }
        }
        if changed {
            template.text = kv.to_text();
            template.needs_fixup = true;
            template.cached = None;
        }
    }
}

/// Rewrite in-group name references inside one keyvalue
///
/// Connection values check their target field and parameter field; plain
/// values check the whole string. Returns true if anything was rewritten.
fn rewrite_value(
    value: &mut String,
    names: &[(usize, String)],
    referenced: &mut Vec<usize>,
) -> bool {
    let matches_group = |field: &str| -> Option<usize> {
        names
            .iter()
            .find(|(_, name)| name == field)
            .map(|(idx, _)| *idx)
    };

    let delim = if value.contains(IO_STRING_DELIMITER) {
        Some(IO_STRING_DELIMITER)
    } else if value.matches(',').count() >= 3 {
        Some(',')
    } else {
        None
    };

    match delim {
        Some(d) => {
            let mut fields: Vec<String> = value.split(d).map(str::to_string).collect();
            let mut changed = false;
            // Field 0 is the connection target, field 2 the parameter.
            for &fi in &[0usize, 2] {
                if let Some(field) = fields.get_mut(fi) {
                    if let Some(idx) = matches_group(field) {
                        if !field.ends_with(FIXUP_PLACEHOLDER) {
                            field.push_str(FIXUP_PLACEHOLDER);
                        }
                        if !referenced.contains(&idx) {
                            referenced.push(idx);
                        }
                        changed = true;
                    }
                }
            }
            if changed {
                *value = fields.join(&d.to_string());
            }
            changed
        }
        None => {
            if let Some(idx) = matches_group(value) {
                if !value.ends_with(FIXUP_PLACEHOLDER) {
                    value.push_str(FIXUP_PLACEHOLDER);
                }
                if !referenced.contains(&idx) {
                    referenced.push(idx);
                }
                true
            } else {
                false
            }
        }
    }
}

/// Serializable template table snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTemplates {
    pub version: u32,
    pub instance_counter: u32,
    pub templates: Vec<SavedTemplate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTemplate {
    pub name: String,
    pub text: String,
    pub needs_fixup: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gib_group(db: &mut TemplateDb) -> Vec<usize> {
        let a = db.add(
            "gib_a",
            "{\n\"classname\" \"prop_gib\"\n\"targetname\" \"gib_a\"\n}\n",
        );
        let b = db.add(
            "gib_b",
            "{\n\"classname\" \"prop_gib\"\n\"targetname\" \"gib_b\"\n\"OnBreak\" \"gib_a\x1bIgnite\x1b\x1b0\x1b-1\"\n}\n",
        );
        vec![a, b]
    }

    #[test]
    fn test_cross_reference_marks_both_sides() {
        let mut db = TemplateDb::new();
        let group = gib_group(&mut db);
        db.reconnect_io_for_group(&group);

        assert!(db.needs_fixup(group[0]));
        assert!(db.needs_fixup(group[1]));
        assert!(db.text_of(group[0]).unwrap().contains("gib_a&0000"));
        assert!(db
            .text_of(group[1])
            .unwrap()
            .contains("gib_a&0000\x1bIgnite"));
    }

    #[test]
    fn test_unreferenced_member_untouched_by_reconnect() {
        let mut db = TemplateDb::new();
        let mut group = gib_group(&mut db);
        let c = db.add(
            "gib_c",
            "{\n\"classname\" \"prop_gib\"\n\"targetname\" \"gib_c\"\n}\n",
        );
        group.push(c);
        db.reconnect_io_for_group(&group);

        assert!(!db.needs_fixup(c));
        assert!(!db.text_of(c).unwrap().contains(FIXUP_PLACEHOLDER));
    }

    #[test]
    fn test_uniquify_group_covers_unreferenced_members() {
        let mut db = TemplateDb::new();
        let c = db.add(
            "gib_c",
            "{\n\"classname\" \"prop_gib\"\n\"targetname\" \"gib_c\"\n}\n",
        );
        db.uniquify_group(&[c], false);
        assert!(db.needs_fixup(c));

        db.start_unique_instance();
        let text = db.fixed_text(c).unwrap();
        assert!(text.contains("gib_c&0001"));
    }

    #[test]
    fn test_preserve_names_skips_fixup() {
        let mut db = TemplateDb::new();
        let group = gib_group(&mut db);
        db.uniquify_group(&group, true);
        assert!(!db.needs_fixup(group[0]));
        assert!(!db.needs_fixup(group[1]));
    }

    #[test]
    fn test_instances_get_distinct_suffixes() {
        let mut db = TemplateDb::new();
        let group = gib_group(&mut db);
        db.uniquify_group(&group, false);

        db.start_unique_instance();
        let first = db.fixed_text(group[1]).unwrap();
        db.start_unique_instance();
        let second = db.fixed_text(group[1]).unwrap();

        assert!(first.contains("gib_a&0001"));
        assert!(second.contains("gib_a&0002"));
        // The captured blob itself is untouched.
        assert!(db.text_of(group[1]).unwrap().contains("gib_a&0000"));
    }

    #[test]
    fn test_parameter_field_fixup() {
        let mut db = TemplateDb::new();
        let a = db.add(
            "anchor",
            "{\n\"classname\" \"info_target\"\n\"targetname\" \"anchor\"\n}\n",
        );
        let b = db.add(
            "mover",
            "{\n\"classname\" \"logic_relay\"\n\"targetname\" \"mover\"\n\"OnTrigger\" \"mover\x1bSetParent\x1banchor\x1b0\x1b-1\"\n}\n",
        );
        db.reconnect_io_for_group(&[a, b]);
        assert!(db.text_of(b).unwrap().contains("\x1banchor&0000\x1b"));
    }

    #[test]
    fn test_save_restore_round_trip() {
        let mut db = TemplateDb::new();
        let group = gib_group(&mut db);
        db.uniquify_group(&group, false);
        db.start_unique_instance();

        let saved = db.save_state();
        let json = serde_json::to_string(&saved).unwrap();
        let back: SavedTemplates = serde_json::from_str(&json).unwrap();

        let mut db2 = TemplateDb::new();
        assert_eq!(db2.restore_state(back).unwrap(), 2);
        assert_eq!(db2.current_instance(), 1);
        assert!(db2.needs_fixup(group[1]));
        assert_eq!(db2.text_of(group[0]), db.text_of(group[0]));
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut db = TemplateDb::new();
        let saved = SavedTemplates {
            version: 0,
            instance_counter: 5,
            templates: vec![],
        };
        assert!(matches!(
            db.restore_state(saved),
            Err(SaveError::VersionMismatch { .. })
        ));
    }
}
