//! Level state save and restore
//!
//! One JSON envelope holds the simulation clock, the event queue, and the
//! template table, each sub-blob carrying its own small-integer version.
//! A version mismatch anywhere rejects the whole blob rather than risking
//! a misread; entity state itself is the host's problem and is not part of
//! this envelope.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SaveError;
use crate::io::queue::SavedEventQueue;
use crate::templates::SavedTemplates;
use crate::world::World;

/// Version of the outer envelope
pub const LEVEL_SAVE_VERSION: u32 = 1;

/// The serialized level state envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelSaveState {
    pub version: u32,
    pub cur_time: f32,
    pub queue: SavedEventQueue,
    pub templates: SavedTemplates,
}

/// Serialize the world's I/O state to a blob
pub fn save_level_state(world: &World) -> Result<Vec<u8>, SaveError> {
    let state = LevelSaveState {
        version: LEVEL_SAVE_VERSION,
        cur_time: world.cur_time(),
        queue: world.queue.save_state(),
        templates: world.templates.save_state(),
    };
    let blob = serde_json::to_vec(&state)?;
    debug!(
        "saved level state: {} queued events, {} templates, {} bytes",
        state.queue.events.len(),
        state.templates.templates.len(),
        blob.len()
    );
    Ok(blob)
}

/// Restore the world's I/O state from a blob; returns the number of
/// queued events restored
///
/// Restored entries whose fire time already elapsed deliver on the next
/// pump, in their saved order.
pub fn restore_level_state(world: &mut World, blob: &[u8]) -> Result<usize, SaveError> {
    let state: LevelSaveState = serde_json::from_slice(blob)?;
    if state.version != LEVEL_SAVE_VERSION {
        warn!(
            "refusing level save blob: version {} (expected {})",
            state.version, LEVEL_SAVE_VERSION
        );
        return Err(SaveError::VersionMismatch {
            expected: LEVEL_SAVE_VERSION,
            found: state.version,
        });
    }

    world.set_time(state.cur_time);
    let count = world.queue.restore_state(state.queue)?;
    world.templates.restore_state(state.templates)?;
    debug!("restored level state: {count} queued events");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EHandle;
    use crate::io::queue::{EventTarget, QueuedEvent};
    use crate::strings::intern;
    use crate::variant::Variant;

    fn queued(name: &str, fire_time: f32) -> QueuedEvent {
        QueuedEvent {
            target: EventTarget::Name(intern(name)),
            input: intern("Trigger"),
            param: Variant::Void,
            activator: EHandle::invalid(),
            caller: EHandle::invalid(),
            fire_time,
            action_id: 0,
        }
    }

    #[test]
    fn test_round_trip_preserves_clock_queue_and_templates() {
        let mut w = World::new();
        w.tick(3.0);
        w.queue.add(queued("door", 5.0));
        w.queue.add(queued("light", 4.0));
        let t = w.templates.add("gib", "{\n\"classname\" \"gib\"\n}\n");
        w.templates.start_unique_instance();

        let blob = save_level_state(&w).unwrap();

        let mut w2 = World::new();
        assert_eq!(restore_level_state(&mut w2, &blob).unwrap(), 2);
        assert_eq!(w2.cur_time(), 3.0);
        assert_eq!(w2.queue.len(), 2);
        assert_eq!(w2.queue.pending()[0].fire_time, 4.0);
        assert_eq!(w2.templates.current_instance(), 1);
        assert_eq!(w2.templates.text_of(t), w.templates.text_of(t));
    }

    #[test]
    fn test_envelope_version_skew_rejected() {
        let w = World::new();
        let blob = save_level_state(&w).unwrap();
        let mut tampered: LevelSaveState = serde_json::from_slice(&blob).unwrap();
        tampered.version = 2;
        let blob = serde_json::to_vec(&tampered).unwrap();

        let mut w2 = World::new();
        assert!(matches!(
            restore_level_state(&mut w2, &blob),
            Err(SaveError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_garbage_blob_is_codec_error() {
        let mut w = World::new();
        assert!(matches!(
            restore_level_state(&mut w, b"not json"),
            Err(SaveError::Codec(_))
        ));
    }
}
