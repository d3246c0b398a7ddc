//! The global deferred event queue
//!
//! A single process-wide ordered list of in-flight firings. Entries are
//! kept sorted by fire time, FIFO among equal times, and nothing ever
//! reorders them by priority. The world pumps the queue once per tick;
//! the queue itself only stores, orders, cancels, and serializes.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::entity::EHandle;
use crate::error::SaveError;
use crate::strings::PooledString;
use crate::variant::Variant;

/// Save format version for the queue blob
pub const EVENT_QUEUE_SAVE_VERSION: u32 = 1;

/// Where a queued event is going
///
/// Names re-resolve at delivery time: a late-spawned entity still receives
/// a delayed event fired before it existed, and a renamed one silently
/// stops. Handles carry identity and drop silently once stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventTarget {
    Name(PooledString),
    Handle(EHandle),
}

/// One materialized, in-flight firing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedEvent {
    pub target: EventTarget,
    pub input: PooledString,
    pub param: Variant,
    pub activator: EHandle,
    pub caller: EHandle,
    /// Absolute simulation time to deliver at
    pub fire_time: f32,
    /// Id of the originating EventAction, for cancellation
    pub action_id: i32,
}

/// Ordered list of pending deliveries
#[derive(Default)]
pub struct EventQueue {
    events: Vec<QueuedEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert in fire-time order; equal times keep insertion order
    pub fn add(&mut self, event: QueuedEvent) {
        trace!(
            "queueing {:?} -> {:?} at t={}",
            event.target,
            event.input,
            event.fire_time
        );
        let pos = self
            .events
            .partition_point(|e| e.fire_time <= event.fire_time);
        self.events.insert(pos, event);
    }

    /// Take the earliest entry whose fire time has arrived
    pub fn pop_ready(&mut self, now: f32) -> Option<QueuedEvent> {
        if self.events.first()?.fire_time <= now {
            Some(self.events.remove(0))
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Peek at the pending entries, earliest first
    pub fn pending(&self) -> &[QueuedEvent] {
        &self.events
    }

    /// Remove every pending entry matching `pred`; returns how many
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&QueuedEvent) -> bool) -> usize {
        let before = self.events.len();
        self.events.retain(|e| !pred(e));
        let removed = before - self.events.len();
        if removed > 0 {
            debug!("cancelled {removed} pending events");
        }
        removed
    }

    /// Cancel everything scheduled by one EventAction
    pub fn cancel_by_action_id(&mut self, id: i32) -> usize {
        self.cancel_where(|e| e.action_id == id)
    }

    /// Cancel everything fired by one entity (`CancelPending` semantics)
    pub fn cancel_by_caller(&mut self, caller: EHandle) -> usize {
        self.cancel_where(|e| e.caller == caller)
    }

    /// Cancel everything addressed to one exact target name
    pub fn cancel_by_target_name(&mut self, name: &str) -> usize {
        self.cancel_where(|e| matches!(&e.target, EventTarget::Name(n) if *n == *name))
    }

    /// Snapshot for a save game
    pub fn save_state(&self) -> SavedEventQueue {
        SavedEventQueue {
            version: EVENT_QUEUE_SAVE_VERSION,
            events: self.events.clone(),
        }
    }

    /// Replace the queue contents from a save game
    ///
    /// Entries restore in their saved order, including entries whose fire
    /// time already passed; the next pump delivers those immediately.
    pub fn restore_state(&mut self, saved: SavedEventQueue) -> Result<usize, SaveError> {
        if saved.version != EVENT_QUEUE_SAVE_VERSION {
            return Err(SaveError::VersionMismatch {
                expected: EVENT_QUEUE_SAVE_VERSION,
                found: saved.version,
            });
        }
        let count = saved.events.len();
        self.events = saved.events;
        Ok(count)
    }
}

/// Serializable queue snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedEventQueue {
    pub version: u32,
    pub events: Vec<QueuedEvent>,
}
