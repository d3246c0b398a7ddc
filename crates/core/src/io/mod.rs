//! The entity I/O event system
//!
//! Outputs hold lists of [`action::EventAction`] connections; firing an
//! output enqueues one [`queue::QueuedEvent`] per live connection into the
//! world's deferred [`queue::EventQueue`], which the world pumps once per
//! tick. Target names resolve at delivery time, not at enqueue time, so
//! events can be aimed at entities that do not exist yet.

pub mod action;
pub mod dispatch;
pub mod output;
pub mod queue;

pub use action::{allocate_action_id, EventAction, EVENT_FIRE_ALWAYS, IO_STRING_DELIMITER};
pub use dispatch::InputData;
pub use output::EntityOutput;
pub use queue::{EventQueue, EventTarget, QueuedEvent, SavedEventQueue, EVENT_QUEUE_SAVE_VERSION};
