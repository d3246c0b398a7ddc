//! Named output slots and the fire path
//!
//! An output owns its connection list and, for value-carrying outputs, the
//! most recently fired value. Firing never blocks and never delivers: it
//! enqueues one scheduler entry per live connection and returns. The
//! repeat budget of a connection is spent at fire time, not delivery time:
//! a twice-fired `Count=2` action is exhausted even if neither delivery
//! has happened yet.

use tracing::warn;

use crate::entity::EHandle;
use crate::io::action::{EventAction, EVENT_FIRE_ALWAYS};
use crate::io::queue::{EventTarget, QueuedEvent};
use crate::variant::Variant;
use crate::world::World;

/// A named signal source on an entity
#[derive(Default)]
pub struct EntityOutput {
    value: Variant,
    actions: Vec<EventAction>,
}

impl EntityOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value, as of the last value-carrying fire
    pub fn value(&self) -> &Variant {
        &self.value
    }

    pub fn set_value(&mut self, value: Variant) {
        self.value = value;
    }

    pub fn actions(&self) -> &[EventAction] {
        &self.actions
    }

    pub fn add_action(&mut self, action: EventAction) {
        self.actions.push(action);
    }

    /// Parse a serialized connection and add it; malformed strings are
    /// logged against `owner` and skipped, never fatal
    pub fn parse_and_add(&mut self, raw: &str, owner: &str) -> bool {
        match EventAction::parse(raw) {
            Ok(action) => {
                self.actions.push(action);
                true
            }
            Err(e) => {
                warn!("{owner}: dropping bad connection: {e}");
                false
            }
        }
    }

    /// Tear down the whole connection list
    ///
    /// Runs when the owning entity dies. Queue entries scheduled by these
    /// actions stay in flight; they are identified by id and name, not by
    /// reference, so they become inert rather than dangling.
    pub fn delete_all_actions(&mut self) {
        self.actions.clear();
    }

    /// Fire the output
    ///
    /// For each connection with remaining budget: enqueue a delivery at
    /// `now + action.delay + extra_delay`, carrying the action's parameter
    /// override or, if that is void, `value`. Finite budgets decrement
    /// here; exhausted actions are removed immediately.
    pub fn fire(
        &mut self,
        world: &mut World,
        value: Variant,
        activator: EHandle,
        caller: EHandle,
        extra_delay: f32,
    ) {
        if !value.is_void() {
            self.value = value.clone();
        }
        let now = world.cur_time();

        self.actions.retain_mut(|action| {
            if action.times_to_fire == 0 {
                return false;
            }

            let param = if action.param.is_void() {
                value.clone()
            } else {
                action.param.clone()
            };

            world.queue.add(QueuedEvent {
                target: EventTarget::Name(action.target.clone()),
                input: action.target_input.clone(),
                param,
                activator,
                caller,
                fire_time: now + action.delay + extra_delay,
                action_id: action.id,
            });

            if action.times_to_fire != EVENT_FIRE_ALWAYS {
                action.times_to_fire -= 1;
                if action.times_to_fire == 0 {
                    return false;
                }
            }
            true
        });
    }

    /// Fire with no value and no extra delay
    pub fn fire_event(&mut self, world: &mut World, activator: EHandle, caller: EHandle) {
        self.fire(world, Variant::Void, activator, caller, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_budget_spent_at_fire_time() {
        // Two fires in the same tick exhaust a Count=2 action before
        // any delivery happens.
        let mut world = World::new();
        let mut output = EntityOutput::new();
        output.add_action(EventAction::new("door", "Open", Variant::Void, 1.0, 2));

        let inv = EHandle::invalid();
        output.fire_event(&mut world, inv, inv);
        output.fire_event(&mut world, inv, inv);

        assert!(output.actions().is_empty());
        assert_eq!(world.queue.len(), 2);

        // A third fire schedules nothing.
        output.fire_event(&mut world, inv, inv);
        assert_eq!(world.queue.len(), 2);
    }

    #[test]
    fn test_always_actions_never_exhaust() {
        let mut world = World::new();
        let mut output = EntityOutput::new();
        output.add_action(EventAction::new(
            "door",
            "Open",
            Variant::Void,
            0.0,
            EVENT_FIRE_ALWAYS,
        ));

        let inv = EHandle::invalid();
        for _ in 0..5 {
            output.fire_event(&mut world, inv, inv);
        }
        assert_eq!(output.actions().len(), 1);
        assert_eq!(world.queue.len(), 5);
    }

    #[test]
    fn test_param_override_beats_fired_value() {
        let mut world = World::new();
        let mut output = EntityOutput::new();
        output.add_action(EventAction::new(
            "counter",
            "SetValue",
            Variant::string("5"),
            0.0,
            EVENT_FIRE_ALWAYS,
        ));
        output.add_action(EventAction::new(
            "counter",
            "SetValue",
            Variant::Void,
            0.0,
            EVENT_FIRE_ALWAYS,
        ));

        let inv = EHandle::invalid();
        output.fire(&mut world, Variant::Int(9), inv, inv, 0.0);

        let pending = world.queue.pending();
        assert_eq!(pending[0].param, Variant::string("5"));
        assert_eq!(pending[1].param, Variant::Int(9));
        assert_eq!(output.value(), &Variant::Int(9));
    }

    #[test]
    fn test_extra_delay_adds_to_action_delay() {
        let mut world = World::new();
        world.tick(10.0);
        let mut output = EntityOutput::new();
        output.add_action(EventAction::new("a", "In", Variant::Void, 0.5, 1));

        let inv = EHandle::invalid();
        output.fire(&mut world, Variant::Void, inv, inv, 0.25);
        assert!((world.queue.pending()[0].fire_time - 10.75).abs() < 1e-4);
    }

    #[test]
    fn test_zero_connection_fire_is_noop() {
        let mut world = World::new();
        let mut output = EntityOutput::new();
        output.fire_event(&mut world, EHandle::invalid(), EHandle::invalid());
        assert!(world.queue.is_empty());
    }
}
