//! I/O connections as authored by the level designer
//!
//! One [`EventAction`] is one edge of the I/O graph: "when this output
//! fires, send this input to entities named X after this delay, this many
//! times". Actions are owned by their output; everything outside refers to
//! them by the process-unique id, never by reference, so an entity's
//! destruction can free its actions without the queue needing a scan.

use std::sync::atomic::{AtomicI32, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::ConnectionParseError;
use crate::strings::{intern, PooledString};
use crate::variant::Variant;

/// Fire-count value meaning "never exhausts"
pub const EVENT_FIRE_ALWAYS: i32 = -1;

/// Delimiter used inside serialized connection strings. A control
/// character, not a comma, precisely so parameters may contain commas;
/// the comma form is accepted as a fallback for hand-written data.
pub const IO_STRING_DELIMITER: char = '\x1b';

static NEXT_EVENT_ACTION_ID: AtomicI32 = AtomicI32::new(1);

/// Stamp a fresh process-unique action id
pub fn allocate_action_id() -> i32 {
    NEXT_EVENT_ACTION_ID.fetch_add(1, Ordering::Relaxed)
}

/// One output-to-input connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAction {
    /// Target name pattern; may denote several recipients, or none
    pub target: PooledString,
    /// Input to deliver on each recipient
    pub target_input: PooledString,
    /// Parameter override; `Void` forwards the firing value unchanged
    pub param: Variant,
    /// Seconds between fire and delivery
    pub delay: f32,
    /// Remaining fires, or [`EVENT_FIRE_ALWAYS`]
    pub times_to_fire: i32,
    /// Process-unique stamp, used for cancellation
    pub id: i32,
}

impl EventAction {
    pub fn new(
        target: &str,
        target_input: &str,
        param: Variant,
        delay: f32,
        times_to_fire: i32,
    ) -> Self {
        Self {
            target: intern(target),
            target_input: intern(target_input),
            param,
            delay,
            times_to_fire,
            id: allocate_action_id(),
        }
    }

    /// Parse the serialized form `Target␛Input␛Param␛Delay␛Count`
    ///
    /// Falls back to comma delimiters when the string carries no ESC
    /// character. The count is optional and defaults to "always".
    pub fn parse(raw: &str) -> Result<Self, ConnectionParseError> {
        let delim = if raw.contains(IO_STRING_DELIMITER) {
            IO_STRING_DELIMITER
        } else {
            ','
        };
        Self::parse_with_delim(raw, delim)
    }

    /// Parse with an explicit delimiter (the runtime `AddOutput` input
    /// uses `:`)
    pub fn parse_with_delim(raw: &str, delim: char) -> Result<Self, ConnectionParseError> {
        let fields: Vec<&str> = raw.split(delim).collect();
        if fields.len() < 4 {
            return Err(ConnectionParseError::TooFewFields {
                raw: raw.to_string(),
                found: fields.len(),
            });
        }

        let param_text = fields[2].trim();
        let param = if param_text.is_empty() {
            Variant::Void
        } else {
            Variant::string(param_text)
        };

        let delay_text = fields[3].trim();
        let delay: f32 = delay_text
            .parse()
            .map_err(|_| ConnectionParseError::BadDelay(delay_text.to_string()))?;

        let times_to_fire = match fields.get(4).map(|s| s.trim()) {
            None | Some("") => EVENT_FIRE_ALWAYS,
            Some(text) => {
                let n: i32 = text
                    .parse()
                    .map_err(|_| ConnectionParseError::BadFireCount(text.to_string()))?;
                if n < 0 {
                    EVENT_FIRE_ALWAYS
                } else {
                    n
                }
            }
        };

        Ok(Self::new(
            fields[0].trim(),
            fields[1].trim(),
            param,
            delay,
            times_to_fire,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_esc_delimited() {
        let a = EventAction::parse("light1\x1bTurnOn\x1b\x1b0.5\x1b1").unwrap();
        assert_eq!(a.target, "light1");
        assert_eq!(a.target_input, "TurnOn");
        assert!(a.param.is_void());
        assert_eq!(a.delay, 0.5);
        assert_eq!(a.times_to_fire, 1);
    }

    #[test]
    fn test_parse_comma_fallback() {
        let a = EventAction::parse("door,Open,,0,-1").unwrap();
        assert_eq!(a.target, "door");
        assert_eq!(a.times_to_fire, EVENT_FIRE_ALWAYS);
    }

    #[test]
    fn test_esc_parameter_may_contain_commas() {
        let a = EventAction::parse("sprite\x1bColor\x1b255,0,0\x1b0\x1b-1").unwrap();
        assert_eq!(a.param.as_str(), Some("255,0,0"));
    }

    #[test]
    fn test_parse_missing_count_means_always() {
        let a = EventAction::parse("door,Open,,1.5").unwrap();
        assert_eq!(a.times_to_fire, EVENT_FIRE_ALWAYS);
    }

    #[test]
    fn test_malformed_strings_fail_soft() {
        assert!(EventAction::parse("door,Open").is_err());
        assert!(EventAction::parse("door,Open,,abc").is_err());
        assert!(EventAction::parse("door,Open,,0,xyz").is_err());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = EventAction::new("a", "In", Variant::Void, 0.0, 1);
        let b = EventAction::new("a", "In", Variant::Void, 0.0, 1);
        assert_ne!(a.id, b.id);
    }
}
