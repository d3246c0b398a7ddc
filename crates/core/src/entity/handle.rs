//! Weak, generation-checked entity references
//!
//! An [`EHandle`] packs an entity table index together with a serial number.
//! The serial changes whenever a slot is reused, so a handle captured before
//! an entity died resolves to nothing afterwards instead of aliasing
//! whatever entity took the slot.
//!
//! # Handle Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          u32 raw value                          │
//! ├─────────────────────────────┬───────────────────────────────────┤
//! │    Serial Number (17 bits)  │      Entity Index (15 bits)       │
//! │         bits 15-31          │           bits 0-14               │
//! └─────────────────────────────┴───────────────────────────────────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Entity index bits (15 bits = 32768 slots)
pub const MAX_EDICT_BITS: u32 = 15;

/// Maximum number of entity slots
pub const MAX_EDICTS: u32 = 1 << MAX_EDICT_BITS;

/// Serial number bits
pub const NUM_SERIAL_BITS: u32 = 17;

/// Invalid handle sentinel value
pub const INVALID_EHANDLE: u32 = 0xFFFF_FFFF;

/// Mask for extracting the index from a raw handle
const INDEX_MASK: u32 = MAX_EDICTS - 1;

/// Mask for wrapping serial numbers into their 17 bits
const SERIAL_MASK: u32 = (1 << NUM_SERIAL_BITS) - 1;

/// A weak reference to an entity slot
///
/// Resolution happens through the entity list; the handle itself only
/// carries identity. A "valid" handle can still fail to resolve if the
/// entity was destroyed; that is the point.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EHandle(u32);

impl EHandle {
    /// Build a handle from a raw packed value
    #[inline]
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Build a handle from an index and serial number
    #[inline]
    pub const fn from_parts(index: u32, serial: u32) -> Self {
        Self((index & INDEX_MASK) | ((serial & SERIAL_MASK) << MAX_EDICT_BITS))
    }

    /// The invalid sentinel handle
    #[inline]
    pub const fn invalid() -> Self {
        Self(INVALID_EHANDLE)
    }

    /// Raw packed value
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Slot index (lower 15 bits)
    #[inline]
    pub const fn index(self) -> u32 {
        self.0 & INDEX_MASK
    }

    /// Serial number (upper 17 bits)
    #[inline]
    pub const fn serial(self) -> u32 {
        self.0 >> MAX_EDICT_BITS
    }

    /// False only for the sentinel; a valid handle may still be stale
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.index() != MAX_EDICTS - 1
    }
}

impl Default for EHandle {
    fn default() -> Self {
        Self::invalid()
    }
}

impl fmt::Debug for EHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "EHandle(index={}, serial={})", self.index(), self.serial())
        } else {
            write!(f, "EHandle(invalid)")
        }
    }
}

impl fmt::Display for EHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}:{}", self.index(), self.serial())
        } else {
            write!(f, "invalid")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack() {
        let h = EHandle::from_parts(42, 7);
        assert_eq!(h.index(), 42);
        assert_eq!(h.serial(), 7);
    }

    #[test]
    fn test_serial_wraps_to_field_width() {
        let h = EHandle::from_parts(1, SERIAL_MASK + 5);
        assert_eq!(h.serial(), 4);
    }

    #[test]
    fn test_invalid_sentinel() {
        let h = EHandle::invalid();
        assert!(!h.is_valid());
        assert_eq!(h.raw(), INVALID_EHANDLE);
        assert_eq!(EHandle::default(), EHandle::invalid());
    }

    #[test]
    fn test_max_index_is_invalid() {
        // The top index is reserved so the sentinel never collides with a
        // live slot.
        let h = EHandle::from_parts(MAX_EDICTS - 1, 0);
        assert!(!h.is_valid());
    }

    #[test]
    fn test_display() {
        let h = EHandle::from_parts(1, 3);
        assert_eq!(format!("{h}"), "1:3");
        assert_eq!(format!("{}", EHandle::invalid()), "invalid");
    }

    #[test]
    fn test_serde_round_trip() {
        let h = EHandle::from_parts(9, 2);
        let json = serde_json::to_string(&h).unwrap();
        let back: EHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }
}
