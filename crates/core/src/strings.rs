//! Pooled strings for entity names and I/O targets
//!
//! Entity names, classnames and connection targets are compared and cloned
//! constantly while the event queue drains. Interning them gives cheap
//! clones and keeps one copy of each distinct name per process, the same
//! role the engine's castable string pool plays for `string_t`.

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, LazyLock};

use dashmap::DashSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Process-wide intern table
static POOL: LazyLock<DashSet<Arc<str>>> = LazyLock::new(DashSet::new);

/// An interned, cheaply-clonable string
///
/// Equality and hashing are by content, so two `PooledString`s built from
/// the same text compare equal even if a racing insert produced two arcs.
#[derive(Clone)]
pub struct PooledString(Arc<str>);

/// Intern a string, returning the pooled copy
pub fn intern(s: &str) -> PooledString {
    if let Some(existing) = POOL.get(s) {
        return PooledString(existing.key().clone());
    }
    let arc: Arc<str> = Arc::from(s);
    POOL.insert(arc.clone());
    PooledString(arc)
}

impl PooledString {
    /// The empty pooled string
    pub fn empty() -> Self {
        intern("")
    }

    /// View as `&str`
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty string
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for PooledString {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for PooledString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PooledString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq for PooledString {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl Eq for PooledString {}

impl PartialEq<str> for PooledString {
    fn eq(&self, other: &str) -> bool {
        *self.0 == *other
    }
}

impl PartialEq<&str> for PooledString {
    fn eq(&self, other: &&str) -> bool {
        *self.0 == **other
    }
}

impl std::hash::Hash for PooledString {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for PooledString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for PooledString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<&str> for PooledString {
    fn from(s: &str) -> Self {
        intern(s)
    }
}

impl Serialize for PooledString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PooledString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(intern(&s))
    }
}
