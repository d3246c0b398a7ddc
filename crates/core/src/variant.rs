//! Tagged I/O payload value
//!
//! Every parameter that travels through the event graph is a [`Variant`].
//! Unlike the engine's `variant_t`, access through the wrong tag is a
//! recoverable error rather than a reinterpretation: conversion happens
//! once, at input dispatch, against the input's declared [`FieldType`].

use serde::{Deserialize, Serialize};

use crate::entity::EHandle;
use crate::math::{Color32, Vector3};
use crate::strings::{intern, PooledString};

/// The tag half of [`Variant`], used by input declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Void,
    Integer,
    Float,
    String,
    Entity,
    Vector,
    Color,
}

/// A typed I/O parameter, passed by value through the whole pipeline
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variant {
    #[default]
    Void,
    Int(i32),
    Float(f32),
    String(PooledString),
    Entity(EHandle),
    Vector(Vector3),
    Color(Color32),
}

impl Variant {
    /// Build a string variant, interning the text
    pub fn string(s: &str) -> Self {
        Variant::String(intern(s))
    }

    /// The tag for this value
    pub fn field_type(&self) -> FieldType {
        match self {
            Variant::Void => FieldType::Void,
            Variant::Int(_) => FieldType::Integer,
            Variant::Float(_) => FieldType::Float,
            Variant::String(_) => FieldType::String,
            Variant::Entity(_) => FieldType::Entity,
            Variant::Vector(_) => FieldType::Vector,
            Variant::Color(_) => FieldType::Color,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Variant::Void)
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Variant::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Variant::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<EHandle> {
        match self {
            Variant::Entity(h) => Some(*h),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<Vector3> {
        match self {
            Variant::Vector(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color32> {
        match self {
            Variant::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// Convert to the declared input type, if the conversion is one the
    /// I/O system permits.
    ///
    /// Allowed: identity, numeric widening/narrowing between Int and Float,
    /// number-to-string formatting, and string parsing into numbers,
    /// vectors, and colors. Entity values convert to nothing else, and
    /// vectors never collapse to scalars; those come back as `None` and the
    /// dispatcher drops the input with a diagnostic.
    ///
    /// String-to-entity resolution needs the live entity set and lives in
    /// the dispatcher, not here.
    pub fn coerce(&self, ty: FieldType) -> Option<Variant> {
        if self.field_type() == ty {
            return Some(self.clone());
        }
        match (self, ty) {
            // Anything is acceptable where no parameter is expected.
            (_, FieldType::Void) => Some(Variant::Void),
            (Variant::Int(v), FieldType::Float) => Some(Variant::Float(*v as f32)),
            (Variant::Float(v), FieldType::Integer) => Some(Variant::Int(*v as i32)),
            (Variant::Int(v), FieldType::String) => Some(Variant::string(&v.to_string())),
            (Variant::Float(v), FieldType::String) => Some(Variant::string(&v.to_string())),
            (Variant::String(s), FieldType::Integer) => {
                if let Ok(v) = s.trim().parse::<i32>() {
                    Some(Variant::Int(v))
                } else {
                    // atoi-style fallback for float-looking text
                    s.trim().parse::<f32>().ok().map(|v| Variant::Int(v as i32))
                }
            }
            (Variant::String(s), FieldType::Float) => {
                s.trim().parse::<f32>().ok().map(Variant::Float)
            }
            (Variant::String(s), FieldType::Vector) => Vector3::parse(s).map(Variant::Vector),
            (Variant::String(s), FieldType::Color) => Color32::parse(s).map(Variant::Color),
            _ => None,
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Void => write!(f, "<void>"),
            Variant::Int(v) => write!(f, "{v}"),
            Variant::Float(v) => write!(f, "{v}"),
            Variant::String(s) => write!(f, "{s}"),
            Variant::Entity(h) => write!(f, "{h}"),
            Variant::Vector(v) => write!(f, "{v}"),
            Variant::Color(c) => write!(f, "{c}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_coercion() {
        let v = Variant::Int(7);
        assert_eq!(v.coerce(FieldType::Integer), Some(Variant::Int(7)));
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(
            Variant::Int(3).coerce(FieldType::Float),
            Some(Variant::Float(3.0))
        );
        assert_eq!(
            Variant::Float(3.9).coerce(FieldType::Integer),
            Some(Variant::Int(3))
        );
    }

    #[test]
    fn test_string_parsing_coercion() {
        assert_eq!(
            Variant::string("42").coerce(FieldType::Integer),
            Some(Variant::Int(42))
        );
        assert_eq!(
            Variant::string("1.5").coerce(FieldType::Float),
            Some(Variant::Float(1.5))
        );
        assert_eq!(
            Variant::string("1 2 3").coerce(FieldType::Vector),
            Some(Variant::Vector(Vector3::new(1.0, 2.0, 3.0)))
        );
        assert_eq!(Variant::string("junk").coerce(FieldType::Integer), None);
    }

    #[test]
    fn test_forbidden_coercions() {
        assert_eq!(
            Variant::Vector(Vector3::new(1.0, 2.0, 3.0)).coerce(FieldType::Float),
            None
        );
        assert_eq!(
            Variant::Entity(EHandle::invalid()).coerce(FieldType::Integer),
            None
        );
    }

    #[test]
    fn test_anything_to_void() {
        assert_eq!(Variant::Int(1).coerce(FieldType::Void), Some(Variant::Void));
    }

    #[test]
    fn test_serde_round_trip() {
        let v = Variant::Vector(Vector3::new(1.0, -2.0, 0.5));
        let json = serde_json::to_string(&v).unwrap();
        let back: Variant = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
    }
}
