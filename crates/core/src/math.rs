//! Minimal transform math for entity placement
//!
//! Just enough vector/angle support to compose template instance transforms
//! and run radius searches. Angles follow the engine convention:
//! degrees, applied yaw then pitch then roll.

use serde::{Deserialize, Serialize};

/// World-space position or offset
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance_to(self, other: Vector3) -> f32 {
        (other - self).length()
    }

    /// Parse the keyvalue form `"x y z"`
    pub fn parse(s: &str) -> Option<Self> {
        let mut it = s.split_whitespace();
        let x = it.next()?.parse().ok()?;
        let y = it.next()?.parse().ok()?;
        let z = it.next()?.parse().ok()?;
        Some(Self { x, y, z })
    }
}

impl std::ops::Add for Vector3 {
    type Output = Vector3;

    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vector3 {
    type Output = Vector3;

    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::fmt::Display for Vector3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

/// Orientation in degrees: pitch (around Y), yaw (around Z), roll (around X)
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QAngle {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl QAngle {
    pub const ZERO: QAngle = QAngle {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    };

    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Parse the keyvalue form `"pitch yaw roll"`
    pub fn parse(s: &str) -> Option<Self> {
        let v = Vector3::parse(s)?;
        Some(Self::new(v.x, v.y, v.z))
    }

    /// Rotate a local-space offset into the space this angle describes
    pub fn rotate(self, v: Vector3) -> Vector3 {
        let (sp, cp) = self.pitch.to_radians().sin_cos();
        let (sy, cy) = self.yaw.to_radians().sin_cos();
        let (sr, cr) = self.roll.to_radians().sin_cos();

        // Row-major rotation matrix, same composition order as the engine's
        // AngleMatrix.
        let m = [
            [cp * cy, sr * sp * cy - cr * sy, cr * sp * cy + sr * sy],
            [cp * sy, sr * sp * sy + cr * cy, cr * sp * sy - sr * cy],
            [-sp, sr * cp, cr * cp],
        ];

        Vector3::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        )
    }
}

impl std::ops::Add for QAngle {
    type Output = QAngle;

    fn add(self, rhs: QAngle) -> QAngle {
        QAngle::new(
            self.pitch + rhs.pitch,
            self.yaw + rhs.yaw,
            self.roll + rhs.roll,
        )
    }
}

impl std::ops::Sub for QAngle {
    type Output = QAngle;

    fn sub(self, rhs: QAngle) -> QAngle {
        QAngle::new(
            self.pitch - rhs.pitch,
            self.yaw - rhs.yaw,
            self.roll - rhs.roll,
        )
    }
}

impl std::fmt::Display for QAngle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.pitch, self.yaw, self.roll)
    }
}

/// 8-bit RGBA color payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color32 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color32 {
    fn default() -> Self {
        Self {
            r: 255,
            g: 255,
            b: 255,
            a: 255,
        }
    }
}

impl Color32 {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse the keyvalue forms `"r g b"` and `"r g b a"`
    pub fn parse(s: &str) -> Option<Self> {
        let mut it = s.split_whitespace();
        let r = it.next()?.parse().ok()?;
        let g = it.next()?.parse().ok()?;
        let b = it.next()?.parse().ok()?;
        let a = match it.next() {
            Some(tok) => tok.parse().ok()?,
            None => 255,
        };
        Some(Self { r, g, b, a })
    }
}

impl std::fmt::Display for Color32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} {}", self.r, self.g, self.b, self.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_parse() {
        assert_eq!(
            Vector3::parse("1 2.5 -3"),
            Some(Vector3::new(1.0, 2.5, -3.0))
        );
        assert_eq!(Vector3::parse("1 2"), None);
        assert_eq!(Vector3::parse("a b c"), None);
    }

    #[test]
    fn test_yaw_rotation() {
        let angles = QAngle::new(0.0, 90.0, 0.0);
        let out = angles.rotate(Vector3::new(1.0, 0.0, 0.0));
        assert!((out.x - 0.0).abs() < 1e-5);
        assert!((out.y - 1.0).abs() < 1e-5);
        assert!((out.z - 0.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_rotation_identity() {
        let v = Vector3::new(4.0, -2.0, 7.0);
        let out = QAngle::ZERO.rotate(v);
        assert!((out - v).length() < 1e-5);
    }

    #[test]
    fn test_color_parse() {
        assert_eq!(Color32::parse("255 0 0"), Some(Color32::new(255, 0, 0, 255)));
        assert_eq!(
            Color32::parse("10 20 30 40"),
            Some(Color32::new(10, 20, 30, 40))
        );
        assert_eq!(Color32::parse("300 0 0"), None);
    }
}
