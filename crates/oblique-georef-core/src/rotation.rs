//! Elemental frame rotations and the roll/pitch/yaw attitude matrix.
//!
//! Rotations here rotate the *frame*: a positive angle turns the other two
//! axes counter-clockwise when viewed from the positive end of the rotation
//! axis. The attitude matrix is `R = Rz(yaw) * Ry(pitch) * Rx(roll)`.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rotation requested about something that is not `x`, `y` or `z`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("axis '{symbol}' is not 'x', 'y' nor 'z'")]
pub struct InvalidAxis {
    pub symbol: String,
}

/// Cartesian axis of a right-handed frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(s)
    }
}

impl TryFrom<char> for Axis {
    type Error = InvalidAxis;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_lowercase() {
            'x' => Ok(Axis::X),
            'y' => Ok(Axis::Y),
            'z' => Ok(Axis::Z),
            _ => Err(InvalidAxis {
                symbol: c.to_string(),
            }),
        }
    }
}

impl FromStr for Axis {
    type Err = InvalidAxis;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Axis::try_from(c).map_err(|_| InvalidAxis {
                symbol: s.to_string(),
            }),
            _ => Err(InvalidAxis {
                symbol: s.to_string(),
            }),
        }
    }
}

/// Proper 3×3 rotation (orthonormal, det = +1).
///
/// Constructed only through the elemental builders and their products, so
/// the invariant holds by construction up to floating-point rounding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationMatrix {
    m: Matrix3<f64>,
}

impl RotationMatrix {
    pub fn identity() -> Self {
        Self {
            m: Matrix3::identity(),
        }
    }

    /// Elemental rotation of the frame about `axis` by `angle_rad`.
    pub fn about(axis: Axis, angle_rad: f64) -> Self {
        let (s, c) = angle_rad.sin_cos();

        #[rustfmt::skip]
        let m = match axis {
            Axis::X => Matrix3::new(
                1.0, 0.0, 0.0,
                0.0,   c,   s,
                0.0,  -s,   c,
            ),
            Axis::Y => Matrix3::new(
                  c, 0.0,  -s,
                0.0, 1.0, 0.0,
                  s, 0.0,   c,
            ),
            Axis::Z => Matrix3::new(
                  c,   s, 0.0,
                 -s,   c, 0.0,
                0.0, 0.0, 1.0,
            ),
        };

        Self { m }
    }

    /// Same as [`RotationMatrix::about`] with the axis given as a symbol.
    pub fn from_symbol(axis: &str, angle_rad: f64) -> Result<Self, InvalidAxis> {
        Ok(Self::about(axis.parse()?, angle_rad))
    }

    /// Attitude rotation `Rz(yaw) * Ry(pitch) * Rx(roll)`, angles in radians.
    pub fn from_roll_pitch_yaw(roll_rad: f64, pitch_rad: f64, yaw_rad: f64) -> Self {
        let rx = Self::about(Axis::X, roll_rad);
        let ry = Self::about(Axis::Y, pitch_rad);
        let rz = Self::about(Axis::Z, yaw_rad);
        rz.compose(&ry).compose(&rx)
    }

    /// `self * other`.
    pub fn compose(&self, other: &RotationMatrix) -> Self {
        Self {
            m: self.m * other.m,
        }
    }

    /// The inverse rotation.
    pub fn transpose(&self) -> Self {
        Self {
            m: self.m.transpose(),
        }
    }

    #[inline]
    pub fn apply(&self, v: Vector3<f64>) -> Vector3<f64> {
        self.m * v
    }

    pub fn determinant(&self) -> f64 {
        self.m.determinant()
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.m
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [
            [self.m[(0, 0)], self.m[(0, 1)], self.m[(0, 2)]],
            [self.m[(1, 0)], self.m[(1, 1)], self.m[(1, 2)]],
            [self.m[(2, 0)], self.m[(2, 1)], self.m[(2, 2)]],
        ]
    }
}

/// Camera attitude in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Attitude {
    pub roll_deg: f64,
    pub pitch_deg: f64,
    pub yaw_deg: f64,
}

impl Attitude {
    pub fn new(roll_deg: f64, pitch_deg: f64, yaw_deg: f64) -> Self {
        Self {
            roll_deg,
            pitch_deg,
            yaw_deg,
        }
    }

    /// Build the attitude rotation. Not cached: every call builds a fresh matrix.
    pub fn rotation(&self) -> RotationMatrix {
        RotationMatrix::from_roll_pitch_yaw(
            self.roll_deg.to_radians(),
            self.pitch_deg.to_radians(),
            self.yaw_deg.to_radians(),
        )
    }
}
