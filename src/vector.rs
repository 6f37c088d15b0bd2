//! 3-axis sample vectors.
//!
//! Two representations exist, matching the two stages of the measurement
//! pipeline:
//! - [`RawVector`]: sign-corrected 16-bit counts straight out of an output
//!   block, before any unit conversion
//! - [`Vector`]: floating-point components in physical units (gravities,
//!   gauss) or unitless calibration/reference values
//!
//! Every operation produces a fresh value; vectors are never mutated in
//! place.

use crate::registers::{
    AxisOffsets, ACC_TO_GRAVITY, MAG_TO_GAUSS_X, MAG_TO_GAUSS_Y, MAG_TO_GAUSS_Z,
};

/// Raw 3-axis reading decoded from a 6-byte output block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawVector {
    pub(crate) x: i16,
    pub(crate) y: i16,
    pub(crate) z: i16,
}

impl RawVector {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// Decode an output block through an axis-offset table.
    ///
    /// Each axis is reassembled as `(block[high] << 8) | block[low]` and
    /// sign-corrected as a 16-bit two's-complement value. Returns `None` if
    /// the block is shorter than the largest offset the table references;
    /// that is a caller error, not an I/O condition.
    pub fn from_block(block: &[u8], offsets: &AxisOffsets) -> Option<Self> {
        if block.len() <= offsets.max_offset() {
            return None;
        }
        Some(Self {
            x: i16::from_be_bytes([block[offsets.x_high], block[offsets.x_low]]),
            y: i16::from_be_bytes([block[offsets.y_high], block[offsets.y_low]]),
            z: i16::from_be_bytes([block[offsets.z_high], block[offsets.z_low]]),
        })
    }

    pub fn x(&self) -> i16 {
        self.x
    }

    pub fn y(&self) -> i16 {
        self.y
    }

    pub fn z(&self) -> i16 {
        self.z
    }

    /// Convert an accelerometer reading to gravities.
    ///
    /// Readings are 16 bits wide but only the high 12 are significant, so
    /// each axis is shifted right 4 bits before the conversion factor is
    /// applied. The shift is arithmetic: truncation must preserve sign and
    /// happen before scaling.
    pub fn to_gravity(&self) -> Vector {
        Vector {
            x: ((self.x >> 4) as f32) * ACC_TO_GRAVITY,
            y: ((self.y >> 4) as f32) * ACC_TO_GRAVITY,
            z: ((self.z >> 4) as f32) * ACC_TO_GRAVITY,
        }
    }

    /// Convert a magnetometer reading to gauss.
    ///
    /// Each axis carries its own conversion factor; no shift is involved.
    pub fn to_gauss(&self) -> Vector {
        Vector {
            x: self.x as f32 * MAG_TO_GAUSS_X,
            y: self.y as f32 * MAG_TO_GAUSS_Y,
            z: self.z as f32 * MAG_TO_GAUSS_Z,
        }
    }
}

impl From<RawVector> for Vector {
    /// Widen raw counts to floating point without any unit conversion.
    fn from(raw: RawVector) -> Self {
        Self {
            x: raw.x as f32,
            y: raw.y as f32,
            z: raw.z as f32,
        }
    }
}

/// Floating-point 3-axis vector.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Component-wise mean of two vectors.
    pub fn average(&self, other: &Self) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
            z: (self.z + other.z) / 2.0,
        }
    }

    /// Component-wise difference `self - other`.
    pub fn subtract(&self, other: &Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    /// Cross product `self × other`.
    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Dot product `self · other`.
    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Euclidean length.
    pub fn magnitude(&self) -> f32 {
        libm::sqrt(self.dot(self) as f64) as f32
    }

    /// Scale to unit length.
    ///
    /// The zero vector has no direction: its components come out non-finite
    /// (division by zero) and stay that way through any further arithmetic.
    /// That propagation is deliberate; nothing here clamps or traps it.
    pub fn normalize(&self) -> Self {
        let m = self.magnitude();
        Self {
            x: self.x / m,
            y: self.y / m,
            z: self.z / m,
        }
    }
}
