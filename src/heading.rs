//! Compass heading derivation.
//!
//! The heading is the angle in the horizontal plane between a reference
//! "forward" direction and magnetic north:
//! 1. Gravity, measured as an upward acceleration, gives the Up direction.
//! 2. The cross product of the magnetic field and Up is East.
//! 3. The cross product of Up and East is horizontal North.
//! 4. Forward is projected onto the East/North basis and the angle of the
//!    projection is taken with `atan2`.
//!
//! Magnitudes cancel out through normalization, so both input vectors may be
//! raw counts; only their directions matter.

use crate::vector::Vector;

/// Default forward reference: the device's +Y axis.
pub const DEFAULT_FORWARD: Vector = Vector::new(0.0, 1.0, 0.0);

/// Heading angle in degrees, [0, 360) when defined.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Heading {
    pub(crate) degrees: f32,
}

impl Heading {
    /// Derive a heading from one accelerometer and one magnetometer reading
    /// taken at the same instant.
    ///
    /// `mag` must already have the hard-iron offset subtracted. If `acc` and
    /// `mag` are collinear, or either is the zero vector, the East/North
    /// basis degenerates and the result is non-finite; callers that can see
    /// such inputs must be prepared for NaN-class values.
    pub fn from_readings(acc: &Vector, mag: &Vector, forward: &Vector) -> Self {
        let east = mag.cross(acc).normalize();
        let north = acc.cross(&east).normalize();

        let radians = libm::atan2(east.dot(forward) as f64, north.dot(forward) as f64);
        let mut degrees = (radians * 180.0 / core::f64::consts::PI) as f32;
        if degrees < 0.0 {
            degrees += 360.0;
        }
        Self { degrees }
    }

    pub fn degrees(&self) -> f32 {
        self.degrees
    }
}
