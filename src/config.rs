//! Driver construction options.

use crate::vector::Vector;

/// Configuration accepted by [`Lsm303::new`](crate::sensor::Lsm303::new).
///
/// The magnetometer hard-iron offset can be supplied three ways, resolved
/// once at construction in this order:
/// 1. an explicit offset vector,
/// 2. a pair of observed per-axis extremes (offset = their average),
/// 3. nothing: a zero offset.
///
/// Observed extremes typically come from a calibration run with
/// [`MagRange`](crate::calibration::MagRange) over the raw magnetometer
/// stream; the offset is expressed in raw counts.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Lsm303Config {
    mag_offset: Option<Vector>,
    mag_min: Option<Vector>,
    mag_max: Option<Vector>,
    diagnostics: bool,
}

impl Lsm303Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this exact hard-iron offset, overriding any min/max pair.
    pub fn with_mag_offset(mut self, offset: Vector) -> Self {
        self.mag_offset = Some(offset);
        self
    }

    /// Observed per-axis minimum of raw magnetometer readings.
    pub fn with_mag_min(mut self, min: Vector) -> Self {
        self.mag_min = Some(min);
        self
    }

    /// Observed per-axis maximum of raw magnetometer readings.
    pub fn with_mag_max(mut self, max: Vector) -> Self {
        self.mag_max = Some(max);
        self
    }

    /// Emit diagnostic output (requires the `defmt-03` feature).
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    /// Resolve the hard-iron offset; exactly one of the three forms applies.
    pub fn resolve_mag_offset(&self) -> Vector {
        if let Some(offset) = self.mag_offset {
            offset
        } else if let (Some(min), Some(max)) = (self.mag_min, self.mag_max) {
            min.average(&max)
        } else {
            Vector::ZERO
        }
    }

    pub(crate) fn diagnostics(&self) -> bool {
        self.diagnostics
    }
}
