//! Error types for LSM303DLHC operations.

use core::fmt::{Debug, Formatter};
use embedded_hal_async::i2c::I2c;

/// Error for driver operations.
///
/// Transport failures carry the bus error and are fatal for the operation
/// that hit them; nothing in this crate retries. Degenerate math inputs are
/// not errors; they surface as non-finite sample values instead.
pub enum Error<I>
where
    I: I2c,
{
    /// A control-register write failed on the bus.
    WriteError(I::Error),
    /// A block read failed on the bus.
    ReadError(I::Error),
    /// An output block was shorter than its axis-offset table requires.
    ShortRead,
    /// The shared initialization sequence failed. Every stream kind of this
    /// driver instance reports this same outcome; the sequence is never
    /// re-run and no reads are issued.
    Initialization,
}

impl<I> Debug for Error<I>
where
    I: I2c,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::result::Result<(), core::fmt::Error> {
        match self {
            Self::WriteError(e) => f.debug_tuple("WriteError").field(e).finish(),
            Self::ReadError(e) => f.debug_tuple("ReadError").field(e).finish(),
            Self::ShortRead => f.write_str("ShortRead"),
            Self::Initialization => f.write_str("Initialization"),
        }
    }
}
