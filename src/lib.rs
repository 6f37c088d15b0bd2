#![no_std]

pub mod calibration;
pub mod config;
pub mod error;
pub mod heading;
pub mod registers;
pub mod sensor;
pub mod stream;
pub mod temperature;
pub mod vector;

/// Diagnostic output, compiled in only with the `defmt-03` feature.
#[cfg(feature = "defmt-03")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        defmt::debug!($($arg)*)
    };
}

#[cfg(not(feature = "defmt-03"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

pub(crate) use debug_log;
