//! Periodic sampling streams.
//!
//! Each stream is a pull-based infinite sequence over one read cycle of the
//! driver. The pacing contract is the same for all three kinds:
//! - The first [`next`](AccelerationStream::next) call waits for the shared
//!   initialization outcome (running the sequence if this is the first
//!   subscriber of the whole driver instance) and then samples immediately:
//!   tick 0 at time 0.
//! - Every later call waits one interval before sampling.
//! - A tick's reads complete, successfully or not, before the next tick can
//!   be issued; back-to-back ticks are never pipelined.
//!
//! Dropping a stream cancels it; nothing is scheduled once the in-flight
//! tick finishes. Creating a fresh stream starts over at tick 0 without
//! re-running initialization. Streams of different kinds are independent and
//! may run at different intervals over the same driver.
//!
//! Errors are surfaced from `next` and never retried internally; whether to
//! keep polling after a transport error is the consumer's decision. An
//! initialization failure, by contrast, is permanent for the driver
//! instance.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::error::Error;
use crate::heading::Heading;
use crate::sensor::Lsm303;
use crate::vector::Vector;

/// Default sampling interval in milliseconds.
pub const DEFAULT_INTERVAL_MS: u32 = 100;

/// Periodic acceleration samples in gravities.
pub struct AccelerationStream<'d, M, I, D>
where
    M: RawMutex,
    I: I2c,
    D: DelayNs,
{
    driver: &'d Lsm303<M, I>,
    delay: D,
    interval_ms: u32,
    started: bool,
}

impl<'d, M, I, D> AccelerationStream<'d, M, I, D>
where
    M: RawMutex,
    I: I2c,
    D: DelayNs,
{
    pub(crate) fn new(driver: &'d Lsm303<M, I>, delay: D, interval_ms: u32) -> Self {
        Self {
            driver,
            delay,
            interval_ms,
            started: false,
        }
    }

    /// Produce the next sample.
    pub async fn next(&mut self) -> Result<Vector, Error<I>> {
        if !self.started {
            self.driver.ensure_initialized().await?;
            self.started = true;
        } else {
            self.delay.delay_ms(self.interval_ms).await;
        }
        Ok(self.driver.read_acceleration_raw().await?.to_gravity())
    }
}

/// Periodic magnetic-field samples.
///
/// In raw mode the decoded counts are passed through unscaled, as a
/// calibration aid meant to be folded into a
/// [`MagRange`](crate::calibration::MagRange). Otherwise each axis is
/// converted to gauss. Neither mode subtracts the hard-iron offset.
pub struct MagneticFieldStream<'d, M, I, D>
where
    M: RawMutex,
    I: I2c,
    D: DelayNs,
{
    driver: &'d Lsm303<M, I>,
    delay: D,
    interval_ms: u32,
    raw: bool,
    started: bool,
}

impl<'d, M, I, D> MagneticFieldStream<'d, M, I, D>
where
    M: RawMutex,
    I: I2c,
    D: DelayNs,
{
    pub(crate) fn new(driver: &'d Lsm303<M, I>, delay: D, interval_ms: u32, raw: bool) -> Self {
        Self {
            driver,
            delay,
            interval_ms,
            raw,
            started: false,
        }
    }

    /// Produce the next sample.
    pub async fn next(&mut self) -> Result<Vector, Error<I>> {
        if !self.started {
            self.driver.ensure_initialized().await?;
            self.started = true;
        } else {
            self.delay.delay_ms(self.interval_ms).await;
        }
        let reading = self.driver.read_magnetometer_raw().await?;
        if self.raw {
            Ok(Vector::from(reading))
        } else {
            Ok(reading.to_gauss())
        }
    }
}

/// Periodic tilt-compensated headings in degrees.
pub struct HeadingStream<'d, M, I, D>
where
    M: RawMutex,
    I: I2c,
    D: DelayNs,
{
    driver: &'d Lsm303<M, I>,
    delay: D,
    interval_ms: u32,
    forward: Vector,
    started: bool,
}

impl<'d, M, I, D> HeadingStream<'d, M, I, D>
where
    M: RawMutex,
    I: I2c,
    D: DelayNs,
{
    pub(crate) fn new(
        driver: &'d Lsm303<M, I>,
        delay: D,
        interval_ms: u32,
        forward: Vector,
    ) -> Self {
        Self {
            driver,
            delay,
            interval_ms,
            forward,
            started: false,
        }
    }

    /// Produce the next sample. Both sensors are read under this tick; the
    /// heading is computed only once both reads have completed.
    pub async fn next(&mut self) -> Result<Heading, Error<I>> {
        if !self.started {
            self.driver.ensure_initialized().await?;
            self.started = true;
        } else {
            self.delay.delay_ms(self.interval_ms).await;
        }
        self.driver.read_heading_pair(&self.forward).await
    }
}
