//! LSM303DLHC Asynchronous Driver
//!
//! This module provides a non-blocking interface to the ST LSM303DLHC
//! 3-axis accelerometer/magnetometer. All bus traffic goes through
//! `embedded-hal-async`, so the driver suspends at I2C boundaries instead of
//! blocking.
//!
//! Core behavior:
//! - Construction is infallible and touches no hardware; it only resolves
//!   the magnetometer hard-iron offset from the configuration.
//! - The five-write initialization sequence runs at most once per driver
//!   instance, triggered by whichever consumer measures first. Later
//!   consumers (including streams created afterwards) observe the stored
//!   outcome without any register write being reissued.
//! - The bus handle sits behind an async mutex so the three stream kinds
//!   can share one driver by reference; each transaction holds the lock for
//!   exactly its own duration.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::config::Lsm303Config;
use crate::error::Error;
use crate::heading::Heading;
use crate::registers::{
    AccelRegister, MagRegister, ACC_ADDRESS, ACC_MULTI_READ, ACC_OUT, MAG_ADDRESS, MAG_OUT,
    OUT_BLOCK_LEN,
};
use crate::stream::{AccelerationStream, HeadingStream, MagneticFieldStream};
use crate::temperature::Temperature;
use crate::vector::{RawVector, Vector};

/// Outcome latch for the one-shot initialization sequence.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum InitState {
    Pending,
    Complete,
    Failed,
}

/// ST LSM303DLHC driver.
///
/// Generic over the bus handle `I` and the mutex flavor `M` guarding it
/// (`NoopRawMutex` for single-task use, `CriticalSectionRawMutex` when the
/// driver is shared across executors).
pub struct Lsm303<M, I>
where
    M: RawMutex,
    I: I2c,
{
    bus: Mutex<M, I>,
    init: Mutex<M, InitState>,
    mag_offset: Vector,
    diagnostics: bool,
}

impl<M, I> Lsm303<M, I>
where
    M: RawMutex,
    I: I2c,
{
    /// Construct a driver for the LSM303DLHC on the given bus.
    ///
    /// No bus traffic happens here; the device is configured lazily by the
    /// first measurement. The hard-iron offset is resolved once and stays
    /// fixed for the lifetime of this instance.
    pub fn new(i2c: I, config: Lsm303Config) -> Self {
        let mag_offset = config.resolve_mag_offset();
        if config.diagnostics() {
            crate::debug_log!("lsm303: mag offset {}", mag_offset);
        }
        Self {
            bus: Mutex::new(i2c),
            init: Mutex::new(InitState::Pending),
            mag_offset,
            diagnostics: config.diagnostics(),
        }
    }

    /// Returns the underlying I2C peripheral, consuming this driver.
    pub fn release(self) -> I {
        self.bus.into_inner()
    }

    /// The resolved hard-iron offset, in raw magnetometer counts.
    pub fn mag_offset(&self) -> Vector {
        self.mag_offset
    }

    pub(crate) async fn write_byte(
        &self,
        device: u8,
        register: u8,
        value: u8,
    ) -> Result<(), Error<I>> {
        let mut bus = self.bus.lock().await;
        bus.write(device, &[register, value])
            .await
            .map_err(Error::WriteError)
    }

    pub(crate) async fn read_block(
        &self,
        device: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), Error<I>> {
        let mut bus = self.bus.lock().await;
        bus.write_read(device, &[register], buf)
            .await
            .map_err(Error::ReadError)
    }

    /// Enable both sub-devices with their power-on-specified settings.
    ///
    /// The five writes are strictly ordered and none may be skipped; the
    /// first failure aborts the sequence. Note that these writes also reset
    /// any other settings held by the registers they touch.
    async fn initialize(&self) -> Result<(), Error<I>> {
        // Accelerometer

        // 0x08 = 0b00001000
        // FS = 00 (±2 g full scale); HR = 1 (high resolution enable)
        self.write_byte(ACC_ADDRESS, AccelRegister::CtrlReg4 as u8, 0x08)
            .await?;

        // 0x47 = 0b01000111
        // ODR = 0100 (50 Hz); LPen = 0 (normal mode); Zen = Yen = Xen = 1
        self.write_byte(ACC_ADDRESS, AccelRegister::CtrlReg1 as u8, 0x47)
            .await?;

        // Magnetometer

        // 0x10 = 0b00010000
        // DO = 100 (15 Hz output data rate)
        self.write_byte(MAG_ADDRESS, MagRegister::CraReg as u8, 0x10)
            .await?;

        // 0x20 = 0b00100000
        // GN = 001 (±1.3 gauss full scale)
        self.write_byte(MAG_ADDRESS, MagRegister::CrbReg as u8, 0x20)
            .await?;

        // 0x00 = 0b00000000
        // MD = 00 (continuous-conversion mode)
        self.write_byte(MAG_ADDRESS, MagRegister::MrReg as u8, 0x00)
            .await?;

        Ok(())
    }

    /// Wait for the shared initialization outcome, running the sequence if
    /// nobody has yet.
    ///
    /// The first caller executes the writes while holding the latch; anyone
    /// arriving meanwhile suspends until the outcome is recorded and then
    /// observes it. A recorded failure is permanent for this instance and
    /// reported uniformly as [`Error::Initialization`].
    pub async fn ensure_initialized(&self) -> Result<(), Error<I>> {
        let mut state = self.init.lock().await;
        match *state {
            InitState::Complete => Ok(()),
            InitState::Failed => Err(Error::Initialization),
            InitState::Pending => match self.initialize().await {
                Ok(()) => {
                    *state = InitState::Complete;
                    if self.diagnostics {
                        crate::debug_log!("lsm303: initialization complete");
                    }
                    Ok(())
                }
                Err(_) => {
                    *state = InitState::Failed;
                    if self.diagnostics {
                        crate::debug_log!("lsm303: initialization failed");
                    }
                    Err(Error::Initialization)
                }
            },
        }
    }

    pub(crate) async fn read_acceleration_raw(&self) -> Result<RawVector, Error<I>> {
        let mut block = [0u8; OUT_BLOCK_LEN];
        self.read_block(
            ACC_ADDRESS,
            AccelRegister::OutX_L as u8 | ACC_MULTI_READ,
            &mut block,
        )
        .await?;
        RawVector::from_block(&block, &ACC_OUT).ok_or(Error::ShortRead)
    }

    pub(crate) async fn read_magnetometer_raw(&self) -> Result<RawVector, Error<I>> {
        let mut block = [0u8; OUT_BLOCK_LEN];
        self.read_block(MAG_ADDRESS, MagRegister::OutX_H as u8, &mut block)
            .await?;
        RawVector::from_block(&block, &MAG_OUT).ok_or(Error::ShortRead)
    }

    /// One paired read cycle for the heading pipeline: both sensors sampled
    /// under the same tick, hard-iron offset subtracted in raw counts.
    pub(crate) async fn read_heading_pair(&self, forward: &Vector) -> Result<Heading, Error<I>> {
        let acc = self.read_acceleration_raw().await?;
        let mag = self.read_magnetometer_raw().await?;
        let corrected = Vector::from(mag).subtract(&self.mag_offset);
        Ok(Heading::from_readings(&Vector::from(acc), &corrected, forward))
    }

    /// Single acceleration measurement in gravities.
    pub async fn acceleration(&self) -> Result<Vector, Error<I>> {
        self.ensure_initialized().await?;
        Ok(self.read_acceleration_raw().await?.to_gravity())
    }

    /// Single magnetic-field measurement in gauss.
    ///
    /// No hard-iron correction is applied here; only the heading pipeline
    /// corrects its magnetometer input.
    pub async fn magnetic_field(&self) -> Result<Vector, Error<I>> {
        self.ensure_initialized().await?;
        Ok(self.read_magnetometer_raw().await?.to_gauss())
    }

    /// Single magnetic-field measurement in raw counts, for calibration.
    pub async fn magnetic_field_raw(&self) -> Result<RawVector, Error<I>> {
        self.ensure_initialized().await?;
        self.read_magnetometer_raw().await
    }

    /// Single tilt-compensated heading measurement.
    ///
    /// See [`DEFAULT_FORWARD`](crate::heading::DEFAULT_FORWARD) for the
    /// conventional forward reference.
    pub async fn heading(&self, forward: &Vector) -> Result<Heading, Error<I>> {
        self.ensure_initialized().await?;
        self.read_heading_pair(forward).await
    }

    /// Read the current temperature of the magnetometer die.
    pub async fn temperature(&self) -> Result<Temperature, Error<I>> {
        self.ensure_initialized().await?;
        let mut data = [0u8; 2];
        self.read_block(MAG_ADDRESS, MagRegister::TempOut_H as u8, &mut data)
            .await?;
        Ok(Temperature::from_bytes(data))
    }

    /// Periodic acceleration samples in gravities.
    ///
    /// `interval_ms` paces every tick after the immediate first one;
    /// [`DEFAULT_INTERVAL_MS`](crate::stream::DEFAULT_INTERVAL_MS) is the
    /// conventional choice.
    pub fn stream_acceleration<D: DelayNs>(
        &self,
        delay: D,
        interval_ms: u32,
    ) -> AccelerationStream<'_, M, I, D> {
        AccelerationStream::new(self, delay, interval_ms)
    }

    /// Periodic magnetic-field samples, in gauss unless `raw` is set.
    pub fn stream_magnetic_field<D: DelayNs>(
        &self,
        delay: D,
        interval_ms: u32,
        raw: bool,
    ) -> MagneticFieldStream<'_, M, I, D> {
        MagneticFieldStream::new(self, delay, interval_ms, raw)
    }

    /// Periodic tilt-compensated headings relative to `forward`.
    pub fn stream_heading<D: DelayNs>(
        &self,
        delay: D,
        interval_ms: u32,
        forward: Vector,
    ) -> HeadingStream<'_, M, I, D> {
        HeadingStream::new(self, delay, interval_ms, forward)
    }
}
