//! Driver and stream tests against a recording mock bus.
//!
//! These cover the initialization latch (once per driver instance, strict
//! write order, uniform failure), the tick pacing contract and the
//! per-stream unit conversions.

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embedded_hal_async::i2c::Operation;

use lsm303dlhc_async::config::Lsm303Config;
use lsm303dlhc_async::error::Error;
use lsm303dlhc_async::heading::DEFAULT_FORWARD;
use lsm303dlhc_async::registers::{
    AccelRegister, MagRegister, ACC_ADDRESS, ACC_MULTI_READ, MAG_ADDRESS,
};
use lsm303dlhc_async::sensor::Lsm303;
use lsm303dlhc_async::vector::{RawVector, Vector};

/// The full initialization sequence as (device, register, value) triples,
/// in the only order the driver may issue it.
const INIT_WRITES: [(u8, u8, u8); 5] = [
    (0x19, 0x23, 0x08),
    (0x19, 0x20, 0x47),
    (0x1E, 0x00, 0x10),
    (0x1E, 0x01, 0x20),
    (0x1E, 0x02, 0x00),
];

#[derive(Debug)]
struct MockError;

impl embedded_hal::i2c::Error for MockError {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        embedded_hal::i2c::ErrorKind::Other
    }
}

/// Recording mock bus: logs every transaction, serves canned output blocks
/// and injects failures on demand.
struct MockI2c {
    writes: Vec<(u8, u8, u8)>,
    reads: Vec<(u8, u8, usize)>,
    accel_block: [u8; 6],
    mag_block: [u8; 6],
    temp_bytes: [u8; 2],
    fail_write_at: Option<usize>,
    fail_reads: bool,
}

impl MockI2c {
    fn new() -> Self {
        Self {
            writes: Vec::new(),
            reads: Vec::new(),
            accel_block: [0; 6],
            mag_block: [0; 6],
            temp_bytes: [0; 2],
            fail_write_at: None,
            fail_reads: false,
        }
    }
}

impl embedded_hal_async::i2c::ErrorType for MockI2c {
    type Error = MockError;
}

impl embedded_hal_async::i2c::I2c for MockI2c {
    async fn transaction(
        &mut self,
        _address: u8,
        _operations: &mut [Operation<'_>],
    ) -> Result<(), MockError> {
        Ok(())
    }

    async fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), MockError> {
        let index = self.writes.len();
        self.writes.push((address, bytes[0], bytes[1]));
        if self.fail_write_at == Some(index) {
            return Err(MockError);
        }
        Ok(())
    }

    async fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buf: &mut [u8],
    ) -> Result<(), MockError> {
        let register = bytes[0];
        self.reads.push((address, register, buf.len()));
        if self.fail_reads {
            return Err(MockError);
        }
        match (address, register) {
            (ACC_ADDRESS, r) if r == (AccelRegister::OutX_L as u8 | ACC_MULTI_READ) => {
                buf.copy_from_slice(&self.accel_block);
            }
            (MAG_ADDRESS, r) if r == MagRegister::OutX_H as u8 => {
                buf.copy_from_slice(&self.mag_block);
            }
            (MAG_ADDRESS, r) if r == MagRegister::TempOut_H as u8 => {
                buf.copy_from_slice(&self.temp_bytes);
            }
            _ => buf.fill(0),
        }
        Ok(())
    }
}

/// Mock delay recording every requested pause in milliseconds.
struct MockDelay {
    delays_ms: Vec<u32>,
}

impl MockDelay {
    fn new() -> Self {
        Self {
            delays_ms: Vec::new(),
        }
    }
}

impl embedded_hal_async::delay::DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.delays_ms.push(ns / 1_000_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
    }
}

fn block_on<F: core::future::Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

fn driver(mock: &mut MockI2c, config: Lsm303Config) -> Lsm303<NoopRawMutex, &mut MockI2c> {
    Lsm303::new(mock, config)
}

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn first_subscription_runs_initialization() {
    let mut mock = MockI2c::new();
    {
        let lsm = driver(&mut mock, Lsm303Config::new());
        let mut delay = MockDelay::new();
        let mut stream = lsm.stream_acceleration(&mut delay, 100);
        block_on(stream.next()).unwrap();
    }
    assert_eq!(mock.writes, INIT_WRITES);
    // Tick 0 issued exactly one block read, against the accelerometer with
    // the auto-increment bit set.
    assert_eq!(mock.reads, vec![(0x19, 0xA8, 6)]);
}

#[test]
fn initialization_runs_once_across_concurrent_streams() {
    let mut mock = MockI2c::new();
    {
        let lsm = driver(&mut mock, Lsm303Config::new());
        let mut d1 = MockDelay::new();
        let mut d2 = MockDelay::new();
        let mut d3 = MockDelay::new();
        let mut acc = lsm.stream_acceleration(&mut d1, 100);
        let mut mag = lsm.stream_magnetic_field(&mut d2, 50, false);
        let mut hdg = lsm.stream_heading(&mut d3, 200, DEFAULT_FORWARD);

        let (a, m, h) = block_on(async { futures::join!(acc.next(), mag.next(), hdg.next()) });
        a.unwrap();
        m.unwrap();
        h.unwrap();
    }
    // All three first ticks together triggered exactly one sequence.
    assert_eq!(mock.writes, INIT_WRITES);
    // One read each for acceleration and magnetic field, two for the paired
    // heading tick.
    assert_eq!(mock.reads.len(), 4);
}

#[test]
fn later_streams_replay_initialization_without_writes() {
    let mut mock = MockI2c::new();
    {
        let lsm = driver(&mut mock, Lsm303Config::new());
        {
            let mut delay = MockDelay::new();
            let mut stream = lsm.stream_acceleration(&mut delay, 100);
            block_on(stream.next()).unwrap();
            block_on(stream.next()).unwrap();
        }
        // A fresh subscription starts over at tick 0 but must not touch the
        // control registers again.
        let mut delay = MockDelay::new();
        let mut stream = lsm.stream_magnetic_field(&mut delay, 100, false);
        block_on(stream.next()).unwrap();
        drop(stream);
        assert!(delay.delays_ms.is_empty());
    }
    assert_eq!(mock.writes, INIT_WRITES);
}

#[test]
fn failed_write_fails_every_stream_kind_and_blocks_reads() {
    let mut mock = MockI2c::new();
    mock.fail_write_at = Some(2);
    {
        let lsm = driver(&mut mock, Lsm303Config::new());
        let mut d1 = MockDelay::new();
        let mut d2 = MockDelay::new();
        let mut d3 = MockDelay::new();
        let mut acc = lsm.stream_acceleration(&mut d1, 100);
        let mut mag = lsm.stream_magnetic_field(&mut d2, 100, false);
        let mut hdg = lsm.stream_heading(&mut d3, 100, DEFAULT_FORWARD);

        assert!(matches!(block_on(acc.next()), Err(Error::Initialization)));
        assert!(matches!(block_on(mag.next()), Err(Error::Initialization)));
        assert!(matches!(block_on(hdg.next()), Err(Error::Initialization)));
        // The outcome is latched; polling again does not retry the sequence.
        assert!(matches!(block_on(acc.next()), Err(Error::Initialization)));
    }
    // Two successful writes plus the failed third attempt, then nothing.
    assert_eq!(mock.writes.len(), 3);
    assert_eq!(&mock.writes[..2], &INIT_WRITES[..2]);
    assert!(mock.reads.is_empty());
}

#[test]
fn tick_zero_is_immediate_then_fixed_interval() {
    let mut mock = MockI2c::new();
    {
        let lsm = driver(&mut mock, Lsm303Config::new());
        let mut delay = MockDelay::new();
        let mut stream = lsm.stream_acceleration(&mut delay, 100);
        block_on(stream.next()).unwrap();
        block_on(stream.next()).unwrap();
        block_on(stream.next()).unwrap();
        drop(stream);
        assert_eq!(delay.delays_ms, vec![100, 100]);
    }
    assert_eq!(mock.reads.len(), 3);
}

#[test]
fn acceleration_stream_converts_to_gravities() {
    let mut mock = MockI2c::new();
    // Raw (1600, -1600, 32752): low byte first per axis.
    mock.accel_block = [0x40, 0x06, 0xC0, 0xF9, 0xF0, 0x7F];
    {
        let lsm = driver(&mut mock, Lsm303Config::new());
        let mut delay = MockDelay::new();
        let mut stream = lsm.stream_acceleration(&mut delay, 100);
        let sample = block_on(stream.next()).unwrap();
        assert_close(sample.x, 0.1);
        assert_close(sample.y, -0.1);
        assert_close(sample.z, 2.047);
    }
}

#[test]
fn magnetic_stream_raw_skips_unit_conversion() {
    let mut mock = MockI2c::new();
    // X = 2, Z = 3, Y = -2 in the magnetometer's X, Z, Y high-first layout.
    mock.mag_block = [0x00, 0x02, 0x00, 0x03, 0xFF, 0xFE];
    {
        let lsm = driver(&mut mock, Lsm303Config::new());

        let mut delay = MockDelay::new();
        let mut raw_stream = lsm.stream_magnetic_field(&mut delay, 100, true);
        let sample = block_on(raw_stream.next()).unwrap();
        assert_eq!(sample, Vector::new(2.0, -2.0, 3.0));
        drop(raw_stream);

        let mut delay = MockDelay::new();
        let mut gauss_stream = lsm.stream_magnetic_field(&mut delay, 100, false);
        let sample = block_on(gauss_stream.next()).unwrap();
        assert_eq!(sample, Vector::new(2200.0, -2200.0, 2940.0));
    }
}

#[test]
fn heading_stream_pairs_reads_and_subtracts_offset() {
    let mut mock = MockI2c::new();
    // Accelerometer straight up, magnetometer at (3, 2, 2) raw.
    mock.accel_block = [0x00, 0x00, 0x00, 0x00, 0x10, 0x00];
    mock.mag_block = [0x00, 0x03, 0x00, 0x02, 0x00, 0x02];
    {
        // Observed extremes resolving to a (2, 2, 2) hard-iron offset, so
        // the corrected field points along +X and the heading is 270.
        let config = Lsm303Config::new()
            .with_mag_min(Vector::ZERO)
            .with_mag_max(Vector::new(4.0, 4.0, 4.0));
        let lsm = driver(&mut mock, config);
        let mut delay = MockDelay::new();
        let mut stream = lsm.stream_heading(&mut delay, 100, DEFAULT_FORWARD);
        let heading = block_on(stream.next()).unwrap();
        assert_close(heading.degrees(), 270.0);
    }
    // The tick issued both reads, accelerometer first, before computing.
    assert_eq!(mock.reads.len(), 2);
    assert_eq!(mock.reads[0].0, ACC_ADDRESS);
    assert_eq!(mock.reads[1].0, MAG_ADDRESS);
}

#[test]
fn transport_read_error_is_surfaced() {
    let mut mock = MockI2c::new();
    mock.fail_reads = true;
    {
        let lsm = driver(&mut mock, Lsm303Config::new());
        let mut delay = MockDelay::new();
        let mut stream = lsm.stream_acceleration(&mut delay, 100);
        assert!(matches!(block_on(stream.next()), Err(Error::ReadError(_))));
    }
    // Initialization itself succeeded; only the tick's read failed.
    assert_eq!(mock.writes, INIT_WRITES);
    assert_eq!(mock.reads.len(), 1);
}

#[test]
fn one_shot_measurements_share_the_latch() {
    let mut mock = MockI2c::new();
    mock.mag_block = [0x00, 0x02, 0x00, 0x03, 0xFF, 0xFE];
    mock.temp_bytes = [0x01, 0x40];
    {
        let lsm = driver(&mut mock, Lsm303Config::new());
        block_on(lsm.acceleration()).unwrap();
        let raw = block_on(lsm.magnetic_field_raw()).unwrap();
        assert_eq!(raw, RawVector::new(2, -2, 3));
        let temp = block_on(lsm.temperature()).unwrap();
        assert_close(temp.celsius(), 22.5);
    }
    // Three measurements, one initialization.
    assert_eq!(mock.writes, INIT_WRITES);
    assert_eq!(mock.reads.len(), 3);
}
