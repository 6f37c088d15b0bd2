//! Embassy LSM303DLHC Magnetometer Calibration Example
//!
//! Rotate the board slowly through every orientation while this runs. The
//! raw magnetometer stream is folded into a running min/max range; the
//! printed offset converges on the hard-iron bias of the board's
//! surroundings. Feed the final offset (or the extremes themselves) into
//! `Lsm303Config` for heading use.

#![no_std]
#![no_main]

use defmt::info;
use embassy_executor::Spawner;
use embassy_rp::i2c::InterruptHandler;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::Delay;
use {defmt_rtt as _, panic_probe as _};

use lsm303dlhc_async::calibration::MagRange;
use lsm303dlhc_async::config::Lsm303Config;
use lsm303dlhc_async::sensor::Lsm303;

embassy_rp::bind_interrupts!(struct Irqs {
    I2C1_IRQ => InterruptHandler<embassy_rp::peripherals::I2C1>;
});

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(embassy_rp::config::Config::default());

    let sda = p.PIN_14;
    let scl = p.PIN_15;
    let config = embassy_rp::i2c::Config::default();
    let bus = embassy_rp::i2c::I2c::new_async(p.I2C1, scl, sda, Irqs, config);

    let lsm: Lsm303<NoopRawMutex, _> = Lsm303::new(bus, Lsm303Config::new());

    // Raw mode: unconverted counts, the unit the heading pipeline corrects
    // in.
    let mut samples = lsm.stream_magnetic_field(Delay, 100, true);
    let mut range = MagRange::new();

    loop {
        let sample = samples.next().await.unwrap();
        range.update(&sample);
        let offset = range.offset();
        info!(
            "sample: ({}, {}, {})  offset so far: ({}, {}, {})",
            sample.x, sample.y, sample.z, offset.x, offset.y, offset.z
        );
    }
}
