//! Embassy LSM303DLHC Compass Example
//!
//! This example streams tilt-compensated headings from the LSM303DLHC on a
//! Raspberry Pi Pico. It shows how to:
//! - Set up async I2C for the sensor
//! - Construct the driver with a previously measured hard-iron offset
//! - Consume the heading stream
//!
//! Hardware Setup:
//! - Connect the LSM303DLHC breakout to the Pico:
//!   - SDA -> GP14
//!   - SCL -> GP15
//!   - VIN -> 3.3V
//!   - GND -> GND

#![no_std]
#![no_main]

use defmt::info;
use embassy_executor::Spawner;
use embassy_rp::i2c::InterruptHandler;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::Delay;
use {defmt_rtt as _, panic_probe as _};

use lsm303dlhc_async::config::Lsm303Config;
use lsm303dlhc_async::heading::DEFAULT_FORWARD;
use lsm303dlhc_async::sensor::Lsm303;
use lsm303dlhc_async::stream::DEFAULT_INTERVAL_MS;
use lsm303dlhc_async::vector::Vector;

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

    // Hard-iron offset measured beforehand with the calibrate example; with
    // no offset at hand, start from `Lsm303Config::new()` and expect the
    // heading to be biased by nearby ferrous material.
    let config = Lsm303Config::new().with_mag_offset(Vector::new(-172.0, 54.0, 89.5));
    let lsm: Lsm303<NoopRawMutex, _> = Lsm303::new(bus, config);

    // The first sample triggers the one-time device initialization; from
    // then on the stream ticks every interval.
    let mut headings = lsm.stream_heading(Delay, DEFAULT_INTERVAL_MS, DEFAULT_FORWARD);
    loop {
        match headings.next().await {
            Ok(heading) => info!("heading: {} deg", heading.degrees()),
            Err(e) => {
                info!("heading read failed: {}", defmt::Debug2Format(&e));
                break;
            }
        }
    }
}
