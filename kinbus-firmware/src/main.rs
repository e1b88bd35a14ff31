//! Kinbus rangefinder demo
//!
//! Reads the distance from a time-of-flight sensor on I2C1 (PTE0/PTE1) of a
//! FRDM-KL25Z and logs it over RTT. Pull SDA low or unplug the sensor
//! mid-transfer to watch the bus recovery kick in.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use defmt::*;
use embedded_hal::delay::DelayNs;
use {defmt_rtt as _, panic_probe as _};

use kinbus_drivers::sensor::Rangefinder;
use kinbus_drivers::{I2cMaster, MasterConfig};
use kinbus_hal_kl25z::Instance;

mod delay;

use delay::CycleDelay;

/// Core clock out of reset (FEI, no MCG setup)
const CORE_CLOCK_HZ: u32 = 20_971_520;
/// Bus clock out of reset: core / 2
const BUS_CLOCK_HZ: u32 = CORE_CLOCK_HZ / 2;

const POLL_INTERVAL_MS: u32 = 100;

/// Flash configuration field: backdoor key, protection, FSEC (unsecured),
/// FOPT
#[link_section = ".flash_config"]
#[used]
static FLASH_CONFIG: [u8; 16] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // backdoor key
    0xFF, 0xFF, 0xFF, 0xFF, // FPROT
    0xFE, // FSEC
    0xFF, // FOPT
    0xFF, 0xFF,
];

#[entry]
fn main() -> ! {
    kinbus_hal_kl25z::disable_watchdog();
    info!("Kinbus rangefinder demo starting");

    let regs = unwrap!(kinbus_hal_kl25z::bring_up(Instance::I2c1));
    let config = MasterConfig::default().with_bus_clock(BUS_CLOCK_HZ);
    let mut bus = I2cMaster::new(regs, config);
    bus.init();

    let mut delay = CycleDelay::new(CORE_CLOCK_HZ);
    let sensor = Rangefinder::default();
    let mut seen_recoveries = 0;

    loop {
        let distance = sensor.distance(&mut bus, &mut delay);
        info!("Distance: {}", distance);

        let stats = bus.stats();
        if stats.recoveries != seen_recoveries {
            warn!(
                "Bus recovered {} times ({} abandoned)",
                stats.recoveries, stats.abandoned
            );
            seen_recoveries = stats.recoveries;
        }

        delay.delay_ms(POLL_INTERVAL_MS);
    }
}
