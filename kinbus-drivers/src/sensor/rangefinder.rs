//! Time-of-flight rangefinder
//!
//! Reports distance as a 16-bit big-endian value split across two
//! registers. The high byte is read first; the sensor needs a short settle
//! before the low byte is consistent with it.

use embedded_hal::delay::DelayNs;
use kinbus_hal::I2cRegisters;

use crate::i2c::I2cMaster;

/// Factory 7-bit address
pub const DEFAULT_ADDRESS: u8 = 0x20;

/// Delay between the high and low byte reads (ms)
const SETTLE_MS: u32 = 10;

/// Register map
pub mod reg {
    pub const DISTANCE_HIGH: u8 = 0x01;
    pub const DISTANCE_LOW: u8 = 0x00;
}

/// Rangefinder at one bus address
///
/// Holds no bus handle; each reading borrows the master, so several devices
/// can share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rangefinder {
    address: u8,
}

impl Default for Rangefinder {
    fn default() -> Self {
        Self::new(DEFAULT_ADDRESS)
    }
}

impl Rangefinder {
    /// Rangefinder strapped to a non-default 7-bit address
    pub fn new(address: u8) -> Self {
        Self { address }
    }

    /// 7-bit bus address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Read the current distance
    ///
    /// A bus lock during either read is recovered by the master and shows
    /// up here as a wrong byte, not an error.
    pub fn distance<R: I2cRegisters>(
        &self,
        bus: &mut I2cMaster<R>,
        delay: &mut impl DelayNs,
    ) -> u16 {
        let high = bus.read_byte(self.address, reg::DISTANCE_HIGH);
        delay.delay_ms(SETTLE_MS);
        let low = bus.read_byte(self.address, reg::DISTANCE_LOW);

        let distance = u16::from_be_bytes([high, low]);
        debug!("Distance: {}", distance);
        distance
    }
}
