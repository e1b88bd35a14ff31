//! Hardware driver implementations
//!
//! This crate provides the polled I2C master built on the register
//! interface from kinbus-hal, plus the devices that sit on that bus:
//!
//! - I2C master (start/restart/stop sequencing, bus-lock recovery)
//! - embedded-hal `I2c` adapter over the same master
//! - Sensors (time-of-flight rangefinder)

#![no_std]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod i2c;
pub mod sensor;

pub use i2c::{BusState, I2cMaster, MasterConfig, RecoveryStats, RecoveryWait};
