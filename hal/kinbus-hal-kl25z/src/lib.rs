//! KL25Z backend for the Kinbus I2C register interface
//!
//! Maps [`kinbus_hal::I2cRegisters`] onto the memory-mapped I2C0/I2C1
//! blocks of the NXP KL25Z (Cortex-M0+).
//!
//! # Usage
//!
//! ```ignore
//! kinbus_hal_kl25z::disable_watchdog();
//! let regs = kinbus_hal_kl25z::bring_up(Instance::I2c1).unwrap();
//! let mut bus = I2cMaster::new(regs, MasterConfig::default());
//! bus.init();
//! ```

#![no_std]

pub mod i2c;
pub mod pins;
mod reg;
pub mod sim;

pub use i2c::{bring_up, Instance, Kl25zI2c};
pub use sim::disable_watchdog;
