//! Kinbus Hardware Abstraction Layer
//!
//! This crate defines the register-level interface the I2C master driver is
//! written against. A chip backend implements [`i2c::I2cRegisters`] once for
//! real hardware; the `mock` feature provides a simulated controller so the
//! driver's sequencing can be tested on the host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  kinbus-drivers (I2C master, sensors)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  kinbus-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ kinbus-hal-   │       │ kinbus_hal::  │
//! │    kl25z      │       │    mock       │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`i2c::I2cRegisters`] - Byte-wide access to one I2C register block

#![no_std]
#![deny(unsafe_code)]

pub mod i2c;
#[cfg(feature = "mock")]
pub mod mock;

// Re-export key types at crate root for convenience
pub use i2c::{Divider, I2cConfig, I2cRegisters, Register};
