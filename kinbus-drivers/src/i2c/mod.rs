//! Polled I2C master
//!
//! Blocking, byte-oriented master for Kinetis-style I2C controllers. Every
//! byte on the bus is followed by a bounded poll of the completion flag; a
//! poll that runs out triggers the bus-clear recovery sequence and the
//! operation carries on as if nothing happened.
//!
//! # Operations
//!
//! - [`I2cMaster::write_byte`] - write one register
//! - [`I2cMaster::read_byte`] - read one register
//! - [`I2cMaster::read_setup`] + [`I2cMaster::repeated_read`] - sequential read
//!
//! There is no internal locking. Each operation takes `&mut self`, so one
//! driver instance can only ever have one transaction in flight; sharing the
//! bus between tasks needs an outer mutex or a single owning task.

mod config;
mod ehal;
mod master;
mod monitor;
mod primitives;
mod recovery;

pub use config::{MasterConfig, RecoveryWait, DEFAULT_BUS_CLOCK_HZ, DEFAULT_LOCK_BOUND};
pub use master::I2cMaster;

/// Where the driver is within a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusState {
    /// No transaction in flight
    Idle,
    /// Start issued, sending the address header
    AddressPhase,
    /// Sending register or payload bytes
    DataPhase,
    /// Controller switched to receive mode
    ReceivePhase,
    /// Completion poll ran out; bus recovery in progress
    Locked,
}

/// Bus recovery counters
///
/// Recovery is otherwise invisible to callers; these counters are the only
/// trace it leaves. Both saturate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RecoveryStats {
    /// Recovery sequences run
    pub recoveries: u32,
    /// Recoveries whose bus-clear wait gave up (bounded wait only)
    pub abandoned: u32,
}
