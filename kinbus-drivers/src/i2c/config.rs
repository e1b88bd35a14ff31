//! Master configuration

use kinbus_hal::{Divider, I2cConfig};

/// Completion polls before the bus is declared locked
pub const DEFAULT_LOCK_BOUND: u32 = 200;

/// KL25Z bus clock with the default 48 MHz core clock
pub const DEFAULT_BUS_CLOCK_HZ: u32 = 24_000_000;

/// How long recovery waits for the bus-clear byte to complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecoveryWait {
    /// Poll until the byte completes; a permanently stuck bus hangs here
    Unbounded,
    /// Give up after this many polls and re-arm the controller anyway
    Bounded(u32),
}

/// I2C master configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MasterConfig {
    /// Completion polls before recovery kicks in
    pub lock_bound: u32,
    /// Bus-clear wait policy during recovery
    pub recovery_wait: RecoveryWait,
    /// Target bus speed
    pub bus: I2cConfig,
    /// Peripheral bus clock feeding the I2C block (Hz)
    pub bus_clock_hz: u32,
    /// Explicit F register value, overriding the one computed from `bus`
    pub divider: Option<Divider>,
    /// Enable high drive on the pins (C2.HDRS)
    pub high_drive: bool,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            lock_bound: DEFAULT_LOCK_BOUND,
            recovery_wait: RecoveryWait::Unbounded,
            bus: I2cConfig::FAST,
            bus_clock_hz: DEFAULT_BUS_CLOCK_HZ,
            divider: None,
            high_drive: true,
        }
    }
}

impl MasterConfig {
    /// Completion polls before a wait is treated as a bus lock
    #[must_use]
    pub fn with_lock_bound(mut self, polls: u32) -> Self {
        self.lock_bound = polls;
        self
    }

    /// How long recovery waits for the bus-clear byte
    #[must_use]
    pub fn with_recovery_wait(mut self, wait: RecoveryWait) -> Self {
        self.recovery_wait = wait;
        self
    }

    /// Target bus speed, used unless a divider is set
    #[must_use]
    pub fn with_bus(mut self, bus: I2cConfig) -> Self {
        self.bus = bus;
        self
    }

    /// Bus clock feeding the I2C block, in Hz
    #[must_use]
    pub fn with_bus_clock(mut self, hz: u32) -> Self {
        self.bus_clock_hz = hz;
        self
    }

    /// Program this F register value instead of computing one
    #[must_use]
    pub fn with_divider(mut self, divider: Divider) -> Self {
        self.divider = Some(divider);
        self
    }

    /// Enable or disable high drive on the pins
    #[must_use]
    pub fn with_high_drive(mut self, enabled: bool) -> Self {
        self.high_drive = enabled;
        self
    }

    /// F register setting to program at init
    pub fn divider(&self) -> Divider {
        self.divider
            .unwrap_or_else(|| self.bus.divider(self.bus_clock_hz))
    }
}
