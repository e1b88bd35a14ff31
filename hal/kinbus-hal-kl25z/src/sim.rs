//! System integration module: clock gates and the COP watchdog

use crate::i2c::Instance;
use crate::pins::Port;
use crate::reg;

/// System clock gating control register 4 (peripheral clocks)
const SCGC4: usize = 0x4004_8034;
/// System clock gating control register 5 (port clocks)
const SCGC5: usize = 0x4004_8038;
/// COP (watchdog) control register
const COPC: usize = 0x4004_8100;

pub mod scgc4 {
    pub const I2C0: u32 = 1 << 6;
    pub const I2C1: u32 = 1 << 7;
}

pub mod scgc5 {
    pub const PORTB: u32 = 1 << 10;
    pub const PORTE: u32 = 1 << 13;
}

/// Gate on the clocks for an I2C controller and the port carrying its pins
///
/// Call from inside a critical section: SCGC4/SCGC5 are shared with every
/// other peripheral.
pub(crate) fn gate_clocks(instance: Instance, port: Port) {
    // SAFETY: fixed SIM addresses on this part, caller holds a critical
    // section
    unsafe {
        reg::modify(SCGC4, |v| v | instance.clock_gate());
        reg::modify(SCGC5, |v| v | port.clock_gate());
    }
}

/// Turn off the COP watchdog
///
/// The COP is armed out of reset with a ~1 s timeout and COPC is
/// write-once, so this has to run early and only once.
pub fn disable_watchdog() {
    // SAFETY: COPC is a valid SIM register; writing zero only disables the
    // watchdog
    unsafe { reg::write(COPC, 0) }
}
