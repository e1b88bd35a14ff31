//! Busy-wait delay on core cycles

use embedded_hal::delay::DelayNs;

/// Cycle-counting delay; accurate only while the core clock is `core_hz`
pub struct CycleDelay {
    core_hz: u32,
}

impl CycleDelay {
    pub const fn new(core_hz: u32) -> Self {
        Self { core_hz }
    }
}

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = u64::from(ns) * u64::from(self.core_hz) / 1_000_000_000;
        cortex_m::asm::delay(cycles.min(u64::from(u32::MAX)) as u32);
    }
}
