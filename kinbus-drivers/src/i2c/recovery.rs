//! Bus recovery sequencer
//!
//! A slave that lost track of a transfer (master reset mid-byte, noise on
//! SCL) can sit holding SDA low forever, waiting for clocks that never come.
//! Recovery resets the controller, clocks out an all-ones byte so the slave
//! can finish whatever it was shifting and let go of SDA, then resets the
//! controller again so the next transaction starts from idle.
//!
//! With [`RecoveryWait::Unbounded`] a bus that stays stuck through the
//! clock-out hangs here.

use kinbus_hal::i2c::s;
use kinbus_hal::I2cRegisters;

use super::{BusState, I2cMaster, RecoveryWait};

/// Nine SCL pulses (eight data bits plus the ACK slot) with SDA released
const BUS_CLEAR_BYTE: u8 = 0xFF;

impl<R: I2cRegisters> I2cMaster<R> {
    /// Run the bus-clear sequence and return to idle
    ///
    /// Only called from the completion monitor once its bound is reached.
    pub(crate) fn recover_bus(&mut self) {
        self.state = BusState::Locked;

        // Reset, then come back up as transmitting master
        self.disable();
        self.transmit_mode();
        self.master_start();
        self.enable();
        self.master_start();
        self.transmit_mode();

        self.transmit(BUS_CLEAR_BYTE);
        let released = self.wait_for_bus_clear();

        self.clear_flags(s::IICIF);
        self.clear_flags(s::ARBL);

        self.disable();
        self.transmit_mode();
        self.master_start();
        self.enable();

        // Drop master mode while disabled: no stop reaches the bus, the
        // controller just forgets the transaction
        self.disable();
        self.master_start();
        self.master_stop();
        self.receive_mode();
        self.enable();

        self.clear_flags(s::IICIF);
        self.clear_flags(s::ARBL);

        self.lock_count = 0;
        self.lock_detected = false;
        self.state = BusState::Idle;

        self.stats.recoveries = self.stats.recoveries.saturating_add(1);
        if released {
            debug!("I2C bus recovered ({} total)", self.stats.recoveries);
        } else {
            self.stats.abandoned = self.stats.abandoned.saturating_add(1);
            error!(
                "I2C bus still stuck after clock-out ({} abandoned)",
                self.stats.abandoned
            );
        }
    }

    /// Wait for the clock-out byte; `false` if a bounded wait ran out
    fn wait_for_bus_clear(&mut self) -> bool {
        match self.config.recovery_wait {
            RecoveryWait::Unbounded => {
                while !self.transfer_complete() {
                    core::hint::spin_loop();
                }
                true
            }
            RecoveryWait::Bounded(limit) => {
                let mut polls = 0u32;
                while !self.transfer_complete() {
                    if polls >= limit {
                        return false;
                    }
                    polls += 1;
                }
                true
            }
        }
    }
}
