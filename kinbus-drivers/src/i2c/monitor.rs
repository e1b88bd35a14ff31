//! Transfer completion monitor
//!
//! The lock bound is a poll count, not a time: how long 200 polls take
//! depends on the core clock and the register backend.

use kinbus_hal::i2c::s;
use kinbus_hal::{I2cRegisters, Register};

use super::I2cMaster;

impl<R: I2cRegisters> I2cMaster<R> {
    /// Wait for the current byte to finish
    ///
    /// Polls `S.IICIF`, counting misses. Once the count reaches the lock
    /// bound the bus is treated as locked and recovered, even if the flag
    /// shows up on the poll that ends the loop. The completion flag is
    /// cleared on the way out either way.
    pub(crate) fn wait_for_completion(&mut self) {
        self.lock_count = 0;

        while !self.transfer_complete() && self.lock_count < self.config.lock_bound {
            self.lock_count += 1;
        }

        if self.lock_count >= self.config.lock_bound {
            self.lock_detected = true;
            warn!(
                "I2C bus lock after {} polls in {:?}, recovering",
                self.lock_count,
                self.state
            );
            self.recover_bus();
        }

        self.clear_flags(s::IICIF);
    }

    pub(crate) fn transfer_complete(&mut self) -> bool {
        self.regs.read(Register::S) & s::IICIF != 0
    }
}
