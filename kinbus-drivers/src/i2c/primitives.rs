//! Transaction primitives
//!
//! Single register mutations with no waiting. Callers sequence them and
//! must own the bus for the whole transaction.

use kinbus_hal::i2c::c1;
use kinbus_hal::{I2cRegisters, Register};

use super::I2cMaster;

impl<R: I2cRegisters> I2cMaster<R> {
    /// Set master mode; a start condition when the module is enabled
    pub(crate) fn master_start(&mut self) {
        self.regs.set_bits(Register::C1, c1::MST);
    }

    /// Clear master mode; a stop condition when the module is enabled
    pub(crate) fn master_stop(&mut self) {
        self.regs.clear_bits(Register::C1, c1::MST);
    }

    pub(crate) fn repeated_start(&mut self) {
        self.regs.set_bits(Register::C1, c1::RSTA);
    }

    pub(crate) fn transmit_mode(&mut self) {
        self.regs.set_bits(Register::C1, c1::TX);
    }

    pub(crate) fn receive_mode(&mut self) {
        self.regs.clear_bits(Register::C1, c1::TX);
    }

    /// ACK received bytes (device keeps sending)
    pub(crate) fn ack(&mut self) {
        self.regs.clear_bits(Register::C1, c1::TXAK);
    }

    /// NACK the next received byte (device stops after it)
    pub(crate) fn nack(&mut self) {
        self.regs.set_bits(Register::C1, c1::TXAK);
    }

    pub(crate) fn enable(&mut self) {
        self.regs.set_bits(Register::C1, c1::IICEN);
    }

    pub(crate) fn disable(&mut self) {
        self.regs.clear_bits(Register::C1, c1::IICEN);
    }

    /// Load the data register; in master transmit mode this clocks it out
    pub(crate) fn transmit(&mut self, byte: u8) {
        trace!("I2C tx {:#x}", byte);
        self.regs.write(Register::D, byte);
    }

    /// Read the data register; in master receive mode this clocks in the
    /// next byte
    pub(crate) fn read_data(&mut self) -> u8 {
        let byte = self.regs.read(Register::D);
        trace!("I2C rx {:#x}", byte);
        byte
    }

    /// Write-one-to-clear status flags
    pub(crate) fn clear_flags(&mut self, mask: u8) {
        self.regs.write(Register::S, mask);
    }
}
