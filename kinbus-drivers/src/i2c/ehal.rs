//! `embedded-hal` I2C support
//!
//! Lets generic device drivers run on top of [`I2cMaster`]. Bus locks are
//! still recovered internally, so the error type is [`Infallible`]: a
//! transaction that hit a lock completes with whatever the bus returned.

use core::convert::Infallible;

use embedded_hal::i2c::{ErrorType, I2c, Operation, SevenBitAddress};
use kinbus_hal::I2cRegisters;

use super::master::{read_header, write_header};
use super::{BusState, I2cMaster};

impl<R: I2cRegisters> ErrorType for I2cMaster<R> {
    type Error = Infallible;
}

impl<R: I2cRegisters> I2c<SevenBitAddress> for I2cMaster<R> {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut owned = false;
        // A read run that is followed by more operations issues the restart
        // itself, before its final data register read
        let mut restarted = false;
        let mut pending_stop = false;

        let mut index = 0;
        while index < operations.len() {
            let reading = matches!(operations[index], Operation::Read(_));
            let end = run_end(operations, index);

            if reading {
                let len = read_len(&operations[index..end]);
                if len == 0 {
                    index = end;
                    continue;
                }
                let more = operations[end..].iter().any(has_bus_activity);

                self.open_run(&mut owned, &mut restarted);
                self.transmit(read_header(address));
                self.wait_for_completion();
                self.read_run(&mut operations[index..end], len, more);

                restarted = more;
                pending_stop = false;
            } else {
                self.open_run(&mut owned, &mut restarted);
                self.transmit(write_header(address));
                self.wait_for_completion();

                self.state = BusState::DataPhase;
                for op in operations[index..end].iter() {
                    if let Operation::Write(bytes) = op {
                        for &byte in bytes.iter() {
                            self.transmit(byte);
                            self.wait_for_completion();
                        }
                    }
                }
                pending_stop = true;
            }

            index = end;
        }

        if pending_stop {
            self.stop();
        }

        Ok(())
    }
}

impl<R: I2cRegisters> I2cMaster<R> {
    /// Start or restart for the next run of operations
    fn open_run(&mut self, owned: &mut bool, restarted: &mut bool) {
        if !*owned {
            self.start();
            *owned = true;
        } else if !*restarted {
            self.repeated_start();
        }
        *restarted = false;
        self.state = BusState::AddressPhase;
    }

    /// Receive `len` bytes into the read buffers of `ops`
    ///
    /// The last byte is NACKed. The stop (or restart, when `more` follows)
    /// goes out before its data register read, so that read does not clock
    /// in another byte.
    fn read_run(&mut self, ops: &mut [Operation<'_>], len: usize, more: bool) {
        self.receive_mode();
        self.state = BusState::ReceivePhase;
        if len == 1 {
            self.nack();
        } else {
            self.ack();
        }
        let _ = self.read_data();

        let mut remaining = len;
        for op in ops.iter_mut() {
            let Operation::Read(buffer) = op else {
                continue;
            };
            for slot in buffer.iter_mut() {
                self.wait_for_completion();
                remaining -= 1;

                if remaining == 0 {
                    if more {
                        self.transmit_mode();
                        self.repeated_start();
                        self.state = BusState::AddressPhase;
                    } else {
                        self.stop();
                    }
                } else if remaining == 1 {
                    self.nack();
                }

                *slot = self.read_data();
            }
        }
    }
}

/// One past the last operation of the same kind as `operations[start]`
fn run_end(operations: &[Operation<'_>], start: usize) -> usize {
    let reading = matches!(operations[start], Operation::Read(_));
    operations[start..]
        .iter()
        .position(|op| matches!(op, Operation::Read(_)) != reading)
        .map_or(operations.len(), |offset| start + offset)
}

fn read_len(run: &[Operation<'_>]) -> usize {
    run.iter()
        .map(|op| match op {
            Operation::Read(buffer) => buffer.len(),
            Operation::Write(_) => 0,
        })
        .sum()
}

/// Empty reads are skipped; empty writes still address the device
fn has_bus_activity(op: &Operation<'_>) -> bool {
    match op {
        Operation::Read(buffer) => !buffer.is_empty(),
        Operation::Write(_) => true,
    }
}
