//! Simulated I2C controller for host testing
//!
//! [`MockRegisters`] behaves like a Kinetis I2C block wired to a single
//! register-file device:
//!
//! - Setting `C1.MST` while enabled generates a start, clearing it a stop.
//! - Writing `C1.RSTA` while master generates a repeated start.
//! - Writing `D` in master transmit mode clocks a byte out.
//! - Reading `D` in master receive mode returns the current contents and
//!   starts clocking the next byte in.
//! - Every completed byte sets `S.IICIF`; `S` flags are write-one-to-clear.
//!
//! The device answers at one 7-bit address. After a write header the first
//! byte sets its register pointer and further bytes are stored there
//! (auto-incrementing); after a read header it returns bytes from the
//! pointer onwards.
//!
//! Bus faults are injected with [`MockRegisters::stall_transfer`] (the slave
//! holds SDA until the controller is reset and clocks the bus) and
//! [`MockRegisters::jam_bus`] (nothing ever completes again).

use heapless::Vec;

use crate::i2c::{c1, s, I2cRegisters, Register};

/// Maximum number of recorded events
pub const EVENT_CAPACITY: usize = 512;

/// Observable bus and controller activity, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusEvent {
    /// Controller enabled (`C1.IICEN` 0→1)
    Enable,
    /// Controller disabled (`C1.IICEN` 1→0)
    Disable,
    /// Start condition
    Start,
    /// Repeated start condition
    RepeatedStart,
    /// Stop condition
    Stop,
    /// Switched to transmit mode
    TransmitMode,
    /// Switched to receive mode
    ReceiveMode,
    /// Acknowledge enabled for received bytes (`C1.TXAK` 1→0)
    Ack,
    /// Not-acknowledge selected for received bytes (`C1.TXAK` 0→1)
    Nack,
    /// Byte written to the data register
    Transmit(u8),
    /// Data register read, with the value returned
    DataRead(u8),
    /// Status flags written (write-one-to-clear)
    ClearFlags(u8),
}

/// Device-side protocol position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No transaction addressed to anyone
    Idle,
    /// Next transmitted byte is an address header
    Header,
    /// Addressed for write, waiting for the register pointer
    Pointer,
    /// Addressed for write, storing data
    Write,
    /// Addressed for read, supplying data
    Read,
    /// Header did not match, bus ignored until next start
    NotAddressed,
}

/// Injected bus fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    None,
    /// Slave is holding SDA low; `released` once the controller was reset
    Held { released: bool },
    /// Bus never completes another transfer
    Jammed,
}

/// Simulated I2C block with one attached device
pub struct MockRegisters {
    f: u8,
    c1: u8,
    status: u8,
    data: u8,
    c2: u8,
    device_address: u8,
    memory: [u8; 256],
    pointer: u8,
    phase: Phase,
    fault: Fault,
    /// Transfers left before the injected stall fires
    stall_countdown: Option<u32>,
    transfers: u32,
    status_reads: u32,
    events: Vec<BusEvent, EVENT_CAPACITY>,
}

impl MockRegisters {
    /// Create a mock with a device at the given 7-bit address
    ///
    /// Device memory starts zeroed.
    pub fn new(device_address: u8) -> Self {
        Self {
            f: 0,
            c1: 0,
            status: 0,
            data: 0,
            c2: 0,
            device_address: device_address & 0x7F,
            memory: [0; 256],
            pointer: 0,
            phase: Phase::Idle,
            fault: Fault::None,
            stall_countdown: None,
            transfers: 0,
            status_reads: 0,
            events: Vec::new(),
        }
    }

    /// Builder: preload device memory starting at `register`
    pub fn with_memory(mut self, register: u8, bytes: &[u8]) -> Self {
        let mut reg = register;
        for &b in bytes {
            self.memory[reg as usize] = b;
            reg = reg.wrapping_add(1);
        }
        self
    }

    /// Device register contents
    pub fn memory(&self, register: u8) -> u8 {
        self.memory[register as usize]
    }

    /// Make the `n`th byte transfer from now (1-based) hang
    ///
    /// The slave keeps SDA low until the controller is disabled and the bus
    /// is clocked again; that clocking transfer then completes and releases
    /// the bus.
    pub fn stall_transfer(&mut self, n: u32) {
        self.stall_countdown = Some(n.max(1));
    }

    /// Make every transfer from now on hang forever
    pub fn jam_bus(&mut self) {
        self.fault = Fault::Jammed;
    }

    /// Recorded events, oldest first
    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    /// Forget recorded events
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Number of times `event` was recorded
    pub fn count(&self, event: BusEvent) -> usize {
        self.events.iter().filter(|e| **e == event).count()
    }

    /// Bytes written to the data register, in order
    pub fn transmitted(&self) -> Vec<u8, EVENT_CAPACITY> {
        self.events
            .iter()
            .filter_map(|e| match e {
                BusEvent::Transmit(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    /// Current C1 contents
    pub fn control(&self) -> u8 {
        self.c1
    }

    /// Current S contents
    pub fn status(&self) -> u8 {
        self.status
    }

    /// Current F contents
    pub fn frequency_divider(&self) -> u8 {
        self.f
    }

    /// Current C2 contents
    pub fn control2(&self) -> u8 {
        self.c2
    }

    /// Number of byte transfers started
    pub fn transfers(&self) -> u32 {
        self.transfers
    }

    /// Number of status register reads (completion polls)
    pub fn status_reads(&self) -> u32 {
        self.status_reads
    }

    fn record(&mut self, event: BusEvent) {
        if self.events.push(event).is_err() {
            panic!("mock event log full ({} events), clear it between steps", EVENT_CAPACITY);
        }
    }

    fn master(&self) -> bool {
        self.c1 & (c1::IICEN | c1::MST) == (c1::IICEN | c1::MST)
    }

    fn write_control(&mut self, value: u8) {
        let old = self.c1;
        let rose = |bit: u8| old & bit == 0 && value & bit != 0;
        let fell = |bit: u8| old & bit != 0 && value & bit == 0;

        if fell(c1::IICEN) {
            self.record(BusEvent::Disable);
            self.phase = Phase::Idle;
            if let Fault::Held { .. } = self.fault {
                self.fault = Fault::Held { released: true };
            }
        }
        if rose(c1::IICEN) {
            self.record(BusEvent::Enable);
        }

        // Start/stop only reach the bus while the module is enabled
        let live = old & c1::IICEN != 0 && value & c1::IICEN != 0;
        if live && rose(c1::MST) {
            self.record(BusEvent::Start);
            self.phase = Phase::Header;
        }
        if live && fell(c1::MST) {
            self.record(BusEvent::Stop);
            self.phase = Phase::Idle;
        }
        if live && value & c1::MST != 0 && old & c1::MST != 0 && value & c1::RSTA != 0 {
            self.record(BusEvent::RepeatedStart);
            self.phase = Phase::Header;
        }

        if rose(c1::TX) {
            self.record(BusEvent::TransmitMode);
        }
        if fell(c1::TX) {
            self.record(BusEvent::ReceiveMode);
        }
        if rose(c1::TXAK) {
            self.record(BusEvent::Nack);
        }
        if fell(c1::TXAK) {
            self.record(BusEvent::Ack);
        }

        self.c1 = value & !c1::RSTA;
    }

    /// Clock one byte; `Some` when transmitting, `None` when receiving
    fn transfer(&mut self, outgoing: Option<u8>) {
        self.transfers += 1;

        match self.fault {
            Fault::Jammed | Fault::Held { released: false } => return,
            Fault::Held { released: true } => {
                // Bus-clear clocking: slave lets go of SDA
                self.fault = Fault::None;
                self.phase = Phase::Idle;
                self.status |= s::IICIF;
                return;
            }
            Fault::None => {}
        }

        if let Some(n) = self.stall_countdown {
            if n <= 1 {
                self.stall_countdown = None;
                self.fault = Fault::Held { released: false };
                return;
            }
            self.stall_countdown = Some(n - 1);
        }

        match outgoing {
            Some(byte) => self.device_receive(byte),
            None => {
                self.data = if self.phase == Phase::Read {
                    let value = self.memory[self.pointer as usize];
                    self.pointer = self.pointer.wrapping_add(1);
                    value
                } else {
                    // Nobody drives SDA
                    0xFF
                };
            }
        }

        self.status |= s::IICIF;
    }

    fn device_receive(&mut self, byte: u8) {
        let mut acked = true;

        match self.phase {
            Phase::Header => {
                if byte >> 1 == self.device_address {
                    self.phase = if byte & 1 != 0 {
                        Phase::Read
                    } else {
                        Phase::Pointer
                    };
                } else {
                    self.phase = Phase::NotAddressed;
                    acked = false;
                }
            }
            Phase::Pointer => {
                self.pointer = byte;
                self.phase = Phase::Write;
            }
            Phase::Write => {
                self.memory[self.pointer as usize] = byte;
                self.pointer = self.pointer.wrapping_add(1);
            }
            Phase::Idle | Phase::Read | Phase::NotAddressed => acked = false,
        }

        if acked {
            self.status &= !s::RXAK;
        } else {
            self.status |= s::RXAK;
        }
    }
}

impl I2cRegisters for MockRegisters {
    fn read(&mut self, reg: Register) -> u8 {
        match reg {
            Register::F => self.f,
            Register::C1 => self.c1,
            Register::C2 => self.c2,
            Register::S => {
                self.status_reads += 1;
                self.status
            }
            Register::D => {
                let value = self.data;
                self.record(BusEvent::DataRead(value));
                if self.master() && self.c1 & c1::TX == 0 {
                    self.transfer(None);
                }
                value
            }
        }
    }

    fn write(&mut self, reg: Register, value: u8) {
        match reg {
            Register::F => self.f = value,
            Register::C2 => self.c2 = value,
            Register::C1 => self.write_control(value),
            Register::S => {
                self.record(BusEvent::ClearFlags(value));
                self.status &= !(value & (s::IICIF | s::ARBL));
            }
            Register::D => {
                self.record(BusEvent::Transmit(value));
                self.data = value;
                if self.master() && self.c1 & c1::TX != 0 {
                    self.transfer(Some(value));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_mock() -> MockRegisters {
        let mut mock = MockRegisters::new(0x20);
        mock.write(Register::C1, c1::IICEN);
        mock.clear_events();
        mock
    }

    #[test]
    fn test_start_and_stop_edges() {
        let mut mock = enabled_mock();

        mock.set_bits(Register::C1, c1::TX);
        mock.set_bits(Register::C1, c1::MST);
        mock.clear_bits(Register::C1, c1::MST);

        assert_eq!(
            mock.events(),
            &[BusEvent::TransmitMode, BusEvent::Start, BusEvent::Stop]
        );
    }

    #[test]
    fn test_master_edges_ignored_while_disabled() {
        let mut mock = MockRegisters::new(0x20);

        mock.set_bits(Register::C1, c1::MST);
        mock.clear_bits(Register::C1, c1::MST);

        assert_eq!(mock.count(BusEvent::Start), 0);
        assert_eq!(mock.count(BusEvent::Stop), 0);
    }

    #[test]
    fn test_repeated_start_bit_reads_as_zero() {
        let mut mock = enabled_mock();
        mock.set_bits(Register::C1, c1::TX | c1::MST);
        mock.set_bits(Register::C1, c1::RSTA);

        assert_eq!(mock.count(BusEvent::RepeatedStart), 1);
        assert_eq!(mock.read(Register::C1) & c1::RSTA, 0);
    }

    #[test]
    fn test_write_transaction_stores_bytes() {
        let mut mock = enabled_mock();
        mock.set_bits(Register::C1, c1::TX | c1::MST);

        mock.write(Register::D, 0x40);
        assert_ne!(mock.status() & s::IICIF, 0);
        assert_eq!(mock.status() & s::RXAK, 0);
        mock.write(Register::S, s::IICIF);
        assert_eq!(mock.status() & s::IICIF, 0);

        mock.write(Register::D, 0x10);
        mock.write(Register::D, 0xAA);
        mock.write(Register::D, 0xBB);

        assert_eq!(mock.memory(0x10), 0xAA);
        assert_eq!(mock.memory(0x11), 0xBB);
        assert_eq!(mock.transfers(), 4);
    }

    #[test]
    fn test_wrong_address_is_nacked() {
        let mut mock = enabled_mock();
        mock.set_bits(Register::C1, c1::TX | c1::MST);

        mock.write(Register::D, 0x42);
        assert_ne!(mock.status() & s::RXAK, 0);
        // The byte still completes
        assert_ne!(mock.status() & s::IICIF, 0);
    }

    #[test]
    fn test_receive_read_starts_next_byte() {
        let mut mock = enabled_mock().with_memory(0x00, &[0x11, 0x22]);
        mock.set_bits(Register::C1, c1::TX | c1::MST);
        mock.write(Register::D, 0x40);
        mock.write(Register::D, 0x00);
        mock.set_bits(Register::C1, c1::RSTA);
        mock.write(Register::D, 0x41);
        mock.clear_bits(Register::C1, c1::TX);

        // Returns the stale header, clocks in 0x11
        assert_eq!(mock.read(Register::D), 0x41);
        // Returns 0x11, clocks in 0x22
        assert_eq!(mock.read(Register::D), 0x11);
        mock.clear_bits(Register::C1, c1::MST);
        // Not master any more: no further clocking
        assert_eq!(mock.read(Register::D), 0x22);
        assert_eq!(mock.read(Register::D), 0x22);
    }

    #[test]
    fn test_flags_are_write_one_to_clear() {
        let mut mock = enabled_mock();
        mock.status = s::IICIF | s::ARBL | s::RXAK;

        mock.write(Register::S, s::ARBL);
        assert_eq!(mock.status(), s::IICIF | s::RXAK);
    }

    #[test]
    #[should_panic(expected = "event log full")]
    fn test_event_log_overflow_panics() {
        let mut mock = enabled_mock();
        for _ in 0..=EVENT_CAPACITY {
            mock.write(Register::S, s::IICIF);
        }
    }

    #[test]
    fn test_event_log_holds_full_capacity() {
        let mut mock = enabled_mock();
        for _ in 0..EVENT_CAPACITY {
            mock.write(Register::S, s::IICIF);
        }
        assert_eq!(mock.events().len(), EVENT_CAPACITY);
    }

    #[test]
    fn test_stalled_transfer_released_by_reset_and_clocking() {
        let mut mock = enabled_mock();
        mock.set_bits(Register::C1, c1::TX | c1::MST);
        mock.stall_transfer(1);

        mock.write(Register::D, 0x40);
        assert_eq!(mock.status() & s::IICIF, 0);

        // Still held without a reset
        mock.write(Register::D, 0xFF);
        assert_eq!(mock.status() & s::IICIF, 0);

        mock.clear_bits(Register::C1, c1::IICEN);
        mock.set_bits(Register::C1, c1::IICEN);
        mock.write(Register::D, 0xFF);
        assert_ne!(mock.status() & s::IICIF, 0);
    }

    #[test]
    fn test_jammed_bus_never_completes() {
        let mut mock = enabled_mock();
        mock.set_bits(Register::C1, c1::TX | c1::MST);
        mock.jam_bus();

        mock.clear_bits(Register::C1, c1::IICEN);
        mock.set_bits(Register::C1, c1::IICEN);
        mock.write(Register::D, 0xFF);
        assert_eq!(mock.status() & s::IICIF, 0);
    }

    #[test]
    fn test_status_reads_are_counted() {
        let mut mock = enabled_mock();
        for _ in 0..5 {
            mock.read(Register::S);
        }
        assert_eq!(mock.status_reads(), 5);
    }
}
