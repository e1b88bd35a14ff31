//! I2C register interface
//!
//! Kinetis-style I2C controllers expose a handful of byte-wide registers.
//! The master driver only ever touches them through [`I2cRegisters`], so a
//! memory-mapped block and a simulated one are interchangeable.

/// Registers of one I2C block that the master driver uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// Frequency divider (MULT + ICR)
    F,
    /// Control register 1
    C1,
    /// Status register
    S,
    /// Data I/O register
    D,
    /// Control register 2
    C2,
}

impl Register {
    /// Byte offset from the start of the register block
    pub const fn offset(self) -> usize {
        match self {
            Register::F => 0x01,
            Register::C1 => 0x02,
            Register::S => 0x03,
            Register::D => 0x04,
            Register::C2 => 0x05,
        }
    }
}

/// Control register 1 bits
pub mod c1 {
    /// Module enable
    pub const IICEN: u8 = 0x80;
    /// Interrupt enable
    pub const IICIE: u8 = 0x40;
    /// Master mode select (0→1 start, 1→0 stop)
    pub const MST: u8 = 0x20;
    /// Transmit mode select
    pub const TX: u8 = 0x10;
    /// Transmit acknowledge disable (1 = NACK)
    pub const TXAK: u8 = 0x08;
    /// Repeat start (write-only, reads as zero)
    pub const RSTA: u8 = 0x04;
}

/// Status register bits
pub mod s {
    /// Transfer complete
    pub const TCF: u8 = 0x80;
    /// Bus busy
    pub const BUSY: u8 = 0x20;
    /// Arbitration lost (write one to clear)
    pub const ARBL: u8 = 0x10;
    /// Interrupt flag, set on byte transfer completion (write one to clear)
    pub const IICIF: u8 = 0x02;
    /// Receive acknowledge (1 = NACK received)
    pub const RXAK: u8 = 0x01;
}

/// Control register 2 bits
pub mod c2 {
    /// High drive select
    pub const HDRS: u8 = 0x20;
}

/// Frequency divider register fields
pub mod f {
    /// Multiplier factor shift (bits 7:6)
    pub const MULT_SHIFT: u8 = 6;
    /// Clock rate field mask (bits 5:0)
    pub const ICR_MASK: u8 = 0x3F;
}

/// Byte-wide access to one I2C register block
///
/// `read` takes `&mut self` because reading the data register has a bus
/// side effect: in master receive mode it starts clocking the next byte.
pub trait I2cRegisters {
    /// Read a register
    fn read(&mut self, reg: Register) -> u8;

    /// Write a register
    fn write(&mut self, reg: Register, value: u8);

    /// Read-modify-write setting `mask`
    ///
    /// Never use this on [`Register::S`]: its flags are write-one-to-clear,
    /// so writing back a read value clears every pending flag.
    fn set_bits(&mut self, reg: Register, mask: u8) {
        let value = self.read(reg);
        self.write(reg, value | mask);
    }

    /// Read-modify-write clearing `mask`
    fn clear_bits(&mut self, reg: Register, mask: u8) {
        let value = self.read(reg);
        self.write(reg, value & !mask);
    }
}

impl<T: I2cRegisters + ?Sized> I2cRegisters for &mut T {
    fn read(&mut self, reg: Register) -> u8 {
        (**self).read(reg)
    }

    fn write(&mut self, reg: Register, value: u8) {
        (**self).write(reg, value)
    }
}

/// SCL divider for each ICR value (KL25Z reference manual, I2C divider table)
const SCL_DIVIDERS: [u16; 64] = [
    20, 22, 24, 26, 28, 30, 34, 40, 28, 32, 36, 40, 44, 48, 56, 68, // 0x00
    48, 56, 64, 72, 80, 88, 104, 128, 80, 96, 112, 128, 144, 160, 192, 240, // 0x10
    160, 192, 224, 256, 288, 320, 384, 480, 320, 384, 448, 512, 576, 640, 768, 960, // 0x20
    640, 768, 896, 1024, 1152, 1280, 1536, 1920, 1280, 1536, 1792, 2048, 2304, 2560, 3072,
    3840, // 0x30
];

/// Encoded frequency divider (F register)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Divider {
    /// Multiplier selector: 0 → ×1, 1 → ×2, 2 → ×4
    pub mult: u8,
    /// Clock rate index into the SCL divider table
    pub icr: u8,
}

impl Divider {
    /// Value to write into the F register
    pub const fn bits(self) -> u8 {
        (self.mult << f::MULT_SHIFT) | (self.icr & f::ICR_MASK)
    }

    /// Resulting SCL frequency for the given bus clock
    pub fn scl_hz(self, bus_clock_hz: u32) -> u32 {
        let mul = 1u32 << self.mult.min(2);
        let div = SCL_DIVIDERS[(self.icr & f::ICR_MASK) as usize] as u32;
        bus_clock_hz / (mul * div)
    }
}

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::FAST
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self { frequency: 400_000 };

    /// Fast mode plus (1 MHz)
    pub const FAST_PLUS: Self = Self {
        frequency: 1_000_000,
    };

    /// Pick the divider giving the fastest SCL that does not exceed
    /// `frequency`
    ///
    /// Falls back to the slowest divider when even that is too fast.
    pub fn divider(&self, bus_clock_hz: u32) -> Divider {
        let mut best: Option<(Divider, u32)> = None;

        for mult in 0..3u8 {
            for icr in 0..SCL_DIVIDERS.len() as u8 {
                let candidate = Divider { mult, icr };
                let hz = candidate.scl_hz(bus_clock_hz);
                if hz > self.frequency {
                    continue;
                }
                match best {
                    Some((_, best_hz)) if best_hz >= hz => {}
                    _ => best = Some((candidate, hz)),
                }
            }
        }

        best.map(|(d, _)| d).unwrap_or(Divider {
            mult: 2,
            icr: f::ICR_MASK,
        })
    }
}
