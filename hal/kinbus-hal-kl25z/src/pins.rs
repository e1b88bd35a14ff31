//! Pin mux for the I2C controllers

use crate::i2c::Instance;
use crate::reg;
use crate::sim::scgc5;

/// Pin control register MUX field (bits 10:8)
pub const PCR_MUX_SHIFT: u32 = 8;
pub const PCR_MUX_MASK: u32 = 0x7 << PCR_MUX_SHIFT;

/// GPIO port owning an I2C pin pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    B,
    E,
}

impl Port {
    /// PORTx register block base
    pub const fn base(self) -> usize {
        match self {
            Port::B => 0x4004_A000,
            Port::E => 0x4004_D000,
        }
    }

    /// SCGC5 clock gate bit
    pub const fn clock_gate(self) -> u32 {
        match self {
            Port::B => scgc5::PORTB,
            Port::E => scgc5::PORTE,
        }
    }

    /// Address of PCRn
    pub const fn pcr(self, pin: u8) -> usize {
        self.base() + 4 * pin as usize
    }
}

/// Pin assignment for one I2C controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinMux {
    pub port: Port,
    pub scl: u8,
    pub sda: u8,
    /// Alternate function selecting the I2C signals
    pub alt: u8,
}

impl PinMux {
    pub const fn for_instance(instance: Instance) -> Self {
        match instance {
            Instance::I2c0 => Self {
                port: Port::B,
                scl: 0,
                sda: 1,
                alt: 2,
            },
            Instance::I2c1 => Self {
                port: Port::E,
                scl: 1,
                sda: 0,
                alt: 6,
            },
        }
    }

    /// Switch both pins to the I2C function
    ///
    /// The port clock must already be gated on.
    pub(crate) fn route(&self) {
        // SAFETY: PCR addresses derived from a fixed port base; each pin's
        // PCR belongs to this controller once claimed
        unsafe {
            reg::modify(self.port.pcr(self.scl), |v| with_mux(v, self.alt));
            reg::modify(self.port.pcr(self.sda), |v| with_mux(v, self.alt));
        }
    }
}

/// Replace the MUX field of a PCR value, keeping the other bits
pub const fn with_mux(pcr: u32, alt: u8) -> u32 {
    (pcr & !PCR_MUX_MASK) | (((alt as u32) << PCR_MUX_SHIFT) & PCR_MUX_MASK)
}
