//! Memory-mapped I2C controller

use core::cell::Cell;
use core::ptr;

use cortex_m::interrupt::{self, Mutex};
use kinbus_hal::{I2cRegisters, Register};

use crate::pins::PinMux;
use crate::sim::{self, scgc4};

/// I2C controller on the KL25Z
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Instance {
    I2c0,
    I2c1,
}

impl Instance {
    /// Register block base address
    pub const fn base(self) -> usize {
        match self {
            Instance::I2c0 => 0x4006_6000,
            Instance::I2c1 => 0x4006_7000,
        }
    }

    /// SCGC4 clock gate bit
    pub const fn clock_gate(self) -> u32 {
        match self {
            Instance::I2c0 => scgc4::I2C0,
            Instance::I2c1 => scgc4::I2C1,
        }
    }

    const fn index(self) -> usize {
        match self {
            Instance::I2c0 => 0,
            Instance::I2c1 => 1,
        }
    }
}

static TAKEN: Mutex<Cell<[bool; 2]>> = Mutex::new(Cell::new([false; 2]));

/// Claim an I2C controller, gate its clocks and mux its pins
///
/// Returns `None` if the instance was already claimed. The controller itself
/// is left disabled; `I2cMaster::init` programs and enables it.
pub fn bring_up(instance: Instance) -> Option<Kl25zI2c> {
    interrupt::free(|cs| {
        let taken = TAKEN.borrow(cs);
        let mut claimed = taken.get();
        if claimed[instance.index()] {
            return None;
        }
        claimed[instance.index()] = true;
        taken.set(claimed);

        let mux = PinMux::for_instance(instance);
        sim::gate_clocks(instance, mux.port);
        mux.route();
        Some(Kl25zI2c {
            base: instance.base(),
        })
    })
}

/// Register access for one claimed I2C controller
#[derive(Debug)]
pub struct Kl25zI2c {
    base: usize,
}

impl Kl25zI2c {
    fn address(&self, reg: Register) -> *mut u8 {
        (self.base + reg.offset()) as *mut u8
    }
}

impl I2cRegisters for Kl25zI2c {
    fn read(&mut self, reg: Register) -> u8 {
        // SAFETY: `base` is a real I2C block and this handle is its only
        // owner (see `bring_up`)
        unsafe { ptr::read_volatile(self.address(reg)) }
    }

    fn write(&mut self, reg: Register, value: u8) {
        // SAFETY: as for `read`
        unsafe { ptr::write_volatile(self.address(reg), value) }
    }
}
