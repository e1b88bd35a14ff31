//! Raw 32-bit register access

use core::ptr;

/// Volatile write
///
/// # Safety
///
/// `addr` must be a valid, aligned peripheral register.
pub(crate) unsafe fn write(addr: usize, value: u32) {
    ptr::write_volatile(addr as *mut u32, value);
}

/// Volatile read-modify-write
///
/// # Safety
///
/// `addr` must be a valid, aligned peripheral register, and nothing else may
/// modify it concurrently.
pub(crate) unsafe fn modify(addr: usize, f: impl FnOnce(u32) -> u32) {
    let reg = addr as *mut u32;
    ptr::write_volatile(reg, f(ptr::read_volatile(reg)));
}
