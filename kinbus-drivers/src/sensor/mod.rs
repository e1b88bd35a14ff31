//! Devices on the I2C bus

mod rangefinder;

pub use rangefinder::Rangefinder;
