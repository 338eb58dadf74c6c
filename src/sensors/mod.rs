//! Sensor chip drivers.
//!
//! Each driver is stateless beyond its bus handle (the BMP280 caches the
//! factory calibration block, which the hardware also holds) and returns
//! either a complete, correctly-scaled reading or an explicit failure —
//! never a partial value.

pub mod ads1115;
pub mod ak09915;
pub mod bmp280;
pub mod icm20689;
