//! Navigator board hardware abstraction layer.
//!
//! Peripheral management for the Navigator robotics controller: one
//! serialized multi-drop bus shared by the ADC, barometer, magnetometer,
//! IMU, and PWM controller, plus direct GPIO for the user LEDs and an
//! SPI-driven addressable strip.  All drivers are generic over the
//! transport traits in [`bus`], so the full stack runs against mock
//! transports on the host; the real Raspberry Pi backend lives behind
//! the `linux-hal` feature.

#![deny(unused_must_use)]

pub mod bus;
pub mod drivers;
pub mod error;
pub mod navigator;
pub mod pins;
pub mod sensors;
pub mod types;

#[cfg(feature = "linux-hal")]
pub mod board;

pub use error::{BusError, Error, Result};
pub use navigator::Navigator;
pub use types::{AdcChannel, AdcData, AxisData, PwmChannel, UserLed};

#[cfg(feature = "linux-hal")]
pub use board::{LinuxNavigator, open_default};
