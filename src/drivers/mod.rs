//! Actuator drivers: PWM controller, discrete LEDs, addressable strip.

pub mod leds;
pub mod neopixel;
pub mod pca9685;
