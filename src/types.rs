//! Channel selectors and unit-carrying value types shared by all drivers.
//!
//! Pure data — no behavior beyond index mapping. Each selector maps to
//! exactly one physical line; `PwmChannel::All` is a fan-out instruction,
//! never a physical address.

/// ADC input channel selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdcChannel {
    Ch0,
    Ch1,
    Ch2,
    Ch3,
}

impl AdcChannel {
    /// All four physical channels, in index order.
    pub const ALL: [AdcChannel; 4] = [Self::Ch0, Self::Ch1, Self::Ch2, Self::Ch3];

    /// Zero-based multiplexer index.
    pub fn index(self) -> usize {
        match self {
            Self::Ch0 => 0,
            Self::Ch1 => 1,
            Self::Ch2 => 2,
            Self::Ch3 => 3,
        }
    }
}

/// PWM output channel selector.
///
/// `All` means "apply to every channel simultaneously" and has no register
/// address of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmChannel {
    Ch1,
    Ch2,
    Ch3,
    Ch4,
    Ch5,
    Ch6,
    Ch7,
    Ch8,
    Ch9,
    Ch10,
    Ch11,
    Ch12,
    Ch13,
    Ch14,
    Ch15,
    Ch16,
    All,
}

/// Number of physical PWM channels on the controller.
pub const PWM_CHANNEL_COUNT: usize = 16;

impl PwmChannel {
    /// Zero-based register index, or `None` for the `All` fan-out variant.
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Ch1 => Some(0),
            Self::Ch2 => Some(1),
            Self::Ch3 => Some(2),
            Self::Ch4 => Some(3),
            Self::Ch5 => Some(4),
            Self::Ch6 => Some(5),
            Self::Ch7 => Some(6),
            Self::Ch8 => Some(7),
            Self::Ch9 => Some(8),
            Self::Ch10 => Some(9),
            Self::Ch11 => Some(10),
            Self::Ch12 => Some(11),
            Self::Ch13 => Some(12),
            Self::Ch14 => Some(13),
            Self::Ch15 => Some(14),
            Self::Ch16 => Some(15),
            Self::All => None,
        }
    }
}

/// User-facing status LED selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserLed {
    Led1,
    Led2,
    Led3,
}

impl UserLed {
    /// All three LEDs, in index order.
    pub const ALL: [UserLed; 3] = [Self::Led1, Self::Led2, Self::Led3];
}

/// One voltage reading per ADC channel, in volts. Index 0 = Ch0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AdcData {
    pub channel: [f32; 4],
}

/// A 3-vector of a single physical quantity in the sensor's mounting
/// frame. Units depend on the producing driver: µT (magnetometer),
/// m/s² (accelerometer), or rad/s (gyroscope). No reprojection is
/// performed by this layer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisData {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}
