//! Bus paths, device addresses, and GPIO line assignments for the
//! Navigator board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding addresses.  Change an assignment here and it propagates
//! everywhere.

// ---------------------------------------------------------------------------
// Buses
// ---------------------------------------------------------------------------

/// Multi-drop I2C bus shared by all sensors and the PWM controller.
pub const I2C_BUS_PATH: &str = "/dev/i2c-1";

/// SPI device backing the single-wire addressable LED strip.
pub const NEOPIXEL_SPI_PATH: &str = "/dev/spidev0.0";

/// SPI clock for the WS2812 byte-per-bit encoding (see `drivers::neopixel`).
pub const NEOPIXEL_SPI_HZ: u32 = 6_400_000;

// ---------------------------------------------------------------------------
// I2C device addresses
// ---------------------------------------------------------------------------

/// ADS1115 4-channel ADC.
pub const ADS1115_ADDR: u8 = 0x48;
/// BMP280 barometric pressure / temperature sensor.
pub const BMP280_ADDR: u8 = 0x76;
/// AK09915 3-axis magnetometer.
pub const AK09915_ADDR: u8 = 0x0C;
/// ICM20689 6-axis inertial sensor.
pub const ICM20689_ADDR: u8 = 0x68;
/// PCA9685 16-channel PWM controller.
pub const PCA9685_ADDR: u8 = 0x40;

// ---------------------------------------------------------------------------
// GPIO lines (independent of the shared bus)
// ---------------------------------------------------------------------------

/// User LED 1 (blue). All user LEDs are wired active-low.
pub const LED_1_GPIO: u32 = 11;
/// User LED 2 (green).
pub const LED_2_GPIO: u32 = 24;
/// User LED 3 (red).
pub const LED_3_GPIO: u32 = 25;

/// PCA9685 output-enable line, active-low: driving it low enables outputs.
pub const PWM_OE_GPIO: u32 = 26;
