//! Navigator session — the process-wide facade over every peripheral.
//!
//! Owns one instance of each chip driver, all sharing one serialized bus
//! handle. Explicitly constructed and explicitly owned (no singleton), so
//! a test suite can hold several independent instances at once.
//!
//! # Preconditions
//!
//! No peripheral operation may be called before [`Navigator::init`] has
//! completed successfully. Doing so is a programming error, checked by
//! `debug_assert!` rather than reported as a runtime failure.

use embedded_hal::spi::SpiBus;
use log::{info, warn};

use crate::bus::{Pin, RegisterBus, SharedBus};
use crate::drivers::leds::Leds;
use crate::drivers::neopixel::Neopixel;
use crate::drivers::pca9685::Pca9685;
use crate::error::Result;
use crate::pins;
use crate::sensors::ads1115::Ads1115;
use crate::sensors::ak09915::Ak09915;
use crate::sensors::bmp280::Bmp280;
use crate::sensors::icm20689::Icm20689;
use crate::types::{AdcChannel, AdcData, AxisData, PwmChannel, UserLed};

pub struct Navigator<B, P, S> {
    adc: Ads1115<B>,
    barometer: Bmp280<B>,
    magnetometer: Ak09915<B>,
    imu: Icm20689<B>,
    pwm: Pca9685<B, P>,
    leds: Leds<P>,
    neopixel: Neopixel<S>,
    initialized: bool,
}

impl<B, P, S> Navigator<B, P, S>
where
    B: RegisterBus,
    P: Pin,
    S: SpiBus,
{
    /// Assemble a session from the raw transports. Call [`init`] before
    /// any peripheral operation.
    ///
    /// [`init`]: Navigator::init
    pub fn new(bus: B, pwm_oe: P, led1: P, led2: P, led3: P, spi: S) -> Self {
        let bus = SharedBus::new(bus);
        Self {
            adc: Ads1115::new(bus.clone(), pins::ADS1115_ADDR),
            barometer: Bmp280::new(bus.clone(), pins::BMP280_ADDR),
            magnetometer: Ak09915::new(bus.clone(), pins::AK09915_ADDR),
            imu: Icm20689::new(bus.clone(), pins::ICM20689_ADDR),
            pwm: Pca9685::new(bus, pins::PCA9685_ADDR, pwm_oe),
            leds: Leds::new(led1, led2, led3),
            neopixel: Neopixel::new(spi),
            initialized: false,
        }
    }

    /// Probe every bus device, configure the sensors, and put the PWM
    /// controller into its default state (outputs disabled, default
    /// prescaler).
    pub fn init(&mut self) -> Result<()> {
        info!("navigator: initializing peripherals");
        self.adc.probe()?;
        self.barometer.init()?;
        self.magnetometer.init()?;
        self.imu.init()?;
        self.pwm.init()?;
        self.leds.set_all(false)?;
        self.initialized = true;
        info!("navigator: init complete");
        Ok(())
    }

    /// Lightweight aggregate health check: one probe per sensor driver,
    /// collapsed into a single verdict. A single absent or wrong device
    /// fails the whole test.
    pub fn self_test(&mut self) -> bool {
        debug_assert!(self.initialized, "self_test() called before init()");
        let checks = [
            ("ads1115", self.adc.probe()),
            ("bmp280", self.barometer.probe()),
            ("ak09915", self.magnetometer.probe()),
            ("icm20689", self.imu.probe()),
        ];
        let mut healthy = true;
        for (name, result) in checks {
            if let Err(e) = result {
                warn!("self_test: {name} failed: {e}");
                healthy = false;
            }
        }
        healthy
    }

    // ── LEDs ──────────────────────────────────────────────────

    pub fn set_led(&mut self, select: UserLed, state: bool) -> Result<()> {
        debug_assert!(self.initialized, "peripheral call before init()");
        self.leds.set(select, state)
    }

    pub fn get_led(&mut self, select: UserLed) -> Result<bool> {
        debug_assert!(self.initialized, "peripheral call before init()");
        self.leds.get(select)
    }

    pub fn set_led_toggle(&mut self, select: UserLed) -> Result<()> {
        debug_assert!(self.initialized, "peripheral call before init()");
        self.leds.toggle(select)
    }

    pub fn set_led_all(&mut self, state: bool) -> Result<()> {
        debug_assert!(self.initialized, "peripheral call before init()");
        self.leds.set_all(state)
    }

    /// Redraw the addressable strip; one `[r, g, b]` triple per pixel.
    pub fn set_neopixel(&mut self, colors: &[[u8; 3]]) -> Result<()> {
        debug_assert!(self.initialized, "peripheral call before init()");
        self.neopixel.set(colors)
    }

    // ── Sensors ───────────────────────────────────────────────

    /// All four ADC channels, in volts.
    pub fn read_adc_all(&mut self) -> Result<AdcData> {
        debug_assert!(self.initialized, "peripheral call before init()");
        self.adc.read_all()
    }

    /// One ADC channel, in volts.
    pub fn read_adc(&mut self, channel: AdcChannel) -> Result<f32> {
        debug_assert!(self.initialized, "peripheral call before init()");
        self.adc.read_channel(channel)
    }

    /// Barometric pressure, in kPa.
    pub fn read_pressure(&mut self) -> Result<f32> {
        debug_assert!(self.initialized, "peripheral call before init()");
        self.barometer.read_pressure()
    }

    /// Barometer die temperature, in °C.
    pub fn read_temp(&mut self) -> Result<f32> {
        debug_assert!(self.initialized, "peripheral call before init()");
        self.barometer.read_temperature()
    }

    /// Magnetic flux density, in µT.
    pub fn read_mag(&mut self) -> Result<AxisData> {
        debug_assert!(self.initialized, "peripheral call before init()");
        self.magnetometer.read()
    }

    /// Acceleration, in m/s².
    pub fn read_accel(&mut self) -> Result<AxisData> {
        debug_assert!(self.initialized, "peripheral call before init()");
        self.imu.read_accel()
    }

    /// Angular velocity, in rad/s.
    pub fn read_gyro(&mut self) -> Result<AxisData> {
        debug_assert!(self.initialized, "peripheral call before init()");
        self.imu.read_gyro()
    }

    // ── PWM ───────────────────────────────────────────────────

    pub fn pwm_enable(&mut self, state: bool) -> Result<()> {
        debug_assert!(self.initialized, "peripheral call before init()");
        self.pwm.enable(state)
    }

    /// Write the PWM prescaler directly (valid range 3..=255).
    pub fn set_pwm_freq_prescale(&mut self, value: u8) -> Result<()> {
        debug_assert!(self.initialized, "peripheral call before init()");
        self.pwm.set_frequency_by_prescale(value)
    }

    /// Set the PWM frequency in Hz. Channel duty values are
    /// frequency-relative on this hardware — re-issue channel values
    /// after changing the frequency.
    pub fn set_pwm_freq_hz(&mut self, freq_hz: f32) -> Result<()> {
        debug_assert!(self.initialized, "peripheral call before init()");
        self.pwm.set_frequency_hz(freq_hz)
    }

    /// Set one channel's OFF-counter duty value (`All` fans out to every
    /// channel).
    pub fn set_pwm_channel_value(&mut self, channel: PwmChannel, value: u16) -> Result<()> {
        debug_assert!(self.initialized, "peripheral call before init()");
        self.pwm.set_channel_value(channel, value)
    }

    /// Apply one duty value to a list of channels.
    pub fn set_pwm_channels_value(&mut self, channels: &[PwmChannel], value: u16) -> Result<()> {
        debug_assert!(self.initialized, "peripheral call before init()");
        self.pwm.set_channels_value(channels, value)
    }

    /// Apply parallel channel/value lists; lengths must match.
    pub fn set_pwm_channels_values(
        &mut self,
        channels: &[PwmChannel],
        values: &[u16],
    ) -> Result<()> {
        debug_assert!(self.initialized, "peripheral call before init()");
        self.pwm.set_channels_values(channels, values)
    }

    /// Currently cached PWM prescaler (authoritative; the hardware cannot
    /// report it without stopping the oscillator).
    pub fn pwm_prescale(&self) -> u8 {
        self.pwm.prescale()
    }
}
