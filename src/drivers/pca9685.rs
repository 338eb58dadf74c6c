//! PCA9685 16-channel PWM controller driver.
//!
//! The driver caches the current prescaler — the one piece of driver-side
//! state that is authoritative, because reading it back from hardware
//! requires stopping the oscillator. Frequency and prescaler are coupled
//! by
//!
//! ```text
//! prescale = round(clock_freq / (4096 × desired_freq)) − 1
//! ```
//!
//! with a fixed 24.5760 MHz crystal. Valid prescalers are 3..=255
//! (≈1526 Hz down to ≈24 Hz).
//!
//! Changing the frequency does NOT rewrite channel OFF counters: duty
//! values are frequency-relative on this hardware, and callers re-issue
//! channel values after a frequency change. This layer exposes that
//! coupling faithfully instead of hiding it.

use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::bus::{BusGuard, Pin, RegisterBus, SharedBus};
use crate::error::{Error, Result};
use crate::types::{PWM_CHANNEL_COUNT, PwmChannel};

const REG_MODE1: u8 = 0x00;
const REG_LED0_ON_L: u8 = 0x06;
const REG_PRE_SCALE: u8 = 0xFE;

const MODE1_RESTART: u8 = 0x80;
const MODE1_AUTO_INCREMENT: u8 = 0x20;
const MODE1_SLEEP: u8 = 0x10;

/// Board crystal frequency, Hz.
pub const CLOCK_FREQ_HZ: f64 = 24_576_000.0;

/// Valid prescaler range per the device datasheet.
pub const PRESCALE_MIN: u8 = 3;
pub const PRESCALE_MAX: u8 = 255;

/// Prescaler programmed at init: ≈60 Hz, safe for servos.
pub const PRESCALE_DEFAULT: u8 = 100;

/// Compute the prescaler for a desired output frequency. The result may
/// be outside `PRESCALE_MIN..=PRESCALE_MAX`; callers validate.
pub fn prescale_for_frequency(freq_hz: f32) -> i64 {
    let exact = CLOCK_FREQ_HZ / (4096.0 * f64::from(freq_hz));
    (exact.round() - 1.0) as i64
}

pub struct Pca9685<B, P> {
    bus: SharedBus<B>,
    address: u8,
    oe_pin: P,
    prescale: u8,
}

impl<B: RegisterBus, P: Pin> Pca9685<B, P> {
    pub fn new(bus: SharedBus<B>, address: u8, oe_pin: P) -> Self {
        Self {
            bus,
            address,
            oe_pin,
            prescale: PRESCALE_DEFAULT,
        }
    }

    /// Put the controller into the known default state: outputs disabled,
    /// register auto-increment on, default prescaler, all channels at
    /// zero duty.
    pub fn init(&mut self) -> Result<()> {
        self.enable(false)?;
        {
            let mut bus = self.bus.lock();
            bus.write_register(self.address, REG_MODE1, &[MODE1_AUTO_INCREMENT | MODE1_SLEEP])?;
            bus.write_register(self.address, REG_PRE_SCALE, &[PRESCALE_DEFAULT])?;
            bus.write_register(self.address, REG_MODE1, &[MODE1_AUTO_INCREMENT])?;
            for index in 0..PWM_CHANNEL_COUNT {
                Self::write_channel(&mut bus, self.address, index, 0)?;
            }
        }
        self.prescale = PRESCALE_DEFAULT;
        Ok(())
    }

    /// Currently cached prescaler value.
    pub fn prescale(&self) -> u8 {
        self.prescale
    }

    /// Toggle the output-enable line. The line is active-low: driving it
    /// low enables all outputs.
    pub fn enable(&mut self, state: bool) -> Result<()> {
        info!("pca9685: outputs {}", if state { "enabled" } else { "disabled" });
        self.oe_pin.set(!state).map_err(Error::from)
    }

    /// Write the prescaler register directly.
    ///
    /// The oscillator must be stopped for the write to take effect, so
    /// the whole sleep/write/wake sequence runs under one bus
    /// acquisition; if the oscillator was running it is restarted
    /// afterwards.
    pub fn set_frequency_by_prescale(&mut self, value: u8) -> Result<()> {
        if value < PRESCALE_MIN {
            return Err(Error::InvalidFrequency {
                prescale: i64::from(value),
            });
        }

        {
            let mut bus = self.bus.lock();

            let mut mode1 = [0u8; 1];
            bus.read_register(self.address, REG_MODE1, &mut mode1)?;
            let was_running = mode1[0] & MODE1_SLEEP == 0;

            bus.write_register(self.address, REG_MODE1, &[mode1[0] | MODE1_SLEEP])?;
            bus.write_register(self.address, REG_PRE_SCALE, &[value])?;
            bus.write_register(self.address, REG_MODE1, &[mode1[0] & !MODE1_SLEEP])?;

            if was_running {
                // The oscillator needs 500 µs before RESTART is honored.
                thread::sleep(Duration::from_micros(500));
                bus.write_register(
                    self.address,
                    REG_MODE1,
                    &[(mode1[0] & !MODE1_SLEEP) | MODE1_RESTART],
                )?;
            }
        }

        self.prescale = value;
        debug!("pca9685: prescale set to {value}");
        Ok(())
    }

    /// Set the output frequency in Hz.
    ///
    /// Fails with `InvalidFrequency` — writing nothing — when the
    /// computed prescaler falls outside 3..=255.
    pub fn set_frequency_hz(&mut self, freq_hz: f32) -> Result<()> {
        let prescale = prescale_for_frequency(freq_hz);
        if prescale < i64::from(PRESCALE_MIN) || prescale > i64::from(PRESCALE_MAX) {
            return Err(Error::InvalidFrequency { prescale });
        }
        debug!("pca9685: {freq_hz} Hz -> prescale {prescale}");
        self.set_frequency_by_prescale(prescale as u8)
    }

    /// Set one channel's duty value, or every channel's for
    /// `PwmChannel::All`. The fan-out holds the bus for the whole
    /// sequence so no concurrent caller observes a torn state.
    pub fn set_channel_value(&mut self, channel: PwmChannel, value: u16) -> Result<()> {
        let mut bus = self.bus.lock();
        match channel.index() {
            Some(index) => Self::write_channel(&mut bus, self.address, index, value),
            None => {
                for index in 0..PWM_CHANNEL_COUNT {
                    Self::write_channel(&mut bus, self.address, index, value)?;
                }
                Ok(())
            }
        }
    }

    /// Apply one value to an explicit list of channels, atomically with
    /// respect to other bus users.
    pub fn set_channels_value(&mut self, channels: &[PwmChannel], value: u16) -> Result<()> {
        let mut bus = self.bus.lock();
        for channel in channels {
            Self::write_resolved(&mut bus, self.address, *channel, value)?;
        }
        Ok(())
    }

    /// Apply parallel value/channel lists. Mismatched lengths fail before
    /// any register is written.
    pub fn set_channels_values(&mut self, channels: &[PwmChannel], values: &[u16]) -> Result<()> {
        if channels.len() != values.len() {
            return Err(Error::LengthMismatch {
                channels: channels.len(),
                values: values.len(),
            });
        }
        let mut bus = self.bus.lock();
        for (channel, value) in channels.iter().zip(values) {
            Self::write_resolved(&mut bus, self.address, *channel, *value)?;
        }
        Ok(())
    }

    fn write_resolved(
        bus: &mut BusGuard<'_, B>,
        address: u8,
        channel: PwmChannel,
        value: u16,
    ) -> Result<()> {
        match channel.index() {
            Some(index) => Self::write_channel(bus, address, index, value),
            None => {
                for index in 0..PWM_CHANNEL_COUNT {
                    Self::write_channel(bus, address, index, value)?;
                }
                Ok(())
            }
        }
    }

    /// One auto-increment write covering ON_L/ON_H/OFF_L/OFF_H: ON is
    /// pinned at 0 so the OFF counter alone defines the duty cycle.
    fn write_channel(
        bus: &mut BusGuard<'_, B>,
        address: u8,
        index: usize,
        value: u16,
    ) -> Result<()> {
        let base = REG_LED0_ON_L + 4 * index as u8;
        let [off_l, off_h] = value.to_le_bytes();
        bus.write_register(address, base, &[0, 0, off_l, off_h])?;
        Ok(())
    }
}
