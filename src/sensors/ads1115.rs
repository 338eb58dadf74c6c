//! ADS1115 4-channel 16-bit ADC driver.
//!
//! Single-shot conversions, one channel per read: write the config
//! register with the channel's MUX bits and the OS (start) bit set, poll
//! OS until the conversion completes, then read the conversion register.
//!
//! PGA is fixed at ±4.096 V full scale, so one LSB is 125 µV.

use std::thread;
use std::time::Duration;

use crate::bus::{RegisterBus, SharedBus};
use crate::error::{BusError, Result};
use crate::types::{AdcChannel, AdcData};

const REG_CONVERSION: u8 = 0x00;
const REG_CONFIG: u8 = 0x01;

/// OS bit: write 1 to start a conversion, reads 1 when idle.
const CONFIG_OS: u16 = 1 << 15;
/// Single-ended MUX base: 0b100 selects AINx vs GND.
const CONFIG_MUX_SINGLE: u16 = 0b100 << 12;
/// PGA 001 = ±4.096 V full scale.
const CONFIG_PGA_4V096: u16 = 0b001 << 9;
/// Single-shot mode.
const CONFIG_MODE_SINGLE: u16 = 1 << 8;
/// 860 samples per second (fastest, ≈1.2 ms per conversion).
const CONFIG_DR_860SPS: u16 = 0b111 << 5;
/// Comparator disabled.
const CONFIG_COMP_DISABLE: u16 = 0b11;

/// Volts per count at ±4.096 V full scale.
const VOLTS_PER_LSB: f32 = 4.096 / 32768.0;

/// Conversion-complete poll bound. 860 SPS completes in ~1.2 ms; each
/// poll sleeps 1 ms, so this allows several conversion periods.
const POLL_ATTEMPTS: u32 = 10;

pub struct Ads1115<B> {
    bus: SharedBus<B>,
    address: u8,
}

impl<B: RegisterBus> Ads1115<B> {
    pub fn new(bus: SharedBus<B>, address: u8) -> Self {
        Self { bus, address }
    }

    /// Lightweight presence check: the config register must be readable.
    pub fn probe(&mut self) -> Result<()> {
        let mut buf = [0u8; 2];
        self.bus
            .lock()
            .read_register(self.address, REG_CONFIG, &mut buf)?;
        Ok(())
    }

    /// Read one channel, in volts.
    pub fn read_channel(&mut self, channel: AdcChannel) -> Result<f32> {
        self.convert(channel)
    }

    /// Read all four channels, in volts.
    pub fn read_all(&mut self) -> Result<AdcData> {
        let mut data = AdcData::default();
        for channel in AdcChannel::ALL {
            data.channel[channel.index()] = self.convert(channel)?;
        }
        Ok(data)
    }

    /// One single-shot conversion. The bus is acquired per transaction,
    /// not across the conversion wait: only this driver touches the
    /// ADC's registers, and holding the lock through the millisecond
    /// sleeps would stall every other bus user.
    fn convert(&self, channel: AdcChannel) -> Result<f32> {
        let config = CONFIG_OS
            | CONFIG_MUX_SINGLE
            | ((channel.index() as u16) << 12)
            | CONFIG_PGA_4V096
            | CONFIG_MODE_SINGLE
            | CONFIG_DR_860SPS
            | CONFIG_COMP_DISABLE;
        self.bus
            .lock()
            .write_register(self.address, REG_CONFIG, &config.to_be_bytes())?;

        // Poll OS until the conversion completes.
        let mut buf = [0u8; 2];
        let mut ready = false;
        for attempt in 0..POLL_ATTEMPTS {
            self.bus
                .lock()
                .read_register(self.address, REG_CONFIG, &mut buf)?;
            if u16::from_be_bytes(buf) & CONFIG_OS != 0 {
                ready = true;
                break;
            }
            if attempt + 1 < POLL_ATTEMPTS {
                thread::sleep(Duration::from_millis(1));
            }
        }
        if !ready {
            return Err(BusError::Timeout.into());
        }

        self.bus
            .lock()
            .read_register(self.address, REG_CONVERSION, &mut buf)?;
        let raw = i16::from_be_bytes(buf);
        Ok(f32::from(raw) * VOLTS_PER_LSB)
    }
}
