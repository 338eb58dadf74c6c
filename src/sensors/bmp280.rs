//! BMP280 barometric pressure / temperature sensor driver.
//!
//! `init` verifies the chip ID, reads the factory calibration block, and
//! configures continuous (normal-mode) sampling; reads then burst the six
//! raw data registers and apply the datasheet's double-precision
//! compensation. Pressure is reported in kPa, temperature in °C.

use crate::bus::{RegisterBus, SharedBus};
use crate::error::{Error, Result};

const REG_CALIB_START: u8 = 0x88;
const REG_ID: u8 = 0xD0;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_CONFIG: u8 = 0xF5;
const REG_DATA_START: u8 = 0xF7;

const CHIP_ID: u8 = 0x58;

/// osrs_t ×2, osrs_p ×16, normal mode.
const CTRL_MEAS_NORMAL: u8 = 0b010_101_11;
/// 0.5 ms standby, IIR filter coefficient 4.
const CONFIG_FILTER_X4: u8 = 0b000_010_00;

/// Factory trim values, read once at init.
#[derive(Debug, Clone, Copy, Default)]
struct Calibration {
    dig_t1: u16,
    dig_t2: i16,
    dig_t3: i16,
    dig_p1: u16,
    dig_p2: i16,
    dig_p3: i16,
    dig_p4: i16,
    dig_p5: i16,
    dig_p6: i16,
    dig_p7: i16,
    dig_p8: i16,
    dig_p9: i16,
}

impl Calibration {
    fn parse(raw: &[u8; 24]) -> Self {
        let u = |i: usize| u16::from_le_bytes([raw[i], raw[i + 1]]);
        let s = |i: usize| i16::from_le_bytes([raw[i], raw[i + 1]]);
        Self {
            dig_t1: u(0),
            dig_t2: s(2),
            dig_t3: s(4),
            dig_p1: u(6),
            dig_p2: s(8),
            dig_p3: s(10),
            dig_p4: s(12),
            dig_p5: s(14),
            dig_p6: s(16),
            dig_p7: s(18),
            dig_p8: s(20),
            dig_p9: s(22),
        }
    }
}

pub struct Bmp280<B> {
    bus: SharedBus<B>,
    address: u8,
    calib: Calibration,
}

impl<B: RegisterBus> Bmp280<B> {
    pub fn new(bus: SharedBus<B>, address: u8) -> Self {
        Self {
            bus,
            address,
            calib: Calibration::default(),
        }
    }

    /// Verify the chip ID, load calibration, and start normal-mode
    /// sampling.
    pub fn init(&mut self) -> Result<()> {
        let mut bus = self.bus.lock();

        let mut id = [0u8; 1];
        bus.read_register(self.address, REG_ID, &mut id)?;
        if id[0] != CHIP_ID {
            return Err(Error::WrongDevice {
                address: self.address,
                id: id[0],
            });
        }

        let mut raw = [0u8; 24];
        bus.read_register(self.address, REG_CALIB_START, &mut raw)?;
        self.calib = Calibration::parse(&raw);

        bus.write_register(self.address, REG_CONFIG, &[CONFIG_FILTER_X4])?;
        bus.write_register(self.address, REG_CTRL_MEAS, &[CTRL_MEAS_NORMAL])?;
        Ok(())
    }

    /// Lightweight presence check used by self-test.
    pub fn probe(&mut self) -> Result<()> {
        let mut id = [0u8; 1];
        self.bus.lock().read_register(self.address, REG_ID, &mut id)?;
        if id[0] != CHIP_ID {
            return Err(Error::WrongDevice {
                address: self.address,
                id: id[0],
            });
        }
        Ok(())
    }

    /// Latest pressure in kPa.
    pub fn read_pressure(&mut self) -> Result<f32> {
        let (_, pressure) = self.read_both()?;
        Ok(pressure)
    }

    /// Latest temperature in °C.
    pub fn read_temperature(&mut self) -> Result<f32> {
        let (temperature, _) = self.read_both()?;
        Ok(temperature)
    }

    /// Burst-read raw data and compensate. Temperature must be computed
    /// first because pressure compensation depends on `t_fine`.
    fn read_both(&mut self) -> Result<(f32, f32)> {
        let mut raw = [0u8; 6];
        self.bus
            .lock()
            .read_register(self.address, REG_DATA_START, &mut raw)?;

        let adc_p = (u32::from(raw[0]) << 12) | (u32::from(raw[1]) << 4) | (u32::from(raw[2]) >> 4);
        let adc_t = (u32::from(raw[3]) << 12) | (u32::from(raw[4]) << 4) | (u32::from(raw[5]) >> 4);

        let (temperature, t_fine) = self.compensate_temperature(adc_t);
        let pressure_pa = self.compensate_pressure(adc_p, t_fine);
        Ok((temperature, pressure_pa / 1000.0))
    }

    /// Datasheet double-precision temperature compensation. Returns
    /// (°C, t_fine).
    fn compensate_temperature(&self, adc_t: u32) -> (f32, f64) {
        let c = &self.calib;
        let adc_t = f64::from(adc_t);
        let var1 =
            (adc_t / 16384.0 - f64::from(c.dig_t1) / 1024.0) * f64::from(c.dig_t2);
        let var2 = (adc_t / 131072.0 - f64::from(c.dig_t1) / 8192.0)
            * (adc_t / 131072.0 - f64::from(c.dig_t1) / 8192.0)
            * f64::from(c.dig_t3);
        let t_fine = var1 + var2;
        ((t_fine / 5120.0) as f32, t_fine)
    }

    /// Datasheet double-precision pressure compensation, in Pa.
    fn compensate_pressure(&self, adc_p: u32, t_fine: f64) -> f32 {
        let c = &self.calib;
        let mut var1 = t_fine / 2.0 - 64000.0;
        let mut var2 = var1 * var1 * f64::from(c.dig_p6) / 32768.0;
        var2 += var1 * f64::from(c.dig_p5) * 2.0;
        var2 = var2 / 4.0 + f64::from(c.dig_p4) * 65536.0;
        var1 = (f64::from(c.dig_p3) * var1 * var1 / 524288.0
            + f64::from(c.dig_p2) * var1)
            / 524288.0;
        var1 = (1.0 + var1 / 32768.0) * f64::from(c.dig_p1);
        if var1 == 0.0 {
            // Datasheet guard: avoids division by zero with blank trim.
            return 0.0;
        }
        let mut p = 1_048_576.0 - f64::from(adc_p);
        p = (p - var2 / 4096.0) * 6250.0 / var1;
        var1 = f64::from(c.dig_p9) * p * p / 2_147_483_648.0;
        var2 = p * f64::from(c.dig_p8) / 32768.0;
        p += (var1 + var2 + f64::from(c.dig_p7)) / 16.0;
        p as f32
    }
}
