//! ICM20689 6-axis inertial sensor driver.
//!
//! `init` verifies WHO_AM_I, wakes the part with the auto-selected clock
//! source, and configures ±2000 dps gyro and ±8 g accelerometer full
//! scale. Each read bursts one sensor's six data registers and scales to
//! SI units (m/s² for acceleration, rad/s for angular velocity), sensor
//! mounting frame, no reprojection.

use std::f32::consts::PI;
use std::thread;
use std::time::Duration;

use crate::bus::{RegisterBus, SharedBus};
use crate::error::{Error, Result};
use crate::types::AxisData;

const REG_GYRO_CONFIG: u8 = 0x1B;
const REG_ACCEL_CONFIG: u8 = 0x1C;
const REG_ACCEL_XOUT_H: u8 = 0x3B;
const REG_GYRO_XOUT_H: u8 = 0x43;
const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_WHO_AM_I: u8 = 0x75;

const WHO_AM_I: u8 = 0x98;

/// CLKSEL = 1: auto-select the best available clock source.
const PWR_MGMT_1_CLK_AUTO: u8 = 0x01;
/// FS_SEL = 3: ±2000 dps.
const GYRO_FS_2000DPS: u8 = 0b11 << 3;
/// ACCEL_FS_SEL = 2: ±8 g.
const ACCEL_FS_8G: u8 = 0b10 << 3;

/// Counts per g at ±8 g full scale.
const ACCEL_LSB_PER_G: f32 = 4096.0;
/// Counts per degree-per-second at ±2000 dps full scale.
const GYRO_LSB_PER_DPS: f32 = 16.4;

const STANDARD_GRAVITY: f32 = 9.80665;

pub struct Icm20689<B> {
    bus: SharedBus<B>,
    address: u8,
}

impl<B: RegisterBus> Icm20689<B> {
    pub fn new(bus: SharedBus<B>, address: u8) -> Self {
        Self { bus, address }
    }

    /// Verify identity, wake the device, and set full-scale ranges.
    pub fn init(&mut self) -> Result<()> {
        let mut bus = self.bus.lock();

        let mut id = [0u8; 1];
        bus.read_register(self.address, REG_WHO_AM_I, &mut id)?;
        if id[0] != WHO_AM_I {
            return Err(Error::WrongDevice {
                address: self.address,
                id: id[0],
            });
        }

        bus.write_register(self.address, REG_PWR_MGMT_1, &[PWR_MGMT_1_CLK_AUTO])?;
        // PLL start-up time after leaving sleep.
        thread::sleep(Duration::from_millis(30));
        bus.write_register(self.address, REG_GYRO_CONFIG, &[GYRO_FS_2000DPS])?;
        bus.write_register(self.address, REG_ACCEL_CONFIG, &[ACCEL_FS_8G])?;
        Ok(())
    }

    /// Lightweight presence check used by self-test.
    pub fn probe(&mut self) -> Result<()> {
        let mut id = [0u8; 1];
        self.bus
            .lock()
            .read_register(self.address, REG_WHO_AM_I, &mut id)?;
        if id[0] != WHO_AM_I {
            return Err(Error::WrongDevice {
                address: self.address,
                id: id[0],
            });
        }
        Ok(())
    }

    /// Latest acceleration, in m/s², sensor frame.
    pub fn read_accel(&mut self) -> Result<AxisData> {
        let raw = self.read_axes(REG_ACCEL_XOUT_H)?;
        let scale = STANDARD_GRAVITY / ACCEL_LSB_PER_G;
        Ok(AxisData {
            x: raw[0] * scale,
            y: raw[1] * scale,
            z: raw[2] * scale,
        })
    }

    /// Latest angular velocity, in rad/s, sensor frame.
    pub fn read_gyro(&mut self) -> Result<AxisData> {
        let raw = self.read_axes(REG_GYRO_XOUT_H)?;
        let scale = (PI / 180.0) / GYRO_LSB_PER_DPS;
        Ok(AxisData {
            x: raw[0] * scale,
            y: raw[1] * scale,
            z: raw[2] * scale,
        })
    }

    /// Burst-read three big-endian axis words starting at `register`.
    fn read_axes(&mut self, register: u8) -> Result<[f32; 3]> {
        let mut raw = [0u8; 6];
        self.bus
            .lock()
            .read_register(self.address, register, &mut raw)?;
        let axis = |hi: usize| f32::from(i16::from_be_bytes([raw[hi], raw[hi + 1]]));
        Ok([axis(0), axis(2), axis(4)])
    }
}
