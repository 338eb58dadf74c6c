//! AK09915 3-axis magnetometer driver.
//!
//! `init` verifies the WIA company/device identity and puts the part into
//! continuous measurement mode 4 (100 Hz). Reads burst ST1 through ST2 in
//! one transaction — reading ST2 releases the data-protection latch — and
//! scale to µT at 0.15 µT/LSB.

use crate::bus::{RegisterBus, SharedBus};
use crate::error::{Error, Result};
use crate::types::AxisData;

const REG_WIA1: u8 = 0x00;
const REG_ST1: u8 = 0x10;
const REG_CNTL2: u8 = 0x31;

const COMPANY_ID: u8 = 0x48;
const DEVICE_ID: u8 = 0x10;

/// Continuous measurement mode 4 = 100 Hz.
const MODE_CONTINUOUS_100HZ: u8 = 0x08;

/// µT per count.
const UT_PER_LSB: f32 = 0.15;

pub struct Ak09915<B> {
    bus: SharedBus<B>,
    address: u8,
}

impl<B: RegisterBus> Ak09915<B> {
    pub fn new(bus: SharedBus<B>, address: u8) -> Self {
        Self { bus, address }
    }

    /// Verify identity and start continuous sampling.
    pub fn init(&mut self) -> Result<()> {
        let mut bus = self.bus.lock();

        let mut wia = [0u8; 2];
        bus.read_register(self.address, REG_WIA1, &mut wia)?;
        if wia != [COMPANY_ID, DEVICE_ID] {
            return Err(Error::WrongDevice {
                address: self.address,
                id: wia[1],
            });
        }

        bus.write_register(self.address, REG_CNTL2, &[MODE_CONTINUOUS_100HZ])?;
        Ok(())
    }

    /// Lightweight presence check used by self-test.
    pub fn probe(&mut self) -> Result<()> {
        let mut wia = [0u8; 2];
        self.bus
            .lock()
            .read_register(self.address, REG_WIA1, &mut wia)?;
        if wia != [COMPANY_ID, DEVICE_ID] {
            return Err(Error::WrongDevice {
                address: self.address,
                id: wia[1],
            });
        }
        Ok(())
    }

    /// Latest magnetic flux density, in µT, sensor frame.
    pub fn read(&mut self) -> Result<AxisData> {
        // ST1, HXL..HZH (little-endian pairs), TMPS, ST2. ST2 must be
        // read to complete the measurement cycle.
        let mut raw = [0u8; 9];
        self.bus
            .lock()
            .read_register(self.address, REG_ST1, &mut raw)?;

        let axis = |lo: usize| f32::from(i16::from_le_bytes([raw[lo], raw[lo + 1]]));
        Ok(AxisData {
            x: axis(1) * UT_PER_LSB,
            y: axis(3) * UT_PER_LSB,
            z: axis(5) * UT_PER_LSB,
        })
    }
}
