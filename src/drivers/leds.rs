//! Discrete user LED driver.
//!
//! Three independent GPIO lines, wired active-low. No state is cached:
//! `get` always re-reads the pin's electrical level, so the reported
//! state stays correct even after out-of-band toggles.

use crate::bus::Pin;
use crate::error::Result;
use crate::types::UserLed;

/// LEDs sink current from the rail: a low output turns the LED on.
const ACTIVE_LOW: bool = true;

pub struct Leds<P> {
    led1: P,
    led2: P,
    led3: P,
}

impl<P: Pin> Leds<P> {
    pub fn new(led1: P, led2: P, led3: P) -> Self {
        Self { led1, led2, led3 }
    }

    fn pin(&mut self, select: UserLed) -> &mut P {
        match select {
            UserLed::Led1 => &mut self.led1,
            UserLed::Led2 => &mut self.led2,
            UserLed::Led3 => &mut self.led3,
        }
    }

    /// Turn the selected LED on or off.
    pub fn set(&mut self, select: UserLed, state: bool) -> Result<()> {
        self.pin(select).set(state ^ ACTIVE_LOW)?;
        Ok(())
    }

    /// Read the selected LED's state back from the pin.
    pub fn get(&mut self, select: UserLed) -> Result<bool> {
        let level = self.pin(select).read()?;
        Ok(level ^ ACTIVE_LOW)
    }

    /// Invert the selected LED's current state.
    pub fn toggle(&mut self, select: UserLed) -> Result<()> {
        let state = self.get(select)?;
        self.set(select, !state)
    }

    /// Apply one state to all three LEDs.
    pub fn set_all(&mut self, state: bool) -> Result<()> {
        for led in UserLed::ALL {
            self.set(led, state)?;
        }
        Ok(())
    }
}
