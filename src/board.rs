//! Raspberry Pi board assembly — the only module that touches real
//! hardware.
//!
//! Opens the I2C bus, the SPI device behind the LED strip, and the GPIO
//! lines named in [`crate::pins`], then wires them into a concrete
//! [`Navigator`]. Everything here is feature-gated so the rest of the
//! crate stays host-testable.

use embedded_hal::digital::{InputPin, OutputPin};
use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::{CdevPin, I2cdev, SpidevBus};
use log::info;

use crate::bus::{I2cRegisterBus, Pin};
use crate::error::{BusError, Result};
use crate::navigator::Navigator;
use crate::pins;

/// The fully concrete session type for the Raspberry Pi backend.
pub type LinuxNavigator = Navigator<I2cRegisterBus<I2cdev>, GpioPin, SpidevBus>;

/// GPIO character-device line with read-back.
pub struct GpioPin {
    pin: CdevPin,
}

impl Pin for GpioPin {
    fn set(&mut self, high: bool) -> core::result::Result<(), BusError> {
        let result = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|_| BusError::Io)
    }

    fn read(&mut self) -> core::result::Result<bool, BusError> {
        self.pin.is_high().map_err(|_| BusError::Io)
    }
}

fn request_output(chip: &mut Chip, line: u32, idle_high: bool) -> Result<GpioPin> {
    let handle = chip
        .get_line(line)
        .map_err(|_| BusError::Io)?
        .request(
            LineRequestFlags::OUTPUT,
            u8::from(idle_high),
            "navigator",
        )
        .map_err(|_| BusError::Io)?;
    let pin = CdevPin::new(handle).map_err(|_| BusError::Io)?;
    Ok(GpioPin { pin })
}

/// Open the board's default devices and assemble a session.
///
/// The returned session still needs [`Navigator::init`] before use.
pub fn open_default() -> Result<LinuxNavigator> {
    info!("board: opening {}", pins::I2C_BUS_PATH);
    let i2c = I2cdev::new(pins::I2C_BUS_PATH).map_err(|_| BusError::Io)?;

    info!("board: opening {}", pins::NEOPIXEL_SPI_PATH);
    let mut spi = SpidevBus::open(pins::NEOPIXEL_SPI_PATH).map_err(|_| BusError::Io)?;
    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(pins::NEOPIXEL_SPI_HZ)
        .mode(SpiModeFlags::SPI_MODE_0)
        .build();
    spi.configure(&options).map_err(|_| BusError::Io)?;

    let mut chip = Chip::new("/dev/gpiochip0").map_err(|_| BusError::Io)?;
    // OE idles high (outputs disabled); LED lines idle high (LEDs off,
    // active-low wiring).
    let pwm_oe = request_output(&mut chip, pins::PWM_OE_GPIO, true)?;
    let led1 = request_output(&mut chip, pins::LED_1_GPIO, true)?;
    let led2 = request_output(&mut chip, pins::LED_2_GPIO, true)?;
    let led3 = request_output(&mut chip, pins::LED_3_GPIO, true)?;

    Ok(Navigator::new(
        I2cRegisterBus::new(i2c),
        pwm_oe,
        led1,
        led2,
        led3,
        spi,
    ))
}
