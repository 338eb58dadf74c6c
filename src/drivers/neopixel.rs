//! Addressable LED strip (WS2812) driver over SPI.
//!
//! The single-wire WS2812 protocol is bit-banged through the SPI MOSI
//! line: at 6.4 MHz one SPI byte spans 1.25 µs, exactly one WS2812 bit
//! period, so each data bit becomes one SPI byte — a long high pulse
//! (0xF8) for a one, a short one (0xC0) for a zero. The frame ends with
//! enough zero bytes to hold the line low past the ≥280 µs reset latch.
//!
//! Each call redraws the entire strip; there is no partial-frame update.

use embedded_hal::spi::SpiBus;

use crate::error::{BusError, Result};

/// SPI byte encoding one WS2812 "1" bit (≈780 ns high).
const BIT_ONE: u8 = 0xF8;
/// SPI byte encoding one WS2812 "0" bit (≈310 ns high).
const BIT_ZERO: u8 = 0xC0;

/// Zero bytes appended after the frame: 224 × 1.25 µs = 280 µs.
const RESET_BYTES: usize = 224;

pub struct Neopixel<S> {
    spi: S,
}

impl<S: SpiBus> Neopixel<S> {
    pub fn new(spi: S) -> Self {
        Self { spi }
    }

    /// Write a full frame. `colors` holds one `[r, g, b]` triple per
    /// pixel; its length determines how many pixels are addressed.
    pub fn set(&mut self, colors: &[[u8; 3]]) -> Result<()> {
        let frame = encode_frame(colors);
        self.spi.write(&frame).map_err(|_| BusError::Io)?;
        Ok(())
    }
}

/// Expand RGB triples into the byte-per-bit SPI stream, GRB wire order,
/// most significant bit first, plus the reset tail.
fn encode_frame(colors: &[[u8; 3]]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(colors.len() * 24 + RESET_BYTES);
    for [r, g, b] in colors {
        for byte in [*g, *r, *b] {
            for bit in (0..8).rev() {
                frame.push(if byte & (1 << bit) != 0 { BIT_ONE } else { BIT_ZERO });
            }
        }
    }
    frame.resize(frame.len() + RESET_BYTES, 0);
    frame
}
