//! Bus transport — the single shared mutable resource of the board.
//!
//! All sensors and the PWM controller hang off one multi-drop bus; the
//! transport serializes access so that no two transactions ever interleave
//! their bytes on the wire. Drivers hold a cloned [`SharedBus`] handle and
//! lock it for the duration of a whole transaction (or a whole bulk
//! sequence for multi-register operations).
//!
//! Transient faults (`NotAcknowledged`, `Timeout`) are retried here, with
//! the same transaction, up to [`MAX_ATTEMPTS`] times; `Io` faults surface
//! immediately.

use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal::i2c::{Error as I2cError, ErrorKind, I2c};
use log::warn;

use crate::error::BusError;

/// Attempts per transaction, including the first. Transactions are
/// microsecond-scale, so a flat bound with no backoff keeps worst-case
/// caller latency predictable.
pub const MAX_ATTEMPTS: u32 = 3;

// ---------------------------------------------------------------------------
// Transport traits
// ---------------------------------------------------------------------------

/// Register-oriented access to one multi-drop bus.
///
/// Each call is a single whole transaction: it either completes entirely
/// or fails with no partial write observable as success.
pub trait RegisterBus {
    /// Read `buf.len()` bytes starting at `register` of `device`.
    fn read_register(&mut self, device: u8, register: u8, buf: &mut [u8])
    -> Result<(), BusError>;

    /// Write `bytes` starting at `register` of `device`.
    fn write_register(&mut self, device: u8, register: u8, bytes: &[u8])
    -> Result<(), BusError>;
}

/// One independent digital line (user LED, PWM output-enable).
///
/// These lines are not on the shared bus and need no serialization beyond
/// the owning driver's `&mut` access.
pub trait Pin {
    /// Drive the line high (`true`) or low (`false`).
    fn set(&mut self, high: bool) -> Result<(), BusError>;

    /// Read the line's current electrical level from hardware.
    fn read(&mut self) -> Result<bool, BusError>;
}

// ---------------------------------------------------------------------------
// Shared, serialized bus handle
// ---------------------------------------------------------------------------

/// Cloneable handle to the exclusively-owned bus.
///
/// The transport owns the physical handle; drivers only ever see it
/// through a [`BusGuard`] scoped to their transaction sequence.
pub struct SharedBus<B> {
    inner: Arc<Mutex<B>>,
}

impl<B> Clone for SharedBus<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: RegisterBus> SharedBus<B> {
    pub fn new(bus: B) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bus)),
        }
    }

    /// Acquire the bus for a transaction sequence.
    ///
    /// Bulk operations hold the returned guard across their entire
    /// multi-register sequence so no other caller observes a torn
    /// intermediate state.
    pub fn lock(&self) -> BusGuard<'_, B> {
        // A poisoned mutex means another thread panicked mid-transaction;
        // the bus itself holds no in-memory state worth discarding.
        let guard = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        BusGuard { bus: guard }
    }
}

/// Exclusive access to the bus for the guard's lifetime.
///
/// All transactions issued through the guard carry the transport's
/// bounded-retry policy.
pub struct BusGuard<'a, B> {
    bus: MutexGuard<'a, B>,
}

impl<B: RegisterBus> BusGuard<'_, B> {
    pub fn read_register(
        &mut self,
        device: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), BusError> {
        retry(device, register, |bus: &mut B| {
            bus.read_register(device, register, buf)
        }, &mut *self.bus)
    }

    pub fn write_register(
        &mut self,
        device: u8,
        register: u8,
        bytes: &[u8],
    ) -> Result<(), BusError> {
        retry(device, register, |bus: &mut B| {
            bus.write_register(device, register, bytes)
        }, &mut *self.bus)
    }
}

fn retry<B>(
    device: u8,
    register: u8,
    mut op: impl FnMut(&mut B) -> Result<(), BusError>,
    bus: &mut B,
) -> Result<(), BusError> {
    let mut attempt = 1;
    loop {
        match op(&mut *bus) {
            Ok(()) => return Ok(()),
            Err(e @ (BusError::NotAcknowledged | BusError::Timeout)) if attempt < MAX_ATTEMPTS => {
                warn!(
                    "bus: transient {e} on 0x{device:02x}/0x{register:02x}, attempt {attempt}/{MAX_ATTEMPTS}"
                );
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// embedded-hal I2C adapter
// ---------------------------------------------------------------------------

/// [`RegisterBus`] over any embedded-hal I2C bus implementation.
pub struct I2cRegisterBus<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> I2cRegisterBus<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }
}

impl<I2C: I2c> RegisterBus for I2cRegisterBus<I2C> {
    fn read_register(
        &mut self,
        device: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), BusError> {
        self.i2c
            .write_read(device, &[register], buf)
            .map_err(map_i2c_error)
    }

    fn write_register(
        &mut self,
        device: u8,
        register: u8,
        bytes: &[u8],
    ) -> Result<(), BusError> {
        let mut frame = Vec::with_capacity(1 + bytes.len());
        frame.push(register);
        frame.extend_from_slice(bytes);
        self.i2c.write(device, &frame).map_err(map_i2c_error)
    }
}

fn map_i2c_error<E: I2cError>(e: E) -> BusError {
    match e.kind() {
        ErrorKind::NoAcknowledge(_) => BusError::NotAcknowledged,
        _ => BusError::Io,
    }
}
