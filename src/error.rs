//! Unified error types for the Navigator HAL.
//!
//! A single `Error` enum that every driver converts into, keeping the
//! session facade's error handling uniform.  All variants are `Copy` so
//! they can be cheaply returned through the facade without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Transport-level errors
// ---------------------------------------------------------------------------

/// Failure of a single bus transaction, after the transport's bounded
/// retries have been exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The addressed device did not acknowledge (absent or busy).
    NotAcknowledged,
    /// The transaction did not complete in time (line stuck).
    Timeout,
    /// Low-level transport fault. Never retried.
    Io,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAcknowledged => write!(f, "device did not acknowledge"),
            Self::Timeout => write!(f, "bus transaction timed out"),
            Self::Io => write!(f, "transport I/O fault"),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level HAL error
// ---------------------------------------------------------------------------

/// Every fallible operation in the HAL funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A bus transaction failed.
    Bus(BusError),
    /// A requested PWM frequency or prescaler maps outside the valid
    /// 3..=255 prescaler range. Carries the computed prescaler.
    InvalidFrequency { prescale: i64 },
    /// Parallel-array PWM operation called with unequal lengths.
    /// No channel register is written when this is returned.
    LengthMismatch { channels: usize, values: usize },
    /// A device probe read back an unexpected chip identity.
    WrongDevice { address: u8, id: u8 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::InvalidFrequency { prescale } => {
                write!(f, "prescaler {prescale} outside valid range 3..=255")
            }
            Self::LengthMismatch { channels, values } => {
                write!(f, "{channels} channels but {values} values")
            }
            Self::WrongDevice { address, id } => {
                write!(f, "device 0x{address:02x} reported unexpected id 0x{id:02x}")
            }
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
