//! Two-wire bus layer
//!
//! An interrupt-driven, half-duplex master state machine ([`engine`]) sits on
//! top of a minimal command/event boundary ([`transport`]). The
//! [`writer`] turns "write this register block" into one engine request, and
//! [`shared`] owns the engine and transport in an interrupt-safe cell.

pub mod engine;
pub mod shared;
pub mod transport;
pub mod writer;

use core::fmt;

/// Bus-level failures surfaced to requesters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusError {
    /// A transaction is still in flight (or its stop is not yet confirmed)
    EngineBusy,
    /// The retry policy gave up on a device that kept rejecting its address
    BusFault {
        /// Start conditions issued before giving up
        attempts: u32,
    },
    /// No engine has been installed on the shared bus yet
    NotInstalled,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EngineBusy => write!(f, "bus engine busy"),
            Self::BusFault { attempts } => {
                write!(f, "device kept rejecting its address ({attempts} attempts)")
            }
            Self::NotInstalled => write!(f, "bus engine not installed"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for BusError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::EngineBusy => defmt::write!(f, "EngineBusy"),
            Self::BusFault { attempts } => defmt::write!(f, "BusFault({})", attempts),
            Self::NotInstalled => defmt::write!(f, "NotInstalled"),
        }
    }
}

/// How many times a rejected address phase is retried
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// Re-issue the start condition forever
    ///
    /// A device that never acknowledges livelocks the bus.
    #[default]
    Unbounded,
    /// Give up after this many re-issued start conditions
    Limited(u32),
}

impl RetryPolicy {
    /// Whether another start condition may be issued after `retries` retries
    #[must_use]
    pub const fn allows(self, retries: u32) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Limited(max) => retries < max,
        }
    }
}
