//! Shared types used across the VNA firmware
//!
//! This module defines domain-specific types shared by the bus, PLL and DDS
//! layers.

use core::fmt;

/// Frequency in Hertz
///
/// Unlike the per-chip limits (which live with the DDS and the band table),
/// any `u32` is a representable frequency. Range checks are done by the
/// component that consumes the value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Frequency(u32);

impl Frequency {
    /// Create a frequency from Hz
    #[must_use]
    pub const fn from_hz(hz: u32) -> Self {
        Self(hz)
    }

    /// Create a frequency from kHz, `None` on overflow
    #[must_use]
    pub const fn from_khz(khz: u32) -> Option<Self> {
        match khz.checked_mul(1_000) {
            Some(hz) => Some(Self(hz)),
            None => None,
        }
    }

    /// Create a frequency from MHz, `None` on overflow
    #[must_use]
    pub const fn from_mhz(mhz: u32) -> Option<Self> {
        match mhz.checked_mul(1_000_000) {
            Some(hz) => Some(Self(hz)),
            None => None,
        }
    }

    /// Get the frequency in Hz
    #[must_use]
    pub const fn as_hz(self) -> u32 {
        self.0
    }

    /// Get the frequency in kHz (truncated)
    #[must_use]
    pub const fn as_khz(self) -> u32 {
        self.0 / 1000
    }

    /// Get the frequency in MHz as floating point
    #[must_use]
    pub fn as_mhz_f32(self) -> f32 {
        self.0 as f32 / 1_000_000.0
    }
}

impl fmt::Debug for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency({} Hz)", self.0)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Frequency {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{} Hz", self.0);
    }
}

/// 7-bit two-wire bus device address
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceAddress(u8);

impl DeviceAddress {
    /// VersaClock PLL (`1101001b`)
    pub const VERSACLOCK: Self = Self(0x69);

    /// Create from a 7-bit address (the R/W bit is masked off)
    #[must_use]
    pub const fn new(addr: u8) -> Self {
        Self(addr & 0x7F)
    }

    /// Get the 7-bit address
    #[must_use]
    pub const fn addr(self) -> u8 {
        self.0
    }

    /// Address shifted into the upper seven bits of the address byte
    #[must_use]
    pub const fn as_write_byte(self) -> u8 {
        self.0 << 1
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for DeviceAddress {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "0x{:02X}", self.0);
    }
}
