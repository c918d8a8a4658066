//! DDS serial link and programming sequence
//!
//! The AD9851 latches its 40-bit input register into the phase accumulator on
//! the FQ_UD strobe. Strobing before all five bytes are shifted in commits a
//! half-written word, so [`Dds::set_frequency`] only strobes once the link has
//! accepted every byte.

use core::fmt;

use super::tuning::{compute_tuning_word, FrequencyOutOfRange, TuningWord};
use crate::config::DDS_LINK_POLL_LIMIT;
use crate::types::Frequency;

/// Synchronous byte-shift link to the DDS plus its control strobes
///
/// No addressing and no acknowledge: a byte is gone once `shift_out` returns.
pub trait DdsLink {
    /// Pin or bus error
    type Error;

    /// Whether the link can take another byte
    fn ready(&mut self) -> Result<bool, Self::Error>;

    /// Shift one byte out, least significant bit first
    fn shift_out(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Whether every byte handed to `shift_out` has reached the chip
    fn drained(&mut self) -> Result<bool, Self::Error>;

    /// Pulse FQ_UD, committing the input register
    fn pulse_frequency_update(&mut self) -> Result<(), Self::Error>;

    /// Pulse W_CLK on its own
    fn pulse_word_clock(&mut self) -> Result<(), Self::Error>;

    /// Pulse RESET
    fn pulse_reset(&mut self) -> Result<(), Self::Error>;
}

/// DDS programming failures
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DdsError<E> {
    /// Requested frequency outside 1–70 MHz; nothing was sent
    FrequencyOutOfRange(Frequency),
    /// The link never became ready; no strobe was issued
    LinkStalled,
    /// Pin or bus error from the link
    Link(E),
}

impl<E> From<FrequencyOutOfRange> for DdsError<E> {
    fn from(err: FrequencyOutOfRange) -> Self {
        Self::FrequencyOutOfRange(err.0)
    }
}

impl<E: fmt::Debug> fmt::Display for DdsError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrequencyOutOfRange(freq) => write!(f, "DDS frequency out of range: {freq}"),
            Self::LinkStalled => write!(f, "DDS link never became ready"),
            Self::Link(err) => write!(f, "DDS link error: {err:?}"),
        }
    }
}

#[cfg(feature = "embedded")]
impl<E> defmt::Format for DdsError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::FrequencyOutOfRange(freq) => defmt::write!(f, "FrequencyOutOfRange({})", freq),
            Self::LinkStalled => defmt::write!(f, "LinkStalled"),
            Self::Link(_) => defmt::write!(f, "Link"),
        }
    }
}

/// AD9851 driver over a [`DdsLink`]
pub struct Dds<L> {
    link: L,
    poll_limit: u32,
}

impl<L: DdsLink> Dds<L> {
    /// Create a driver; the chip is not touched until [`Dds::initialize`]
    #[must_use]
    pub const fn new(link: L) -> Self {
        Self {
            link,
            poll_limit: DDS_LINK_POLL_LIMIT,
        }
    }

    /// Override how long to poll the link before giving up
    #[must_use]
    pub const fn with_poll_limit(mut self, poll_limit: u32) -> Self {
        self.poll_limit = poll_limit;
        self
    }

    /// Access the link
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Give the link back
    pub fn release(self) -> L {
        self.link
    }

    /// Reset the chip and switch it to serial input mode
    ///
    /// A W_CLK pulse followed by an FQ_UD pulse after reset selects serial
    /// loading.
    ///
    /// # Errors
    ///
    /// [`DdsError::Link`] on a pin error.
    pub fn initialize(&mut self) -> Result<(), DdsError<L::Error>> {
        self.link.pulse_reset().map_err(DdsError::Link)?;
        self.link.pulse_word_clock().map_err(DdsError::Link)?;
        self.link.pulse_frequency_update().map_err(DdsError::Link)?;
        debug!("dds: serial mode");
        Ok(())
    }

    /// Program `freq` and commit it
    ///
    /// # Errors
    ///
    /// [`DdsError::FrequencyOutOfRange`] before anything is sent,
    /// [`DdsError::LinkStalled`] if the link stops accepting bytes (no strobe
    /// is issued), [`DdsError::Link`] on a pin or bus error.
    pub fn set_frequency(&mut self, freq: Frequency) -> Result<TuningWord, DdsError<L::Error>> {
        let word = compute_tuning_word(freq)?;
        self.load(&word)?;
        debug!("dds: {} -> {}", freq, word);
        Ok(word)
    }

    /// Shift `word` out and strobe it in
    ///
    /// # Errors
    ///
    /// As for [`Dds::set_frequency`], minus the range check.
    pub fn load(&mut self, word: &TuningWord) -> Result<(), DdsError<L::Error>> {
        for byte in word.to_bytes() {
            self.poll(L::ready)?;
            self.link.shift_out(byte).map_err(DdsError::Link)?;
        }
        self.poll(L::drained)?;
        self.link.pulse_frequency_update().map_err(DdsError::Link)
    }

    fn poll(&mut self, mut check: impl FnMut(&mut L) -> Result<bool, L::Error>) -> Result<(), DdsError<L::Error>> {
        for _ in 0..self.poll_limit {
            if check(&mut self.link).map_err(DdsError::Link)? {
                return Ok(());
            }
        }
        Err(DdsError::LinkStalled)
    }
}
