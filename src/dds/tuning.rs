//! DDS Tuning-Word Calculation
//!
//! The AD9851 output is `f_out = W × f_ref / 2^32`, where `W` is the 32-bit
//! frequency tuning word and `f_ref` the system clock after the on-chip 6×
//! multiplier. This module is testable on the host.
//!
//! # Word format
//!
//! Forty bits go to the chip, least significant byte first:
//!
//! ```text
//! W[7:0]  W[15:8]  W[23:16]  W[31:24]  control
//! ```
//!
//! The control byte is fixed for this application (phase 0, 6× multiplier).

use fixed::types::{U0F32, U32F32};

use crate::config::{
    DDS_CONTROL_BYTE, DDS_MAX_FREQUENCY_HZ, DDS_MIN_FREQUENCY_HZ, DDS_REFERENCE_CLOCK_HZ,
};
use crate::types::Frequency;

/// Requested frequency outside the DDS's usable range
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrequencyOutOfRange(pub Frequency);

/// 32-bit fixed-point frequency ratio plus control byte
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TuningWord {
    ratio: U0F32,
    control: u8,
}

impl TuningWord {
    /// Create from a raw word and control byte
    #[must_use]
    pub const fn new(word: u32, control: u8) -> Self {
        Self {
            ratio: U0F32::from_bits(word),
            control,
        }
    }

    /// Raw 32-bit tuning word
    #[must_use]
    pub const fn word(&self) -> u32 {
        self.ratio.to_bits()
    }

    /// `f_out / f_ref` as a fixed-point fraction
    #[must_use]
    pub const fn ratio(&self) -> U0F32 {
        self.ratio
    }

    /// Control byte sent after the word
    #[must_use]
    pub const fn control(&self) -> u8 {
        self.control
    }

    /// Wire order: word LSB first, then the control byte
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; 5] {
        let w = self.word().to_le_bytes();
        [w[0], w[1], w[2], w[3], self.control]
    }

    /// Exact output frequency this word synthesizes from `reference_hz`
    #[must_use]
    pub fn output_frequency(&self, reference_hz: u32) -> U32F32 {
        // W × f_ref fits in 64 bits and is f_out scaled by 2^32.
        U32F32::from_bits(u64::from(self.word()) * u64::from(reference_hz))
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TuningWord {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "W={=u32:#x} ctl={=u8:#x}", self.word(), self.control);
    }
}

/// Nearest tuning word for `freq` against `reference_hz`, without range checks
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn tuning_word_for(freq: Frequency, reference_hz: u32) -> u32 {
    let reference = reference_hz as u64;
    let scaled = (freq.as_hz() as u64) << 32;
    ((scaled + reference / 2) / reference) as u32
}

/// Tuning word for `freq` on this board's DDS
///
/// # Errors
///
/// [`FrequencyOutOfRange`] below 1 MHz or above 70 MHz.
pub fn compute_tuning_word(freq: Frequency) -> Result<TuningWord, FrequencyOutOfRange> {
    let hz = freq.as_hz();
    if !(DDS_MIN_FREQUENCY_HZ..=DDS_MAX_FREQUENCY_HZ).contains(&hz) {
        return Err(FrequencyOutOfRange(freq));
    }

    Ok(TuningWord::new(
        tuning_word_for(freq, DDS_REFERENCE_CLOCK_HZ),
        DDS_CONTROL_BYTE,
    ))
}
