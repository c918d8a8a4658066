//! VersaClock register dumps
//!
//! A snapshot is what the chip actually holds after a full read. Nothing in
//! the write path depends on it; comparing a snapshot against the blocks that
//! were written is an opt-in check.

use heapless::Vec;

use crate::bus::writer::RegisterBlock;
use crate::config::PLL_REGISTER_FILE_LEN;

/// Register whose read-back value differs from what was written
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mismatch {
    /// Register address
    pub address: u8,
    /// Value written
    pub expected: u8,
    /// Value read back
    pub actual: u8,
}

/// The full 27-byte register file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterSnapshot([u8; PLL_REGISTER_FILE_LEN]);

impl RegisterSnapshot {
    /// Wrap a raw register dump
    #[must_use]
    pub const fn from_bytes(bytes: [u8; PLL_REGISTER_FILE_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw bytes, indexed by register address
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PLL_REGISTER_FILE_LEN] {
        &self.0
    }

    /// Value of `register`
    #[must_use]
    pub fn get(&self, register: u8) -> Option<u8> {
        self.0.get(register as usize).copied()
    }

    /// Registers in `blocks` whose read-back differs from the written value
    #[must_use]
    pub fn mismatches(&self, blocks: &[RegisterBlock]) -> Vec<Mismatch, PLL_REGISTER_FILE_LEN> {
        let mut out = Vec::new();
        for block in blocks {
            for (offset, &expected) in block.values().iter().enumerate() {
                #[allow(clippy::cast_possible_truncation)]
                let address = block.start_address().wrapping_add(offset as u8);
                let actual = self.get(address);
                if actual != Some(expected) {
                    // A register file has at most PLL_REGISTER_FILE_LEN
                    // distinct addresses; further entries are duplicates.
                    let _ = out.push(Mismatch {
                        address,
                        expected,
                        actual: actual.unwrap_or(0),
                    });
                }
            }
        }
        out
    }

    /// Whether every register in `blocks` reads back as written
    #[must_use]
    pub fn matches(&self, blocks: &[RegisterBlock]) -> bool {
        self.mismatches(blocks).is_empty()
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for RegisterSnapshot {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{:x}", self.0);
    }
}
