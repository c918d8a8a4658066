//! Frequency Band Table
//!
//! Bands are half-open kHz intervals `[lower, upper)` that tile the operating
//! range without gaps. Each band carries the register blocks to write when it
//! becomes active.

use core::fmt;

use crate::bus::writer::RegisterBlock;
use crate::config::PLL_REGISTER_FILE_LEN;
use crate::types::Frequency;

/// One contiguous frequency interval sharing a PLL configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrequencyBand {
    /// Inclusive lower edge in kHz
    pub lower_khz: u32,
    /// Exclusive upper edge in kHz
    pub upper_khz: u32,
    /// Blocks to write, in address order
    pub blocks: &'static [RegisterBlock],
}

impl FrequencyBand {
    /// Create a band
    #[must_use]
    pub const fn new(lower_khz: u32, upper_khz: u32, blocks: &'static [RegisterBlock]) -> Self {
        Self {
            lower_khz,
            upper_khz,
            blocks,
        }
    }

    /// Whether `khz` falls inside `[lower, upper)`
    #[must_use]
    pub const fn contains_khz(&self, khz: u32) -> bool {
        self.lower_khz <= khz && khz < self.upper_khz
    }
}

/// Why a band table was refused
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableError {
    /// No bands at all
    Empty,
    /// `lower >= upper`
    EmptyBand {
        /// Offending band
        index: usize,
    },
    /// `band[index].upper != band[index + 1].lower`
    NotContiguous {
        /// Band whose upper edge does not meet the next band
        index: usize,
    },
    /// A band with nothing to write
    NoBlocks {
        /// Offending band
        index: usize,
    },
    /// Blocks empty, overlapping or not in ascending address order
    BlocksOutOfOrder {
        /// Offending band
        index: usize,
    },
    /// A block reaches past the register file
    BlockOutOfRange {
        /// Offending band
        index: usize,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "band table is empty"),
            Self::EmptyBand { index } => write!(f, "band {index} is empty"),
            Self::NotContiguous { index } => write!(f, "gap or overlap after band {index}"),
            Self::NoBlocks { index } => write!(f, "band {index} has no register blocks"),
            Self::BlocksOutOfOrder { index } => write!(f, "band {index} blocks out of order"),
            Self::BlockOutOfRange { index } => {
                write!(f, "band {index} writes past the register file")
            }
        }
    }
}

/// A validated, ordered band table
#[derive(Clone, Copy, Debug)]
pub struct BandTable {
    bands: &'static [FrequencyBand],
}

impl BandTable {
    /// Validate `bands` and wrap them
    ///
    /// # Errors
    ///
    /// A [`TableError`] naming the first band that breaks the partition or
    /// block-ordering rules.
    pub fn new(bands: &'static [FrequencyBand]) -> Result<Self, TableError> {
        if bands.is_empty() {
            return Err(TableError::Empty);
        }

        for (index, band) in bands.iter().enumerate() {
            if band.lower_khz >= band.upper_khz {
                return Err(TableError::EmptyBand { index });
            }
            if band.blocks.is_empty() {
                return Err(TableError::NoBlocks { index });
            }

            let mut next_free = 0usize;
            for block in band.blocks {
                if block.length() == 0 || (block.start_address() as usize) < next_free {
                    return Err(TableError::BlocksOutOfOrder { index });
                }
                if block.end_address() > PLL_REGISTER_FILE_LEN {
                    return Err(TableError::BlockOutOfRange { index });
                }
                next_free = block.end_address();
            }
        }

        if let Some(index) = bands
            .windows(2)
            .position(|pair| pair[0].upper_khz != pair[1].lower_khz)
        {
            return Err(TableError::NotContiguous { index });
        }

        Ok(Self { bands })
    }

    /// The production VersaClock table
    ///
    /// # Errors
    ///
    /// Only if the compiled-in table is malformed.
    pub fn versaclock() -> Result<Self, TableError> {
        Self::new(&VERSACLOCK_BANDS)
    }

    /// All bands in order
    #[must_use]
    pub const fn bands(&self) -> &'static [FrequencyBand] {
        self.bands
    }

    /// Number of bands
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bands.len()
    }

    /// Always false for a validated table
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Band at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'static FrequencyBand> {
        self.bands.get(index)
    }

    /// Lowest covered frequency in kHz
    #[must_use]
    pub fn lower_khz(&self) -> u32 {
        self.bands.first().map_or(0, |b| b.lower_khz)
    }

    /// Exclusive upper edge of the covered range in kHz
    #[must_use]
    pub fn upper_khz(&self) -> u32 {
        self.bands.last().map_or(0, |b| b.upper_khz)
    }

    /// Index of the first band containing `freq`
    #[must_use]
    pub fn find(&self, freq: Frequency) -> Option<usize> {
        let khz = freq.as_khz();
        self.bands.iter().position(|band| band.contains_khz(khz))
    }
}

/// Register addresses rewritten on a band change
pub mod reg {
    /// PLL1 feedback divider N (low bits)
    pub const PLL1_FEEDBACK: u8 = 0x02;
    /// PLL1 fractional / VCO range select
    pub const PLL1_RANGE: u8 = 0x06;
    /// P0 output divider
    pub const P0_DIVIDER: u8 = 0x0D;
}

const fn band_blocks(feedback: &'static [u8], range: &'static [u8], divider: &'static [u8]) -> [RegisterBlock; 3] {
    [
        RegisterBlock::new(reg::PLL1_FEEDBACK, feedback),
        RegisterBlock::new(reg::PLL1_RANGE, range),
        RegisterBlock::new(reg::P0_DIVIDER, divider),
    ]
}

static BAND0: [RegisterBlock; 3] = band_blocks(&[0x50], &[0x00], &[0x14]);
static BAND1: [RegisterBlock; 3] = band_blocks(&[0x50], &[0x80], &[0x14]);
static BAND2: [RegisterBlock; 3] = band_blocks(&[0x14], &[0x00], &[0x05]);
static BAND3: [RegisterBlock; 3] = band_blocks(&[0x14], &[0x80], &[0x05]);
static BAND4: [RegisterBlock; 3] = band_blocks(&[0x08], &[0x00], &[0x02]);
static BAND5: [RegisterBlock; 3] = band_blocks(&[0x08], &[0x80], &[0x02]);
static BAND6: [RegisterBlock; 3] = band_blocks(&[0x04], &[0x00], &[0x01]);
static BAND7: [RegisterBlock; 3] = band_blocks(&[0x04], &[0x80], &[0x01]);

/// VersaClock bands, 1 MHz to 70 MHz
pub static VERSACLOCK_BANDS: [FrequencyBand; 8] = [
    FrequencyBand::new(1_000, 3_000, &BAND0),
    FrequencyBand::new(3_000, 4_000, &BAND1),
    FrequencyBand::new(4_000, 10_000, &BAND2),
    FrequencyBand::new(10_000, 16_000, &BAND3),
    FrequencyBand::new(16_000, 24_000, &BAND4),
    FrequencyBand::new(24_000, 38_000, &BAND5),
    FrequencyBand::new(38_000, 48_000, &BAND6),
    FrequencyBand::new(48_000, 70_000, &BAND7),
];

/// Power-up writes, leaving the PLL in the band that contains 1 MHz
///
/// Reference divider, feedback divider, PLL mux, range select, P0 source
/// select, P0 divider and Y0 divider select, each a single register.
pub static POWER_UP_BLOCKS: [RegisterBlock; 7] = [
    RegisterBlock::new(0x01, &[0x01]),
    RegisterBlock::new(reg::PLL1_FEEDBACK, &[0x50]),
    RegisterBlock::new(0x03, &[0b0110_0000]),
    RegisterBlock::new(reg::PLL1_RANGE, &[0x00]),
    RegisterBlock::new(0x09, &[0b0010_0000]),
    RegisterBlock::new(reg::P0_DIVIDER, &[0x14]),
    RegisterBlock::new(0x13, &[0b0011_1000]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_table_validates() {
        let table = BandTable::versaclock().unwrap();
        assert_eq!(table.len(), 8);
        assert_eq!(table.lower_khz(), 1_000);
        assert_eq!(table.upper_khz(), 70_000);
    }

    #[test]
    fn power_up_frequency_is_in_first_band() {
        let table = BandTable::versaclock().unwrap();
        assert_eq!(table.find(crate::config::power_up_frequency()), Some(0));
    }

    #[test]
    fn power_up_blocks_agree_with_first_band() {
        for block in &BAND0 {
            let addr = block.start_address();
            let init = POWER_UP_BLOCKS
                .iter()
                .find_map(|b| b.value_at(addr))
                .unwrap();
            assert_eq!(Some(init), block.value_at(addr));
        }
    }

    static GAP: [FrequencyBand; 2] = [
        FrequencyBand::new(1_000, 2_000, &BAND0),
        FrequencyBand::new(2_500, 3_000, &BAND1),
    ];

    static OVERLAP_BLOCKS: [RegisterBlock; 2] = [
        RegisterBlock::new(0x02, &[0x01, 0x02]),
        RegisterBlock::new(0x03, &[0x03]),
    ];
    static OVERLAP: [FrequencyBand; 1] = [FrequencyBand::new(1_000, 2_000, &OVERLAP_BLOCKS)];

    static TOO_FAR_BLOCKS: [RegisterBlock; 1] = [RegisterBlock::new(26, &[0x01, 0x02])];
    static TOO_FAR: [FrequencyBand; 1] = [FrequencyBand::new(1_000, 2_000, &TOO_FAR_BLOCKS)];

    static INVERTED: [FrequencyBand; 1] = [FrequencyBand::new(2_000, 2_000, &BAND0)];

    #[test]
    fn malformed_tables_are_refused() {
        assert_eq!(BandTable::new(&[]).unwrap_err(), TableError::Empty);
        assert_eq!(BandTable::new(&GAP).unwrap_err(), TableError::NotContiguous { index: 0 });
        assert_eq!(BandTable::new(&OVERLAP).unwrap_err(), TableError::BlocksOutOfOrder { index: 0 });
        assert_eq!(BandTable::new(&TOO_FAR).unwrap_err(), TableError::BlockOutOfRange { index: 0 });
        assert_eq!(BandTable::new(&INVERTED).unwrap_err(), TableError::EmptyBand { index: 0 });
    }
}
