//! Band Selector / Register Updater
//!
//! Keeps track of the active band and rewrites the PLL only when a requested
//! frequency leaves it.

use core::fmt;

use super::band::{BandTable, FrequencyBand};
use crate::bus::writer::{BlockWriter, RegisterBlock};
use crate::bus::BusError;
use crate::types::Frequency;

/// Outcome of a successful band check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PllUpdate {
    /// Frequency is inside the active band; nothing written
    Unchanged,
    /// Blocks of a new band were issued
    Changed {
        /// Newly active band
        band: usize,
    },
}

/// Band selection failures
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PllError {
    /// No band covers the frequency; PLL left as it was
    BandNotFound(Frequency),
    /// A block could not be issued; active band left as it was
    Bus(BusError),
}

impl From<BusError> for PllError {
    fn from(err: BusError) -> Self {
        Self::Bus(err)
    }
}

impl fmt::Display for PllError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BandNotFound(freq) => write!(f, "no PLL band covers {freq}"),
            Self::Bus(err) => write!(f, "PLL write failed: {err}"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for PllError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::BandNotFound(freq) => defmt::write!(f, "BandNotFound({})", freq),
            Self::Bus(err) => defmt::write!(f, "Bus({})", err),
        }
    }
}

/// Active-band tracker driving a [`BlockWriter`]
pub struct BandSelector<W> {
    table: BandTable,
    writer: W,
    active: usize,
}

impl<W: BlockWriter> BandSelector<W> {
    /// Start with the band that contains the power-up frequency active
    ///
    /// # Errors
    ///
    /// [`PllError::BandNotFound`] if `power_up` lies outside the table.
    pub fn new(table: BandTable, writer: W, power_up: Frequency) -> Result<Self, PllError> {
        let active = table.find(power_up).ok_or(PllError::BandNotFound(power_up))?;
        Ok(Self { table, writer, active })
    }

    /// Index of the active band
    #[must_use]
    pub const fn active_index(&self) -> usize {
        self.active
    }

    /// The active band
    #[must_use]
    pub fn active_band(&self) -> &'static FrequencyBand {
        &self.table.bands()[self.active]
    }

    /// The band table
    #[must_use]
    pub const fn table(&self) -> &BandTable {
        &self.table
    }

    /// Access the block writer
    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Bring the PLL to `freq`'s band if it is not there already
    ///
    /// # Errors
    ///
    /// [`PllError::BandNotFound`] outside the table, [`PllError::Bus`] if a
    /// block could not be issued. In both cases the active band is unchanged.
    pub fn update_for_frequency(&mut self, freq: Frequency) -> Result<PllUpdate, PllError> {
        let khz = freq.as_khz();

        if self.active_band().contains_khz(khz) {
            return Ok(PllUpdate::Unchanged);
        }

        let index = self.table.find(freq).ok_or(PllError::BandNotFound(freq))?;
        let band = self.table.bands()[index];

        for block in band.blocks {
            self.writer.write_block(block)?;
        }

        info!(
            "pll: band {=usize} -> {=usize} ({=u32}..{=u32} kHz)",
            self.active,
            index,
            band.lower_khz,
            band.upper_khz
        );
        self.active = index;
        Ok(PllUpdate::Changed { band: index })
    }

    /// Write the power-up register set and make its band active
    ///
    /// # Errors
    ///
    /// [`PllError::BandNotFound`] if `power_up` lies outside the table,
    /// [`PllError::Bus`] if a block could not be issued.
    pub fn initialize(&mut self, blocks: &[RegisterBlock], power_up: Frequency) -> Result<(), PllError> {
        let index = self.table.find(power_up).ok_or(PllError::BandNotFound(power_up))?;
        for block in blocks {
            self.writer.write_block(block)?;
        }
        self.active = index;
        Ok(())
    }
}
