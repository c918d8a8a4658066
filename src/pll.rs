//! VersaClock PLL configuration
//!
//! The PLL is not programmed from first principles. A table of frequency
//! bands lists, for each band, the few register blocks that differ from the
//! power-up configuration; changing band rewrites exactly those blocks.

pub mod band;
pub mod selector;
pub mod snapshot;

pub use crate::bus::writer::RegisterBlock;
