//! Analyzer Front End
//!
//! Bundles the PLL band selector, the DDS driver and the sample snapshot
//! behind the commands the sweep loop and the console use.

use core::fmt;

use heapless::Vec;

use crate::bus::writer::{EngineHandle, RegisterWriter};
use crate::bus::BusError;
use crate::config::{
    power_up_frequency, PLL_REGISTER_FILE_LEN, SWEEP_START_HZ, SWEEP_STEP_HZ, SWEEP_STOP_HZ,
};
use crate::dds::tuning::compute_tuning_word;
use crate::dds::{Dds, DdsError, DdsLink, TuningWord};
use crate::pll::band::{BandTable, FrequencyBand, POWER_UP_BLOCKS};
use crate::pll::selector::{BandSelector, PllError, PllUpdate};
use crate::pll::snapshot::{Mismatch, RegisterSnapshot};
use crate::sampling::{SampleSet, SharedSamples};
use crate::types::Frequency;

/// Front-end failures
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalyzerError<E> {
    /// PLL side
    Pll(PllError),
    /// DDS side
    Dds(DdsError<E>),
}

impl<E> From<PllError> for AnalyzerError<E> {
    fn from(err: PllError) -> Self {
        Self::Pll(err)
    }
}

impl<E> From<BusError> for AnalyzerError<E> {
    fn from(err: BusError) -> Self {
        Self::Pll(PllError::Bus(err))
    }
}

impl<E> From<DdsError<E>> for AnalyzerError<E> {
    fn from(err: DdsError<E>) -> Self {
        Self::Dds(err)
    }
}

impl<E: fmt::Debug> fmt::Display for AnalyzerError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pll(err) => write!(f, "{err}"),
            Self::Dds(err) => write!(f, "{err}"),
        }
    }
}

#[cfg(feature = "embedded")]
impl<E> defmt::Format for AnalyzerError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Pll(err) => defmt::write!(f, "Pll({})", err),
            Self::Dds(err) => defmt::write!(f, "Dds({})", err),
        }
    }
}

/// What a [`Analyzer::tune`] did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tuned {
    /// PLL band outcome
    pub pll: PllUpdate,
    /// Word committed to the DDS
    pub word: TuningWord,
}

/// PLL plus DDS front end
pub struct Analyzer<'s, H, L> {
    pll: BandSelector<RegisterWriter<H>>,
    dds: Dds<L>,
    samples: &'s SharedSamples,
}

impl<'s, H: EngineHandle, L: DdsLink> Analyzer<'s, H, L> {
    /// Assemble the front end; nothing is written until [`Analyzer::initialize`]
    ///
    /// # Errors
    ///
    /// [`PllError::BandNotFound`] if the power-up frequency is outside `table`.
    pub fn new(table: BandTable, pll: H, dds: L, samples: &'s SharedSamples) -> Result<Self, PllError> {
        Ok(Self {
            pll: BandSelector::new(table, RegisterWriter::new(pll), power_up_frequency())?,
            dds: Dds::new(dds),
            samples,
        })
    }

    /// Write the PLL power-up registers and put the DDS in serial mode
    ///
    /// # Errors
    ///
    /// The first PLL or DDS failure.
    pub fn initialize(&mut self) -> Result<(), AnalyzerError<L::Error>> {
        self.pll.initialize(&POWER_UP_BLOCKS, power_up_frequency())?;
        self.dds.initialize()?;
        info!("frontend: initialized, band {=usize}", self.pll.active_index());
        Ok(())
    }

    /// Program the DDS only
    ///
    /// # Errors
    ///
    /// See [`Dds::set_frequency`].
    pub fn set_dds_frequency(&mut self, freq: Frequency) -> Result<TuningWord, DdsError<L::Error>> {
        self.dds.set_frequency(freq)
    }

    /// Move the PLL to `freq`'s band if needed
    ///
    /// # Errors
    ///
    /// See [`BandSelector::update_for_frequency`].
    pub fn update_pll_for_frequency(&mut self, freq: Frequency) -> Result<PllUpdate, PllError> {
        self.pll.update_for_frequency(freq)
    }

    /// Set both chips for `freq`
    ///
    /// The DDS range is checked first, so an out-of-range request leaves the
    /// PLL untouched too.
    ///
    /// # Errors
    ///
    /// The first PLL or DDS failure.
    pub fn tune(&mut self, freq: Frequency) -> Result<Tuned, AnalyzerError<L::Error>> {
        let word = compute_tuning_word(freq).map_err(DdsError::<L::Error>::from)?;
        let pll = self.pll.update_for_frequency(freq)?;
        self.dds.load(&word)?;
        Ok(Tuned { pll, word })
    }

    /// Wait for the bus to go idle
    ///
    /// # Errors
    ///
    /// See [`RegisterWriter::flush`].
    pub fn flush(&mut self) -> Result<(), BusError> {
        self.pll.writer_mut().flush()
    }

    /// Start a full PLL register dump; collect it with
    /// [`Analyzer::poll_registers`]
    ///
    /// # Errors
    ///
    /// [`BusError::EngineBusy`] if the bus does not go idle, or the fault of
    /// the previous transaction.
    pub fn read_all_registers(&mut self) -> Result<(), BusError> {
        let writer = self.pll.writer_mut();
        writer.flush()?;
        writer.handle_mut().begin_read_all()
    }

    /// The register dump, once it has completed
    pub fn poll_registers(&mut self) -> Option<RegisterSnapshot> {
        self.pll
            .writer_mut()
            .handle_mut()
            .take_registers()
            .map(RegisterSnapshot::from_bytes)
    }

    /// Registers of the active band that did not read back as written
    #[must_use]
    pub fn verify_active_band(&self, snapshot: &RegisterSnapshot) -> Vec<Mismatch, PLL_REGISTER_FILE_LEN> {
        let diffs = snapshot.mismatches(self.pll.active_band().blocks);
        for diff in &diffs {
            warn!(
                "frontend: reg {=u8:#x} wrote {=u8:#x} read {=u8:#x}",
                diff.address,
                diff.expected,
                diff.actual
            );
        }
        diffs
    }

    /// Most recent ADC sample set
    #[must_use]
    pub fn latest_samples(&self) -> SampleSet {
        self.samples.latest()
    }

    /// The active PLL band
    #[must_use]
    pub fn active_band(&self) -> &'static FrequencyBand {
        self.pll.active_band()
    }

    /// Index of the active PLL band
    #[must_use]
    pub const fn active_band_index(&self) -> usize {
        self.pll.active_index()
    }

    /// Access the DDS driver
    pub fn dds_mut(&mut self) -> &mut Dds<L> {
        &mut self.dds
    }

    /// Access the PLL engine handle
    pub fn pll_handle_mut(&mut self) -> &mut H {
        self.pll.writer_mut().handle_mut()
    }
}

/// Stepped frequency sweep that wraps from `stop` back to `start`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sweep {
    start: u32,
    stop: u32,
    step: u32,
    next: u32,
}

impl Sweep {
    /// Sweep `start..=stop` in `step` increments; `None` if the range is
    /// empty or the step is zero
    #[must_use]
    pub const fn new(start: Frequency, stop: Frequency, step: u32) -> Option<Self> {
        if step == 0 || start.as_hz() > stop.as_hz() {
            return None;
        }
        Some(Self {
            start: start.as_hz(),
            stop: stop.as_hz(),
            step,
            next: start.as_hz(),
        })
    }

    /// The board's default sweep
    #[must_use]
    pub const fn default_plan() -> Self {
        Self {
            start: SWEEP_START_HZ,
            stop: SWEEP_STOP_HZ,
            step: SWEEP_STEP_HZ,
            next: SWEEP_START_HZ,
        }
    }

    /// Next point, wrapping after `stop`
    pub fn next_point(&mut self) -> Frequency {
        let point = self.next;
        self.next = match point.checked_add(self.step) {
            Some(next) if next <= self.stop => next,
            _ => self.start,
        };
        Frequency::from_hz(point)
    }

    /// Whether the next point starts a new pass
    #[must_use]
    pub const fn at_start(&self) -> bool {
        self.next == self.start
    }
}
