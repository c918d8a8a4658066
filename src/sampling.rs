//! S-Parameter Sample Snapshot
//!
//! The ADC side converts the four detector outputs once per acquisition
//! cycle and publishes them as one [`SampleSet`]. The main sequence only ever
//! reads a whole set, so it never sees S11 from one cycle next to S21 from
//! the next.

use core::cell::Cell;

use critical_section::Mutex;
use micromath::F32Ext;

use crate::config::{ADC_RESOLUTION_BITS, ADC_VREF, NUM_ADC_CHANNELS};

/// Full-scale ADC code
const ADC_FULL_SCALE: u16 = (1 << ADC_RESOLUTION_BITS) - 1;

/// Mid-scale code, the detector's zero
#[allow(clippy::cast_precision_loss)]
const ADC_MID_SCALE: f32 = (1u32 << (ADC_RESOLUTION_BITS - 1)) as f32;

/// ADC input channel, in acquisition order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    /// Reflection, in-phase
    S11Re = 0,
    /// Reflection, quadrature
    S11Im = 1,
    /// Transmission, in-phase
    S21Re = 2,
    /// Transmission, quadrature
    S21Im = 3,
}

impl Channel {
    /// All channels in acquisition order
    pub const ALL: [Self; NUM_ADC_CHANNELS] = [Self::S11Re, Self::S11Im, Self::S21Re, Self::S21Im];

    /// Position in a raw sample array
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One complex reflection or transmission measurement
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SParameter {
    /// In-phase part, normalized to ±1
    pub re: f32,
    /// Quadrature part, normalized to ±1
    pub im: f32,
}

impl SParameter {
    /// Build from two raw detector codes
    #[must_use]
    pub fn from_raw(re: u16, im: u16) -> Self {
        Self {
            re: normalize(re),
            im: normalize(im),
        }
    }

    /// Linear magnitude
    #[must_use]
    pub fn magnitude(&self) -> f32 {
        (self.re * self.re + self.im * self.im).sqrt()
    }

    /// Magnitude in dB, floored at -120 dB
    #[must_use]
    pub fn magnitude_db(&self) -> f32 {
        let mag = self.magnitude();
        if mag < 1e-6 {
            return -120.0;
        }
        20.0 * mag.log10()
    }

    /// Phase in degrees, -180 to 180
    #[must_use]
    pub fn phase_deg(&self) -> f32 {
        self.im.atan2(self.re).to_degrees()
    }
}

fn normalize(raw: u16) -> f32 {
    (f32::from(raw.min(ADC_FULL_SCALE)) - ADC_MID_SCALE) / ADC_MID_SCALE
}

/// Raw detector codes of one acquisition cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SampleSet {
    raw: [u16; NUM_ADC_CHANNELS],
}

impl SampleSet {
    /// Wrap raw codes in [`Channel`] order
    #[must_use]
    pub const fn from_raw(raw: [u16; NUM_ADC_CHANNELS]) -> Self {
        Self { raw }
    }

    /// Raw codes in [`Channel`] order
    #[must_use]
    pub const fn raw(&self) -> [u16; NUM_ADC_CHANNELS] {
        self.raw
    }

    /// Raw code of one channel
    #[must_use]
    pub const fn channel(&self, channel: Channel) -> u16 {
        self.raw[channel.index()]
    }

    /// Input voltage of one channel
    #[must_use]
    pub fn voltage(&self, channel: Channel) -> f32 {
        f32::from(self.channel(channel)) / f32::from(ADC_FULL_SCALE) * ADC_VREF
    }

    /// Reflection coefficient
    #[must_use]
    pub fn s11(&self) -> SParameter {
        SParameter::from_raw(self.channel(Channel::S11Re), self.channel(Channel::S11Im))
    }

    /// Transmission coefficient
    #[must_use]
    pub fn s21(&self) -> SParameter {
        SParameter::from_raw(self.channel(Channel::S21Re), self.channel(Channel::S21Im))
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for SampleSet {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "S11=({},{}) S21=({},{})",
            self.raw[0],
            self.raw[1],
            self.raw[2],
            self.raw[3]
        );
    }
}

/// Latest sample set, shared between the ADC side and the main sequence
pub struct SharedSamples {
    cell: Mutex<Cell<(SampleSet, u32)>>,
}

impl SharedSamples {
    /// Empty cell, usable in a `static`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: Mutex::new(Cell::new((SampleSet::from_raw([0; NUM_ADC_CHANNELS]), 0))),
        }
    }

    /// Replace the current set
    pub fn publish(&self, samples: SampleSet) {
        critical_section::with(|cs| {
            let cell = self.cell.borrow(cs);
            let (_, seq) = cell.get();
            cell.set((samples, seq.wrapping_add(1)));
        });
    }

    /// The most recent set
    #[must_use]
    pub fn latest(&self) -> SampleSet {
        self.snapshot().0
    }

    /// The most recent set with its publish count (0 before the first)
    #[must_use]
    pub fn snapshot(&self) -> (SampleSet, u32) {
        critical_section::with(|cs| self.cell.borrow(cs).get())
    }
}

impl Default for SharedSamples {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mid_scale_is_zero() {
        let s = SParameter::from_raw(2048, 2048);
        assert!(s.magnitude() < 1e-6);
        assert!((s.magnitude_db() + 120.0).abs() < 1e-3);
    }

    #[test]
    fn channel_order() {
        let set = SampleSet::from_raw([1, 2, 3, 4]);
        assert_eq!(set.channel(Channel::S11Re), 1);
        assert_eq!(set.channel(Channel::S21Im), 4);
    }
}
