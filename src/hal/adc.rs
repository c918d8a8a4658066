//! S-Parameter ADC
//!
//! Reads the four detector outputs on ADC1 back to back and packs them into
//! a [`SampleSet`]. Conversions are blocking; one cycle is four conversions.

use embassy_stm32::adc::{Adc, AdcChannel, AnyAdcChannel, SampleTime};
use embassy_stm32::peripherals::ADC1;

use crate::config::NUM_ADC_CHANNELS;
use crate::sampling::{Channel, SampleSet, SharedSamples};

/// Detector inputs in [`Channel`] order
pub struct DetectorInputs {
    channels: [AnyAdcChannel<ADC1>; NUM_ADC_CHANNELS],
}

impl DetectorInputs {
    /// Bind the S11 and S21 in-phase and quadrature pins
    pub fn new(
        s11_re: impl AdcChannel<ADC1>,
        s11_im: impl AdcChannel<ADC1>,
        s21_re: impl AdcChannel<ADC1>,
        s21_im: impl AdcChannel<ADC1>,
    ) -> Self {
        Self {
            channels: [
                s11_re.degrade_adc(),
                s11_im.degrade_adc(),
                s21_re.degrade_adc(),
                s21_im.degrade_adc(),
            ],
        }
    }
}

/// ADC1 driver for the four detector channels
pub struct SParamAdc<'d> {
    adc: Adc<'d, ADC1>,
    inputs: DetectorInputs,
}

impl<'d> SParamAdc<'d> {
    /// Create the driver with a long sample time for the high-impedance
    /// detector outputs
    #[must_use]
    pub fn new(adc: ADC1, inputs: DetectorInputs) -> Self {
        let mut adc = Adc::new(adc);
        adc.set_sample_time(SampleTime::CYCLES247_5);
        Self { adc, inputs }
    }

    /// Convert all four channels
    pub fn acquire(&mut self) -> SampleSet {
        let mut raw = [0u16; NUM_ADC_CHANNELS];
        for channel in Channel::ALL {
            raw[channel.index()] = self.adc.blocking_read(&mut self.inputs.channels[channel.index()]);
        }
        SampleSet::from_raw(raw)
    }

    /// Convert all four channels and publish the set
    pub fn acquire_into(&mut self, shared: &SharedSamples) -> SampleSet {
        let samples = self.acquire();
        shared.publish(samples);
        samples
    }
}
