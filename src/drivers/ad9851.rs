//! AD9851 Serial Links
//!
//! Two ways to shift the 40-bit frequency word into the AD9851:
//!
//! - [`BitBangLink`]: four GPIOs, data set then W_CLK pulsed per bit (default)
//! - [`SpiLink`]: a hardware SPI whose SCK drives W_CLK and MOSI drives D7
//!   (`dds-spi` feature)
//!
//! The chip needs bits least significant first. The bit-banged link does this
//! itself; an SPI must be configured for LSB-first transfers.
//!
//! Pulses are produced by toggling without delay. A GPIO write takes
//! several nanoseconds, above the 3.5 ns (W_CLK, RESET) and 7 ns
//! (FQ_UD) minima.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::dds::DdsLink;

fn pulse<P: OutputPin>(pin: &mut P) -> Result<(), P::Error> {
    pin.set_high()?;
    pin.set_low()
}

/// GPIO-driven link
///
/// | Signal | AD9851 pin |
/// |--------|------------|
/// | data   | 25 (D7)    |
/// | w_clk  | 7          |
/// | fq_ud  | 8          |
/// | reset  | 22         |
pub struct BitBangLink<Data, WClk, FqUd, Reset> {
    data: Data,
    w_clk: WClk,
    fq_ud: FqUd,
    reset: Reset,
}

impl<Data, WClk, FqUd, Reset, E> BitBangLink<Data, WClk, FqUd, Reset>
where
    Data: OutputPin<Error = E>,
    WClk: OutputPin<Error = E>,
    FqUd: OutputPin<Error = E>,
    Reset: OutputPin<Error = E>,
{
    /// Wrap the four pins; all should start low
    pub fn new(data: Data, w_clk: WClk, fq_ud: FqUd, reset: Reset) -> Self {
        Self {
            data,
            w_clk,
            fq_ud,
            reset,
        }
    }

    /// Give the pins back
    pub fn release(self) -> (Data, WClk, FqUd, Reset) {
        (self.data, self.w_clk, self.fq_ud, self.reset)
    }
}

impl<Data, WClk, FqUd, Reset, E> DdsLink for BitBangLink<Data, WClk, FqUd, Reset>
where
    Data: OutputPin<Error = E>,
    WClk: OutputPin<Error = E>,
    FqUd: OutputPin<Error = E>,
    Reset: OutputPin<Error = E>,
{
    type Error = E;

    fn ready(&mut self) -> Result<bool, E> {
        Ok(true)
    }

    fn shift_out(&mut self, byte: u8) -> Result<(), E> {
        for bit in 0..8 {
            if byte & (1 << bit) == 0 {
                self.data.set_low()?;
            } else {
                self.data.set_high()?;
            }
            pulse(&mut self.w_clk)?;
        }
        Ok(())
    }

    fn drained(&mut self) -> Result<bool, E> {
        Ok(true)
    }

    fn pulse_frequency_update(&mut self) -> Result<(), E> {
        pulse(&mut self.fq_ud)
    }

    fn pulse_word_clock(&mut self) -> Result<(), E> {
        pulse(&mut self.w_clk)
    }

    fn pulse_reset(&mut self) -> Result<(), E> {
        pulse(&mut self.reset)
    }
}

/// [`SpiLink`] failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpiLinkError<S, P> {
    /// SPI transfer failed
    Spi(S),
    /// FQ_UD or RESET pin failed
    Pin(P),
}

/// SPI-driven link
///
/// SCK is wired to W_CLK, so a lone word-clock pulse is one byte of zeros.
/// With D0 and D1 strapped high and D2 low, the first of those edges selects
/// serial mode and the FQ_UD that follows commits it.
pub struct SpiLink<Spi, FqUd, Reset> {
    spi: Spi,
    fq_ud: FqUd,
    reset: Reset,
}

impl<Spi, FqUd, Reset, P> SpiLink<Spi, FqUd, Reset>
where
    Spi: SpiBus,
    FqUd: OutputPin<Error = P>,
    Reset: OutputPin<Error = P>,
{
    /// Wrap an LSB-first SPI and the two strobe pins
    pub fn new(spi: Spi, fq_ud: FqUd, reset: Reset) -> Self {
        Self { spi, fq_ud, reset }
    }

    /// Give the bus and pins back
    pub fn release(self) -> (Spi, FqUd, Reset) {
        (self.spi, self.fq_ud, self.reset)
    }
}

impl<Spi, FqUd, Reset, P> DdsLink for SpiLink<Spi, FqUd, Reset>
where
    Spi: SpiBus,
    FqUd: OutputPin<Error = P>,
    Reset: OutputPin<Error = P>,
{
    type Error = SpiLinkError<Spi::Error, P>;

    fn ready(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn shift_out(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.spi.write(&[byte]).map_err(SpiLinkError::Spi)
    }

    fn drained(&mut self) -> Result<bool, Self::Error> {
        self.spi.flush().map_err(SpiLinkError::Spi)?;
        Ok(true)
    }

    fn pulse_frequency_update(&mut self) -> Result<(), Self::Error> {
        pulse(&mut self.fq_ud).map_err(SpiLinkError::Pin)
    }

    fn pulse_word_clock(&mut self) -> Result<(), Self::Error> {
        self.spi.write(&[0]).map_err(SpiLinkError::Spi)?;
        self.spi.flush().map_err(SpiLinkError::Spi)
    }

    fn pulse_reset(&mut self) -> Result<(), Self::Error> {
        pulse(&mut self.reset).map_err(SpiLinkError::Pin)
    }
}
