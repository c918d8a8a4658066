//! I2C Event Transport
//!
//! Drives I2C1 (STM32G4, I2C v2 peripheral) register by register from the
//! event interrupt. Embassy brings the peripheral up (pins, timing, enable);
//! after that this transport owns CR2 and the data registers and reports
//! interrupt flags as [`BusEvent`]s.
//!
//! | ISR flag | Reported as |
//! |----------|-------------|
//! | NACKF    | `AddressRejected` |
//! | STOPF    | `StopConfirmed` |
//! | RXNE     | `ByteReceived` |
//! | TXIS     | `ByteTransmitted` (except for the lead byte) |
//! | TC       | `ByteTransmitted`, or a queued stop |
//!
//! AUTOEND stays clear so the engine decides between stop and repeated start
//! once TC is reached.

use embassy_stm32::pac;
use embassy_stm32::pac::i2c::vals::{Addmode, Autoend, Dir, Reload};

use crate::bus::transport::{BusEvent, BusTransport};
use crate::types::DeviceAddress;

/// Register-level transport for I2C1
///
/// Holds no peripheral handle; it addresses `pac::I2C1` directly so it can
/// live in a `static` bus cell.
pub struct PacTransport {
    /// Lead byte waiting for the first TXIS of the current attempt
    lead: Option<u8>,
    last_lead: u8,
    stop_on_complete: bool,
    /// The current start condition is a read
    reading: bool,
}

impl PacTransport {
    /// Take over I2C1 and enable its event interrupts
    ///
    /// The peripheral must already be configured (embassy `I2c::new_blocking`)
    /// and the `I2c` handle kept alive.
    #[must_use]
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        pac::I2C1.cr1().modify(|w| {
            w.set_txie(true);
            w.set_rxie(true);
            w.set_nackie(true);
            w.set_stopie(true);
            w.set_tcie(true);
        });
        Self {
            lead: None,
            last_lead: 0,
            stop_on_complete: false,
            reading: false,
        }
    }

    fn start(device: DeviceAddress, dir: Dir, nbytes: usize) {
        #[allow(clippy::cast_possible_truncation)]
        let nbytes = nbytes.min(255) as u8;
        pac::I2C1.cr2().modify(|w| {
            w.set_sadd(u16::from(device.as_write_byte()));
            w.set_add10(Addmode::BIT7);
            w.set_dir(dir);
            w.set_nbytes(nbytes);
            w.set_reload(Reload::COMPLETED);
            w.set_autoend(Autoend::SOFTWARE);
            w.set_start(true);
        });
    }
}

impl BusTransport for PacTransport {
    fn start_write(&mut self, device: DeviceAddress, lead: u8, following: usize) {
        self.lead = Some(lead);
        self.last_lead = lead;
        self.stop_on_complete = false;
        self.reading = false;
        Self::start(device, Dir::WRITE, following + 1);
    }

    fn restart(&mut self) {
        // CR2 still holds the rejected attempt's address, direction and count.
        if !self.reading {
            // Flush whatever was loaded for the rejected attempt.
            pac::I2C1.isr().modify(|w| w.set_txe(true));
            self.lead = Some(self.last_lead);
        }
        pac::I2C1.cr2().modify(|w| w.set_start(true));
    }

    fn send_byte(&mut self, byte: u8) {
        pac::I2C1.txdr().write(|w| w.set_txdata(byte));
    }

    fn send_stop(&mut self) {
        pac::I2C1.cr2().modify(|w| w.set_stop(true));
    }

    fn turn_to_receive(&mut self, device: DeviceAddress, len: usize) {
        pac::I2C1.cr1().modify(|w| w.set_txie(false));
        self.reading = true;
        Self::start(device, Dir::READ, len);
    }

    fn stop_after_next_byte(&mut self) {
        // NBYTES already NAKs the last byte; the stop goes out on TC.
        self.stop_on_complete = true;
    }

    fn read_byte(&mut self) -> u8 {
        pac::I2C1.rxdr().read().rxdata()
    }

    fn finish_receive(&mut self) {
        self.reading = false;
        pac::I2C1.cr1().modify(|w| w.set_txie(true));
    }

    fn poll_event(&mut self) -> Option<BusEvent> {
        let regs = pac::I2C1;
        loop {
            let isr = regs.isr().read();

            if isr.nackf() {
                regs.icr().write(|w| w.set_nackcf(true));
                return Some(BusEvent::AddressRejected);
            }
            if isr.rxne() {
                return Some(BusEvent::ByteReceived);
            }
            if isr.txis() {
                if let Some(lead) = self.lead.take() {
                    regs.txdr().write(|w| w.set_txdata(lead));
                    continue;
                }
                return Some(BusEvent::ByteTransmitted);
            }
            if isr.tc() {
                if self.stop_on_complete {
                    self.stop_on_complete = false;
                    regs.cr2().modify(|w| w.set_stop(true));
                    continue;
                }
                return Some(BusEvent::ByteTransmitted);
            }
            if isr.stopf() {
                regs.icr().write(|w| w.set_stopcf(true));
                return Some(BusEvent::StopConfirmed);
            }
            return None;
        }
    }
}
