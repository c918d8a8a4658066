//! Bus transport boundary
//!
//! The engine never touches peripheral registers. It issues the handful of
//! commands below and is told what happened through [`BusEvent`]s, which the
//! transport produces from its interrupt flags.

use crate::types::DeviceAddress;

/// Edge-triggered bus events delivered to the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusEvent {
    /// The addressed device did not acknowledge (NAK)
    AddressRejected,
    /// The last byte left the shift register; ready for the next one
    ByteTransmitted,
    /// A byte is waiting in the receive register
    ByteReceived,
    /// A previously issued stop condition has been put on the bus
    StopConfirmed,
}

#[cfg(feature = "embedded")]
impl defmt::Format for BusEvent {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::AddressRejected => defmt::write!(f, "NAK"),
            Self::ByteTransmitted => defmt::write!(f, "TX"),
            Self::ByteReceived => defmt::write!(f, "RX"),
            Self::StopConfirmed => defmt::write!(f, "STOP"),
        }
    }
}

/// Master-side bus primitives
///
/// Every method is a non-blocking register poke; completion is reported later
/// as a [`BusEvent`].
pub trait BusTransport {
    /// Start condition, device address (write), then `lead` as the first data
    /// byte. `following` data bytes will come after it.
    fn start_write(&mut self, device: DeviceAddress, lead: u8, following: usize);

    /// Re-issue the last start condition after a rejected address
    fn restart(&mut self);

    /// Load the next byte to send
    fn send_byte(&mut self, byte: u8);

    /// Issue a stop condition after the current byte
    fn send_stop(&mut self);

    /// Disable the send-ready interrupt, switch to receive mode and issue a
    /// repeated start for `len` bytes
    fn turn_to_receive(&mut self, device: DeviceAddress, len: usize);

    /// Arrange for a stop condition after the byte currently being received
    fn stop_after_next_byte(&mut self);

    /// Take the received byte out of the receive register
    fn read_byte(&mut self) -> u8;

    /// Back to transmit mode with the send-ready interrupt enabled
    fn finish_receive(&mut self);

    /// Next pending event, if any, clearing its flag
    fn poll_event(&mut self) -> Option<BusEvent>;
}
