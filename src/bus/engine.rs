//! Bus Transaction Engine
//!
//! Half-duplex master state machine advanced exclusively by [`BusEvent`]s.
//! One transaction may be in flight at a time:
//!
//! ```text
//!  Idle ──begin──▶ Sending ──(write only)──────────────────────────▶ Idle
//!                    │  ▲ NAK: restart
//!                    └──┘
//!                    └──(read after write)──▶ TurnToReceiving ──▶ Receiving ──▶ Idle
//! ```
//!
//! Requests are accepted only while the engine is idle, which includes the
//! stop condition of the previous transaction having been confirmed.

use super::transport::{BusEvent, BusTransport};
use super::{BusError, RetryPolicy};
use crate::config::PLL_REGISTER_FILE_LEN;
use crate::types::DeviceAddress;

/// Capacity of the receive buffer (the whole register file)
pub const RX_CAPACITY: usize = PLL_REGISTER_FILE_LEN;

/// Engine state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EngineState {
    /// No transaction in flight
    #[default]
    Idle,
    /// Address and data bytes going out
    Sending,
    /// Repeated start issued, waiting for the first received byte
    TurnToReceiving,
    /// Filling the receive buffer
    Receiving,
}

#[cfg(feature = "embedded")]
impl defmt::Format for EngineState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Idle => defmt::write!(f, "Idle"),
            Self::Sending => defmt::write!(f, "Sending"),
            Self::TurnToReceiving => defmt::write!(f, "TurnToReceiving"),
            Self::Receiving => defmt::write!(f, "Receiving"),
        }
    }
}

/// Transfer direction of the in-flight transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Master to device
    Sending,
    /// Device to master
    Receiving,
}

/// The in-flight request
#[derive(Clone, Copy, Debug)]
pub struct BusTransaction<'a> {
    /// Current direction
    pub direction: Direction,
    /// Target device
    pub device: DeviceAddress,
    /// Register address sent as the leading byte
    pub start_register: u8,
    source: &'a [u8],
    index: usize,
    remaining: usize,
    read_after_write: bool,
    retries: u32,
}

impl<'a> BusTransaction<'a> {
    fn new(device: DeviceAddress, start_register: u8, source: &'a [u8], read_after_write: bool) -> Self {
        Self {
            direction: Direction::Sending,
            device,
            start_register,
            source,
            index: 0,
            remaining: source.len(),
            read_after_write,
            retries: 0,
        }
    }

    /// Cursor into the source buffer
    #[must_use]
    pub const fn byte_index(&self) -> usize {
        self.index
    }

    /// Data bytes not yet loaded
    #[must_use]
    pub const fn bytes_remaining(&self) -> usize {
        self.remaining
    }
}

/// Interrupt-driven bus master
pub struct BusEngine<'a> {
    state: EngineState,
    transaction: Option<BusTransaction<'a>>,
    rx: [u8; RX_CAPACITY],
    rx_index: usize,
    rx_ready: bool,
    stop_pending: bool,
    retry: RetryPolicy,
    fault: Option<BusError>,
}

impl<'a> BusEngine<'a> {
    /// Create an idle engine
    #[must_use]
    pub const fn new(retry: RetryPolicy) -> Self {
        Self {
            state: EngineState::Idle,
            transaction: None,
            rx: [0; RX_CAPACITY],
            rx_index: 0,
            rx_ready: false,
            stop_pending: false,
            retry,
            fault: None,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> EngineState {
        self.state
    }

    /// The in-flight transaction, if any
    #[must_use]
    pub const fn transaction(&self) -> Option<&BusTransaction<'a>> {
        self.transaction.as_ref()
    }

    /// No transaction in flight and no stop awaiting confirmation
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.state, EngineState::Idle) && !self.stop_pending
    }

    /// Receive buffer as last filled
    #[must_use]
    pub const fn received(&self) -> &[u8; RX_CAPACITY] {
        &self.rx
    }

    /// Completed register dump, once per completed read
    pub fn take_received(&mut self) -> Option<[u8; RX_CAPACITY]> {
        if self.rx_ready {
            self.rx_ready = false;
            Some(self.rx)
        } else {
            None
        }
    }

    /// Fault recorded by the last abandoned transaction
    pub fn take_fault(&mut self) -> Option<BusError> {
        self.fault.take()
    }

    /// Start writing `data` to consecutive registers from `first_register`
    ///
    /// Returns as soon as the start condition is issued.
    ///
    /// # Errors
    ///
    /// [`BusError::EngineBusy`] if a transaction is still in flight.
    pub fn begin_write<T: BusTransport>(
        &mut self,
        transport: &mut T,
        device: DeviceAddress,
        first_register: u8,
        data: &'a [u8],
    ) -> Result<(), BusError> {
        self.begin(transport, BusTransaction::new(device, first_register, data, false))
    }

    /// Start reading the whole register file from register 0
    ///
    /// # Errors
    ///
    /// [`BusError::EngineBusy`] if a transaction is still in flight.
    pub fn begin_read_all<T: BusTransport>(
        &mut self,
        transport: &mut T,
        device: DeviceAddress,
    ) -> Result<(), BusError> {
        self.begin_write_read(transport, device, crate::config::PLL_DUMP_START_REGISTER, &[])
    }

    /// Write `data` from `first_register`, then read the register file back
    /// through a repeated start
    ///
    /// # Errors
    ///
    /// [`BusError::EngineBusy`] if a transaction is still in flight.
    pub fn begin_write_read<T: BusTransport>(
        &mut self,
        transport: &mut T,
        device: DeviceAddress,
        first_register: u8,
        data: &'a [u8],
    ) -> Result<(), BusError> {
        self.begin(transport, BusTransaction::new(device, first_register, data, true))
    }

    fn begin<T: BusTransport>(&mut self, transport: &mut T, txn: BusTransaction<'a>) -> Result<(), BusError> {
        if !self.is_idle() {
            return Err(BusError::EngineBusy);
        }

        trace!(
            "bus: start {=u8:#x} reg {=u8:#x} len {=usize}",
            txn.device.addr(),
            txn.start_register,
            txn.source.len()
        );

        transport.start_write(txn.device, txn.start_register, txn.source.len());
        self.transaction = Some(txn);
        self.state = EngineState::Sending;
        Ok(())
    }

    /// Advance the state machine by one bus event
    ///
    /// Call from the bus interrupt handler only.
    pub fn on_event<T: BusTransport>(&mut self, transport: &mut T, event: BusEvent) {
        if event == BusEvent::StopConfirmed {
            self.stop_pending = false;
            return;
        }

        match (self.state, event) {
            (EngineState::Sending | EngineState::TurnToReceiving, BusEvent::AddressRejected) => {
                self.address_rejected(transport);
            }
            (EngineState::Sending, BusEvent::ByteTransmitted) => self.byte_transmitted(transport),
            (EngineState::TurnToReceiving, BusEvent::ByteReceived) => {
                self.state = EngineState::Receiving;
                self.byte_received(transport);
            }
            (EngineState::Receiving, BusEvent::ByteReceived) => self.byte_received(transport),
            (state, event) => {
                trace!("bus: ignoring {} in {}", event, state);
            }
        }
    }

    fn address_rejected<T: BusTransport>(&mut self, transport: &mut T) {
        let Some(txn) = self.transaction.as_mut() else {
            return;
        };

        if self.retry.allows(txn.retries) {
            txn.retries += 1;
            debug!("bus: NAK from {=u8:#x}, retry {=u32}", txn.device.addr(), txn.retries);
            // The restart resends the register address, so the data has to
            // follow it from the beginning again.
            if self.state == EngineState::Sending {
                txn.index = 0;
                txn.remaining = txn.source.len();
            }
            transport.restart();
        } else {
            let attempts = txn.retries + 1;
            warn!("bus: giving up on {=u8:#x} after {=u32} attempts", txn.device.addr(), attempts);
            self.fault = Some(BusError::BusFault { attempts });
            if self.state == EngineState::TurnToReceiving {
                transport.finish_receive();
            }
            transport.send_stop();
            self.stop_pending = true;
            self.finish();
        }
    }

    fn byte_transmitted<T: BusTransport>(&mut self, transport: &mut T) {
        let Some(txn) = self.transaction.as_mut() else {
            return;
        };

        if txn.remaining > 0 {
            transport.send_byte(txn.source[txn.index]);
            txn.index += 1;
            txn.remaining -= 1;
        } else if txn.read_after_write {
            txn.direction = Direction::Receiving;
            self.rx_index = 0;
            transport.turn_to_receive(txn.device, RX_CAPACITY);
            self.state = EngineState::TurnToReceiving;
        } else {
            transport.send_stop();
            self.stop_pending = true;
            self.finish();
        }
    }

    fn byte_received<T: BusTransport>(&mut self, transport: &mut T) {
        // The stop has to be requested before the penultimate byte is taken
        // so the device is NAKed on the last one.
        if self.rx_index + 2 == RX_CAPACITY {
            transport.stop_after_next_byte();
            self.stop_pending = true;
        }

        self.rx[self.rx_index] = transport.read_byte();

        if self.rx_index + 1 == RX_CAPACITY {
            transport.finish_receive();
            self.rx_ready = true;
            self.finish();
        } else {
            self.rx_index += 1;
        }
    }

    fn finish(&mut self) {
        self.transaction = None;
        self.rx_index = 0;
        self.state = EngineState::Idle;
    }
}

impl Default for BusEngine<'_> {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}
