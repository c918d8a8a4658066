//! Interrupt-shared bus cell
//!
//! The engine and its transport live together in one critical-section mutex.
//! The bus interrupt calls [`SharedBus::service`]; the main sequence goes
//! through the [`EngineHandle`] impl. Both sides take the same critical
//! section, so the main sequence can only observe the engine between events.

use core::cell::RefCell;

use critical_section::Mutex;

use super::engine::{BusEngine, RX_CAPACITY};
use super::transport::BusTransport;
use super::writer::EngineHandle;
use super::{BusError, RetryPolicy};
use crate::types::DeviceAddress;

/// Most events drained per interrupt
const EVENTS_PER_SERVICE: usize = 4;

struct Installed<T> {
    engine: BusEngine<'static>,
    transport: T,
}

/// A bus engine bound to one device, shareable with an interrupt handler
pub struct SharedBus<T> {
    device: DeviceAddress,
    cell: Mutex<RefCell<Option<Installed<T>>>>,
}

impl<T: BusTransport> SharedBus<T> {
    /// Create an empty cell, usable in a `static`
    #[must_use]
    pub const fn new(device: DeviceAddress) -> Self {
        Self {
            device,
            cell: Mutex::new(RefCell::new(None)),
        }
    }

    /// Hand the transport over; replaces any previous one
    pub fn install(&self, transport: T, retry: RetryPolicy) {
        critical_section::with(|cs| {
            self.cell.borrow_ref_mut(cs).replace(Installed {
                engine: BusEngine::new(retry),
                transport,
            });
        });
    }

    /// Target device
    #[must_use]
    pub const fn device(&self) -> DeviceAddress {
        self.device
    }

    /// Drain pending bus events into the engine
    ///
    /// Call from the bus event interrupt. Returns the number of events
    /// handled.
    pub fn service(&self) -> usize {
        critical_section::with(|cs| {
            let mut slot = self.cell.borrow_ref_mut(cs);
            let Some(bus) = slot.as_mut() else {
                return 0;
            };

            let mut handled = 0;
            while handled < EVENTS_PER_SERVICE {
                let Some(event) = bus.transport.poll_event() else {
                    break;
                };
                bus.engine.on_event(&mut bus.transport, event);
                handled += 1;
            }
            handled
        })
    }

    fn with<R>(&self, f: impl FnOnce(&mut Installed<T>) -> R) -> Option<R> {
        critical_section::with(|cs| self.cell.borrow_ref_mut(cs).as_mut().map(f))
    }
}

impl<T: BusTransport> EngineHandle for &SharedBus<T> {
    fn is_idle(&mut self) -> bool {
        self.with(|bus| bus.engine.is_idle()).unwrap_or(false)
    }

    fn is_installed(&mut self) -> bool {
        self.with(|_| ()).is_some()
    }

    fn begin_write(&mut self, first_register: u8, data: &'static [u8]) -> Result<(), BusError> {
        let device = self.device;
        self.with(|bus| bus.engine.begin_write(&mut bus.transport, device, first_register, data))
            .unwrap_or(Err(BusError::NotInstalled))
    }

    fn begin_read_all(&mut self) -> Result<(), BusError> {
        let device = self.device;
        self.with(|bus| bus.engine.begin_read_all(&mut bus.transport, device))
            .unwrap_or(Err(BusError::NotInstalled))
    }

    fn take_registers(&mut self) -> Option<[u8; RX_CAPACITY]> {
        self.with(|bus| bus.engine.take_received()).flatten()
    }

    fn take_fault(&mut self) -> Option<BusError> {
        self.with(|bus| bus.engine.take_fault()).flatten()
    }
}
