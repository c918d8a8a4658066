//! Host simulations shared by the integration tests
//!
//! - [`SimTarget`]: a 27-register two-wire device behind the transport trait
//! - [`SimBus`]: an engine plus target that advances one event per idle poll
//! - [`RecordingLink`]: a DDS link that logs every byte and strobe

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use vna_firmware::bus::engine::BusEngine;
use vna_firmware::bus::transport::{BusEvent, BusTransport};
use vna_firmware::bus::writer::EngineHandle;
use vna_firmware::bus::{BusError, RetryPolicy};
use vna_firmware::config::PLL_REGISTER_FILE_LEN;
use vna_firmware::dds::DdsLink;
use vna_firmware::types::DeviceAddress;

// =============================================================================
// Simulated bus target
// =============================================================================

/// One completed register write as the device saw it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteRecord {
    pub start: u8,
    pub data: Vec<u8>,
}

/// Device state, shared between the transport and the test body
#[derive(Debug)]
pub struct Device {
    pub registers: [u8; PLL_REGISTER_FILE_LEN],
    pub pointer: usize,
    pub events: VecDeque<BusEvent>,
    pub writes: Vec<WriteRecord>,
    pub starts: u32,
    pub stops: u32,
    pub naks_remaining: u32,
    pub read_naks_remaining: u32,
    pub read_starts: u32,
    pub address_seen: Option<DeviceAddress>,
    current: Option<WriteRecord>,
    lead: u8,
    rx_len: usize,
    rx_remaining: usize,
    stop_requested: bool,
    receiving: bool,
}

impl Device {
    fn new() -> Self {
        Self {
            registers: [0; PLL_REGISTER_FILE_LEN],
            pointer: 0,
            events: VecDeque::new(),
            writes: Vec::new(),
            starts: 0,
            stops: 0,
            naks_remaining: 0,
            read_naks_remaining: 0,
            read_starts: 0,
            address_seen: None,
            current: None,
            lead: 0,
            rx_len: 0,
            rx_remaining: 0,
            stop_requested: false,
            receiving: false,
        }
    }

    fn address_phase(&mut self) {
        self.starts += 1;
        if self.naks_remaining > 0 {
            self.naks_remaining -= 1;
            self.events.push_back(BusEvent::AddressRejected);
            return;
        }
        self.pointer = usize::from(self.lead);
        self.current = Some(WriteRecord {
            start: self.lead,
            data: Vec::new(),
        });
        self.events.push_back(BusEvent::ByteTransmitted);
    }

    /// Repeated start in read direction; the register pointer carries over
    fn read_address_phase(&mut self) {
        self.read_starts += 1;
        if self.read_naks_remaining > 0 {
            self.read_naks_remaining -= 1;
            self.events.push_back(BusEvent::AddressRejected);
            return;
        }
        self.rx_remaining = self.rx_len;
        self.events.push_back(BusEvent::ByteReceived);
    }
}

/// Transport half of the simulation
pub struct SimTarget {
    device: Rc<RefCell<Device>>,
}

impl SimTarget {
    pub fn new() -> Self {
        Self {
            device: Rc::new(RefCell::new(Device::new())),
        }
    }

    /// A second handle onto the same device, for assertions
    pub fn device(&self) -> Rc<RefCell<Device>> {
        Rc::clone(&self.device)
    }

    /// Reject the next `count` address phases
    pub fn reject_next(&self, count: u32) {
        self.device.borrow_mut().naks_remaining = count;
    }

    /// Reject the next `count` read-direction starts
    pub fn reject_next_reads(&self, count: u32) {
        self.device.borrow_mut().read_naks_remaining = count;
    }

    /// Preload the register file
    pub fn load_registers(&self, registers: [u8; PLL_REGISTER_FILE_LEN]) {
        self.device.borrow_mut().registers = registers;
    }
}

impl BusTransport for SimTarget {
    fn start_write(&mut self, device: DeviceAddress, lead: u8, _following: usize) {
        let mut dev = self.device.borrow_mut();
        dev.address_seen = Some(device);
        dev.lead = lead;
        dev.address_phase();
    }

    fn restart(&mut self) {
        let mut dev = self.device.borrow_mut();
        if dev.receiving {
            dev.read_address_phase();
        } else {
            dev.address_phase();
        }
    }

    fn send_byte(&mut self, byte: u8) {
        let mut dev = self.device.borrow_mut();
        let pointer = dev.pointer;
        if let Some(reg) = dev.registers.get_mut(pointer) {
            *reg = byte;
        }
        dev.pointer += 1;
        if let Some(current) = dev.current.as_mut() {
            current.data.push(byte);
        }
        dev.events.push_back(BusEvent::ByteTransmitted);
    }

    fn send_stop(&mut self) {
        let mut dev = self.device.borrow_mut();
        dev.stops += 1;
        dev.receiving = false;
        if let Some(record) = dev.current.take() {
            if !record.data.is_empty() {
                dev.writes.push(record);
            }
        }
        dev.events.push_back(BusEvent::StopConfirmed);
    }

    fn turn_to_receive(&mut self, _device: DeviceAddress, len: usize) {
        let mut dev = self.device.borrow_mut();
        dev.current = None;
        dev.receiving = true;
        dev.rx_len = len;
        dev.read_address_phase();
    }

    fn stop_after_next_byte(&mut self) {
        self.device.borrow_mut().stop_requested = true;
    }

    fn read_byte(&mut self) -> u8 {
        let mut dev = self.device.borrow_mut();
        let byte = dev.registers[dev.pointer % PLL_REGISTER_FILE_LEN];
        dev.pointer += 1;
        dev.rx_remaining = dev.rx_remaining.saturating_sub(1);
        if dev.rx_remaining > 0 {
            dev.events.push_back(BusEvent::ByteReceived);
        } else if dev.stop_requested {
            dev.stop_requested = false;
            dev.stops += 1;
            dev.events.push_back(BusEvent::StopConfirmed);
        }
        byte
    }

    fn finish_receive(&mut self) {
        self.device.borrow_mut().receiving = false;
    }

    fn poll_event(&mut self) -> Option<BusEvent> {
        self.device.borrow_mut().events.pop_front()
    }
}

// =============================================================================
// Engine plus target
// =============================================================================

/// Engine handle whose bus advances one event every time it is polled
pub struct SimBus {
    pub engine: BusEngine<'static>,
    pub target: SimTarget,
    pub device: DeviceAddress,
}

impl SimBus {
    pub fn new() -> Self {
        Self::with_retry(RetryPolicy::Unbounded)
    }

    pub fn with_retry(retry: RetryPolicy) -> Self {
        Self {
            engine: BusEngine::new(retry),
            target: SimTarget::new(),
            device: DeviceAddress::VERSACLOCK,
        }
    }

    /// Deliver one pending event; false if none was pending
    pub fn step(&mut self) -> bool {
        match self.target.poll_event() {
            Some(event) => {
                self.engine.on_event(&mut self.target, event);
                true
            }
            None => false,
        }
    }

    /// Deliver events until none are left
    pub fn run(&mut self) {
        while self.step() {}
    }

    pub fn writes(&self) -> Vec<WriteRecord> {
        self.target.device.borrow().writes.clone()
    }
}

impl EngineHandle for SimBus {
    fn is_idle(&mut self) -> bool {
        if self.engine.is_idle() {
            return true;
        }
        self.step();
        self.engine.is_idle()
    }

    fn begin_write(&mut self, first_register: u8, data: &'static [u8]) -> Result<(), BusError> {
        self.engine.begin_write(&mut self.target, self.device, first_register, data)
    }

    fn begin_read_all(&mut self) -> Result<(), BusError> {
        self.engine.begin_read_all(&mut self.target, self.device)
    }

    fn take_registers(&mut self) -> Option<[u8; PLL_REGISTER_FILE_LEN]> {
        self.engine.take_received()
    }

    fn take_fault(&mut self) -> Option<BusError> {
        self.engine.take_fault()
    }
}

// =============================================================================
// Recording DDS link
// =============================================================================

/// Everything a DDS link can be asked to do
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkOp {
    Reset,
    WordClock,
    FrequencyUpdate,
    Byte(u8),
}

/// Pin failure injected by [`RecordingLink::fail_after`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinFault;

/// DDS link that records every operation
#[derive(Default)]
pub struct RecordingLink {
    pub ops: Vec<LinkOp>,
    /// `ready` answers false this many times before each byte
    pub busy_polls: u32,
    /// `ready` never answers true
    pub stalled: bool,
    /// Fail the shift of byte number `n` (0-based)
    pub fail_after: Option<usize>,
    busy_left: u32,
}

impl RecordingLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes shifted out, in order
    pub fn bytes(&self) -> Vec<u8> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                LinkOp::Byte(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    pub fn strobes(&self) -> usize {
        self.ops.iter().filter(|op| **op == LinkOp::FrequencyUpdate).count()
    }
}

impl DdsLink for RecordingLink {
    type Error = PinFault;

    fn ready(&mut self) -> Result<bool, PinFault> {
        if self.stalled {
            return Ok(false);
        }
        if self.busy_left > 0 {
            self.busy_left -= 1;
            return Ok(false);
        }
        Ok(true)
    }

    fn shift_out(&mut self, byte: u8) -> Result<(), PinFault> {
        if self.fail_after == Some(self.bytes().len()) {
            return Err(PinFault);
        }
        self.ops.push(LinkOp::Byte(byte));
        self.busy_left = self.busy_polls;
        Ok(())
    }

    fn drained(&mut self) -> Result<bool, PinFault> {
        Ok(true)
    }

    fn pulse_frequency_update(&mut self) -> Result<(), PinFault> {
        self.ops.push(LinkOp::FrequencyUpdate);
        Ok(())
    }

    fn pulse_word_clock(&mut self) -> Result<(), PinFault> {
        self.ops.push(LinkOp::WordClock);
        Ok(())
    }

    fn pulse_reset(&mut self) -> Result<(), PinFault> {
        self.ops.push(LinkOp::Reset);
        Ok(())
    }
}
