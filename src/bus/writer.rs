//! Register Block Writer
//!
//! Turns "write this block" into exactly one engine request. The caller is
//! held up only while a previous transaction is still on the bus, never for
//! the completion of its own request.

use super::BusError;
use crate::config::BLOCK_WRITE_SPIN_LIMIT;

/// A contiguous span of a device's register file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterBlock {
    start: u8,
    values: &'static [u8],
}

impl RegisterBlock {
    /// Create a block of `values` starting at register `start`
    #[must_use]
    pub const fn new(start: u8, values: &'static [u8]) -> Self {
        Self { start, values }
    }

    /// First register address
    #[must_use]
    pub const fn start_address(&self) -> u8 {
        self.start
    }

    /// Number of registers covered
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn length(&self) -> u8 {
        self.values.len() as u8
    }

    /// Values in address order
    #[must_use]
    pub const fn values(&self) -> &'static [u8] {
        self.values
    }

    /// One past the last register address covered
    #[must_use]
    pub const fn end_address(&self) -> usize {
        self.start as usize + self.values.len()
    }

    /// Value this block writes to `register`, if it covers it
    #[must_use]
    pub fn value_at(&self, register: u8) -> Option<u8> {
        let offset = register.checked_sub(self.start)?;
        self.values.get(offset as usize).copied()
    }
}

/// Main-sequence view of a bus engine bound to one device
///
/// Implementations decide how the engine is reached (a critical section on
/// target, a simulation on the host).
pub trait EngineHandle {
    /// Whether a new request would be accepted right now
    fn is_idle(&mut self) -> bool;

    /// Whether there is an engine behind the handle at all
    fn is_installed(&mut self) -> bool {
        true
    }

    /// Start a register write
    ///
    /// # Errors
    ///
    /// [`BusError::EngineBusy`] if the engine is not idle.
    fn begin_write(&mut self, first_register: u8, data: &'static [u8]) -> Result<(), BusError>;

    /// Start a full register-file read
    ///
    /// # Errors
    ///
    /// [`BusError::EngineBusy`] if the engine is not idle.
    fn begin_read_all(&mut self) -> Result<(), BusError>;

    /// Completed register dump, once per completed read
    fn take_registers(&mut self) -> Option<[u8; crate::config::PLL_REGISTER_FILE_LEN]>;

    /// Fault left behind by an abandoned transaction
    fn take_fault(&mut self) -> Option<BusError>;
}

/// Anything that can put a [`RegisterBlock`] on the bus
pub trait BlockWriter {
    /// Issue the write of one block
    ///
    /// # Errors
    ///
    /// Bus errors from the underlying transport.
    fn write_block(&mut self, block: &RegisterBlock) -> Result<(), BusError>;
}

/// [`BlockWriter`] over an [`EngineHandle`]
pub struct RegisterWriter<H> {
    handle: H,
    spin_limit: u32,
}

impl<H: EngineHandle> RegisterWriter<H> {
    /// Create a writer with the default spin bound
    #[must_use]
    pub const fn new(handle: H) -> Self {
        Self::with_spin_limit(handle, BLOCK_WRITE_SPIN_LIMIT)
    }

    /// Create a writer that polls the engine at most `spin_limit` times
    #[must_use]
    pub const fn with_spin_limit(handle: H, spin_limit: u32) -> Self {
        Self { handle, spin_limit }
    }

    /// Access the engine handle
    pub fn handle_mut(&mut self) -> &mut H {
        &mut self.handle
    }

    /// Spin until the engine is idle
    ///
    /// # Errors
    ///
    /// [`BusError::NotInstalled`] without an engine, [`BusError::EngineBusy`]
    /// if the spin bound runs out first, or the fault left behind by the last
    /// transaction.
    pub fn flush(&mut self) -> Result<(), BusError> {
        self.wait_idle()?;
        self.handle.take_fault().map_or(Ok(()), Err)
    }

    fn wait_idle(&mut self) -> Result<(), BusError> {
        if !self.handle.is_installed() {
            return Err(BusError::NotInstalled);
        }
        for _ in 0..self.spin_limit {
            if self.handle.is_idle() {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(BusError::EngineBusy)
    }
}

impl<H: EngineHandle> BlockWriter for RegisterWriter<H> {
    fn write_block(&mut self, block: &RegisterBlock) -> Result<(), BusError> {
        self.wait_idle()?;
        if let Some(fault) = self.handle.take_fault() {
            return Err(fault);
        }
        debug!(
            "pll: write {=u8} byte(s) at {=u8:#x}",
            block.length(),
            block.start_address()
        );
        self.handle.begin_write(block.start_address(), block.values())
    }
}
