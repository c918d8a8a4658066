//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the VNA front end.
//! Bus addresses, reference clocks, chip limits and pin mappings are
//! centralized here.

use crate::types::{DeviceAddress, Frequency};

/// I2C bus frequency for the VersaClock (standard mode)
pub const I2C_FREQUENCY_HZ: u32 = 100_000;

/// VersaClock PLL I2C address
pub const PLL_I2C_ADDR: DeviceAddress = DeviceAddress::VERSACLOCK;

/// Size of the VersaClock register file read back by a full dump
pub const PLL_REGISTER_FILE_LEN: usize = 27;

/// Register pointer a full register dump starts from
pub const PLL_DUMP_START_REGISTER: u8 = 0x00;

/// Frequency the VersaClock comes up at after the power-up writes
pub const POWER_UP_FREQUENCY_HZ: u32 = 1_000_000;

/// DDS crystal (30 MHz, multiplied by 6 on-chip)
pub const DDS_CRYSTAL_HZ: u32 = 30_000_000;

/// DDS reference clock multiplier
pub const DDS_REFERENCE_MULTIPLIER: u32 = 6;

/// DDS system clock after the internal reference multiplier
pub const DDS_REFERENCE_CLOCK_HZ: u32 = DDS_CRYSTAL_HZ * DDS_REFERENCE_MULTIPLIER;

/// Lowest DDS output frequency accepted
pub const DDS_MIN_FREQUENCY_HZ: u32 = 1_000_000;

/// Highest DDS output frequency accepted
pub const DDS_MAX_FREQUENCY_HZ: u32 = 70_000_000;

/// AD9851 control byte: phase 0, power up, 6x REFCLK multiplier enabled
pub const DDS_CONTROL_BYTE: u8 = 0x01;

/// SPI clock when the DDS is driven from SPI1 (`dds-spi` feature)
pub const DDS_SPI_FREQUENCY_HZ: u32 = 500_000;

/// Polls of the DDS link "ready" flag before giving up on a byte
pub const DDS_LINK_POLL_LIMIT: u32 = 10_000;

/// Polls of the bus engine before a block write reports busy
pub const BLOCK_WRITE_SPIN_LIMIT: u32 = 100_000;

/// Number of ADC channels sampled per acquisition cycle
pub const NUM_ADC_CHANNELS: usize = 4;

/// ADC resolution in bits
pub const ADC_RESOLUTION_BITS: u32 = 12;

/// ADC reference voltage
pub const ADC_VREF: f32 = 3.3;

/// First frequency of the continuous sweep
pub const SWEEP_START_HZ: u32 = 1_000_000;

/// Sweep wraps back to the start once it would pass this frequency
pub const SWEEP_STOP_HZ: u32 = 50_000_000;

/// Sweep step
pub const SWEEP_STEP_HZ: u32 = 1_000_000;

/// Time spent at each sweep point before sampling
pub const SWEEP_DWELL_MS: u64 = 5;

/// Attempts at front-end initialization before the firmware halts
pub const INIT_ATTEMPTS: u32 = 5;

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments matching the schematic

    /// Status LED
    pub const LED_STATUS: &str = "PA5";

    /// Sweep trigger output (toggled at the start of each conversion)
    pub const SWEEP_TRIGGER: &str = "PC5";

    /// I2C1 SCL (VersaClock)
    pub const I2C1_SCL: &str = "PB8";

    /// I2C1 SDA (VersaClock)
    pub const I2C1_SDA: &str = "PB9";

    /// AD9851 serial data (D7)
    pub const DDS_DATA: &str = "PB5";

    /// AD9851 word load clock
    pub const DDS_W_CLK: &str = "PB3";

    /// AD9851 frequency update strobe
    pub const DDS_FQ_UD: &str = "PB4";

    /// AD9851 reset
    pub const DDS_RESET: &str = "PB6";

    /// S11 real part
    pub const S11_RE: &str = "PA0";

    /// S11 imaginary part
    pub const S11_IM: &str = "PA1";

    /// S21 real part
    pub const S21_RE: &str = "PA2";

    /// S21 imaginary part
    pub const S21_IM: &str = "PA3";
}

/// Interrupt priorities
pub mod priorities {
    //! NVIC priority bytes (lower is more urgent). The STM32G4 implements
    //! the upper four bits only.

    /// I2C1 event interrupt driving the bus engine (level 2)
    pub const I2C_EVENT: u8 = 2 << 4;
}

/// The frequency the VersaClock is configured for at power-up
#[must_use]
pub const fn power_up_frequency() -> Frequency {
    Frequency::from_hz(POWER_UP_FREQUENCY_HZ)
}
