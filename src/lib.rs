//! VNA Front-End Firmware Library
//!
//! This library provides the core functionality for a low-cost
//! direct-conversion vector network analyzer. The stimulus is produced by an
//! AD9851 direct digital synthesizer, and the quadrature LO comes from a
//! VersaClock PLL clock generator programmed over I2C.
//!
//! # Architecture
//!
//! The firmware is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │        Analyzer (tune, read-back, sample snapshots)          │
//! ├─────────────────────────────────────────────────────────────┤
//! │                 FREQUENCY TRANSLATION LAYER                  │
//! │   PLL band table + selector  │  DDS tuning-word calculator   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      BUS LAYER                               │
//! │   Transaction engine  │  Block writer  │  Shared bus cell    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL / DRIVER LAYER                         │
//! │   I2C event IRQ  │  ADC  │  GPIO  │  AD9851 serial link      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Interrupt-driven bus**: the engine only moves when a bus event arrives
//! - **Static tables**: band tables are compile-time data, validated once
//! - **No unsafe in application code**: all unsafe isolated in the binary
//! - **Functional core, imperative shell**: pure logic separated from I/O
//! - **Explicit error handling**: all fallible operations return `Result`

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Must come first so the logging macros are visible to every module below.
#[macro_use]
mod fmt;

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Hardware Abstraction Layer
///
/// STM32G474 bindings for the I2C transport, ADC and GPIO.
#[cfg(feature = "embedded")]
pub mod hal;

/// Peripheral Drivers
///
/// Pin- and SPI-level links for the AD9851 DDS.
#[cfg(feature = "embedded")]
pub mod drivers;

/// Two-wire bus transaction engine and block writer
pub mod bus;

/// VersaClock band table, band selector and register snapshots
pub mod pll;

/// AD9851 tuning-word calculation and programming sequence
pub mod dds;

/// ADC results snapshot shared between the sampling side and the main sequence
pub mod sampling;

/// Logical command surface of the analyzer front end
pub mod frontend;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    // Common traits
    pub use embedded_hal::digital::OutputPin;

    // Embassy
    pub use embassy_time::{Duration, Instant, Timer};

    // Error handling
    pub use core::result::Result;

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
