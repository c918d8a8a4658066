//! Hardware Abstraction Layer
//!
//! STM32G474 glue for the pure layers: the I2C event transport behind the
//! bus engine, the S-parameter ADC and the status outputs.

pub mod adc;
pub mod gpio;
pub mod i2c;
