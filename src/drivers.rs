//! Peripheral Drivers
//!
//! Pin- and bus-level drivers for the external ICs.
//! These implement the link traits of the pure layers over embedded-hal.

pub mod ad9851;
