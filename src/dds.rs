//! AD9851 Direct Digital Synthesizer
//!
//! [`tuning`] is the pure frequency → tuning-word math; [`link`] is the
//! byte-shift link abstraction and the load-then-strobe sequence that
//! commits a word to the chip.

pub mod link;
pub mod tuning;

pub use link::{Dds, DdsError, DdsLink};
pub use tuning::{compute_tuning_word, TuningWord};
