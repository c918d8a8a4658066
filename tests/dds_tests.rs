//! DDS Tuning and Programming Tests
//!
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test dds_tests

mod common;

use common::{LinkOp, PinFault, RecordingLink};
use vna_firmware::config::{DDS_CONTROL_BYTE, DDS_REFERENCE_CLOCK_HZ};
use vna_firmware::dds::tuning::FrequencyOutOfRange;
use vna_firmware::dds::{compute_tuning_word, Dds, DdsError, TuningWord};
use vna_firmware::types::Frequency;

/// One tuning-word step in Hz
fn ulp_hz() -> f64 {
    f64::from(DDS_REFERENCE_CLOCK_HZ) / 4_294_967_296.0
}

// =============================================================================
// Tuning Word Tests
// =============================================================================

#[test]
fn round_trip_within_one_step() {
    let mut hz = 1_000_000u32;
    while hz <= 70_000_000 {
        let word = compute_tuning_word(Frequency::from_hz(hz)).unwrap();
        let out: f64 = word.output_frequency(DDS_REFERENCE_CLOCK_HZ).to_num();
        assert!(
            (out - f64::from(hz)).abs() <= ulp_hz(),
            "{hz} Hz came back as {out}"
        );
        hz += 1_234_567;
    }
}

#[test]
fn range_edges_are_inclusive() {
    assert!(compute_tuning_word(Frequency::from_hz(1_000_000)).is_ok());
    assert!(compute_tuning_word(Frequency::from_hz(70_000_000)).is_ok());
    assert_eq!(
        compute_tuning_word(Frequency::from_hz(999_999)),
        Err(FrequencyOutOfRange(Frequency::from_hz(999_999)))
    );
    assert_eq!(
        compute_tuning_word(Frequency::from_hz(70_000_001)),
        Err(FrequencyOutOfRange(Frequency::from_hz(70_000_001)))
    );
}

#[test]
fn word_grows_with_frequency() {
    let low = compute_tuning_word(Frequency::from_hz(5_000_000)).unwrap();
    let high = compute_tuning_word(Frequency::from_hz(5_000_001)).unwrap();
    assert!(high.word() > low.word());
    assert_eq!(low.control(), DDS_CONTROL_BYTE);
}

// =============================================================================
// Programming Sequence Tests
// =============================================================================

#[test]
fn initialize_enters_serial_mode() {
    let mut dds = Dds::new(RecordingLink::new());
    dds.initialize().unwrap();
    assert_eq!(
        dds.link_mut().ops,
        vec![LinkOp::Reset, LinkOp::WordClock, LinkOp::FrequencyUpdate]
    );
}

#[test]
fn five_bytes_then_one_strobe() {
    let mut dds = Dds::new(RecordingLink::new());
    let word = dds.set_frequency(Frequency::from_hz(10_000_000)).unwrap();

    let mut expected: Vec<LinkOp> = word.to_bytes().iter().map(|&b| LinkOp::Byte(b)).collect();
    expected.push(LinkOp::FrequencyUpdate);
    assert_eq!(dds.link_mut().ops, expected);
    assert_eq!(word, TuningWord::new(238_609_294, DDS_CONTROL_BYTE));
}

#[test]
fn out_of_range_sends_nothing() {
    let mut dds = Dds::new(RecordingLink::new());
    for hz in [0, 999_999, 70_000_001, u32::MAX] {
        let f = Frequency::from_hz(hz);
        assert_eq!(dds.set_frequency(f), Err(DdsError::FrequencyOutOfRange(f)));
    }
    assert!(dds.link_mut().ops.is_empty());
}

#[test]
fn slow_link_is_waited_for() {
    let mut link = RecordingLink::new();
    link.busy_polls = 20;
    let mut dds = Dds::new(link);
    dds.set_frequency(Frequency::from_hz(33_000_000)).unwrap();
    assert_eq!(dds.link_mut().bytes().len(), 5);
    assert_eq!(dds.link_mut().strobes(), 1);
}

#[test]
fn stalled_link_never_strobes() {
    let mut link = RecordingLink::new();
    link.stalled = true;
    let mut dds = Dds::new(link).with_poll_limit(16);
    assert_eq!(
        dds.set_frequency(Frequency::from_hz(33_000_000)),
        Err(DdsError::LinkStalled)
    );
    assert_eq!(dds.link_mut().strobes(), 0);
}

#[test]
fn poll_limit_shorter_than_busy_period_stalls() {
    let mut link = RecordingLink::new();
    link.busy_polls = 20;
    let mut dds = Dds::new(link).with_poll_limit(10);
    assert_eq!(
        dds.set_frequency(Frequency::from_hz(2_000_000)),
        Err(DdsError::LinkStalled)
    );
    // First byte goes out, the second never becomes ready.
    assert_eq!(dds.link_mut().bytes().len(), 1);
    assert_eq!(dds.link_mut().strobes(), 0);
}

#[test]
fn pin_failure_aborts_before_strobe() {
    let mut link = RecordingLink::new();
    link.fail_after = Some(3);
    let mut dds = Dds::new(link);
    assert_eq!(
        dds.set_frequency(Frequency::from_hz(2_000_000)),
        Err(DdsError::Link(PinFault))
    );
    assert_eq!(dds.link_mut().bytes().len(), 3);
    assert_eq!(dds.link_mut().strobes(), 0);
}
