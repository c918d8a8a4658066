//! Analyzer Front-End Tests
//!
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test frontend_tests

mod common;

use common::{LinkOp, PinFault, RecordingLink, SimBus, WriteRecord};
use vna_firmware::dds::{compute_tuning_word, DdsError};
use vna_firmware::frontend::{Analyzer, AnalyzerError, Tuned};
use vna_firmware::pll::band::{BandTable, POWER_UP_BLOCKS, VERSACLOCK_BANDS};
use vna_firmware::pll::selector::{PllError, PllUpdate};
use vna_firmware::sampling::{SampleSet, SharedSamples};
use vna_firmware::types::Frequency;

fn analyzer(samples: &SharedSamples) -> Analyzer<'_, SimBus, RecordingLink> {
    Analyzer::new(BandTable::versaclock().unwrap(), SimBus::new(), RecordingLink::new(), samples).unwrap()
}

fn mhz(mhz: u32) -> Frequency {
    Frequency::from_mhz(mhz).unwrap()
}

// =============================================================================
// Initialization Tests
// =============================================================================

#[test]
fn initialize_programs_both_chips() {
    let samples = SharedSamples::new();
    let mut a = analyzer(&samples);
    a.initialize().unwrap();
    a.flush().unwrap();

    let expected: Vec<WriteRecord> = POWER_UP_BLOCKS
        .iter()
        .map(|b| WriteRecord {
            start: b.start_address(),
            data: b.values().to_vec(),
        })
        .collect();
    assert_eq!(a.pll_handle_mut().writes(), expected);
    assert_eq!(
        a.dds_mut().link_mut().ops,
        vec![LinkOp::Reset, LinkOp::WordClock, LinkOp::FrequencyUpdate]
    );
    assert_eq!(a.active_band_index(), 0);
}

// =============================================================================
// Tuning Tests
// =============================================================================

#[test]
fn tune_moves_pll_then_loads_dds() {
    let samples = SharedSamples::new();
    let mut a = analyzer(&samples);

    let tuned = a.tune(mhz(12)).unwrap();
    let word = compute_tuning_word(mhz(12)).unwrap();
    assert_eq!(
        tuned,
        Tuned {
            pll: PllUpdate::Changed { band: 3 },
            word
        }
    );
    assert_eq!(a.dds_mut().link_mut().bytes(), word.to_bytes().to_vec());

    let again = a.tune(Frequency::from_hz(12_500_000)).unwrap();
    assert_eq!(again.pll, PllUpdate::Unchanged);
    assert_eq!(a.dds_mut().link_mut().strobes(), 2);
}

#[test]
fn out_of_range_tune_touches_nothing() {
    let samples = SharedSamples::new();
    let mut a = analyzer(&samples);

    let f = mhz(80);
    assert_eq!(
        a.tune(f),
        Err(AnalyzerError::Dds(DdsError::FrequencyOutOfRange(f)))
    );
    a.flush().unwrap();
    assert!(a.pll_handle_mut().writes().is_empty());
    assert!(a.dds_mut().link_mut().ops.is_empty());
}

#[test]
fn pll_and_dds_commands_are_independent() {
    let samples = SharedSamples::new();
    let mut a = analyzer(&samples);

    assert_eq!(a.update_pll_for_frequency(mhz(30)), Ok(PllUpdate::Changed { band: 5 }));
    assert_eq!(a.dds_mut().link_mut().strobes(), 0);

    a.set_dds_frequency(mhz(30)).unwrap();
    assert_eq!(a.active_band_index(), 5);
    assert_eq!(
        a.update_pll_for_frequency(mhz(75)),
        Err(PllError::BandNotFound(mhz(75)))
    );
}

#[test]
fn dds_pin_failure_is_reported() {
    let samples = SharedSamples::new();
    let mut a = analyzer(&samples);
    a.dds_mut().link_mut().fail_after = Some(0);
    assert_eq!(a.tune(mhz(5)), Err(AnalyzerError::Dds(DdsError::Link(PinFault))));
}

// =============================================================================
// Register Read-Back Tests
// =============================================================================

#[test]
fn read_back_after_initialize_matches() {
    let samples = SharedSamples::new();
    let mut a = analyzer(&samples);
    a.initialize().unwrap();

    a.read_all_registers().unwrap();
    a.flush().unwrap();
    let snapshot = a.poll_registers().expect("dump complete");
    assert!(snapshot.matches(&POWER_UP_BLOCKS));
    assert!(a.verify_active_band(&snapshot).is_empty());
    assert_eq!(a.poll_registers(), None);
}

#[test]
fn read_back_reports_drifted_register() {
    let samples = SharedSamples::new();
    let mut a = analyzer(&samples);
    a.tune(mhz(40)).unwrap();
    a.flush().unwrap();
    a.pll_handle_mut().target.device().borrow_mut().registers[0x06] = 0x5A;

    a.read_all_registers().unwrap();
    a.flush().unwrap();
    let snapshot = a.poll_registers().unwrap();
    let diffs = a.verify_active_band(&snapshot);
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].address, 0x06);
    assert_eq!(diffs[0].expected, VERSACLOCK_BANDS[6].blocks[1].values()[0]);
    assert_eq!(diffs[0].actual, 0x5A);
}

// =============================================================================
// Sample Access Tests
// =============================================================================

#[test]
fn latest_samples_follow_publisher() {
    let samples = SharedSamples::new();
    let a = analyzer(&samples);
    assert_eq!(a.latest_samples(), SampleSet::default());

    samples.publish(SampleSet::from_raw([10, 20, 30, 40]));
    assert_eq!(a.latest_samples().raw(), [10, 20, 30, 40]);
}
