//! VNA Front-End Main Application
//!
//! Entry point for the STM32G474-based VNA firmware.
//! Brings up the VersaClock and the AD9851, then sweeps while the ADC task
//! publishes S-parameter samples.

#![no_std]
#![no_main]

use defmt::{error, info, warn};
use embassy_executor::Spawner;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
#[cfg(feature = "dds-spi")]
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use embassy_time::{Duration, Timer};
use {defmt_rtt as _, panic_probe as _};

use vna_firmware::bus::shared::SharedBus;
use vna_firmware::bus::RetryPolicy;
use vna_firmware::config::{priorities, INIT_ATTEMPTS, I2C_FREQUENCY_HZ, PLL_I2C_ADDR, SWEEP_DWELL_MS};
#[cfg(feature = "dds-spi")]
use vna_firmware::config::DDS_SPI_FREQUENCY_HZ;
#[cfg(not(feature = "dds-spi"))]
use vna_firmware::drivers::ad9851::BitBangLink;
#[cfg(feature = "dds-spi")]
use vna_firmware::drivers::ad9851::SpiLink;
use vna_firmware::frontend::{Analyzer, Sweep};
use vna_firmware::hal::adc::{DetectorInputs, SParamAdc};
use vna_firmware::hal::gpio::{StatusLed, SweepTrigger};
use vna_firmware::hal::i2c::PacTransport;
use vna_firmware::pll::band::BandTable;
use vna_firmware::sampling::SharedSamples;

/// VersaClock bus engine, serviced from the I2C1 event interrupt
static PLL_BUS: SharedBus<PacTransport> = SharedBus::new(PLL_I2C_ADDR);

/// Latest detector samples
static SAMPLES: SharedSamples = SharedSamples::new();

#[interrupt]
fn I2C1_EV() {
    PLL_BUS.service();
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("VNA Firmware v{}", env!("CARGO_PKG_VERSION"));

    let config = embassy_stm32::Config::default();
    let p = embassy_stm32::init(config);

    info!("Peripherals initialized");

    let led = StatusLed::new(Output::new(p.PA5, Level::Low, Speed::Low));
    let trigger = SweepTrigger::new(Output::new(p.PC5, Level::Low, Speed::Low));

    // PB8 = SCL, PB9 = SDA. Embassy sets up timing and enables the
    // peripheral; the handle must outlive the transport.
    let _i2c = I2c::new_blocking(
        p.I2C1,
        p.PB8,
        p.PB9,
        Hertz(I2C_FREQUENCY_HZ),
        Default::default(),
    );
    PLL_BUS.install(PacTransport::new(), RetryPolicy::default());
    interrupt::I2C1_EV.set_priority(Priority::from(priorities::I2C_EVENT));
    // SAFETY: the handler only touches PLL_BUS, which is critical-section guarded.
    unsafe { interrupt::I2C1_EV.enable() };

    info!("I2C1 initialized at {} Hz", I2C_FREQUENCY_HZ);

    #[cfg(not(feature = "dds-spi"))]
    let dds_link = BitBangLink::new(
        Output::new(p.PB5, Level::Low, Speed::VeryHigh), // DATA (D7)
        Output::new(p.PB3, Level::Low, Speed::VeryHigh), // W_CLK
        Output::new(p.PB4, Level::Low, Speed::VeryHigh), // FQ_UD
        Output::new(p.PB6, Level::Low, Speed::VeryHigh), // RESET
    );

    // Same pins as the bit-banged link: PB3 = SPI1_SCK, PB5 = SPI1_MOSI.
    // Mode 0 idles SCK low and the AD9851 latches on the rising edge.
    #[cfg(feature = "dds-spi")]
    let dds_link = {
        let mut spi_config = spi::Config::default();
        spi_config.frequency = Hertz(DDS_SPI_FREQUENCY_HZ);
        spi_config.bit_order = spi::BitOrder::LsbFirst;
        SpiLink::new(
            Spi::new_blocking_txonly(p.SPI1, p.PB3, p.PB5, spi_config),
            Output::new(p.PB4, Level::Low, Speed::VeryHigh), // FQ_UD
            Output::new(p.PB6, Level::Low, Speed::VeryHigh), // RESET
        )
    };

    let adc = SParamAdc::new(
        p.ADC1,
        DetectorInputs::new(p.PA0, p.PA1, p.PA2, p.PA3),
    );

    spawner.spawn(heartbeat_task(led)).unwrap();
    spawner.spawn(sampling_task(adc, trigger)).unwrap();

    let table = match BandTable::versaclock() {
        Ok(table) => table,
        Err(e) => defmt::panic!("band table rejected: {}", defmt::Display2Format(&e)),
    };
    let mut analyzer = match Analyzer::new(table, &PLL_BUS, dds_link, &SAMPLES) {
        Ok(analyzer) => analyzer,
        Err(e) => defmt::panic!("front end unavailable: {}", e),
    };

    let mut attempt = 0;
    loop {
        attempt += 1;
        match analyzer.initialize().and_then(|()| analyzer.flush().map_err(Into::into)) {
            Ok(()) => break,
            Err(e) if attempt < INIT_ATTEMPTS => {
                warn!("front end init failed ({}), retrying", e);
                Timer::after(Duration::from_millis(100)).await;
            }
            Err(e) => defmt::panic!("front end init failed: {}", e),
        }
    }

    check_registers(&mut analyzer).await;

    let mut sweep = Sweep::default_plan();
    loop {
        let freq = sweep.next_point();
        if let Err(e) = analyzer.tune(freq) {
            error!("tune {} failed: {}", freq, e);
            continue;
        }
        Timer::after(Duration::from_millis(SWEEP_DWELL_MS)).await;

        let samples = analyzer.latest_samples();
        info!("{}: {}", freq, samples);
    }
}

/// Read the register file back and report any band register that differs
async fn check_registers<H, L>(analyzer: &mut Analyzer<'static, H, L>)
where
    H: vna_firmware::bus::writer::EngineHandle,
    L: vna_firmware::dds::DdsLink,
{
    if let Err(e) = analyzer.read_all_registers() {
        warn!("register read-back not started: {}", e);
        return;
    }
    for _ in 0..100 {
        if let Some(snapshot) = analyzer.poll_registers() {
            info!("versaclock: {}", snapshot);
            let diffs = analyzer.verify_active_band(&snapshot);
            if diffs.is_empty() {
                info!("versaclock registers match");
            }
            return;
        }
        Timer::after(Duration::from_millis(1)).await;
    }
    warn!("register read-back timed out");
}

/// Heartbeat task - blinks LED to show system is running
#[embassy_executor::task]
async fn heartbeat_task(mut led: StatusLed<'static>) {
    loop {
        led.toggle();
        Timer::after(Duration::from_millis(100)).await;
        led.toggle();
        Timer::after(Duration::from_millis(900)).await;
    }
}

/// Sampling task - converts the four detector channels once per millisecond
#[embassy_executor::task]
async fn sampling_task(mut adc: SParamAdc<'static>, mut trigger: SweepTrigger<'static>) {
    loop {
        trigger.pulse();
        adc.acquire_into(&SAMPLES);
        Timer::after(Duration::from_millis(1)).await;
    }
}
