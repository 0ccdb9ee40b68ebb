use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::adc::{AdcChannel, AnyAdcChannel};
use heapless::Vec;
use sampler_core::capture::{ChannelSpec, MAX_CAPTURE_WORDS, MAX_SCAN_CHANNELS};
use sampler_core::sampler::{AnalogSampler, SamplerConfig};
use static_cell::StaticCell;

use crate::hw::BOARD_CHANNELS;
use crate::hw::analog::ScanCapture;

mod report_task;
mod sample_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

/// Millivolts on the converter's reference rail.
const REFERENCE_MILLIVOLTS: u32 = 3300;
/// Full scan cycles each capture buffer holds, per channel.
const OVERSAMPLING: usize = 4;
/// Converter resolution in bits.
const RESOLUTION_BITS: u8 = 12;

static SAMPLER: StaticCell<AnalogSampler> = StaticCell::new();
static CAPTURE_REGION: StaticCell<[u16; MAX_CAPTURE_WORDS]> = StaticCell::new();

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        ADC1,
        DMA2_CH0,
        PC1,
        PC2,
        ..
    } = hal::init(config);

    let mut channels: Vec<ChannelSpec, MAX_SCAN_CHANNELS> = Vec::new();
    for board in &BOARD_CHANNELS {
        let _ = channels.push(ChannelSpec::new(board.adc_channel));
    }

    let sampler_config = SamplerConfig {
        channels,
        oversampling: OVERSAMPLING,
        reference_millivolts: REFERENCE_MILLIVOLTS,
        resolution_bits: RESOLUTION_BITS,
    };

    let sampler: &'static AnalogSampler = match AnalogSampler::new(sampler_config) {
        Ok(sampler) => SAMPLER.init(sampler),
        Err(err) => {
            // Fatal to the subsystem: report and leave hardware untouched.
            defmt::error!("analog init rejected: {}", defmt::Debug2Format(&err));
            loop {
                core::future::pending::<()>().await;
            }
        }
    };

    // Scan hardware channels in the same order as the board table, which is
    // also the order of the sampler's channel list.
    let mut scan: Vec<AnyAdcChannel<hal::peripherals::ADC1>, MAX_SCAN_CHANNELS> = Vec::new();
    let _ = scan.push(PC1.degrade_adc());
    let _ = scan.push(PC2.degrade_adc());

    let region = CAPTURE_REGION.init([0; MAX_CAPTURE_WORDS]);
    let region: &'static mut [u16] = &mut region[..sampler.plan().dma_words()];

    let capture = ScanCapture::new(ADC1, DMA2_CH0, region, scan, sampler.plan());

    spawner
        .spawn(sample_task::run(sampler, capture))
        .expect("failed to spawn capture task");
    spawner
        .spawn(report_task::run(sampler))
        .expect("failed to spawn report task");

    core::future::pending::<()>().await;
}
