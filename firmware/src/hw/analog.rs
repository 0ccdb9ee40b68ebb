//! Ring-buffered ADC capture for the STM32F405.
//!
//! ADC1 free-runs a scan over the configured channels while DMA2 streams the
//! conversions into a circular region whose two halves alternate as the
//! hardware write target. Completion is signaled once per half (one buffer
//! flip), and [`ScanCapture::next_buffer`] hands back the half the hardware
//! just finished, never the live one. No foreground polling is involved at
//! any point; the DMA interrupt wakes the capture task.

#![cfg(target_os = "none")]

use embassy_stm32::Peri;
use embassy_stm32::adc::{Adc, AnyAdcChannel, RingBufferedAdc, SampleTime, Sequence};
use embassy_stm32::peripherals::{ADC1, DMA2_CH0};
use heapless::Vec;
use sampler_core::capture::{CapturePlan, MAX_CAPTURE_WORDS, MAX_SCAN_CHANNELS};

/// Conservative per-channel sample time; the sense rails sit behind
/// high-impedance dividers, so longer sampling beats conversion rate here.
const SAMPLE_TIME: SampleTime = SampleTime::CYCLES56;

/// Conversion ranks in scan order.
const RANKS: [Sequence; MAX_SCAN_CHANNELS] = [
    Sequence::One,
    Sequence::Two,
    Sequence::Three,
    Sequence::Four,
    Sequence::Five,
    Sequence::Six,
    Sequence::Seven,
    Sequence::Eight,
];

/// Continuous double-buffered scan capture over ADC1.
pub struct ScanCapture {
    ring: RingBufferedAdc<'static, ADC1>,
    words_per_buffer: usize,
    half: [u16; MAX_CAPTURE_WORDS / 2],
}

impl ScanCapture {
    /// Programs scan-mode continuous conversion plus circular
    /// double-buffered DMA.
    ///
    /// `region` must span exactly `plan.dma_words()` half-words; the runtime
    /// slices it out of the statically reserved capture region before
    /// hardware ever sees it. Channel order in `scan` must match the
    /// sampler's configured channel list.
    pub fn new(
        adc: Peri<'static, ADC1>,
        dma: Peri<'static, DMA2_CH0>,
        region: &'static mut [u16],
        mut scan: Vec<AnyAdcChannel<ADC1>, MAX_SCAN_CHANNELS>,
        plan: &CapturePlan,
    ) -> Self {
        let adc = Adc::new(adc);
        let mut ring = adc.into_ring_buffered(dma, region);

        for (rank, channel) in RANKS.iter().zip(scan.iter_mut()) {
            ring.set_sample_sequence(*rank, channel, SAMPLE_TIME);
        }

        Self {
            ring,
            words_per_buffer: plan.words_per_buffer(),
            half: [0; MAX_CAPTURE_WORDS / 2],
        }
    }

    /// Starts free-running conversion. The device runs until teardown.
    pub fn start(&mut self) {
        let _ = self.ring.start();
    }

    /// Waits for the next buffer flip and returns the completed half.
    ///
    /// `None` reports a DMA overrun: the consumer fell behind far enough
    /// that the hardware wrapped onto unread samples, and the caller must
    /// [`Self::restart`] the ring. Averages simply span a longer window
    /// afterwards; no samples are ever fabricated.
    pub async fn next_buffer(&mut self) -> Option<&[u16]> {
        let words = self.words_per_buffer;
        match self.ring.read(&mut self.half[..words]).await {
            Ok(_) => Some(&self.half[..words]),
            Err(_) => None,
        }
    }

    /// Drops stale ring contents and restarts capture after an overrun.
    pub fn restart(&mut self) {
        let _ = self.ring.start();
    }
}
