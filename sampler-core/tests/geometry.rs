use critical_section as _; // host critical-section implementation

use sampler_core::capture::{
    CapturePlan, MAX_CAPTURE_WORDS, MAX_OVERSAMPLING, MAX_SCAN_CHANNELS,
};
use sampler_core::sampler::InitError;

#[test]
fn every_supported_geometry_holds_the_requested_cycles() {
    for channel_count in 1..=MAX_SCAN_CHANNELS {
        for oversampling in 1..=MAX_OVERSAMPLING {
            let plan = CapturePlan::new(channel_count, oversampling)
                .expect("supported geometry rejected");

            // Each buffer holds at least `oversampling` full scan cycles.
            assert!(
                plan.cycles_per_buffer() * channel_count >= oversampling * channel_count,
                "buffer too small for {channel_count} channels at {oversampling}x"
            );

            // Depth derives from an even channel count, keeping half-word
            // pairs 32-bit aligned for the DMA engine.
            assert_eq!(plan.cycles_per_buffer() % 2, 0);

            // Both halves must fit the statically reserved region.
            assert_eq!(plan.dma_words(), 2 * plan.words_per_buffer());
            assert!(plan.dma_words() <= MAX_CAPTURE_WORDS);
        }
    }
}

#[test]
fn worst_case_plan_exactly_fills_the_reserved_region() {
    let plan = CapturePlan::new(MAX_SCAN_CHANNELS, MAX_OVERSAMPLING).unwrap();
    assert_eq!(plan.dma_words(), MAX_CAPTURE_WORDS);
}

#[test]
fn unsupported_channel_count_is_rejected_before_any_side_effect() {
    let err = CapturePlan::new(MAX_SCAN_CHANNELS + 1, 2).unwrap_err();
    assert_eq!(
        err,
        InitError::UnsupportedChannelCount(MAX_SCAN_CHANNELS + 1)
    );
}

#[test]
fn plan_reports_interleaved_buffer_sizes() {
    let plan = CapturePlan::new(3, 2).unwrap();
    // Three channels pad to a four-channel-aligned depth.
    assert_eq!(plan.cycles_per_buffer(), 4 * 2 * 2);
    assert_eq!(plan.words_per_buffer(), plan.cycles_per_buffer() * 3);
}
