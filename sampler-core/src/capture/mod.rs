//! Capture-buffer geometry shared by the DMA driver, the emulator, and tests.
//!
//! The converter free-runs scan cycles over the configured channels while the
//! DMA engine streams results into a circular region split into two halves.
//! Exactly one half is the hardware write target at any instant; the other
//! belongs to the accumulation engine, and ownership alternates on every
//! hardware-signaled flip. [`CapturePlan`] fixes the region geometry from the
//! channel count and oversampling factor so every consumer agrees on cycle
//! boundaries.

use crate::sampler::InitError;

/// Most channels one converter scans per cycle.
pub const MAX_SCAN_CHANNELS: usize = 8;

/// Largest supported oversampling factor.
pub const MAX_OVERSAMPLING: usize = 8;

/// Capacity ceiling, in half-words, of the reserved capture region (both
/// halves together). Sized for the worst-case plan so the firmware can keep
/// one static allocation regardless of the configured channel list.
pub const MAX_CAPTURE_WORDS: usize =
    2 * (MAX_SCAN_CHANNELS * MAX_OVERSAMPLING * 2) * MAX_SCAN_CHANNELS;

/// One entry in the conversion scan order.
///
/// The position of a spec in the configured channel list is load-bearing: it
/// is simultaneously the channel's rank in the hardware scan, its interleave
/// offset inside every capture buffer, and its accumulator index.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChannelSpec {
    /// Hardware channel number on the converter (e.g. `ADC123_IN11`).
    pub channel: u8,
}

impl ChannelSpec {
    /// Creates a spec for the given hardware channel number.
    #[must_use]
    pub const fn new(channel: u8) -> Self {
        Self { channel }
    }
}

/// Validated geometry of the double-buffered capture region.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CapturePlan {
    channel_count: usize,
    cycles_per_buffer: usize,
}

impl CapturePlan {
    /// Plans the capture region for `channel_count` channels at the given
    /// oversampling factor.
    ///
    /// Each half of the region holds at least `oversampling` full scan
    /// cycles. The DMA engine moves half-word pairs on 32-bit boundaries, so
    /// an odd scan length is padded to the next even cycle count before the
    /// depth is derived.
    pub fn new(channel_count: usize, oversampling: usize) -> Result<Self, InitError> {
        if channel_count == 0 || channel_count > MAX_SCAN_CHANNELS {
            return Err(InitError::UnsupportedChannelCount(channel_count));
        }
        if oversampling == 0 || oversampling > MAX_OVERSAMPLING {
            return Err(InitError::UnsupportedOversampling(oversampling));
        }

        let aligned = channel_count + (channel_count & 1);
        let plan = Self {
            channel_count,
            cycles_per_buffer: aligned * oversampling * 2,
        };

        if plan.dma_words() > MAX_CAPTURE_WORDS {
            return Err(InitError::CaptureRegionExhausted {
                required: plan.dma_words(),
                capacity: MAX_CAPTURE_WORDS,
            });
        }

        Ok(plan)
    }

    /// Number of channels converted per scan cycle.
    #[must_use]
    pub const fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// Scan cycles each capture buffer holds before the hardware flips.
    #[must_use]
    pub const fn cycles_per_buffer(&self) -> usize {
        self.cycles_per_buffer
    }

    /// Half-words in one capture buffer.
    #[must_use]
    pub const fn words_per_buffer(&self) -> usize {
        self.cycles_per_buffer * self.channel_count
    }

    /// Half-words in the full circular region (both buffers).
    #[must_use]
    pub const fn dma_words(&self) -> usize {
        2 * self.words_per_buffer()
    }

    /// Iterates a completed capture buffer as interleaved scan cycles.
    ///
    /// A trailing partial cycle cannot occur when the buffer came from the
    /// planned region; if a caller hands in a short slice the remainder is
    /// ignored rather than misattributed to the wrong channels.
    pub fn cycles<'a>(&self, raw: &'a [u16]) -> core::slice::ChunksExact<'a, u16> {
        raw.chunks_exact(self.channel_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_holds_requested_oversampling() {
        for channel_count in 1..=MAX_SCAN_CHANNELS {
            for oversampling in 1..=MAX_OVERSAMPLING {
                let plan = CapturePlan::new(channel_count, oversampling)
                    .expect("supported geometry rejected");
                assert!(plan.cycles_per_buffer() >= oversampling);
                assert_eq!(
                    plan.words_per_buffer(),
                    plan.cycles_per_buffer() * channel_count
                );
                assert!(plan.dma_words() <= MAX_CAPTURE_WORDS);
            }
        }
    }

    #[test]
    fn odd_channel_counts_pad_to_even_depth() {
        let odd = CapturePlan::new(3, 2).unwrap();
        let even = CapturePlan::new(4, 2).unwrap();
        assert_eq!(odd.cycles_per_buffer(), even.cycles_per_buffer());
        assert_eq!(odd.cycles_per_buffer() % 2, 0);
    }

    #[test]
    fn rejects_out_of_range_geometry() {
        assert_eq!(
            CapturePlan::new(0, 2),
            Err(InitError::UnsupportedChannelCount(0))
        );
        assert_eq!(
            CapturePlan::new(MAX_SCAN_CHANNELS + 1, 2),
            Err(InitError::UnsupportedChannelCount(MAX_SCAN_CHANNELS + 1))
        );
        assert_eq!(
            CapturePlan::new(2, 0),
            Err(InitError::UnsupportedOversampling(0))
        );
        assert_eq!(
            CapturePlan::new(2, MAX_OVERSAMPLING + 1),
            Err(InitError::UnsupportedOversampling(MAX_OVERSAMPLING + 1))
        );
    }

    #[test]
    fn cycles_iterator_walks_interleaved_frames() {
        let plan = CapturePlan::new(2, 1).unwrap();
        let raw = [10u16, 20, 30, 40, 50, 60];
        let cycles: heapless::Vec<&[u16], 4> = plan.cycles(&raw).collect();
        assert_eq!(cycles.len(), 3);
        assert_eq!(cycles[0], &[10, 20]);
        assert_eq!(cycles[2], &[50, 60]);
    }

    #[test]
    fn cycles_iterator_ignores_trailing_partial_frame() {
        let plan = CapturePlan::new(2, 1).unwrap();
        let raw = [10u16, 20, 30];
        assert_eq!(plan.cycles(&raw).count(), 1);
    }
}
