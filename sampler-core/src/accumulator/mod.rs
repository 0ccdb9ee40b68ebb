//! Per-channel running-average accumulators.
//!
//! The capture side folds every raw sample into a sum/count pair; the readout
//! side drains a channel to a single average and reseeds it. Sums are
//! rescaled as they approach the representable range so the average survives
//! an arbitrarily long capture window between reads.

use heapless::Vec;

use crate::capture::MAX_SCAN_CHANNELS;

/// Sum level at which an accumulator is rescaled (half the `u32` range).
pub const SATURATION_THRESHOLD: u32 = 1 << 31;

/// Running sum and sample count for one scan channel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelAccumulator {
    sum: u32,
    count: u32,
}

impl ChannelAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self { sum: 0, count: 0 }
    }

    /// Folds one raw sample in, rescaling on saturation.
    ///
    /// The rescale check runs on every addition: a single capture buffer can
    /// carry enough full-scale samples to cross the threshold mid-buffer.
    /// Halving sum and count together keeps the running average within one
    /// count of its exact value.
    pub fn push(&mut self, sample: u16) {
        self.sum += u32::from(sample);
        self.count = self.count.saturating_add(1);
        if self.sum >= SATURATION_THRESHOLD {
            self.sum /= 2;
            self.count /= 2;
        }
    }

    /// Current average without draining, `None` while the sum is zero.
    ///
    /// A zero sum means nothing worth reporting has landed since the last
    /// drain; an all-zero input signal therefore keeps reading as empty.
    #[must_use]
    pub fn peek(&self) -> Option<u32> {
        if self.sum == 0 {
            return None;
        }
        Some(self.sum / self.count.max(1))
    }

    /// Drains to the running average and reseeds with `(average, 1)`.
    ///
    /// Reseeding keeps a subsequent drain before fresh samples arrive
    /// reporting the same average instead of failing.
    pub fn drain(&mut self) -> Option<u32> {
        let average = self.peek()?;
        self.sum = average;
        self.count = 1;
        Some(average)
    }

    /// Samples folded in since the last rescale-adjusted origin.
    #[must_use]
    pub const fn sample_count(&self) -> u32 {
        self.count
    }
}

/// Accumulators for every configured channel, indexed by scan order.
#[derive(Clone, Debug, Default)]
pub struct AccumulatorBank {
    channels: Vec<ChannelAccumulator, MAX_SCAN_CHANNELS>,
}

impl AccumulatorBank {
    /// Builds a bank with one empty accumulator per channel.
    ///
    /// Channel counts are validated by the capture plan before a bank is
    /// built, so a count beyond the scan ceiling cannot reach this
    /// constructor through the public surface.
    #[must_use]
    pub fn new(channel_count: usize) -> Self {
        let mut channels = Vec::new();
        for _ in 0..channel_count.min(MAX_SCAN_CHANNELS) {
            let _ = channels.push(ChannelAccumulator::new());
        }
        Self { channels }
    }

    /// Number of channels in the bank.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns `true` for a bank with no channels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Read-only view of one channel's accumulator.
    #[must_use]
    pub fn channel(&self, index: usize) -> Option<&ChannelAccumulator> {
        self.channels.get(index)
    }

    /// Folds one interleaved scan cycle; position `i` of the cycle feeds
    /// accumulator `i`.
    pub fn fold_cycle(&mut self, cycle: &[u16]) {
        for (accumulator, &sample) in self.channels.iter_mut().zip(cycle) {
            accumulator.push(sample);
        }
    }

    /// Drains one channel to its average, reseeding it.
    pub fn drain(&mut self, index: usize) -> Option<u32> {
        self.channels.get_mut(index)?.drain()
    }
}
