//! Device descriptor and foreground readout surface.
//!
//! [`AnalogSampler`] is the one owned handle to the sampling subsystem.
//! Owning (or holding a shared reference to) a sampler is itself the proof
//! that initialization validated the configuration; there is no runtime
//! validity tag to re-check on every call. What remains run-time state is
//! whether hardware capture is live: readout reports [`ReadError::NotReady`]
//! until the capture driver arms the sampler.
//!
//! The accumulator bank and the flip hook are the only state shared between
//! the capture context and the foreground, and both sit behind
//! critical-section mutexes so every read-modify-write of a record is
//! exclusive.

use core::cell::{Cell, RefCell};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::Vec;
use portable_atomic::{AtomicBool, Ordering};

use crate::accumulator::AccumulatorBank;
use crate::capture::{CapturePlan, ChannelSpec, MAX_SCAN_CHANNELS};

/// Hook invoked from the capture context after each buffer-flip fold, with
/// the raw buffer that was just drained. This is the attachment point for a
/// forwarding transport (e.g. a coulomb-counting consumer); the subsystem
/// itself never interprets the data further.
pub type FlipHook = fn(&[u16]);

/// Errors fatal to initialization. No partially configured sampler survives
/// any of these; construction is all-or-nothing by value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InitError {
    /// Channel list is empty or beyond the converter's scan ceiling.
    UnsupportedChannelCount(usize),
    /// Oversampling factor outside the supported window.
    UnsupportedOversampling(usize),
    /// Converter resolution the scale math cannot represent.
    UnsupportedResolution(u8),
    /// Planned capture window does not fit the reserved DMA region.
    CaptureRegionExhausted { required: usize, capacity: usize },
}

/// Read failures surfaced to foreground callers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReadError {
    /// Capture has not been armed; callers should treat this as "no device".
    NotReady,
    /// Channel index beyond the configured scan list.
    InvalidChannel,
    /// Nothing non-zero accumulated since the last drain.
    NoData,
}

/// Widest converter resolution the voltage scale supports.
const MAX_RESOLUTION_BITS: u8 = 16;

/// Immutable sampling configuration consumed by [`AnalogSampler::new`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Scan order; position defines buffer interleave and accumulator index.
    pub channels: Vec<ChannelSpec, MAX_SCAN_CHANNELS>,
    /// Full scan cycles each capture buffer must hold, at minimum.
    pub oversampling: usize,
    /// Millivolts on the converter's reference rail.
    pub reference_millivolts: u32,
    /// Converter resolution in bits.
    pub resolution_bits: u8,
}

/// One sampling device: validated configuration, capture geometry, and the
/// per-channel accumulators.
///
/// Methods take `&self` so a single instance can be shared as `&'static`
/// between the capture context and any number of foreground readers.
pub struct AnalogSampler {
    channels: Vec<ChannelSpec, MAX_SCAN_CHANNELS>,
    plan: CapturePlan,
    oversampling: usize,
    reference_millivolts: u32,
    resolution_bits: u8,
    bank: Mutex<CriticalSectionRawMutex, RefCell<AccumulatorBank>>,
    flip_hook: Mutex<CriticalSectionRawMutex, Cell<Option<FlipHook>>>,
    armed: AtomicBool,
}

impl AnalogSampler {
    /// Validates `config` and builds the sampler.
    ///
    /// The capture plan, the accumulator bank, and the scale parameters are
    /// all derived here; any rejection leaves no trace, so a failed
    /// initialization never produces a half-configured device.
    pub fn new(config: SamplerConfig) -> Result<Self, InitError> {
        let SamplerConfig {
            channels,
            oversampling,
            reference_millivolts,
            resolution_bits,
        } = config;

        if resolution_bits == 0 || resolution_bits > MAX_RESOLUTION_BITS {
            return Err(InitError::UnsupportedResolution(resolution_bits));
        }

        let plan = CapturePlan::new(channels.len(), oversampling)?;
        let bank = AccumulatorBank::new(plan.channel_count());

        Ok(Self {
            channels,
            plan,
            oversampling,
            reference_millivolts,
            resolution_bits,
            bank: Mutex::new(RefCell::new(bank)),
            flip_hook: Mutex::new(Cell::new(None)),
            armed: AtomicBool::new(false),
        })
    }

    /// Capture geometry the DMA driver must honor.
    #[must_use]
    pub const fn plan(&self) -> &CapturePlan {
        &self.plan
    }

    /// Configured scan order.
    #[must_use]
    pub fn channels(&self) -> &[ChannelSpec] {
        &self.channels
    }

    /// Marks hardware free-running conversion as live.
    ///
    /// Called once by the capture driver after the converter and DMA engine
    /// started successfully; readout errors with [`ReadError::NotReady`]
    /// until then. There is no disarm: capture runs until teardown.
    pub fn begin_capture(&self) {
        self.armed.store(true, Ordering::Release);
    }

    /// Returns `true` once the capture driver has armed the sampler.
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Registers (or clears) the buffer-flip forwarding hook.
    pub fn set_flip_hook(&self, hook: Option<FlipHook>) {
        self.flip_hook.lock(|cell| cell.set(hook));
    }

    /// Folds one completed capture buffer into the accumulators.
    ///
    /// Runs in the capture context only, with the buffer hardware just
    /// finished writing, never the live half. Each scan cycle is folded
    /// under its own short critical section, so a foreground drain can slot
    /// in between cycles but never into the middle of a record update. Total
    /// over its input: no allocation, no blocking, no error paths.
    pub fn absorb(&self, raw: &[u16]) {
        for cycle in self.plan.cycles(raw) {
            self.bank.lock(|bank| bank.borrow_mut().fold_cycle(cycle));
        }

        if let Some(hook) = self.flip_hook.lock(Cell::get) {
            hook(raw);
        }
    }

    /// Returns the running average for `channel` and reseeds its
    /// accumulator with `(average, 1)`.
    ///
    /// The drain-and-reseed happens inside one critical section, so samples
    /// folded by a concurrent capture pass are never lost between the read
    /// and the reset. Repeated reads with no intervening samples keep
    /// returning the last average.
    pub fn read(&self, channel: usize) -> Result<u32, ReadError> {
        if !self.is_capturing() {
            return Err(ReadError::NotReady);
        }
        if channel >= self.channels.len() {
            return Err(ReadError::InvalidChannel);
        }

        self.bank
            .lock(|bank| bank.borrow_mut().drain(channel))
            .ok_or(ReadError::NoData)
    }

    /// Running average scaled to volts via [`Self::lsb_voltage`].
    #[allow(clippy::cast_precision_loss)]
    pub fn read_voltage(&self, channel: usize) -> Result<f32, ReadError> {
        self.read(channel).map(|average| average as f32 * self.lsb_voltage())
    }

    /// Number of configured scan channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Whether `channel` exists on this device.
    ///
    /// Best-effort introspection: callers validate an index once up front
    /// and then rely on [`Self::read`]'s own check.
    #[must_use]
    pub fn is_available(&self, channel: usize) -> bool {
        channel < self.channels.len()
    }

    /// Volts represented by one least-significant bit of a raw sample:
    /// reference voltage over the converter's full-scale code range.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn lsb_voltage(&self) -> f32 {
        let full_scale = (1u32 << self.resolution_bits) - 1;
        self.reference_millivolts as f32 / 1000.0 / full_scale as f32
    }

    /// Configured oversampling factor.
    #[must_use]
    pub const fn oversampling(&self) -> usize {
        self.oversampling
    }
}
