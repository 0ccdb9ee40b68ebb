//! Interactive session wrapping one [`AnalogSampler`] instance.
//!
//! The session plays the role of the DMA hardware: every `flip` command
//! synthesizes one completed capture buffer of interleaved scan cycles and
//! hands it to the accumulation engine, exactly as the firmware capture task
//! does with a real buffer half. Readout then goes through the same public
//! surface the flight stack uses.

use std::sync::atomic::{AtomicUsize, Ordering};

use heapless::Vec;
use sampler_core::capture::ChannelSpec;
use sampler_core::sampler::{AnalogSampler, ReadError, SamplerConfig};

pub const DEFAULT_CHANNEL_COUNT: usize = 2;

const OVERSAMPLING: usize = 4;
const REFERENCE_MILLIVOLTS: u32 = 3300;
const RESOLUTION_BITS: u8 = 12;

/// Buffers forwarded through the flip hook since startup.
static FORWARDED_BUFFERS: AtomicUsize = AtomicUsize::new(0);

fn forward_buffer(_raw: &[u16]) {
    FORWARDED_BUFFERS.fetch_add(1, Ordering::Relaxed);
}

pub const HELP_TOPICS: &[(&str, &str)] = &[
    ("flip [n]", "synthesize n completed capture buffers (default 1)"),
    ("read <ch>", "drain channel ch to its running average"),
    ("status", "show capture state and geometry"),
    ("scale", "show the LSB-to-voltage conversion"),
    ("help", "show this summary"),
    ("exit", "close the session"),
];

pub struct Session {
    sampler: AnalogSampler,
    raw: std::vec::Vec<u16>,
    flips: usize,
    phase: u16,
}

impl Session {
    pub fn new(channel_count: usize) -> Result<Self, String> {
        let mut channels: Vec<ChannelSpec, { sampler_core::capture::MAX_SCAN_CHANNELS }> =
            Vec::new();
        for index in 0..channel_count {
            let spec = u8::try_from(index)
                .map(ChannelSpec::new)
                .map_err(|_| format!("channel count {channel_count} out of range"))?;
            if channels.push(spec).is_err() {
                // Capacity exceeded; let the sampler report the precise error
                // by validating the raw count below.
                break;
            }
        }

        if channels.len() != channel_count {
            // Reproduce the init-time rejection without touching a sampler.
            let err = sampler_core::capture::CapturePlan::new(channel_count, OVERSAMPLING)
                .expect_err("overlong channel list accepted");
            return Err(format!("init rejected: {err:?}"));
        }

        let sampler = AnalogSampler::new(SamplerConfig {
            channels,
            oversampling: OVERSAMPLING,
            reference_millivolts: REFERENCE_MILLIVOLTS,
            resolution_bits: RESOLUTION_BITS,
        })
        .map_err(|err| format!("init rejected: {err:?}"))?;

        sampler.set_flip_hook(Some(forward_buffer));

        let words = sampler.plan().words_per_buffer();
        Ok(Self {
            sampler,
            raw: vec![0; words],
            flips: 0,
            phase: 0,
        })
    }

    pub fn handle_command(&mut self, input: &str) -> std::vec::Vec<String> {
        let mut parts = input.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let argument = parts.next();

        match command {
            "help" => HELP_TOPICS
                .iter()
                .map(|(name, text)| format!("{name:<12} {text}"))
                .collect(),
            "flip" => self.flip(argument),
            "read" => self.read(argument),
            "status" => self.status(),
            "scale" => self.scale(),
            other => vec![format!("Unknown command `{other}`; try `help`.")],
        }
    }

    /// Simulates `times` hardware buffer flips.
    fn flip(&mut self, argument: Option<&str>) -> std::vec::Vec<String> {
        let times: usize = match argument.map(str::parse).transpose() {
            Ok(times) => times.unwrap_or(1),
            Err(_) => return vec!["flip expects a positive count".to_string()],
        };

        // First flip models the capture driver arming the device.
        if !self.sampler.is_capturing() {
            self.sampler.begin_capture();
        }

        for _ in 0..times {
            self.fill_buffer();
            self.sampler.absorb(&self.raw);
            self.flips += 1;
        }

        vec![format!(
            "{times} buffer flip(s) absorbed ({} total)",
            self.flips
        )]
    }

    fn read(&mut self, argument: Option<&str>) -> std::vec::Vec<String> {
        let Some(channel) = argument.and_then(|value| value.parse::<usize>().ok()) else {
            return vec!["read expects a channel index".to_string()];
        };

        if !self.sampler.is_available(channel) {
            return vec![format!(
                "channel {channel} not available (device has {})",
                self.sampler.channel_count()
            )];
        }

        match self.sampler.read(channel) {
            Ok(average) => {
                let volts = f64::from(average) * f64::from(self.sampler.lsb_voltage());
                vec![format!("channel {channel}: avg {average} ({volts:.3} V)")]
            }
            Err(ReadError::NotReady) => {
                vec!["capture not running; `flip` at least once".to_string()]
            }
            Err(ReadError::NoData) => {
                vec![format!("channel {channel}: no samples since last read")]
            }
            Err(ReadError::InvalidChannel) => {
                vec![format!("channel {channel} does not exist")]
            }
        }
    }

    fn status(&self) -> std::vec::Vec<String> {
        let plan = self.sampler.plan();
        vec![
            format!(
                "capture: {}",
                if self.sampler.is_capturing() {
                    "running"
                } else {
                    "not started"
                }
            ),
            format!(
                "geometry: {} channels x {} cycles per buffer ({} words, both halves {})",
                plan.channel_count(),
                plan.cycles_per_buffer(),
                plan.words_per_buffer(),
                plan.dma_words()
            ),
            format!("oversampling: {}x", self.sampler.oversampling()),
            format!(
                "flips absorbed: {} (hook forwarded {})",
                self.flips,
                FORWARDED_BUFFERS.load(Ordering::Relaxed)
            ),
        ]
    }

    fn scale(&self) -> std::vec::Vec<String> {
        let lsb = self.sampler.lsb_voltage();
        vec![format!(
            "lsb: {:.6} V ({} mV reference, {}-bit)",
            lsb, REFERENCE_MILLIVOLTS, RESOLUTION_BITS
        )]
    }

    /// Fills the raw buffer with one buffer's worth of interleaved cycles.
    ///
    /// Channel `i` idles at a distinct baseline with a slow triangle ripple,
    /// so successive flips move the averages in a recognizable way.
    fn fill_buffer(&mut self) {
        let channel_count = self.sampler.channel_count();
        for cycle in self.raw.chunks_exact_mut(channel_count) {
            self.phase = (self.phase + 1) % 64;
            let ripple = if self.phase < 32 {
                self.phase
            } else {
                63 - self.phase
            };
            for (index, word) in cycle.iter_mut().enumerate() {
                let baseline = 600 + 400 * index as u16;
                *word = (baseline + ripple).min(4095);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_channel_counts_beyond_the_platform() {
        assert!(Session::new(0).is_err());
        assert!(Session::new(9).is_err());
    }

    #[test]
    fn flip_then_read_round_trip() {
        let mut session = Session::new(2).expect("session");

        let before = session.handle_command("read 0");
        assert!(before[0].contains("not running"));

        session.handle_command("flip 3");
        let after = session.handle_command("read 0");
        assert!(after[0].contains("avg"));

        let missing = session.handle_command("read 7");
        assert!(missing[0].contains("not available"));
    }
}
