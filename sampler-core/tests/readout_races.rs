//! Interleaving tests for the capture-context fold and the foreground drain.
//!
//! The host `critical-section` implementation gives the same mutual
//! exclusion guarantee the firmware gets from masking interrupts, so these
//! tests drive real cross-thread contention through the public surface.

use critical_section as _;

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use heapless::Vec;
use sampler_core::capture::ChannelSpec;
use sampler_core::sampler::{AnalogSampler, ReadError, SamplerConfig};

fn two_channel_sampler() -> AnalogSampler {
    let mut channels = Vec::new();
    let _ = channels.push(ChannelSpec::new(11));
    let _ = channels.push(ChannelSpec::new(12));
    AnalogSampler::new(SamplerConfig {
        channels,
        oversampling: 4,
        reference_millivolts: 3300,
        resolution_bits: 12,
    })
    .expect("configuration rejected")
}

// With a constant input signal every prefix average, every reseed, and every
// rescale is exactly the input value, so any lost or double-counted sample
// inside the drain-and-reset window would show up as a different average.
#[test]
fn concurrent_fold_and_drain_preserve_a_constant_signal() {
    let sampler = two_channel_sampler();
    sampler.begin_capture();

    let buffer = {
        let mut buffer = [0u16; 64];
        for cycle in buffer.chunks_exact_mut(2) {
            cycle[0] = 1000;
            cycle[1] = 2000;
        }
        buffer
    };

    let capture_done = AtomicBool::new(false);
    thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..2_000 {
                sampler.absorb(&buffer);
            }
            capture_done.store(true, Ordering::Release);
        });

        while !capture_done.load(Ordering::Acquire) {
            match sampler.read(0) {
                Ok(average) => assert_eq!(average, 1000),
                Err(ReadError::NoData) => {}
                Err(err) => panic!("unexpected readout failure: {err:?}"),
            }
        }
    });

    assert_eq!(sampler.read(0), Ok(1000));
    assert_eq!(sampler.read(1), Ok(2000));
}

// Forced critical-section boundary: a drain lands exactly between two capture
// passes. The reseeded average must fold into the next window as one sample's
// worth of history, with nothing lost on either side of the boundary.
#[test]
fn drain_between_flips_keeps_the_sample_accounting() {
    let sampler = two_channel_sampler();
    sampler.begin_capture();

    sampler.absorb(&[100, 0]);
    assert_eq!(sampler.read(0), Ok(100));

    // Accumulator now holds (100, 1); the next flip lands on top of it.
    sampler.absorb(&[300, 0]);
    assert_eq!(sampler.read(0), Ok(200));

    // And a drain with no intervening flip replays the same average.
    assert_eq!(sampler.read(0), Ok(200));
}
