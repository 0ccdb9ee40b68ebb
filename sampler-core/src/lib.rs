#![no_std]

// Hardware-independent core of the analog sampling subsystem.
//
// Everything that can be exercised on the host lives here: capture-buffer
// geometry, the per-channel accumulator engine, and the readout surface the
// rest of the flight stack polls. The firmware crate owns the actual
// converter and DMA programming and hands completed capture buffers to
// [`sampler::AnalogSampler::absorb`].

pub mod accumulator;
pub mod capture;
pub mod sampler;
