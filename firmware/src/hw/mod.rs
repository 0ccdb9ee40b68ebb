//! Board wiring for the analog monitor.
//!
//! The flight controller routes its sense rails to ADC1: the battery divider
//! on PC1 and the current-sense amplifier on PC2. The table below is the one
//! authority on scan order; the runtime builds both the core channel list
//! and the hardware scan sequence from it, which keeps accumulator indices
//! and DMA interleave positions in lock-step by construction.

#![allow(dead_code)]

pub mod analog;

/// Metadata for one sensed rail.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BoardChannel {
    /// Short label used in log lines.
    pub name: &'static str,
    /// Converter channel number (`ADC123_INx`).
    pub adc_channel: u8,
    /// MCU pin carrying the signal, for board bring-up notes.
    pub mcu_pin: &'static str,
}

/// Scan order for this board. Position in this table is the channel index
/// callers pass to the readout API.
pub const BOARD_CHANNELS: [BoardChannel; 2] = [
    BoardChannel {
        name: "vbat",
        adc_channel: 11,
        mcu_pin: "PC1",
    },
    BoardChannel {
        name: "current",
        adc_channel: 12,
        mcu_pin: "PC2",
    },
];
