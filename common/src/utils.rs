//! Channel Geometry Utilities
//!
//! Maps LTE channel widths (in physical resource blocks) onto OFDM
//! transform sizes and slot durations.

use tracing::trace;

use crate::types::CyclicPrefix;

/// Each RB has 12 subcarriers
pub const SUBCARRIERS_PER_RB: usize = 12;

/// Widest LTE channel (20 MHz) in resource blocks
pub const MAX_PRB: usize = 100;

/// LTE subcarrier spacing in Hz
pub const SUBCARRIER_SPACING_HZ: f64 = 15_000.0;

/// OFDM symbol size (FFT length) for a channel of `nof_prb` resource blocks.
///
/// Returns `None` for zero or more than [`MAX_PRB`] resource blocks.
pub fn symbol_size(nof_prb: usize) -> Option<usize> {
    let size = match nof_prb {
        0 => return None,
        1..=6 => 128,
        7..=15 => 256,
        16..=25 => 512,
        26..=50 => 1024,
        51..=75 => 1536,
        76..=MAX_PRB => 2048,
        _ => return None,
    };

    trace!("Resolved symbol size {} for {} PRB", size, nof_prb);

    Some(size)
}

/// Number of useful resource elements per OFDM symbol
pub fn nof_re(nof_prb: usize) -> usize {
    nof_prb * SUBCARRIERS_PER_RB
}

/// Samples in one 0.5 ms slot, prefixes included
pub fn slot_length(symbol_size: usize) -> usize {
    480 * symbol_size / 64
}

/// Samples in one 1 ms subframe (two slots)
pub fn subframe_length(symbol_size: usize) -> usize {
    2 * slot_length(symbol_size)
}

/// Baseband sample rate for a given transform size
pub fn sample_rate_hz(symbol_size: usize) -> f64 {
    symbol_size as f64 * SUBCARRIER_SPACING_HZ
}

/// Sum of `symbol_size + cp_length` over every symbol of a slot
pub fn slot_length_for(cp: CyclicPrefix, symbol_size: usize) -> usize {
    (0..cp.symbols_per_slot())
        .map(|symbol| symbol_size + cp.cp_length(symbol, symbol_size))
        .sum()
}
