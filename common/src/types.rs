//! Common Types for the LTE PHY
//!
//! Defines the fundamental enumerations the OFDM framer is configured with

use serde::{Deserialize, Serialize};

/// Symbols per slot with normal cyclic prefix
pub const CPNORM_NSYMB: usize = 7;
/// Symbols per slot with extended cyclic prefix
pub const CPEXT_NSYMB: usize = 6;

/// CP length of the first symbol of a normal-CP slot, in 2048-point samples
pub const CPNORM_0_LEN: usize = 160;
/// CP length of the remaining normal-CP symbols, in 2048-point samples
pub const CPNORM_LEN: usize = 144;
/// Extended CP length, in 2048-point samples
pub const CPEXT_LEN: usize = 512;

/// Cyclic prefix type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclicPrefix {
    Normal,
    Extended,
}

impl CyclicPrefix {
    /// Number of OFDM symbols in one slot
    pub fn symbols_per_slot(&self) -> usize {
        match self {
            CyclicPrefix::Normal => CPNORM_NSYMB,
            CyclicPrefix::Extended => CPEXT_NSYMB,
        }
    }

    /// CP length in samples for `symbol` (index within the slot) at the given
    /// transform size.
    ///
    /// Normal CP gives the first symbol of the slot a longer prefix so that
    /// the slot always spans `15 * symbol_size / 2` samples.
    pub fn cp_length(&self, symbol: usize, symbol_size: usize) -> usize {
        match self {
            CyclicPrefix::Normal if symbol == 0 => scale_cp(CPNORM_0_LEN, symbol_size),
            CyclicPrefix::Normal => scale_cp(CPNORM_LEN, symbol_size),
            CyclicPrefix::Extended => scale_cp(CPEXT_LEN, symbol_size),
        }
    }
}

impl std::fmt::Display for CyclicPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CyclicPrefix::Normal => write!(f, "Normal"),
            CyclicPrefix::Extended => write!(f, "Extended"),
        }
    }
}

/// Rescale a CP length given for a 2048-point symbol, rounding up
fn scale_cp(len_2048: usize, symbol_size: usize) -> usize {
    (len_2048 * symbol_size).div_ceil(2048)
}

/// Direction of the OFDM transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Time samples to subcarriers (receiver, forward DFT)
    Analysis,
    /// Subcarriers to time samples (transmitter, inverse DFT)
    Synthesis,
}

impl Direction {
    pub fn is_forward(&self) -> bool {
        matches!(self, Direction::Analysis)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Analysis => write!(f, "FFT"),
            Direction::Synthesis => write!(f, "iFFT"),
        }
    }
}
