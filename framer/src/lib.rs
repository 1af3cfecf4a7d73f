//! LTE OFDM Symbol Framer
//!
//! Converts between baseband time samples and the frequency-domain resource
//! grid of an LTE physical layer: cyclic prefix handling, guard band
//! trimming, DC subcarrier placement and optional frequency shift
//! correction, on top of a pluggable DFT engine.

pub mod config;
pub mod phy;

use thiserror::Error;

pub use config::FramerConfig;
pub use phy::dft::{DftError, DftFlags, RustFftEngine, SpectralEngine};
pub use phy::ofdm::{OfdmFramer, OfdmSymbolTiming};
pub use common::types::{CyclicPrefix, Direction};

/// Errors raised while building or configuring an OFDM framer
#[derive(Error, Debug)]
pub enum FramerError {
    #[error("Invalid bandwidth: {nof_prb} PRB has no LTE symbol size")]
    InvalidBandwidth { nof_prb: usize },

    #[error("DFT engine initialization failed")]
    EngineInitFailure(#[from] DftError),

    #[error("Failed to allocate {what} ({len} samples)")]
    AllocationFailure { what: &'static str, len: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
