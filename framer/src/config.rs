//! TOML Configuration for OFDM framers
//!
//! ```toml
//! nof_prb = 25
//! cyclic_prefix = "normal"
//! direction = "synthesis"
//! freq_shift = 0.5
//! normalize = true
//! ```

use std::path::Path;

use common::types::{CyclicPrefix, Direction};
use common::utils::symbol_size;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::phy::dft::{RustFftEngine, SpectralEngine};
use crate::phy::ofdm::OfdmFramer;
use crate::FramerError;

/// Framer configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FramerConfig {
    /// Channel width in resource blocks
    pub nof_prb: usize,
    /// Cyclic prefix type
    #[serde(default = "default_cyclic_prefix")]
    pub cyclic_prefix: CyclicPrefix,
    /// Analysis (receive) or synthesis (transmit)
    pub direction: Direction,
    /// Frequency shift in subcarrier spacings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freq_shift: Option<f32>,
    /// Override the direction's default output normalization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalize: Option<bool>,
}

fn default_cyclic_prefix() -> CyclicPrefix {
    CyclicPrefix::Normal
}

impl FramerConfig {
    pub fn new(nof_prb: usize, cyclic_prefix: CyclicPrefix, direction: Direction) -> Self {
        Self {
            nof_prb,
            cyclic_prefix,
            direction,
            freq_shift: None,
            normalize: None,
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, FramerError> {
        let config: FramerConfig = toml::from_str(contents)
            .map_err(|e| FramerError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, FramerError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            FramerError::InvalidConfiguration(format!("{}: {}", path.display(), e))
        })?;
        debug!("Loaded framer configuration from {}", path.display());
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), FramerError> {
        if symbol_size(self.nof_prb).is_none() {
            warn!("Rejecting framer configuration with {} PRB", self.nof_prb);
            return Err(FramerError::InvalidBandwidth {
                nof_prb: self.nof_prb,
            });
        }
        if let Some(shift) = self.freq_shift {
            if !shift.is_finite() {
                warn!("Rejecting non-finite frequency shift {}", shift);
                return Err(FramerError::InvalidConfiguration(format!(
                    "frequency shift must be finite, got {}",
                    shift
                )));
            }
        }
        Ok(())
    }

    /// Build a framer on the default `rustfft` engine
    pub fn build(&self) -> Result<OfdmFramer<RustFftEngine>, FramerError> {
        self.build_with()
    }

    /// Build a framer on a chosen DFT engine, applying the frequency shift
    /// and normalization settings
    pub fn build_with<E: SpectralEngine>(&self) -> Result<OfdmFramer<E>, FramerError> {
        self.validate()?;

        let mut framer = OfdmFramer::<E>::new(self.cyclic_prefix, self.nof_prb, self.direction)?;
        if let Some(shift) = self.freq_shift {
            framer.set_freq_shift(shift)?;
        }
        if let Some(normalize) = self.normalize {
            framer.set_normalize(normalize);
        }

        Ok(framer)
    }
}
