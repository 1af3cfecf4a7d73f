//! Physical Layer (PHY) Submodules
//!
//! OFDM framing on top of a DFT engine. The engine is a trait so that the
//! pure-Rust backend and the FFTW backend are interchangeable.

pub mod dft;
#[cfg(feature = "fftw")]
pub mod dft_fftw;
pub mod ofdm;

// Re-export commonly used types
pub use dft::{DftError, DftFlags, RustFftEngine, SpectralEngine};
#[cfg(feature = "fftw")]
pub use dft_fftw::FftwEngine;
pub use ofdm::{OfdmFramer, OfdmSymbolTiming};

use num_complex::Complex32;

/// Multiply `samples` element-wise by `coeffs`, in place
pub(crate) fn vec_prod(samples: &mut [Complex32], coeffs: &[Complex32]) {
    debug_assert_eq!(samples.len(), coeffs.len());
    for (sample, coeff) in samples.iter_mut().zip(coeffs) {
        *sample *= *coeff;
    }
}
