//! FFTW DFT Engine
//!
//! Uses FFTW plans for high-performance FFT operations. Enabled with the
//! `fftw` cargo feature; requires the system FFTW3 library.

use std::fmt;

use common::types::Direction;
use fftw::array::AlignedVec;
use fftw::plan::{C2CPlan, C2CPlan32};
use fftw::types::{c32, Flag, Sign};
use num_complex::Complex32;
use tracing::debug;

use super::dft::{copy_post, copy_pre, normalize, DftError, DftFlags, SpectralEngine};

/// Engine backed by an FFTW plan (pre-computed for performance)
pub struct FftwEngine {
    size: usize,
    direction: Direction,
    flags: DftFlags,
    plan: C2CPlan32,
    input: AlignedVec<c32>,
    output: AlignedVec<c32>,
}

// FFTW plans are only executed through `&mut self`
unsafe impl Send for FftwEngine {}

impl fmt::Debug for FftwEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftwEngine")
            .field("size", &self.size)
            .field("direction", &self.direction)
            .field("flags", &self.flags)
            .finish()
    }
}

impl SpectralEngine for FftwEngine {
    fn plan(size: usize, direction: Direction) -> Result<Self, DftError> {
        if size == 0 {
            return Err(DftError::InvalidSize(size));
        }

        let sign = if direction.is_forward() {
            Sign::Forward
        } else {
            Sign::Backward
        };

        // MEASURE takes more time to plan but is faster to execute
        let plan = C2CPlan32::aligned(&[size], sign, Flag::MEASURE | Flag::DESTROYINPUT)
            .map_err(|e| DftError::PlanFailed(format!("{:?}", e)))?;

        debug!("Created FFTW {} plan of size {}", direction, size);

        Ok(Self {
            size,
            direction,
            flags: DftFlags::empty(),
            plan,
            input: AlignedVec::new(size),
            output: AlignedVec::new(size),
        })
    }

    fn size(&self) -> usize {
        self.size
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn flags(&self) -> DftFlags {
        self.flags
    }

    fn configure(&mut self, flags: DftFlags) {
        self.flags = flags;
    }

    fn run(&mut self, input: &[Complex32], output: &mut [Complex32]) {
        let forward = self.direction.is_forward();

        copy_pre(&mut self.input, input, forward, self.flags);
        self.plan
            .c2c(&mut self.input, &mut self.output)
            .expect("FFTW buffers are allocated with the plan size and alignment");
        if self.flags.contains(DftFlags::NORMALIZE) {
            normalize(&mut self.output);
        }
        copy_post(output, &self.output, forward, self.flags);
    }
}
