//! DFT Engine Abstraction
//!
//! The OFDM framer only needs a complex-to-complex transform of a fixed size
//! plus three options that define the subcarrier ordering on the wire:
//!
//! - `MIRROR`: the frequency-domain side is ordered negative frequencies
//!   first, positive frequencies second (the resource grid order).
//! - `DC`: the DC bin is skipped. The inverse transform inserts a zero at
//!   bin 0 and the forward transform never emits it.
//! - `NORMALIZE`: the transform output is scaled by `1/N`.
//!
//! Mirroring is applied on the way in for inverse transforms and on the way
//! out for forward transforms, so the time-domain side is always in natural
//! order.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use common::types::Direction;
use num_complex::Complex32;
use num_traits::Zero;
use rustfft::{Fft, FftDirection, FftPlanner};
use thiserror::Error;
use tracing::trace;

bitflags! {
    /// Options of a DFT engine
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DftFlags: u8 {
        /// Frequency side ordered negative-then-positive
        const MIRROR = 0b001;
        /// Skip the DC bin
        const DC = 0b010;
        /// Scale the output by 1/N
        const NORMALIZE = 0b100;
    }
}

/// DFT engine errors
#[derive(Error, Debug)]
pub enum DftError {
    #[error("Invalid DFT size: {0}")]
    InvalidSize(usize),

    #[error("Failed to create DFT plan: {0}")]
    PlanFailed(String),
}

/// A fixed-size complex-to-complex transform.
///
/// Engines are planned once and released on drop. `run` must not keep any
/// state between calls other than the plan itself.
pub trait SpectralEngine: Send {
    /// Plan a transform of `size` points in the given direction
    fn plan(size: usize, direction: Direction) -> Result<Self, DftError>
    where
        Self: Sized;

    /// Transform size
    fn size(&self) -> usize;

    /// Transform direction
    fn direction(&self) -> Direction;

    /// Currently active options
    fn flags(&self) -> DftFlags;

    /// Replace all options at once
    fn configure(&mut self, flags: DftFlags);

    /// Enable or disable a single option
    fn set_flag(&mut self, flag: DftFlags, enabled: bool) {
        let mut flags = self.flags();
        flags.set(flag, enabled);
        self.configure(flags);
    }

    /// Transform `input` into `output`, both exactly `size()` samples
    fn run(&mut self, input: &[Complex32], output: &mut [Complex32]);
}

/// Pure Rust engine backed by `rustfft`
pub struct RustFftEngine {
    size: usize,
    direction: Direction,
    flags: DftFlags,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex32>,
    fft_scratch: Vec<Complex32>,
}

impl fmt::Debug for RustFftEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RustFftEngine")
            .field("size", &self.size)
            .field("direction", &self.direction)
            .field("flags", &self.flags)
            .finish()
    }
}

impl SpectralEngine for RustFftEngine {
    fn plan(size: usize, direction: Direction) -> Result<Self, DftError> {
        if size == 0 {
            return Err(DftError::InvalidSize(size));
        }

        let fft_direction = if direction.is_forward() {
            FftDirection::Forward
        } else {
            FftDirection::Inverse
        };
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft(size, fft_direction);
        let fft_scratch = vec![Complex32::zero(); fft.get_inplace_scratch_len()];

        trace!("Planned {} of size {} ({} scratch)", direction, size, fft_scratch.len());

        Ok(Self {
            size,
            direction,
            flags: DftFlags::empty(),
            fft,
            buffer: vec![Complex32::zero(); size],
            fft_scratch,
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

        copy_pre(&mut self.buffer, input, forward, self.flags);
        self.fft.process_with_scratch(&mut self.buffer, &mut self.fft_scratch);
        if self.flags.contains(DftFlags::NORMALIZE) {
            normalize(&mut self.buffer);
        }
        copy_post(output, &self.buffer, forward, self.flags);
    }
}

/// Reorder the transform input. Only inverse transforms are mirrored here.
pub(crate) fn copy_pre(dst: &mut [Complex32], src: &[Complex32], forward: bool, flags: DftFlags) {
    let len = dst.len();
    if flags.contains(DftFlags::MIRROR) && !forward {
        let offset = usize::from(flags.contains(DftFlags::DC));
        let hlen = len / 2;
        dst[..offset].fill(Complex32::zero());
        dst[offset..len - hlen].copy_from_slice(&src[hlen..len - offset]);
        dst[len - hlen..].copy_from_slice(&src[..hlen]);
    } else {
        dst.copy_from_slice(src);
    }
}

/// Reorder the transform output. Only forward transforms are mirrored here.
pub(crate) fn copy_post(dst: &mut [Complex32], src: &[Complex32], forward: bool, flags: DftFlags) {
    let len = dst.len();
    if flags.contains(DftFlags::MIRROR) && forward {
        let offset = usize::from(flags.contains(DftFlags::DC));
        let hlen = len.div_ceil(2);
        dst[..len - hlen].copy_from_slice(&src[hlen..]);
        dst[len - hlen..len - offset].copy_from_slice(&src[offset..hlen]);
        dst[len - offset..].fill(Complex32::zero());
    } else {
        dst.copy_from_slice(src);
    }
}

pub(crate) fn normalize(buffer: &mut [Complex32]) {
    let scale = 1.0 / buffer.len() as f32;
    for sample in buffer.iter_mut() {
        *sample *= scale;
    }
}
