//! OFDM Framing for LTE
//!
//! Converts one slot or subframe of baseband samples into resource grid
//! symbols (analysis) and back (synthesis). The framer owns the bookkeeping
//! around the DFT: symbol size selection from the channel width, cyclic
//! prefix insertion and removal, guard band trimming and the optional
//! frequency shift correction.
//!
//! Resource grid layout is one symbol after the other, each holding
//! `nof_re` subcarriers ordered from the lowest to the highest frequency.

use common::types::{CyclicPrefix, Direction};
use common::utils::{nof_re, slot_length_for, symbol_size};
use num_complex::Complex32;
use num_traits::Zero;
use std::f64::consts::PI;
use tracing::{debug, trace};

use super::dft::{DftFlags, RustFftEngine, SpectralEngine};
use super::vec_prod;
use crate::FramerError;

/// Slots in one subframe
const SLOTS_PER_SUBFRAME: usize = 2;

/// OFDM framer for one transform direction.
///
/// A framer is either an analyzer (time samples to resource grid) or a
/// synthesizer (resource grid to time samples). Processing needs `&mut self`
/// because the scratch symbol is reused across calls; separate framers are
/// independent and may run on separate threads.
pub struct OfdmFramer<E: SpectralEngine = RustFftEngine> {
    /// Cyclic prefix type
    cp: CyclicPrefix,
    /// Transform direction
    direction: Direction,
    /// Bandwidth in resource blocks
    nof_prb: usize,
    /// FFT size
    symbol_size: usize,
    /// Symbols per slot
    nof_symbols: usize,
    /// Useful subcarriers per symbol
    nof_re: usize,
    /// Guard subcarriers on each spectral edge
    nof_guards: usize,
    /// Samples per slot, prefixes included
    slot_size: usize,
    /// Frequency shift correction active
    freq_shift: bool,
    /// Per-sample rotation for one subframe, empty until configured
    shift_buffer: Vec<Complex32>,
    /// One symbol of frequency-domain samples
    scratch: Vec<Complex32>,
    engine: E,
}

/// OFDM symbol timing information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfdmSymbolTiming {
    /// Symbol start sample within the slot
    pub start_sample: usize,
    /// Symbol duration in samples (including CP)
    pub duration: usize,
    /// CP length in samples
    pub cp_length: usize,
}

impl OfdmFramer<RustFftEngine> {
    /// Create an analyzer (FFT, receive side) using the `rustfft` engine
    pub fn analyzer(cp: CyclicPrefix, nof_prb: usize) -> Result<Self, FramerError> {
        Self::new(cp, nof_prb, Direction::Analysis)
    }

    /// Create a synthesizer (iFFT, transmit side) using the `rustfft` engine
    pub fn synthesizer(cp: CyclicPrefix, nof_prb: usize) -> Result<Self, FramerError> {
        Self::new(cp, nof_prb, Direction::Synthesis)
    }
}

impl<E: SpectralEngine> OfdmFramer<E> {
    /// Create a framer for a channel of `nof_prb` resource blocks.
    ///
    /// Synthesizers start with output normalization enabled and their
    /// scratch guard bands zeroed; the guards are never written again.
    pub fn new(
        cp: CyclicPrefix,
        nof_prb: usize,
        direction: Direction,
    ) -> Result<Self, FramerError> {
        let symbol_size = symbol_size(nof_prb)
            .ok_or(FramerError::InvalidBandwidth { nof_prb })?;

        let mut engine = E::plan(symbol_size, direction)?;
        debug_assert_eq!(engine.size(), symbol_size);
        debug_assert_eq!(engine.direction(), direction);
        engine.configure(DftFlags::MIRROR | DftFlags::DC);

        let scratch = try_alloc(symbol_size, "scratch symbol")?;

        let nof_symbols = cp.symbols_per_slot();
        let nof_re = nof_re(nof_prb);
        let nof_guards = (symbol_size - nof_re) / 2;
        let slot_size = slot_length_for(cp, symbol_size);

        let mut framer = Self {
            cp,
            direction,
            nof_prb,
            symbol_size,
            nof_symbols,
            nof_re,
            nof_guards,
            slot_size,
            freq_shift: false,
            shift_buffer: Vec::new(),
            scratch,
            engine,
        };

        if direction == Direction::Synthesis {
            framer.engine.set_flag(DftFlags::NORMALIZE, true);
            let guard_end = framer.nof_re + framer.nof_guards;
            framer.scratch[..nof_guards].fill(Complex32::zero());
            framer.scratch[guard_end..].fill(Complex32::zero());
        }

        debug!(
            "Init {} symbol_sz={}, nof_symbols={}, cp={}, nof_re={}, nof_guards={}",
            direction, symbol_size, nof_symbols, cp, nof_re, nof_guards
        );

        Ok(framer)
    }

    /// Configure a frequency shift of `freq_shift` subcarrier spacings.
    ///
    /// Analysis applies the rotation to the input subframe before the FFT,
    /// synthesis applies it to the output subframe after the iFFT. The DC
    /// subcarrier is no longer skipped once a shift is active. Must be called
    /// before the first subframe is processed; calling it again replaces
    /// the table.
    pub fn set_freq_shift(&mut self, freq_shift: f32) -> Result<(), FramerError> {
        let mut shift_buffer = try_alloc(SLOTS_PER_SUBFRAME * self.slot_size, "frequency shift table")?;

        let n = self.symbol_size as f64;
        let shift = f64::from(freq_shift);
        let mut pos = 0;
        for _ in 0..SLOTS_PER_SUBFRAME {
            for symbol in 0..self.nof_symbols {
                let cp_len = self.cp_len(symbol);
                let len = self.symbol_size + cp_len;
                for (t, coeff) in shift_buffer[pos..pos + len].iter_mut().enumerate() {
                    let phase = 2.0 * PI * (t as f64 - cp_len as f64) * shift / n;
                    *coeff = Complex32::new(phase.cos() as f32, phase.sin() as f32);
                }
                pos += len;
            }
        }

        self.shift_buffer = shift_buffer;
        self.engine.set_flag(DftFlags::DC, false);
        self.freq_shift = true;

        debug!(
            "Frequency shift {:.4} configured on {} context ({} samples)",
            freq_shift,
            self.direction,
            self.shift_buffer.len()
        );

        Ok(())
    }

    /// Enable or disable 1/N scaling of the transform output
    pub fn set_normalize(&mut self, normalize: bool) {
        self.engine.set_flag(DftFlags::NORMALIZE, normalize);
    }

    /// Demodulate one slot: `slot_length()` time samples in,
    /// `symbols_per_slot() * nof_re()` subcarriers out.
    ///
    /// The frequency shift is not applied here, see
    /// [`demodulate_subframe`](Self::demodulate_subframe).
    pub fn demodulate_slot(&mut self, input: &[Complex32], output: &mut [Complex32]) {
        debug_assert_eq!(self.direction, Direction::Analysis, "demodulate on a synthesis context");

        let (n, guards, re) = (self.symbol_size, self.nof_guards, self.nof_re);
        let mut in_pos = 0;
        let mut out_pos = 0;
        for symbol in 0..self.nof_symbols {
            // Skip CP
            in_pos += self.cp_len(symbol);
            self.engine.run(&input[in_pos..in_pos + n], &mut self.scratch);
            output[out_pos..out_pos + re].copy_from_slice(&self.scratch[guards..guards + re]);
            in_pos += n;
            out_pos += re;
        }
    }

    /// Demodulate one subframe (two slots).
    ///
    /// When a frequency shift is configured, `input` is rotated in place
    /// before demodulation.
    pub fn demodulate_subframe(&mut self, input: &mut [Complex32], output: &mut [Complex32]) {
        let slot_in = self.slot_size;
        let slot_out = self.nof_re * self.nof_symbols;

        if self.freq_shift {
            vec_prod(&mut input[..SLOTS_PER_SUBFRAME * slot_in], &self.shift_buffer);
        }

        for slot in 0..SLOTS_PER_SUBFRAME {
            self.demodulate_slot(
                &input[slot * slot_in..(slot + 1) * slot_in],
                &mut output[slot * slot_out..(slot + 1) * slot_out],
            );
        }

        trace!("Demodulated subframe: {} samples -> {} RE", 2 * slot_in, 2 * slot_out);
    }

    /// Modulate one slot: `symbols_per_slot() * nof_re()` subcarriers in,
    /// `slot_length()` time samples out.
    ///
    /// The frequency shift is not applied here, see
    /// [`modulate_subframe`](Self::modulate_subframe).
    pub fn modulate_slot(&mut self, input: &[Complex32], output: &mut [Complex32]) {
        debug_assert_eq!(self.direction, Direction::Synthesis, "modulate on an analysis context");

        let (n, guards, re) = (self.symbol_size, self.nof_guards, self.nof_re);
        let mut in_pos = 0;
        let mut out_pos = 0;
        for symbol in 0..self.nof_symbols {
            let cp_len = self.cp_len(symbol);
            self.scratch[guards..guards + re].copy_from_slice(&input[in_pos..in_pos + re]);

            let samples = &mut output[out_pos..out_pos + cp_len + n];
            self.engine.run(&self.scratch, &mut samples[cp_len..]);
            // Add CP
            samples.copy_within(n..n + cp_len, 0);

            in_pos += re;
            out_pos += n + cp_len;
        }
    }

    /// Modulate one subframe (two slots), applying the frequency shift to
    /// the output when configured
    pub fn modulate_subframe(&mut self, input: &[Complex32], output: &mut [Complex32]) {
        let slot_in = self.nof_re * self.nof_symbols;
        let slot_out = self.slot_size;

        for slot in 0..SLOTS_PER_SUBFRAME {
            self.modulate_slot(
                &input[slot * slot_in..(slot + 1) * slot_in],
                &mut output[slot * slot_out..(slot + 1) * slot_out],
            );
        }

        if self.freq_shift {
            vec_prod(&mut output[..SLOTS_PER_SUBFRAME * slot_out], &self.shift_buffer);
        }

        trace!("Modulated subframe: {} RE -> {} samples", 2 * slot_in, 2 * slot_out);
    }

    /// Start, duration and CP length of every symbol in a slot
    pub fn slot_timing(&self) -> Vec<OfdmSymbolTiming> {
        let mut start = 0;
        (0..self.nof_symbols)
            .map(|symbol| {
                let cp_length = self.cp_len(symbol);
                let duration = self.symbol_size + cp_length;
                let timing = OfdmSymbolTiming {
                    start_sample: start,
                    duration,
                    cp_length,
                };
                start += duration;
                timing
            })
            .collect()
    }

    fn cp_len(&self, symbol: usize) -> usize {
        self.cp.cp_length(symbol, self.symbol_size)
    }

    pub fn cyclic_prefix(&self) -> CyclicPrefix {
        self.cp
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn nof_prb(&self) -> usize {
        self.nof_prb
    }

    /// FFT size
    pub fn symbol_size(&self) -> usize {
        self.symbol_size
    }

    pub fn symbols_per_slot(&self) -> usize {
        self.nof_symbols
    }

    /// Useful subcarriers per symbol
    pub fn nof_re(&self) -> usize {
        self.nof_re
    }

    /// Guard subcarriers on each edge of the spectrum
    pub fn guard_width(&self) -> usize {
        self.nof_guards
    }

    /// Time samples per slot, prefixes included
    pub fn slot_length(&self) -> usize {
        self.slot_size
    }

    /// Time samples per subframe
    pub fn subframe_length(&self) -> usize {
        SLOTS_PER_SUBFRAME * self.slot_size
    }

    /// Resource elements per slot
    pub fn slot_re(&self) -> usize {
        self.nof_symbols * self.nof_re
    }

    pub fn freq_shift_enabled(&self) -> bool {
        self.freq_shift
    }

    /// Per-sample rotation applied to a subframe; empty without a shift
    pub fn shift_table(&self) -> &[Complex32] {
        &self.shift_buffer
    }

    pub fn normalize(&self) -> bool {
        self.engine.flags().contains(DftFlags::NORMALIZE)
    }

    /// Options currently set on the DFT engine
    pub fn dft_flags(&self) -> DftFlags {
        self.engine.flags()
    }
}

impl<E: SpectralEngine> Drop for OfdmFramer<E> {
    fn drop(&mut self) {
        trace!("Releasing {} context symbol_sz={}", self.direction, self.symbol_size);
    }
}

/// Allocate a zeroed sample buffer, reporting allocation failure as an error
fn try_alloc(len: usize, what: &'static str) -> Result<Vec<Complex32>, FramerError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| FramerError::AllocationFailure { what, len })?;
    buffer.resize(len, Complex32::zero());
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::utils::{slot_length, MAX_PRB};
    use quickcheck_macros::quickcheck;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const TOLERANCE: f32 = 1e-3;

    fn random_grid(rng: &mut StdRng, len: usize) -> Vec<Complex32> {
        (0..len)
            .map(|_| Complex32::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
            .collect()
    }

    fn max_error(a: &[Complex32], b: &[Complex32]) -> f32 {
        assert_eq!(a.len(), b.len());
        a.iter().zip(b).map(|(x, y)| (x - y).norm()).fold(0.0, f32::max)
    }

    fn loopback_subframe(
        tx: &mut OfdmFramer,
        rx: &mut OfdmFramer,
        grid: &[Complex32],
    ) -> Vec<Complex32> {
        let mut time = vec![Complex32::zero(); tx.subframe_length()];
        let mut back = vec![Complex32::zero(); grid.len()];
        tx.modulate_subframe(grid, &mut time);
        rx.demodulate_subframe(&mut time, &mut back);
        back
    }

    #[test]
    fn test_invalid_bandwidth() {
        for nof_prb in [0, MAX_PRB + 1, 500] {
            let result = OfdmFramer::analyzer(CyclicPrefix::Normal, nof_prb);
            assert!(matches!(
                result,
                Err(FramerError::InvalidBandwidth { nof_prb: n }) if n == nof_prb
            ));
        }
    }

    #[test]
    fn test_geometry_for_every_bandwidth() {
        for nof_prb in 1..=MAX_PRB {
            for cp in [CyclicPrefix::Normal, CyclicPrefix::Extended] {
                let framer = OfdmFramer::analyzer(cp, nof_prb).unwrap();
                assert_eq!(framer.nof_re(), nof_prb * 12);
                assert_eq!(
                    2 * framer.guard_width() + framer.nof_re(),
                    framer.symbol_size()
                );
                assert_eq!(framer.slot_length(), slot_length(framer.symbol_size()));
            }
        }
    }

    #[test]
    fn test_normal_cp_slot_timing() {
        let framer = OfdmFramer::analyzer(CyclicPrefix::Normal, 50).unwrap();
        let timing = framer.slot_timing();

        assert_eq!(timing.len(), 7);
        assert_eq!(timing[0].cp_length, 80);
        assert!(timing[1..].iter().all(|t| t.cp_length == 72));
        assert!(timing[0].cp_length > timing[1].cp_length);

        let last = timing.last().unwrap();
        assert_eq!(last.start_sample + last.duration, 7680);
        assert_eq!(framer.slot_length(), 7680);
    }

    #[test]
    fn test_extended_cp_slot_timing() {
        let framer = OfdmFramer::synthesizer(CyclicPrefix::Extended, 25).unwrap();
        let timing = framer.slot_timing();

        assert_eq!(timing.len(), 6);
        assert!(timing.iter().all(|t| t.cp_length == 128));
        assert_eq!(timing.iter().map(|t| t.duration).sum::<usize>(), 3840);
        assert_eq!(timing[3].start_sample, 3 * (512 + 128));
    }

    #[test]
    fn test_six_prb_slot_sample_counts() {
        let mut framer = OfdmFramer::analyzer(CyclicPrefix::Normal, 6).unwrap();
        assert_eq!(framer.symbol_size(), 128);
        assert_eq!(framer.slot_length(), 138 + 6 * 137);
        assert_eq!(framer.slot_re(), 7 * 72);

        // Every symbol body is a tone on subcarrier +1; prefixes hold junk
        // that must never reach the FFT.
        let mut input = Vec::with_capacity(framer.slot_length());
        for timing in framer.slot_timing() {
            input.extend((0..timing.cp_length).map(|i| Complex32::new(100.0 + i as f32, -50.0)));
            input.extend((0..128).map(|t| {
                Complex32::from_polar(1.0, 2.0 * std::f32::consts::PI * t as f32 / 128.0)
            }));
        }
        assert_eq!(input.len(), 960);

        let mut output = vec![Complex32::zero(); 7 * 72];
        framer.demodulate_slot(&input, &mut output);

        for (symbol, re) in output.chunks(72).enumerate() {
            for (k, &x) in re.iter().enumerate() {
                let expected = if k == 36 { 128.0 } else { 0.0 };
                assert!(
                    (x - Complex32::new(expected, 0.0)).norm() < 1e-2,
                    "symbol {} subcarrier {}: {}",
                    symbol,
                    k,
                    x
                );
            }
        }
    }

    #[test]
    fn test_zero_grid_gives_zero_signal() {
        let mut framer = OfdmFramer::synthesizer(CyclicPrefix::Normal, 15).unwrap();
        let grid = vec![Complex32::zero(); 2 * framer.slot_re()];
        let mut output = vec![Complex32::new(1.0, 1.0); framer.subframe_length()];

        framer.modulate_subframe(&grid, &mut output);

        assert!(output.iter().all(|x| x.is_zero()));
    }

    #[test]
    fn test_cyclic_prefix_is_copy_of_tail() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut framer = OfdmFramer::synthesizer(CyclicPrefix::Normal, 25).unwrap();
        let grid = random_grid(&mut rng, framer.slot_re());
        let mut output = vec![Complex32::zero(); framer.slot_length()];

        framer.modulate_slot(&grid, &mut output);

        let n = framer.symbol_size();
        for timing in framer.slot_timing() {
            let symbol = &output[timing.start_sample..timing.start_sample + timing.duration];
            assert_eq!(&symbol[..timing.cp_length], &symbol[n..]);
        }
    }

    #[test]
    fn test_guard_bands_stay_zero() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut framer = OfdmFramer::synthesizer(CyclicPrefix::Extended, 6).unwrap();
        let mut output = vec![Complex32::zero(); framer.subframe_length()];

        for _ in 0..5 {
            let grid = random_grid(&mut rng, 2 * framer.slot_re());
            framer.modulate_subframe(&grid, &mut output);

            let guards = framer.guard_width();
            let upper = guards + framer.nof_re();
            assert!(framer.scratch[..guards].iter().all(|x| x.is_zero()));
            assert!(framer.scratch[upper..].iter().all(|x| x.is_zero()));
        }
    }

    #[test]
    fn test_loopback_normal_and_extended() {
        let mut rng = StdRng::seed_from_u64(1);
        for nof_prb in [6, 15, 25, 50, 75, 100] {
            for cp in [CyclicPrefix::Normal, CyclicPrefix::Extended] {
                let mut tx = OfdmFramer::synthesizer(cp, nof_prb).unwrap();
                let mut rx = OfdmFramer::analyzer(cp, nof_prb).unwrap();
                let grid = random_grid(&mut rng, 2 * tx.slot_re());

                let back = loopback_subframe(&mut tx, &mut rx, &grid);

                let err = max_error(&grid, &back);
                assert!(err < TOLERANCE, "{} PRB {:?}: error {}", nof_prb, cp, err);
            }
        }
    }

    #[test]
    fn test_shift_table_geometry() {
        let mut framer = OfdmFramer::analyzer(CyclicPrefix::Normal, 6).unwrap();
        assert!(!framer.freq_shift_enabled());
        assert!(framer.shift_table().is_empty());

        framer.set_freq_shift(0.5).unwrap();

        assert!(framer.freq_shift_enabled());
        let table = framer.shift_table();
        assert_eq!(table.len(), 2 * framer.slot_length());

        // Sample t == cp of each symbol is the start of its body: zero phase
        let mut pos = 0;
        for _ in 0..2 {
            for timing in framer.slot_timing() {
                let x = table[pos + timing.cp_length];
                assert!((x - Complex32::new(1.0, 0.0)).norm() < 1e-6);
                pos += timing.duration;
            }
        }
        assert!(table.iter().all(|x| (x.norm() - 1.0).abs() < 1e-5));
    }

    #[test]
    fn test_shift_table_values() {
        let mut framer = OfdmFramer::analyzer(CyclicPrefix::Normal, 6).unwrap();
        framer.set_freq_shift(0.25).unwrap();
        let table = framer.shift_table();

        let expected = |t: f64, cp: f64| {
            let phase = 2.0 * PI * (t - cp) * 0.25 / 128.0;
            Complex32::new(phase.cos() as f32, phase.sin() as f32)
        };

        // (table index, sample offset within the symbol, CP length)
        let cases = [
            (0, 0.0, 10.0),
            (20, 20.0, 10.0),
            (137, 137.0, 10.0),
            (138, 0.0, 9.0),
            (138 + 100, 100.0, 9.0),
            (960, 0.0, 10.0),
            (960 + 138 + 14, 14.0, 9.0),
            (2 * 960 - 1, 136.0, 9.0),
        ];
        for (index, t, cp) in cases {
            let x = table[index];
            assert!(
                (x - expected(t, cp)).norm() < 1e-5,
                "index {}: {} != {}",
                index,
                x,
                expected(t, cp)
            );
        }

        // First sample of the subframe lags by the 10-sample prefix
        let first = -2.0 * std::f32::consts::PI * 10.0 * 0.25 / 128.0;
        assert!((table[0] - Complex32::new(first.cos(), first.sin())).norm() < 1e-5);
        assert!(table[0].im < 0.0);
    }

    #[test]
    fn test_shift_disables_dc() {
        let mut framer = OfdmFramer::synthesizer(CyclicPrefix::Normal, 6).unwrap();
        assert!(framer.dft_flags().contains(DftFlags::DC | DftFlags::MIRROR));

        framer.set_freq_shift(0.25).unwrap();

        assert!(!framer.dft_flags().contains(DftFlags::DC));
        assert!(framer.dft_flags().contains(DftFlags::MIRROR));
    }

    #[test]
    fn test_zero_shift_is_identity() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut framer = OfdmFramer::analyzer(CyclicPrefix::Extended, 25).unwrap();
        framer.set_freq_shift(0.0).unwrap();
        assert!(framer
            .shift_table()
            .iter()
            .all(|&x| x == Complex32::new(1.0, 0.0)));

        let slot_len = framer.slot_length();
        let slot_re = framer.slot_re();
        let mut input = random_grid(&mut rng, 2 * slot_len);
        let original = input.clone();

        let mut unshifted = vec![Complex32::zero(); 2 * slot_re];
        framer.demodulate_slot(&original[..slot_len], &mut unshifted[..slot_re]);
        framer.demodulate_slot(&original[slot_len..], &mut unshifted[slot_re..]);

        let mut shifted = vec![Complex32::zero(); 2 * slot_re];
        framer.demodulate_subframe(&mut input, &mut shifted);

        assert_eq!(input, original);
        assert_eq!(shifted, unshifted);
    }

    #[test]
    fn test_opposite_shifts_cancel() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut tx = OfdmFramer::synthesizer(CyclicPrefix::Normal, 25).unwrap();
        let mut rx = OfdmFramer::analyzer(CyclicPrefix::Normal, 25).unwrap();
        tx.set_freq_shift(0.5).unwrap();
        rx.set_freq_shift(-0.5).unwrap();
        let grid = random_grid(&mut rng, 2 * tx.slot_re());

        let back = loopback_subframe(&mut tx, &mut rx, &grid);

        assert!(max_error(&grid, &back) < TOLERANCE);
    }

    #[test]
    fn test_shifted_output_is_rotated() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut plain = OfdmFramer::synthesizer(CyclicPrefix::Normal, 6).unwrap();
        let mut shifted = OfdmFramer::synthesizer(CyclicPrefix::Normal, 6).unwrap();
        plain.set_freq_shift(0.0).unwrap();
        shifted.set_freq_shift(1.0).unwrap();
        let grid = random_grid(&mut rng, 2 * plain.slot_re());

        let mut a = vec![Complex32::zero(); plain.subframe_length()];
        let mut b = vec![Complex32::zero(); shifted.subframe_length()];
        plain.modulate_subframe(&grid, &mut a);
        shifted.modulate_subframe(&grid, &mut b);

        let expected: Vec<Complex32> = a
            .iter()
            .zip(shifted.shift_table())
            .map(|(x, c)| x * c)
            .collect();
        assert!(max_error(&expected, &b) < 1e-5);
    }

    #[test]
    fn test_normalize_toggle() {
        let mut tx = OfdmFramer::synthesizer(CyclicPrefix::Normal, 6).unwrap();
        let rx = OfdmFramer::analyzer(CyclicPrefix::Normal, 6).unwrap();
        assert!(tx.normalize());
        assert!(!rx.normalize());

        tx.set_normalize(false);
        let flags = tx.dft_flags();
        tx.set_normalize(false);
        assert_eq!(tx.dft_flags(), flags);
        assert!(!tx.normalize());

        tx.set_normalize(true);
        assert!(tx.normalize());
    }

    #[test]
    fn test_unnormalized_synthesis_scales_by_symbol_size() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut tx = OfdmFramer::synthesizer(CyclicPrefix::Normal, 6).unwrap();
        let mut rx = OfdmFramer::analyzer(CyclicPrefix::Normal, 6).unwrap();
        tx.set_normalize(false);
        let grid = random_grid(&mut rng, 2 * tx.slot_re());

        let back = loopback_subframe(&mut tx, &mut rx, &grid);

        let scaled: Vec<Complex32> = grid.iter().map(|x| x * 128.0).collect();
        assert!(max_error(&scaled, &back) < 128.0 * TOLERANCE);
    }

    #[quickcheck]
    fn prop_loopback_recovers_grid(seed: u64, nof_prb: u8, extended: bool) -> bool {
        let nof_prb = 1 + nof_prb as usize % MAX_PRB;
        let cp = if extended {
            CyclicPrefix::Extended
        } else {
            CyclicPrefix::Normal
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let mut tx = OfdmFramer::synthesizer(cp, nof_prb).unwrap();
        let mut rx = OfdmFramer::analyzer(cp, nof_prb).unwrap();
        let grid = random_grid(&mut rng, 2 * tx.slot_re());

        let back = loopback_subframe(&mut tx, &mut rx, &grid);

        max_error(&grid, &back) < TOLERANCE
    }
}
