//! OFDM loopback demo
//!
//! Synthesizes one subframe of random QPSK resource elements, analyses it
//! back and reports the reconstruction error.
//!
//! ```text
//! cargo run -p framer --example loopback -- --nof-prb 25 --freq-shift 0.5
//! cargo run -p framer --example loopback -- --config tx.toml
//! ```

use anyhow::Result;
use clap::Parser;
use common::utils::sample_rate_hz;
use framer::{CyclicPrefix, Direction, FramerConfig};
use num_complex::Complex32;
use rand::Rng;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "LTE OFDM framer loopback")]
struct Args {
    /// TOML configuration of the transmitting framer
    #[arg(short, long)]
    config: Option<String>,

    /// Channel width in resource blocks
    #[arg(long, default_value_t = 25)]
    nof_prb: usize,

    /// Use extended cyclic prefix
    #[arg(long)]
    extended_cp: bool,

    /// Frequency shift in subcarrier spacings
    #[arg(long)]
    freq_shift: Option<f32>,

    /// Log level
    #[arg(long, default_value = "debug")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt().with_env_filter(env_filter).with_target(true).init();

    let mut tx_config = match &args.config {
        Some(path) => FramerConfig::from_toml_file(path)?,
        None => {
            let cp = if args.extended_cp {
                CyclicPrefix::Extended
            } else {
                CyclicPrefix::Normal
            };
            let mut config = FramerConfig::new(args.nof_prb, cp, Direction::Synthesis);
            config.freq_shift = args.freq_shift;
            config
        }
    };
    tx_config.direction = Direction::Synthesis;

    // The receiver undoes the transmitter's shift
    let mut rx_config = tx_config.clone();
    rx_config.direction = Direction::Analysis;
    rx_config.freq_shift = tx_config.freq_shift.map(|shift| -shift);
    rx_config.normalize = None;

    let mut tx = tx_config.build()?;
    let mut rx = rx_config.build()?;

    info!(
        "{} PRB, {} CP: symbol_sz={}, guards={}, slot={} samples at {:.2} MHz",
        tx.nof_prb(),
        tx.cyclic_prefix(),
        tx.symbol_size(),
        tx.guard_width(),
        tx.slot_length(),
        sample_rate_hz(tx.symbol_size()) / 1e6
    );

    let mut rng = rand::thread_rng();
    let amplitude = std::f32::consts::FRAC_1_SQRT_2;
    let grid: Vec<Complex32> = (0..2 * tx.slot_re())
        .map(|_| {
            let re = if rng.gen::<bool>() { amplitude } else { -amplitude };
            let im = if rng.gen::<bool>() { amplitude } else { -amplitude };
            Complex32::new(re, im)
        })
        .collect();

    let mut time = vec![Complex32::new(0.0, 0.0); tx.subframe_length()];
    let mut back = vec![Complex32::new(0.0, 0.0); grid.len()];

    let start = Instant::now();
    tx.modulate_subframe(&grid, &mut time);
    rx.demodulate_subframe(&mut time, &mut back);
    let elapsed = start.elapsed();

    let max_error = grid
        .iter()
        .zip(&back)
        .map(|(a, b)| (a - b).norm())
        .fold(0.0f32, f32::max);

    info!(
        "Loopback of {} RE through {} samples in {:?}, max error {:.3e}",
        grid.len(),
        time.len(),
        elapsed,
        max_error
    );

    Ok(())
}
