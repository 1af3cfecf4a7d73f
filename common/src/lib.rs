//! Common Utilities and Types Library
//!
//! This crate provides the LTE numerology shared by the OFDM framer:
//! cyclic prefix modes, transform direction and the channel geometry table.

pub mod types;
pub mod utils;

// Re-export commonly used items
pub use types::*;
pub use utils::*;
