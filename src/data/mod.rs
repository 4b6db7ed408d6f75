//! Synthetic measurement data.

pub mod simulate;

pub use simulate::*;
