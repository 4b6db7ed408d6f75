//! Text reports for fits and runs.

pub mod format;

pub use format::*;
