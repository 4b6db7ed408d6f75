//! Mathematical utilities: line profiles and dense least squares.

pub mod lineshape;
pub mod ols;

pub use lineshape::*;
pub use ols::*;
