//! Beam physics: Doppler correction and hyperfine structure.

pub mod doppler;
pub mod hyperfine;
