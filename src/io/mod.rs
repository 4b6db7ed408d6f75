//! Input/output helpers.
//!
//! - measurement file ingest (`records`)
//! - corrected spectrum CSV export (`export`)
//! - curve JSON read/write (`curve`)

pub mod curve;
pub mod export;
pub mod records;

pub use curve::*;
pub use export::*;
pub use records::*;
