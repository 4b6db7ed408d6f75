//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - measurement rows and records (`MeasurementRecord`)
//! - physical constants and beam geometry (`PhysicalConstants`, `BeamMode`)
//! - declared hyperfine parameters (`HyperfineParams`)
//! - the rest-frame spectrum (`CorrectedSpectrum`)
//! - fit outputs and exports (`ParameterEstimate`, `FitStatistics`, `CurveFile`)

pub mod types;

pub use types::*;
