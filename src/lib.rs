//! `beam-hfs` library crate.
//!
//! The binary (`hfs`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the pipeline is a pure function of (file content, parameter block, constants)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod params;
pub mod physics;
pub mod plot;
pub mod report;
pub mod tui;
