//! Fitting: engine capability, Levenberg–Marquardt, and orchestration.

pub mod engine;
pub mod lm;
pub mod orchestrator;

pub use engine::{FitEngine, FitOutcome};
pub use lm::LevenbergMarquardt;
pub use orchestrator::{FitResult, run_fit};
