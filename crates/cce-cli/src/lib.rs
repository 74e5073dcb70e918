//! Support code for the `cce-forge` binary: layered settings and run reports.

pub mod report;
pub mod settings;

pub use report::{CrystalReport, RunReport};
pub use settings::{LoggingConfig, Settings};
