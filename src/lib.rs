//! Bike-sharing exploratory analysis
//!
//! Downloads the UCI bike-sharing dataset, drops the columns the analysis
//! does not use, fits check outs against temperature and renders the
//! exploratory charts as PNG files.

pub mod charts;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod stats;

pub use config::Settings;
pub use pipeline::{run, Analysis, PipelineError, RunReport};
