//! Stats module - regression and binning

mod histogram;
mod regression;

pub use histogram::{shared_edges, Histogram, HistogramError, DEFAULT_BINS};
pub use regression::{OlsFit, RegressionError, SummaryRow, SummaryTable};
