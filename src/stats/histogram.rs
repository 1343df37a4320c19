//! Histogram Binning Module
//! Equal-width binning with matplotlib/NumPy conventions: every bin is
//! half-open except the last, which includes its right edge.

use thiserror::Error;

/// Bin count used when none is given.
pub const DEFAULT_BINS: usize = 10;

#[derive(Error, Debug, PartialEq)]
pub enum HistogramError {
    #[error("Cannot bin an empty series")]
    Empty,
    #[error("Bin count must be at least 1")]
    ZeroBins,
    #[error("Series contains NaN or infinite values")]
    NonFinite,
    #[error("Bin edges must be finite, strictly increasing and at least two")]
    InvalidEdges,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `counts.len() + 1` edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width bins spanning their range.
    pub fn new(values: &[f64], bins: usize) -> Result<Self, HistogramError> {
        let (min, max) = finite_range(values.iter().copied())?;
        let edges = equal_width_edges(min, max, bins)?;
        Self::with_edges(values, &edges)
    }

    /// Count `values` into the given bins; values outside them are ignored.
    pub fn with_edges(values: &[f64], edges: &[f64]) -> Result<Self, HistogramError> {
        if edges.len() < 2
            || edges.iter().any(|e| !e.is_finite())
            || edges.windows(2).any(|w| w[0] >= w[1])
        {
            return Err(HistogramError::InvalidEdges);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(HistogramError::NonFinite);
        }

        let n_bins = edges.len() - 1;
        let first = edges[0];
        let last = edges[n_bins];
        let mut counts = vec![0usize; n_bins];

        for &v in values {
            if v < first || v > last {
                continue;
            }
            let idx = (edges.partition_point(|e| *e <= v) - 1).min(n_bins - 1);
            counts[idx] += 1;
        }

        Ok(Self {
            edges: edges.to_vec(),
            counts,
        })
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// `(left, right, count)` for each bin.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(w, &c)| (w[0], w[1], c))
    }

    pub fn range(&self) -> (f64, f64) {
        (self.edges[0], self.edges[self.edges.len() - 1])
    }
}

/// Edges shared by two overlaid series so both distributions are compared
/// on the same bins.
pub fn shared_edges(a: &[f64], b: &[f64], max_nbins: usize) -> Result<Vec<f64>, HistogramError> {
    let (min, max) = finite_range(a.iter().chain(b).copied())?;
    equal_width_edges(min, max, max_nbins)
}

fn finite_range(values: impl Iterator<Item = f64>) -> Result<(f64, f64), HistogramError> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut seen = false;
    for v in values {
        if !v.is_finite() {
            return Err(HistogramError::NonFinite);
        }
        seen = true;
        min = min.min(v);
        max = max.max(v);
    }
    if !seen {
        return Err(HistogramError::Empty);
    }
    Ok((min, max))
}

fn equal_width_edges(min: f64, max: f64, bins: usize) -> Result<Vec<f64>, HistogramError> {
    if bins == 0 {
        return Err(HistogramError::ZeroBins);
    }
    // A constant series gets a unit-wide range around its value.
    let (lo, hi) = if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    let width = (hi - lo) / bins as f64;
    let mut edges: Vec<f64> = (0..bins).map(|i| lo + i as f64 * width).collect();
    edges.push(hi);
    Ok(edges)
}
