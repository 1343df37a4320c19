//! Linear Regression Module
//! Ordinary least squares with an intercept, plus the per-observation
//! summary table (fitted values, confidence and prediction intervals,
//! residual diagnostics).

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use thiserror::Error;

/// Number of fitted parameters (intercept and slope).
const N_PARAMS: usize = 2;

#[derive(Error, Debug, PartialEq)]
pub enum RegressionError {
    #[error("x and y differ in length ({x} vs {y})")]
    LengthMismatch { x: usize, y: usize },
    #[error("At least {required} observations are required, got {got}")]
    InsufficientData { required: usize, got: usize },
    #[error("Regressor has zero variance")]
    DegenerateRegressor,
    #[error("Input contains NaN or infinite values")]
    NonFinite,
    #[error("Alpha must be in (0, 1), got {0}")]
    InvalidAlpha(f64),
    #[error("Student's t distribution unavailable for {0} degrees of freedom")]
    Distribution(f64),
}

/// Fitted model `y = intercept + slope * x`.
#[derive(Debug, Clone, Serialize)]
pub struct OlsFit {
    pub intercept: f64,
    pub slope: f64,
    pub std_err_intercept: f64,
    pub std_err_slope: f64,
    pub t_intercept: f64,
    pub t_slope: f64,
    pub p_intercept: f64,
    pub p_slope: f64,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    /// Residual standard deviation.
    pub sigma: f64,
    pub df_resid: f64,
    pub n: usize,
    #[serde(skip)]
    x: Vec<f64>,
    #[serde(skip)]
    y: Vec<f64>,
    #[serde(skip)]
    x_mean: f64,
    #[serde(skip)]
    sxx: f64,
}

/// One observation of the summary table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryRow {
    /// 1-based observation number.
    pub obs: usize,
    pub dep_var: f64,
    pub predicted: f64,
    pub std_err_mean_predict: f64,
    pub mean_ci_low: f64,
    pub mean_ci_upp: f64,
    pub predict_ci_low: f64,
    pub predict_ci_upp: f64,
    pub residual: f64,
    pub std_err_residual: f64,
    pub student_residual: f64,
    pub cooks_d: f64,
}

/// Per-observation diagnostics at a given significance level.
#[derive(Debug, Clone)]
pub struct SummaryTable {
    pub alpha: f64,
    pub rows: Vec<SummaryRow>,
    x: Vec<f64>,
}

impl OlsFit {
    /// Fit `y` on `x` with an intercept.
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self, RegressionError> {
        if x.len() != y.len() {
            return Err(RegressionError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        let n = x.len();
        if n <= N_PARAMS {
            return Err(RegressionError::InsufficientData {
                required: N_PARAMS + 1,
                got: n,
            });
        }
        if x.iter().chain(y).any(|v| !v.is_finite()) {
            return Err(RegressionError::NonFinite);
        }

        let nf = n as f64;
        let x_mean = x.iter().sum::<f64>() / nf;
        let y_mean = y.iter().sum::<f64>() / nf;

        let sxx: f64 = x.iter().map(|xi| (xi - x_mean).powi(2)).sum();
        if sxx == 0.0 {
            return Err(RegressionError::DegenerateRegressor);
        }
        let sxy: f64 = x
            .iter()
            .zip(y)
            .map(|(xi, yi)| (xi - x_mean) * (yi - y_mean))
            .sum();

        let slope = sxy / sxx;
        let intercept = y_mean - slope * x_mean;

        let sse: f64 = x
            .iter()
            .zip(y)
            .map(|(xi, yi)| (yi - (intercept + slope * xi)).powi(2))
            .sum();
        let sst: f64 = y.iter().map(|yi| (yi - y_mean).powi(2)).sum();

        let df_resid = (n - N_PARAMS) as f64;
        let variance = sse / df_resid;
        let sigma = variance.sqrt();

        let std_err_slope = (variance / sxx).sqrt();
        let std_err_intercept = (variance * (1.0 / nf + x_mean * x_mean / sxx)).sqrt();
        let t_slope = slope / std_err_slope;
        let t_intercept = intercept / std_err_intercept;

        let dist = students_t(df_resid)?;
        let p_slope = two_sided_p(&dist, t_slope);
        let p_intercept = two_sided_p(&dist, t_intercept);

        // Constant y: statsmodels reports R² as NaN here too.
        let r_squared = 1.0 - sse / sst;
        let adj_r_squared = 1.0 - (1.0 - r_squared) * (nf - 1.0) / df_resid;

        Ok(Self {
            intercept,
            slope,
            std_err_intercept,
            std_err_slope,
            t_intercept,
            t_slope,
            p_intercept,
            p_slope,
            r_squared,
            adj_r_squared,
            sigma,
            df_resid,
            n,
            x: x.to_vec(),
            y: y.to_vec(),
            x_mean,
            sxx,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Leverage of a point at `x`.
    fn leverage(&self, x: f64) -> f64 {
        1.0 / self.n as f64 + (x - self.x_mean).powi(2) / self.sxx
    }

    /// Build the per-observation table with `(1 - alpha)` intervals.
    pub fn summary_table(&self, alpha: f64) -> Result<SummaryTable, RegressionError> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(RegressionError::InvalidAlpha(alpha));
        }
        let t_crit = students_t(self.df_resid)?.inverse_cdf(1.0 - alpha / 2.0);
        let variance = self.sigma * self.sigma;

        let rows = self
            .x
            .iter()
            .zip(&self.y)
            .enumerate()
            .map(|(i, (&xi, &yi))| {
                let predicted = self.predict(xi);
                let h = self.leverage(xi);
                let se_mean = (variance * h).sqrt();
                let se_obs = (variance * (1.0 + h)).sqrt();
                let residual = yi - predicted;
                let se_resid = (variance * (1.0 - h)).sqrt();
                let student_residual = residual / se_resid;
                let cooks_d = student_residual.powi(2) / N_PARAMS as f64 * h / (1.0 - h);

                SummaryRow {
                    obs: i + 1,
                    dep_var: yi,
                    predicted,
                    std_err_mean_predict: se_mean,
                    mean_ci_low: predicted - t_crit * se_mean,
                    mean_ci_upp: predicted + t_crit * se_mean,
                    predict_ci_low: predicted - t_crit * se_obs,
                    predict_ci_upp: predicted + t_crit * se_obs,
                    residual,
                    std_err_residual: se_resid,
                    student_residual,
                    cooks_d,
                }
            })
            .collect();

        Ok(SummaryTable {
            alpha,
            rows,
            x: self.x.clone(),
        })
    }
}

impl SummaryTable {
    pub fn fitted_values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.predicted).collect()
    }

    /// Lower and upper bounds of the mean confidence interval, in input order.
    pub fn mean_ci(&self) -> (Vec<f64>, Vec<f64>) {
        self.rows
            .iter()
            .map(|r| (r.mean_ci_low, r.mean_ci_upp))
            .unzip()
    }

    /// `(x, low, upper)` of the mean confidence interval sorted by x,
    /// ready for shading.
    pub fn ci_band(&self) -> Vec<(f64, f64, f64)> {
        let mut band: Vec<(f64, f64, f64)> = self
            .x
            .iter()
            .zip(&self.rows)
            .map(|(&x, r)| (x, r.mean_ci_low, r.mean_ci_upp))
            .collect();
        band.sort_by(|a, b| a.0.total_cmp(&b.0));
        band
    }

    /// Confidence level in percent, e.g. 95 for alpha 0.05.
    pub fn confidence_percent(&self) -> f64 {
        (1.0 - self.alpha) * 100.0
    }
}

fn students_t(df: f64) -> Result<StudentsT, RegressionError> {
    StudentsT::new(0.0, 1.0, df).map_err(|_| RegressionError::Distribution(df))
}

fn two_sided_p(dist: &StudentsT, t: f64) -> f64 {
    2.0 * (1.0 - dist.cdf(t.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];
    const Y: [f64; 5] = [2.0, 4.0, 5.0, 4.0, 5.0];

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_exact_line() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 - 0.5 * v).collect();
        let fit = OlsFit::fit(&x, &y).unwrap();
        assert!(close(fit.intercept, 3.0, 1e-12));
        assert!(close(fit.slope, -0.5, 1e-12));
        assert!(close(fit.r_squared, 1.0, 1e-12));
        assert!(close(fit.predict(20.0), -7.0, 1e-9));
    }

    #[test]
    fn test_textbook_coefficients() {
        let fit = OlsFit::fit(&X, &Y).unwrap();
        assert!(close(fit.intercept, 2.2, 1e-12));
        assert!(close(fit.slope, 0.6, 1e-12));
        assert!(close(fit.std_err_slope, 0.282_843, 1e-6));
        assert!(close(fit.std_err_intercept, 0.938_083, 1e-6));
        assert!(close(fit.r_squared, 0.6, 1e-12));
        assert!(close(fit.adj_r_squared, 0.466_667, 1e-6));
        assert!(close(fit.t_slope, 2.121_320, 1e-6));
        assert!(close(fit.p_slope, 0.124, 1e-3));
        assert_eq!(fit.df_resid, 3.0);
        assert_eq!(fit.n, 5);
    }

    #[test]
    fn test_summary_table_intervals() {
        let fit = OlsFit::fit(&X, &Y).unwrap();
        let table = fit.summary_table(0.05).unwrap();
        assert_eq!(table.rows.len(), 5);

        // x = 3 is the mean of x: leverage 1/5, se 0.4, t(0.975, 3) = 3.182446
        let mid = table.rows[2];
        assert_eq!(mid.obs, 3);
        assert!(close(mid.predicted, 4.0, 1e-12));
        assert!(close(mid.std_err_mean_predict, 0.4, 1e-12));
        assert!(close(mid.mean_ci_low, 2.727_02, 1e-4));
        assert!(close(mid.mean_ci_upp, 5.272_98, 1e-4));

        let residual_sum: f64 = table.rows.iter().map(|r| r.residual).sum();
        assert!(close(residual_sum, 0.0, 1e-9));

        for row in &table.rows {
            assert!(row.mean_ci_low < row.predicted && row.predicted < row.mean_ci_upp);
            assert!(row.predict_ci_low < row.mean_ci_low);
            assert!(row.predict_ci_upp > row.mean_ci_upp);
            // narrowest at the mean of x
            assert!(row.std_err_mean_predict >= mid.std_err_mean_predict);
            assert!(row.cooks_d >= 0.0);
        }
    }

    #[test]
    fn test_ci_band_is_sorted() {
        let x = [0.4, 0.1, 0.9, 0.3, 0.7];
        let y = [5.0, 2.0, 9.5, 3.0, 7.0];
        let table = OlsFit::fit(&x, &y).unwrap().summary_table(0.05).unwrap();
        let band = table.ci_band();
        let xs: Vec<f64> = band.iter().map(|b| b.0).collect();
        assert_eq!(xs, vec![0.1, 0.3, 0.4, 0.7, 0.9]);
        for (_, low, upp) in band {
            assert!(low < upp);
        }
        let (low, upp) = table.mean_ci();
        assert_eq!(low.len(), 5);
        assert_eq!(upp.len(), 5);
        assert_eq!(table.fitted_values().len(), 5);
    }

    #[test]
    fn test_wider_band_for_smaller_alpha() {
        let fit = OlsFit::fit(&X, &Y).unwrap();
        let ninety = fit.summary_table(0.10).unwrap();
        let ninety_nine = fit.summary_table(0.01).unwrap();
        let w90 = ninety.rows[0].mean_ci_upp - ninety.rows[0].mean_ci_low;
        let w99 = ninety_nine.rows[0].mean_ci_upp - ninety_nine.rows[0].mean_ci_low;
        assert!(w99 > w90);
        assert!(close(ninety_nine.confidence_percent(), 99.0, 1e-9));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(
            OlsFit::fit(&[1.0, 2.0], &[1.0]).unwrap_err(),
            RegressionError::LengthMismatch { x: 2, y: 1 }
        );
        assert_eq!(
            OlsFit::fit(&[1.0, 2.0], &[1.0, 2.0]).unwrap_err(),
            RegressionError::InsufficientData { required: 3, got: 2 }
        );
        assert_eq!(
            OlsFit::fit(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).unwrap_err(),
            RegressionError::DegenerateRegressor
        );
        assert_eq!(
            OlsFit::fit(&[1.0, f64::NAN, 3.0], &[1.0, 2.0, 3.0]).unwrap_err(),
            RegressionError::NonFinite
        );
    }

    #[test]
    fn test_rejects_bad_alpha() {
        let fit = OlsFit::fit(&X, &Y).unwrap();
        assert!(matches!(
            fit.summary_table(0.0),
            Err(RegressionError::InvalidAlpha(_))
        ));
        assert!(matches!(
            fit.summary_table(1.5),
            Err(RegressionError::InvalidAlpha(_))
        ));
    }
}
