//! Bike-sharing EDA - dataset download & exploratory chart generation
//!
//! Fetches the daily bike-sharing table, cleans it and writes the charts and
//! a regression summary to the output directory.

use anyhow::{Context, Result};
use bikeshare_eda::Settings;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "bikeshare-eda")]
#[command(about = "Exploratory charts for the UCI bike-sharing dataset", long_about = None)]
struct Cli {
    /// Dataset archive URL
    #[arg(long)]
    url: Option<String>,

    /// Local .zip archive or day.csv to use instead of downloading
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Directory the charts and summary are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// JSON settings file; command-line flags take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Significance level of the confidence band
    #[arg(long)]
    alpha: Option<f64>,

    /// Number of histogram bins
    #[arg(long)]
    bins: Option<usize>,

    /// Download timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Open every chart with the system viewer when done
    #[arg(long, default_value_t = false)]
    open: bool,
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => Settings::default(),
        };

        if let Some(url) = &self.url {
            settings.source_url = url.clone();
        }
        if let Some(input) = &self.input {
            settings.input = Some(input.clone());
        }
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        if let Some(alpha) = self.alpha {
            settings.alpha = alpha;
        }
        if let Some(bins) = self.bins {
            settings.hist_bins = bins;
            settings.overlay_max_bins = bins;
        }
        if let Some(secs) = self.timeout_secs {
            settings.timeout_secs = secs;
        }
        Ok(settings)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = cli.settings()?;

    let report = bikeshare_eda::run(&settings).context("analysis failed")?;
    info!(
        rows = report.rows,
        charts = report.charts.len(),
        summary = %report.summary.display(),
        "Done"
    );

    if cli.open {
        for chart in &report.charts {
            if let Err(e) = open::that(chart) {
                warn!(path = %chart.display(), "Could not open chart: {e}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "bikeshare-eda",
            "--input",
            "day.csv",
            "-o",
            "out",
            "--alpha",
            "0.1",
            "--bins",
            "20",
        ])
        .unwrap();
        let settings = cli.settings().unwrap();
        assert_eq!(settings.input, Some(PathBuf::from("day.csv")));
        assert_eq!(settings.output_dir, PathBuf::from("out"));
        assert_eq!(settings.alpha, 0.1);
        assert_eq!(settings.hist_bins, 20);
        assert_eq!(settings.overlay_max_bins, 20);
        assert_eq!(settings.timeout_secs, 60);
    }
}
