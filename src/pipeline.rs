//! Pipeline Module
//! Fetch → load → clean → analyze → render, in that order.

use crate::charts::{
    AxisSeries, ChartError, ChartKind, NamedHistogram, StaticChartRenderer,
};
use crate::config::{ConfigError, Settings};
use crate::data::{
    DailyData, DataLoader, FetchError, LoaderError, Workspace, COUNT_COLUMN, DAILY_FILE,
    DROP_COLUMNS, TEMP_COLUMN,
};
use crate::stats::{shared_edges, Histogram, HistogramError, OlsFit, RegressionError, SummaryTable};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Name of the JSON regression summary written next to the charts.
pub const SUMMARY_FILE: &str = "regression_summary.json";

/// Rows shown when logging the head of the cleaned table.
const HEAD_ROWS: usize = 5;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error("Regression failed: {0}")]
    Regression(#[from] RegressionError),
    #[error("Histogram failed: {0}")]
    Histogram(#[from] HistogramError),
    #[error(transparent)]
    Chart(#[from] ChartError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to write summary: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported input '{0}', expected a .zip or .csv file")]
    UnsupportedInput(PathBuf),
}

/// Everything the charts are drawn from.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub data: DailyData,
    pub fit: OlsFit,
    pub table: SummaryTable,
    pub registered_hist: Histogram,
    pub registered_overlay: Histogram,
    pub casual_overlay: Histogram,
}

/// Outputs of a complete run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub rows: usize,
    pub charts: Vec<PathBuf>,
    pub summary: PathBuf,
}

/// JSON form of the regression results.
#[derive(Debug, Serialize)]
pub struct RegressionSummary<'a> {
    pub dependent: &'static str,
    pub regressor: &'static str,
    pub alpha: f64,
    pub first_day: Option<NaiveDate>,
    pub last_day: Option<NaiveDate>,
    pub fit: &'a OlsFit,
}

enum InputKind {
    Archive,
    Csv,
}

fn input_kind(path: &Path) -> Result<InputKind, PipelineError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("zip") => Ok(InputKind::Archive),
        Some("csv") => Ok(InputKind::Csv),
        _ => Err(PipelineError::UnsupportedInput(path.to_path_buf())),
    }
}

/// Fetch (or import) the dataset, load `day.csv`, drop unused columns and
/// remove the temporary workspace.
pub fn load_dataset(settings: &Settings) -> Result<DailyData, PipelineError> {
    let mut loader = DataLoader::new();

    let input = settings.input.as_deref();
    let kind = input.map(input_kind).transpose()?;

    match (input, kind) {
        (Some(path), Some(InputKind::Csv)) => {
            info!(path = %path.display(), "Loading local CSV");
            loader.load_csv(path)?;
        }
        (input, _) => {
            let mut workspace = Workspace::new()?;
            match input {
                Some(archive) => {
                    info!(path = %archive.display(), "Importing local archive");
                    workspace.import_archive(archive)?;
                }
                None => workspace.fetch_remote(&settings.source_url, settings.timeout())?,
            }
            let daily_path = workspace.locate(DAILY_FILE)?;
            loader.load_csv(&daily_path)?;
            // The frame is fully in memory; the extracted files can go.
            workspace.close()?;
            info!("Temporary files removed");
        }
    }

    clean(&mut loader)
}

/// Drop unused columns, log the head of the table and extract typed data.
pub fn clean(loader: &mut DataLoader) -> Result<DailyData, PipelineError> {
    loader.drop_columns(&DROP_COLUMNS)?;
    info!(
        rows = loader.get_row_count(),
        columns = ?loader.get_columns(),
        source = ?loader.get_file_path(),
        "Dataset cleaned"
    );
    if let Some(head) = loader.head(HEAD_ROWS) {
        info!("\n{}", head);
    }
    Ok(loader.daily_data()?)
}

/// Fit check outs on temperature and bin the check-out distributions.
pub fn analyze(data: &DailyData, settings: &Settings) -> Result<Analysis, PipelineError> {
    let fit = OlsFit::fit(&data.temp, &data.cnt)?;
    info!(
        intercept = fit.intercept,
        slope = fit.slope,
        r_squared = fit.r_squared,
        p_slope = fit.p_slope,
        "{} ~ {} fitted",
        COUNT_COLUMN,
        TEMP_COLUMN
    );
    let table = fit.summary_table(settings.alpha)?;

    let registered_hist = Histogram::new(&data.registered, settings.hist_bins)?;
    let edges = shared_edges(&data.registered, &data.casual, settings.overlay_max_bins)?;
    let registered_overlay = Histogram::with_edges(&data.registered, &edges)?;
    let casual_overlay = Histogram::with_edges(&data.casual, &edges)?;
    debug!(?edges, "Shared histogram edges");

    Ok(Analysis {
        data: data.clone(),
        fit,
        table,
        registered_hist,
        registered_overlay,
        casual_overlay,
    })
}

fn render_chart(
    renderer: &StaticChartRenderer,
    analysis: &Analysis,
    kind: ChartKind,
    path: &Path,
) -> Result<(), ChartError> {
    let data = &analysis.data;
    let labels = kind.labels();
    match kind {
        ChartKind::Scatter => renderer.scatterplot(path, &data.temp, &data.cnt, labels),
        ChartKind::BestFit => {
            renderer.lineplot(path, &data.temp, &analysis.table.fitted_values(), labels)
        }
        ChartKind::BestFitCi => {
            let band_label = format!("{:.0}% CI", analysis.table.confidence_percent());
            renderer.lineplot_ci(
                path,
                &data.temp,
                &analysis.table.fitted_values(),
                &analysis.table.ci_band(),
                &band_label,
                labels,
            )
        }
        ChartKind::DualAxis => renderer.lineplot_2y(
            path,
            &data.dates,
            AxisSeries {
                values: &data.cnt,
                label: labels.y_label,
            },
            AxisSeries {
                values: &data.windspeed,
                label: "Normalized windspeed",
            },
            labels.title,
            labels.x_label,
        ),
        ChartKind::RegisteredHistogram => {
            renderer.histogram(path, &analysis.registered_hist, labels)
        }
        ChartKind::OverlaidHistogram => renderer.overlaid_histogram(
            path,
            NamedHistogram {
                hist: &analysis.registered_overlay,
                name: "Registered",
            },
            NamedHistogram {
                hist: &analysis.casual_overlay,
                name: "Casual",
            },
            labels,
        ),
    }
}

/// Draw every chart into the output directory. Charts are independent
/// files, so they are rendered in parallel; paths come back in
/// [`ChartKind::ALL`] order.
pub fn render(analysis: &Analysis, settings: &Settings) -> Result<Vec<PathBuf>, PipelineError> {
    fs::create_dir_all(&settings.output_dir)?;
    let renderer = StaticChartRenderer::new(settings.style.clone(), &settings.palette)?;

    let paths = ChartKind::ALL
        .par_iter()
        .map(|&kind| {
            let path = settings.output_dir.join(kind.file_name());
            render_chart(&renderer, analysis, kind, &path)?;
            info!(chart = ?kind, path = %path.display(), "Chart written");
            Ok(path)
        })
        .collect::<Result<Vec<_>, ChartError>>()?;

    Ok(paths)
}

/// Write the regression results as pretty JSON.
pub fn write_summary(analysis: &Analysis, alpha: f64, path: &Path) -> Result<(), PipelineError> {
    let range = analysis.data.date_range();
    let summary = RegressionSummary {
        dependent: COUNT_COLUMN,
        regressor: TEMP_COLUMN,
        alpha,
        first_day: range.map(|r| r.0),
        last_day: range.map(|r| r.1),
        fit: &analysis.fit,
    };
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &summary)?;
    debug!(path = %path.display(), "Summary written");
    Ok(())
}

/// Run the whole pipeline.
pub fn run(settings: &Settings) -> Result<RunReport, PipelineError> {
    settings.validate()?;

    let data = load_dataset(settings)?;
    let analysis = analyze(&data, settings)?;
    let charts = render(&analysis, settings)?;

    let summary = settings.output_dir.join(SUMMARY_FILE);
    write_summary(&analysis, settings.alpha, &summary)?;

    Ok(RunReport {
        rows: data.len(),
        charts,
        summary,
    })
}
