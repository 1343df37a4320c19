//! CSV Data Loader Module
//! Handles CSV file loading, column dropping and typed extraction using Polars.

use crate::data::daily::{
    DailyData, CASUAL_COLUMN, COUNT_COLUMN, DATE_COLUMN, REGISTERED_COLUMN, TEMP_COLUMN,
    WINDSPEED_COLUMN,
};
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Date format used by `dteday`.
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("No data loaded")]
    NoData,
    #[error("Column '{0}' not found")]
    MissingColumn(String),
    #[error("Column '{column}' has a null at row {row}")]
    NullValue { column: String, row: usize },
    #[error("Invalid date '{value}' at row {row}")]
    InvalidDate { row: usize, value: String },
}

/// Handles CSV file loading with Polars for high performance.
pub struct DataLoader {
    df: Option<DataFrame>,
    file_path: Option<PathBuf>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            df: None,
            file_path: None,
        }
    }

    /// Load a CSV file using Polars.
    pub fn load_csv(&mut self, file_path: &Path) -> Result<&DataFrame, LoaderError> {
        self.file_path = Some(file_path.to_path_buf());

        let df = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(10000))
            .finish()?
            .collect()?;
        debug!(
            path = %file_path.display(),
            rows = df.height(),
            columns = df.width(),
            "CSV loaded"
        );

        self.df = Some(df);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Drop the named columns. Every name must exist in the loaded frame.
    pub fn drop_columns(&mut self, names: &[&str]) -> Result<(), LoaderError> {
        let mut df = self.df.take().ok_or(LoaderError::NoData)?;

        // Check everything up front so a bad name leaves the frame untouched.
        let missing = names
            .iter()
            .find(|name| df.column(name).is_err())
            .map(|name| name.to_string());
        if let Some(name) = missing {
            self.df = Some(df);
            return Err(LoaderError::MissingColumn(name));
        }

        for name in names {
            df = df.drop(name)?;
        }
        debug!(dropped = names.len(), remaining = df.width(), "Columns dropped");

        self.df = Some(df);
        Ok(())
    }

    /// Get list of column names from loaded DataFrame.
    pub fn get_columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the number of rows in the DataFrame.
    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Get file path.
    pub fn get_file_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }

    /// First `n` rows, for logging.
    pub fn head(&self, n: usize) -> Option<DataFrame> {
        self.df.as_ref().map(|df| df.head(Some(n)))
    }

    /// Extract the cleaned table into typed vectors.
    pub fn daily_data(&self) -> Result<DailyData, LoaderError> {
        let df = self.df.as_ref().ok_or(LoaderError::NoData)?;

        Ok(DailyData {
            dates: Self::date_column(df, DATE_COLUMN)?,
            temp: Self::f64_column(df, TEMP_COLUMN)?,
            windspeed: Self::f64_column(df, WINDSPEED_COLUMN)?,
            casual: Self::f64_column(df, CASUAL_COLUMN)?,
            registered: Self::f64_column(df, REGISTERED_COLUMN)?,
            cnt: Self::f64_column(df, COUNT_COLUMN)?,
        })
    }

    fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, LoaderError> {
        df.column(name)
            .map_err(|_| LoaderError::MissingColumn(name.to_string()))
    }

    fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>, LoaderError> {
        let values = Self::column(df, name)?.cast(&DataType::Float64)?;
        let ca = values.f64()?;

        ca.into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.ok_or_else(|| LoaderError::NullValue {
                    column: name.to_string(),
                    row,
                })
            })
            .collect()
    }

    fn date_column(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>, LoaderError> {
        // A frame read with date parsing enabled holds a Date column; the
        // string cast gives ISO dates either way.
        let values = Self::column(df, name)?.cast(&DataType::String)?;
        let ca = values.str()?;

        ca.into_iter()
            .enumerate()
            .map(|(row, v)| {
                let raw = v.ok_or_else(|| LoaderError::NullValue {
                    column: name.to_string(),
                    row,
                })?;
                NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
                    LoaderError::InvalidDate {
                        row,
                        value: raw.to_string(),
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::daily::{DROP_COLUMNS, KEPT_COLUMNS};
    use std::fs;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
instant,dteday,season,yr,mnth,holiday,weekday,workingday,weathersit,temp,atemp,hum,windspeed,casual,registered,cnt
1,2011-01-01,1,0,1,0,6,0,2,0.344167,0.363625,0.805833,0.160446,331,654,985
2,2011-01-02,1,0,1,0,0,0,2,0.363478,0.353739,0.696087,0.248539,131,670,801
3,2011-01-03,1,0,1,0,1,1,1,0.196364,0.189405,0.437273,0.248309,120,1229,1349
";

    fn write_csv(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("day.csv");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_and_drop() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, SAMPLE);

        let mut loader = DataLoader::new();
        loader.load_csv(&path).unwrap();
        assert_eq!(loader.get_row_count(), 3);
        assert_eq!(loader.get_file_path(), Some(&path));

        loader.drop_columns(&DROP_COLUMNS).unwrap();
        // weekday is not in the drop list and survives
        let columns = loader.get_columns();
        assert!(columns.contains(&"weekday".to_string()));
        for kept in KEPT_COLUMNS {
            assert!(columns.contains(&kept.to_string()), "missing {kept}");
        }
        for dropped in DROP_COLUMNS {
            assert!(!columns.contains(&dropped.to_string()));
        }
    }

    #[test]
    fn test_drop_missing_column_leaves_frame() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, SAMPLE);

        let mut loader = DataLoader::new();
        loader.load_csv(&path).unwrap();
        let before = loader.get_columns();

        let err = loader.drop_columns(&["season", "nope"]).unwrap_err();
        assert!(matches!(err, LoaderError::MissingColumn(ref c) if c == "nope"));
        assert_eq!(loader.get_columns(), before);
    }

    #[test]
    fn test_daily_data_parses_dates_and_values() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, SAMPLE);

        let mut loader = DataLoader::new();
        loader.load_csv(&path).unwrap();
        let data = loader.daily_data().unwrap();

        assert_eq!(data.len(), 3);
        assert_eq!(data.dates[0], NaiveDate::from_ymd_opt(2011, 1, 1).unwrap());
        assert_eq!(data.cnt, vec![985.0, 801.0, 1349.0]);
        assert!((data.temp[2] - 0.196364).abs() < 1e-12);
        assert_eq!(data.registered[1], 670.0);
    }

    #[test]
    fn test_daily_data_reports_bad_date() {
        let dir = TempDir::new().unwrap();
        let body = "dteday,temp,windspeed,casual,registered,cnt\n\
                    2011-01-01,0.3,0.1,1,2,3\n\
                    not-a-date,0.3,0.1,1,2,3\n";
        let path = write_csv(&dir, body);

        let mut loader = DataLoader::new();
        loader.load_csv(&path).unwrap();
        let err = loader.daily_data().unwrap_err();
        assert!(matches!(err, LoaderError::InvalidDate { row: 1, .. }));
    }

    #[test]
    fn test_daily_data_requires_columns() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "dteday,temp\n2011-01-01,0.3\n");

        let mut loader = DataLoader::new();
        loader.load_csv(&path).unwrap();
        let err = loader.daily_data().unwrap_err();
        assert!(matches!(err, LoaderError::MissingColumn(ref c) if c == "windspeed"));
    }

    #[test]
    fn test_no_data_before_load() {
        let loader = DataLoader::new();
        assert!(matches!(loader.daily_data(), Err(LoaderError::NoData)));
        assert!(loader.get_columns().is_empty());
        assert!(loader.head(5).is_none());
    }
}
