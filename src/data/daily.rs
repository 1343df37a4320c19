//! Daily Data Module
//! Typed view of the cleaned day-level bike-sharing table.

use chrono::NaiveDate;

/// Date column, parsed into calendar dates.
pub const DATE_COLUMN: &str = "dteday";
/// Normalized temperature.
pub const TEMP_COLUMN: &str = "temp";
/// Normalized wind speed.
pub const WINDSPEED_COLUMN: &str = "windspeed";
/// Check outs by casual users.
pub const CASUAL_COLUMN: &str = "casual";
/// Check outs by registered users.
pub const REGISTERED_COLUMN: &str = "registered";
/// Total check outs.
pub const COUNT_COLUMN: &str = "cnt";

/// Columns removed from the raw `day.csv` before analysis.
pub const DROP_COLUMNS: [&str; 9] = [
    "instant",
    "season",
    "yr",
    "mnth",
    "holiday",
    "workingday",
    "weathersit",
    "atemp",
    "hum",
];

/// Columns left after cleaning, in file order.
pub const KEPT_COLUMNS: [&str; 6] = [
    DATE_COLUMN,
    TEMP_COLUMN,
    WINDSPEED_COLUMN,
    CASUAL_COLUMN,
    REGISTERED_COLUMN,
    COUNT_COLUMN,
];

/// One entry per day; every vector has the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyData {
    pub dates: Vec<NaiveDate>,
    pub temp: Vec<f64>,
    pub windspeed: Vec<f64>,
    pub casual: Vec<f64>,
    pub registered: Vec<f64>,
    pub cnt: Vec<f64>,
}

impl DailyData {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// First and last day covered, regardless of row order.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.dates.iter().min()?;
        let last = self.dates.iter().max()?;
        Some((*first, *last))
    }
}
