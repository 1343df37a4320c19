//! Data module - dataset download, CSV loading and cleaning

mod daily;
mod fetch;
mod loader;

pub use daily::{
    DailyData, CASUAL_COLUMN, COUNT_COLUMN, DATE_COLUMN, DROP_COLUMNS, KEPT_COLUMNS,
    REGISTERED_COLUMN, TEMP_COLUMN, WINDSPEED_COLUMN,
};
pub use fetch::{
    download, extract_all, FetchError, Workspace, ARCHIVE_NAME, DAILY_FILE, DATA_SOURCE_URL,
};
pub use loader::{DataLoader, LoaderError};
