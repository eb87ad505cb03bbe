use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use polars::prelude::*;
use tracing::{debug, info};

use crate::error::{DashboardError, Result};
use crate::table::PopulationTable;

pub const DEFAULT_DATA_PATH: &str = "data/us-population-2010-2019-reshaped.csv";

/// Storage access for the raw dataset bytes.
pub trait DatasetSource: Send + Sync {
    /// Human-readable location, used in logs and error messages.
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<Vec<u8>>;
}

/// Reads the dataset from a delimited file on disk.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for CsvFileSource {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_PATH)
    }
}

impl DatasetSource for CsvFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path).map_err(|e| {
            DashboardError::unavailable(format!("cannot read '{}': {e}", self.path.display()))
        })
    }
}

/// Load-once handle over a dataset source.
///
/// The first successful `load` parses the source; every later call returns
/// the same table without touching storage. Failed loads are not cached.
pub struct DatasetLoader<S: DatasetSource = CsvFileSource> {
    source: S,
    table: Mutex<Option<Arc<PopulationTable>>>,
}

impl DatasetLoader<CsvFileSource> {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(CsvFileSource::new(path))
    }
}

impl<S: DatasetSource> DatasetLoader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            table: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.table
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or_else(|poisoned| poisoned.into_inner().is_some())
    }

    pub fn load(&self) -> Result<Arc<PopulationTable>> {
        // Held across the read so concurrent first calls fetch only once.
        let mut slot = self
            .table
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(table) = slot.as_ref() {
            debug!(source = %self.source.describe(), "dataset served from cache");
            return Ok(Arc::clone(table));
        }

        let bytes = self.source.fetch()?;
        let table = Arc::new(parse_csv(&bytes).map_err(|e| match e {
            DashboardError::DataUnavailable(reason) => DashboardError::DataUnavailable(format!(
                "{}: {reason}",
                self.source.describe()
            )),
            other => other,
        })?);

        info!(
            source = %self.source.describe(),
            rows = table.height(),
            years = table.distinct_years().len(),
            "dataset loaded"
        );

        *slot = Some(Arc::clone(&table));
        Ok(table)
    }
}

/// Parse CSV bytes (header row required) into a validated table.
pub fn parse_csv(bytes: &[u8]) -> Result<PopulationTable> {
    let raw = read_csv_as_strings(bytes)
        .map_err(|e| DashboardError::unavailable(format!("malformed CSV: {e}")))?;
    PopulationTable::from_frame(raw)
}

/// Read CSV with all columns as String dtype and trimmed column names.
fn read_csv_as_strings(bytes: &[u8]) -> PolarsResult<DataFrame> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    Ok(df)
}
