use std::collections::BTreeSet;

use polars::prelude::*;
use serde::Serialize;
use tracing::warn;

use crate::error::{DashboardError, Result};
use crate::schema::record::{self, POPULATION, STATES, STATES_CODE, YEAR};

/// One row of the population dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopulationRecord {
    pub year: i32,
    pub states: String,
    pub states_code: String,
    pub population: i64,
}

/// Validated, immutable population table.
///
/// Columns are typed (`year` Int32, `population` Int64, names and codes
/// String) and free of nulls. Row order is the source file order.
#[derive(Debug, Clone)]
pub struct PopulationTable {
    frame: DataFrame,
    years: BTreeSet<i32>,
    latest_year: i32,
}

impl PopulationTable {
    /// Type and validate a raw frame. Any column may arrive as text; extra
    /// columns are dropped.
    pub fn from_frame(raw: DataFrame) -> Result<Self> {
        for &name in &record::REQUIRED {
            if raw.column(name).is_err() {
                return Err(DashboardError::unavailable(format!(
                    "missing required column '{name}'"
                )));
            }
        }

        let frame = typed_frame(raw)
            .map_err(|e| DashboardError::unavailable(format!("malformed dataset: {e}")))?;

        if frame.height() == 0 {
            return Err(DashboardError::unavailable("dataset has no rows"));
        }

        for &name in &record::REQUIRED {
            let nulls = frame.column(name)?.null_count();
            if nulls > 0 {
                return Err(DashboardError::unavailable(format!(
                    "column '{name}' has {nulls} missing or non-numeric values"
                )));
            }
        }

        if let Some(min) = frame.column(POPULATION)?.i64()?.min() {
            if min < 0 {
                return Err(DashboardError::unavailable(format!(
                    "column '{POPULATION}' has a negative value ({min})"
                )));
            }
        }

        let years: BTreeSet<i32> = frame.column(YEAR)?.i32()?.into_iter().flatten().collect();
        let latest_year = years
            .last()
            .copied()
            .ok_or_else(|| DashboardError::unavailable("dataset has no years"))?;

        let duplicates = count_duplicate_keys(&frame)?;
        if duplicates > 0 {
            warn!(
                duplicates,
                "dataset has repeated (year, states_code) rows; they are summed as-is"
            );
        }

        Ok(Self {
            frame,
            years,
            latest_year,
        })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// All years in the dataset, ascending.
    pub fn distinct_years(&self) -> &BTreeSet<i32> {
        &self.years
    }

    /// Years as offered to a selector: most recent first.
    pub fn year_choices(&self) -> Vec<i32> {
        self.years.iter().rev().copied().collect()
    }

    /// Default selection.
    pub fn latest_year(&self) -> i32 {
        self.latest_year
    }

    pub fn contains_year(&self, year: i32) -> bool {
        self.years.contains(&year)
    }

    pub fn ensure_year(&self, year: i32) -> Result<()> {
        if self.contains_year(year) {
            Ok(())
        } else {
            Err(DashboardError::InvalidYear(year))
        }
    }

    /// Rows of one year, in source order.
    pub fn rows_for_year(&self, year: i32) -> Result<DataFrame> {
        self.ensure_year(year)?;
        let df = self
            .frame
            .clone()
            .lazy()
            .filter(col(YEAR).eq(lit(year)))
            .collect()?;
        Ok(df)
    }

    pub fn state_codes(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .frame
            .column(STATES_CODE)?
            .str()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect())
    }

    pub fn records(&self) -> Result<Vec<PopulationRecord>> {
        records_of(&self.frame)
    }
}

/// Read typed rows back out of a frame with the record columns.
pub(crate) fn records_of(df: &DataFrame) -> Result<Vec<PopulationRecord>> {
    let years = df.column(YEAR)?.i32()?;
    let names = df.column(STATES)?.str()?;
    let codes = df.column(STATES_CODE)?.str()?;
    let pops = df.column(POPULATION)?.i64()?;

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let null_at =
            |column: &str| DashboardError::unavailable(format!("null {column} at row {i}"));
        rows.push(PopulationRecord {
            year: years.get(i).ok_or_else(|| null_at(YEAR))?,
            states: names.get(i).ok_or_else(|| null_at(STATES))?.to_string(),
            states_code: codes.get(i).ok_or_else(|| null_at(STATES_CODE))?.to_string(),
            population: pops.get(i).ok_or_else(|| null_at(POPULATION))?,
        });
    }
    Ok(rows)
}

fn typed_frame(raw: DataFrame) -> PolarsResult<DataFrame> {
    let trimmed = |name: &str| {
        col(name)
            .cast(DataType::String)
            .str()
            .strip_chars(lit(" \t\r\n"))
    };

    raw.lazy()
        .select([
            trimmed(YEAR).cast(DataType::Int32).alias(YEAR),
            trimmed(STATES).alias(STATES),
            trimmed(STATES_CODE).alias(STATES_CODE),
            trimmed(POPULATION).cast(DataType::Int64).alias(POPULATION),
        ])
        .collect()
}

fn count_duplicate_keys(frame: &DataFrame) -> Result<usize> {
    let years = frame.column(YEAR)?.i32()?;
    let codes = frame.column(STATES_CODE)?.str()?;

    let mut seen = BTreeSet::new();
    let mut duplicates = 0;
    for (year, code) in years.into_iter().zip(codes.into_iter()) {
        if !seen.insert((year, code)) {
            duplicates += 1;
        }
    }
    Ok(duplicates)
}
