use std::sync::Arc;

use polars::prelude::*;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyModule;
use pyo3_polars::PyDataFrame;

use crate::aggregation::{self, DerivedSummary, DEFAULT_TOP_N};
use crate::dashboard::{render_dashboard, RenderOptions};
use crate::error::DashboardError;
use crate::loader::{parse_csv, DatasetLoader, DEFAULT_DATA_PATH};
use crate::regions::{RegionCatalog, RegionGroup};
use crate::schema::{record, summary};
use crate::table::PopulationTable;

/// Loaded dataset plus region catalog, as seen from Python.
///
/// Construct once per process (e.g. behind the host's resource cache) and
/// call the aggregation methods on every selection change.
#[pyclass(name = "PopulationDashboard")]
pub struct PyPopulationDashboard {
    table: Arc<PopulationTable>,
    catalog: RegionCatalog,
}

#[pymethods]
impl PyPopulationDashboard {
    #[new]
    #[pyo3(signature = (path=None))]
    fn new(path: Option<String>) -> PyResult<Self> {
        let loader = DatasetLoader::from_path(path.unwrap_or_else(|| DEFAULT_DATA_PATH.into()));
        Ok(Self {
            table: loader.load()?,
            catalog: RegionCatalog::census(),
        })
    }

    /// Build from CSV text already in memory.
    #[staticmethod]
    fn from_csv_text(text: &str) -> PyResult<Self> {
        Ok(Self {
            table: Arc::new(parse_csv(text.as_bytes())?),
            catalog: RegionCatalog::census(),
        })
    }

    /// Replace the census catalog with `[(region, [codes...]), ...]`, in order.
    fn set_regions(&mut self, regions: Vec<(String, Vec<String>)>) -> PyResult<()> {
        let groups = regions
            .into_iter()
            .map(|(name, states)| RegionGroup::new(name, states))
            .collect();
        self.catalog = RegionCatalog::new(groups)?;
        Ok(())
    }

    // ── Selection ───────────────────────────────────────────────────────────

    /// Years for a selector, most recent first.
    #[getter]
    fn years(&self) -> Vec<i32> {
        self.table.year_choices()
    }

    #[getter]
    fn latest_year(&self) -> i32 {
        self.table.latest_year()
    }

    fn is_valid_year(&self, year: i32) -> bool {
        self.table.contains_year(year)
    }

    // ── Aggregation ─────────────────────────────────────────────────────────

    fn total_population(&self, year: i32) -> PyResult<i64> {
        Ok(aggregation::total_population(&self.table, year)?)
    }

    /// Columns: region, population (catalog order).
    fn region_totals(&self, year: i32) -> PyResult<PyDataFrame> {
        let totals = aggregation::region_totals(&self.table, year, &self.catalog)?;
        let names: Vec<String> = totals.iter().map(|t| t.region.clone()).collect();
        let pops: Vec<i64> = totals.iter().map(|t| t.population).collect();
        two_column_frame(summary::REGION, &names, &pops)
    }

    /// Columns: state, population (descending).
    #[pyo3(signature = (year, n=DEFAULT_TOP_N))]
    fn top_states(&self, year: i32, n: usize) -> PyResult<PyDataFrame> {
        let top = aggregation::top_states(&self.table, year, n)?;
        let names: Vec<String> = top.iter().map(|s| s.state.clone()).collect();
        let pops: Vec<i64> = top.iter().map(|s| s.population).collect();
        two_column_frame(summary::STATE, &names, &pops)
    }

    /// Columns: year, population (ascending by year).
    fn national_trend(&self) -> PyResult<PyDataFrame> {
        let trend = aggregation::national_trend(&self.table)?;
        let years: Vec<i32> = trend.iter().map(|p| p.year).collect();
        let pops: Vec<i64> = trend.iter().map(|p| p.population).collect();
        let df = DataFrame::new(vec![
            Column::new(summary::YEAR.into(), &years),
            Column::new(summary::POPULATION.into(), &pops),
        ])
        .map_err(DashboardError::from)?;
        Ok(PyDataFrame(df))
    }

    /// Choropleth input. Columns: states, states_code, population.
    fn state_values(&self, year: i32) -> PyResult<PyDataFrame> {
        let values = aggregation::state_values(&self.table, year)?;
        let names: Vec<String> = values.iter().map(|v| v.state.clone()).collect();
        let codes: Vec<String> = values.iter().map(|v| v.states_code.clone()).collect();
        let pops: Vec<i64> = values.iter().map(|v| v.population).collect();
        let df = DataFrame::new(vec![
            Column::new(record::STATES.into(), &names),
            Column::new(record::STATES_CODE.into(), &codes),
            Column::new(record::POPULATION.into(), &pops),
        ])
        .map_err(DashboardError::from)?;
        Ok(PyDataFrame(df))
    }

    /// The full derived summary of one year as a JSON string.
    #[pyo3(signature = (year, top_n=DEFAULT_TOP_N))]
    fn summary_json(&self, year: i32, top_n: usize) -> PyResult<String> {
        let summary = DerivedSummary::compute(&self.table, year, &self.catalog, top_n)?;
        serde_json::to_string(&summary).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    // ── Properties ──────────────────────────────────────────────────────────

    #[getter]
    fn table_df(&self) -> PyDataFrame {
        PyDataFrame(self.table.frame().clone())
    }

    // ── Rendering ───────────────────────────────────────────────────────────

    /// Self-contained HTML dashboard. Use with `IPython.display.HTML(...)` or
    /// an HTML component of the UI host.
    #[pyo3(signature = (year=None, top_n=DEFAULT_TOP_N, title=None))]
    fn render_html(
        &self,
        year: Option<i32>,
        top_n: usize,
        title: Option<String>,
    ) -> PyResult<String> {
        let defaults = RenderOptions::default();
        let options = RenderOptions {
            title: title.unwrap_or(defaults.title),
            selected_year: year,
            top_n,
            generated_at: None,
        };
        Ok(render_dashboard(&self.table, &self.catalog, &options)?)
    }
}

fn two_column_frame(label: &str, labels: &[String], pops: &[i64]) -> PyResult<PyDataFrame> {
    let df = DataFrame::new(vec![
        Column::new(label.into(), labels),
        Column::new(summary::POPULATION.into(), pops),
    ])
    .map_err(DashboardError::from)?;
    Ok(PyDataFrame(df))
}

/// Export column-name constants as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let rec = PyModule::new(m.py(), "record")?;
    rec.add("YEAR", record::YEAR)?;
    rec.add("STATES", record::STATES)?;
    rec.add("STATES_CODE", record::STATES_CODE)?;
    rec.add("POPULATION", record::POPULATION)?;
    m.add_submodule(&rec)?;

    let sum = PyModule::new(m.py(), "summary")?;
    sum.add("REGION", summary::REGION)?;
    sum.add("STATE", summary::STATE)?;
    sum.add("YEAR", summary::YEAR)?;
    sum.add("POPULATION", summary::POPULATION)?;
    m.add_submodule(&sum)?;

    Ok(())
}

#[pymodule]
fn population_dashboard(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyPopulationDashboard>()?;
    add_schema_exports(m)?;
    Ok(())
}
