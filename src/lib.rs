pub mod aggregation;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod format;
pub mod loader;
pub mod regions;
pub mod schema;
pub mod table;

#[cfg(feature = "python")]
mod python;

pub use aggregation::{
    national_trend, region_totals, state_values, top_states, total_population, DerivedSummary,
    RegionTotal, StatePopulation, StateValue, TrendPoint, DEFAULT_TOP_N,
};
pub use dashboard::{render_dashboard, RenderOptions};
pub use error::{DashboardError, Result};
pub use loader::{parse_csv, CsvFileSource, DatasetLoader, DatasetSource};
pub use regions::{RegionCatalog, RegionGroup};
pub use table::{PopulationRecord, PopulationTable};
