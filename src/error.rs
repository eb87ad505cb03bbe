use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Invalid year: {0} is not present in the dataset")]
    InvalidYear(i32),

    #[error("Config: {0}")]
    Config(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    pub(crate) fn unavailable(reason: impl Into<String>) -> Self {
        DashboardError::DataUnavailable(reason.into())
    }
}

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;

#[cfg(feature = "python")]
impl From<DashboardError> for pyo3::PyErr {
    fn from(err: DashboardError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyRuntimeError, PyValueError};
        match err {
            DashboardError::InvalidYear(_) => PyValueError::new_err(err.to_string()),
            other => PyRuntimeError::new_err(other.to_string()),
        }
    }
}
