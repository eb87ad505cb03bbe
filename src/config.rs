use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::aggregation::DEFAULT_TOP_N;
use crate::error::{DashboardError, Result};
use crate::loader::DEFAULT_DATA_PATH;
use crate::regions::{RegionCatalog, RegionGroup};

pub const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub data_path: PathBuf,
    pub top_n: usize,
    pub title: String,
    /// Replaces the census catalog when present.
    pub regions: Option<Vec<RegionGroup>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            top_n: DEFAULT_TOP_N,
            title: "US Population Analytics".into(),
            regions: None,
        }
    }
}

impl Settings {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let settings: Settings =
            toml::from_str(raw).map_err(|e| DashboardError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(DashboardError::Config("top_n must be at least 1".into()));
        }
        if let Some(regions) = &self.regions {
            if regions.is_empty() {
                return Err(DashboardError::Config(
                    "regions, when given, must list at least one region".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn catalog(&self) -> Result<RegionCatalog> {
        match &self.regions {
            Some(groups) => RegionCatalog::new(groups.clone()),
            None => Ok(RegionCatalog::census()),
        }
    }
}

/// Read settings from `explicit`, else `dashboard.toml` in the working
/// directory if it exists, else defaults.
///
/// A relative `data_path` in a file is resolved against that file's
/// directory.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !fallback.is_file() {
                return Ok(Settings::default());
            }
            fallback
        }
    };

    let raw = fs::read_to_string(&path)
        .map_err(|e| DashboardError::Config(format!("cannot read '{}': {e}", path.display())))?;
    let mut settings = Settings::from_toml_str(&raw).map_err(|e| match e {
        DashboardError::Config(reason) => {
            DashboardError::Config(format!("'{}': {reason}", path.display()))
        }
        other => other,
    })?;

    if settings.data_path.is_relative() {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            settings.data_path = dir.join(&settings.data_path);
        }
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Settings::from_toml_str("").unwrap(), Settings::default());
    }

    #[test]
    fn parses_custom_regions_in_order() {
        let settings = Settings::from_toml_str(
            r#"
            top_n = 5
            title = "Coasts"

            [[regions]]
            name = "West"
            states = ["CA", "OR", "WA"]

            [[regions]]
            name = "East"
            states = ["NY", "NJ"]
            "#,
        )
        .unwrap();

        assert_eq!(settings.top_n, 5);
        let catalog = settings.catalog().unwrap();
        assert_eq!(catalog.region_names().collect::<Vec<_>>(), ["West", "East"]);
        assert_eq!(catalog.region_of("NJ"), Some("East"));
        assert_eq!(catalog.region_of("TX"), None);
    }

    #[test]
    fn rejects_zero_top_n_and_unknown_keys() {
        assert!(matches!(
            Settings::from_toml_str("top_n = 0"),
            Err(DashboardError::Config(_))
        ));
        assert!(matches!(
            Settings::from_toml_str("colour = \"red\""),
            Err(DashboardError::Config(_))
        ));
    }

    #[test]
    fn resolves_data_path_next_to_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("dashboard.toml");
        fs::write(&config, "data_path = \"pop.csv\"\n").unwrap();

        let settings = load_settings(Some(&config)).unwrap();
        assert_eq!(settings.data_path, dir.path().join("pop.csv"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_settings(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, DashboardError::Config(_)));
    }

    #[test]
    fn invalid_file_names_the_path_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("dashboard.toml");
        fs::write(&config, "top_n = 0\n").unwrap();

        let err = load_settings(Some(&config)).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, DashboardError::Config(_)));
        assert_eq!(message.matches("Config:").count(), 1, "{message}");
        assert!(message.contains(&config.display().to_string()), "{message}");
        assert!(message.contains("top_n"), "{message}");
    }
}
