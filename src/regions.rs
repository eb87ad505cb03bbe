use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};
use crate::table::PopulationTable;

/// The four US Census regions, in legend order.
pub const CENSUS_REGIONS: [(&str, &[&str]); 4] = [
    (
        "Northeast",
        &["ME", "NH", "VT", "MA", "RI", "CT", "NY", "NJ", "PA"],
    ),
    (
        "Midwest",
        &["OH", "IN", "IL", "MI", "WI", "MN", "IA", "MO", "ND", "SD", "NE", "KS"],
    ),
    (
        "South",
        &[
            "DE", "MD", "DC", "VA", "WV", "NC", "SC", "GA", "FL", "KY", "TN", "AL", "MS", "AR",
            "LA", "OK", "TX",
        ],
    ),
    (
        "West",
        &["MT", "ID", "WY", "CO", "NM", "AZ", "UT", "NV", "WA", "OR", "CA", "AK", "HI"],
    ),
];

/// A named group of state codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionGroup {
    pub name: String,
    pub states: Vec<String>,
}

impl RegionGroup {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        states: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            states: states.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, state_code: &str) -> bool {
        self.states.iter().any(|s| s == state_code)
    }
}

/// Ordered region -> state-code mapping.
///
/// Iteration order is declaration order; it drives legend and color
/// assignment, so it is never sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionCatalog {
    groups: Vec<RegionGroup>,
}

impl RegionCatalog {
    /// Build a catalog from explicit groups. Region names must be unique and
    /// a state code may belong to at most one region.
    pub fn new(groups: Vec<RegionGroup>) -> Result<Self> {
        let mut names = BTreeSet::new();
        let mut codes = BTreeSet::new();
        for group in &groups {
            if !names.insert(group.name.as_str()) {
                return Err(DashboardError::Config(format!(
                    "region '{}' is declared more than once",
                    group.name
                )));
            }
            for code in &group.states {
                if !codes.insert(code.as_str()) {
                    return Err(DashboardError::Config(format!(
                        "state code '{code}' is assigned to more than one region"
                    )));
                }
            }
        }
        Ok(Self { groups })
    }

    pub fn census() -> Self {
        Self {
            groups: CENSUS_REGIONS
                .iter()
                .map(|(name, states)| RegionGroup::new(*name, states.iter().copied()))
                .collect(),
        }
    }

    pub fn groups(&self) -> &[RegionGroup] {
        &self.groups
    }

    pub fn region_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.name.as_str())
    }

    pub fn region_of(&self, state_code: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|g| g.contains(state_code))
            .map(|g| g.name.as_str())
    }

    /// State codes present in the table that no region covers.
    pub fn uncovered_codes(&self, table: &PopulationTable) -> Result<BTreeSet<String>> {
        Ok(table
            .state_codes()?
            .into_iter()
            .filter(|code| self.region_of(code).is_none())
            .collect())
    }
}

impl Default for RegionCatalog {
    fn default() -> Self {
        Self::census()
    }
}
