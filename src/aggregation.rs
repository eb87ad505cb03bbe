//! View-ready summaries derived from the population table.
//!
//! Every function here is pure: it reads the immutable table, never mutates
//! it, and returns the same value for the same inputs.
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::regions::RegionCatalog;
use crate::schema::record::{POPULATION, STATES_CODE, YEAR};
use crate::table::{records_of, PopulationTable};

pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionTotal {
    pub region: String,
    pub population: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatePopulation {
    pub state: String,
    pub population: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub year: i32,
    pub population: i64,
}

/// Choropleth input: one state of the selected year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateValue {
    pub state: String,
    pub states_code: String,
    pub population: i64,
}

/// Sum of population over every row of `year`.
pub fn total_population(table: &PopulationTable, year: i32) -> Result<i64> {
    let rows = table.rows_for_year(year)?;
    let total = sum_population(&rows)?;
    debug!(year, total, "total population");
    Ok(total)
}

/// Per-region totals in catalog order. Codes outside the catalog count
/// toward no region.
pub fn region_totals(
    table: &PopulationTable,
    year: i32,
    catalog: &RegionCatalog,
) -> Result<Vec<RegionTotal>> {
    let rows = table.rows_for_year(year)?;

    let mut totals = Vec::with_capacity(catalog.groups().len());
    for group in catalog.groups() {
        let codes = Series::new(STATES_CODE.into(), group.states.as_slice());
        let members = rows
            .clone()
            .lazy()
            .filter(col(STATES_CODE).is_in(lit(codes), false))
            .collect()?;

        totals.push(RegionTotal {
            region: group.name.clone(),
            population: sum_population(&members)?,
        });
    }

    debug!(year, regions = totals.len(), "region totals");
    Ok(totals)
}

/// The `n` most populous states of `year`, descending. Ties keep source
/// row order.
pub fn top_states(table: &PopulationTable, year: i32, n: usize) -> Result<Vec<StatePopulation>> {
    let rows = table.rows_for_year(year)?;

    let ranked = rows
        .lazy()
        .sort(
            [POPULATION],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .collect()?
        .head(Some(n));

    let top: Vec<StatePopulation> = records_of(&ranked)?
        .into_iter()
        .map(|r| StatePopulation {
            state: r.states,
            population: r.population,
        })
        .collect();

    debug!(year, n, returned = top.len(), "top states");
    Ok(top)
}

/// Population summed per year over the whole dataset, ascending by year.
pub fn national_trend(table: &PopulationTable) -> Result<Vec<TrendPoint>> {
    let grouped = table
        .frame()
        .clone()
        .lazy()
        .group_by([col(YEAR)])
        .agg([col(POPULATION).sum()])
        .sort([YEAR], SortMultipleOptions::default())
        .collect()?;

    let years = grouped.column(YEAR)?.i32()?;
    let sums = grouped.column(POPULATION)?.i64()?;

    let trend: Vec<TrendPoint> = years
        .into_iter()
        .zip(sums.into_iter())
        .filter_map(|(year, population)| {
            Some(TrendPoint {
                year: year?,
                population: population.unwrap_or(0),
            })
        })
        .collect();

    debug!(points = trend.len(), "national trend");
    Ok(trend)
}

/// Every row of `year` in source order, for map rendering.
pub fn state_values(table: &PopulationTable, year: i32) -> Result<Vec<StateValue>> {
    let rows = table.rows_for_year(year)?;
    Ok(records_of(&rows)?
        .into_iter()
        .map(|r| StateValue {
            state: r.states,
            states_code: r.states_code,
            population: r.population,
        })
        .collect())
}

/// Everything one dashboard render needs for a selected year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedSummary {
    pub year: i32,
    pub total_population: i64,
    pub region_totals: Vec<RegionTotal>,
    pub top_states: Vec<StatePopulation>,
    pub national_trend: Vec<TrendPoint>,
    pub state_values: Vec<StateValue>,
}

impl DerivedSummary {
    pub fn compute(
        table: &PopulationTable,
        year: i32,
        catalog: &RegionCatalog,
        top_n: usize,
    ) -> Result<Self> {
        Ok(Self {
            year,
            total_population: total_population(table, year)?,
            region_totals: region_totals(table, year, catalog)?,
            top_states: top_states(table, year, top_n)?,
            national_trend: national_trend(table)?,
            state_values: state_values(table, year)?,
        })
    }

    /// Population of rows whose code no region covers.
    pub fn uncovered_population(&self) -> i64 {
        self.total_population - self.region_totals.iter().map(|r| r.population).sum::<i64>()
    }
}

fn sum_population(rows: &DataFrame) -> Result<i64> {
    Ok(rows.column(POPULATION)?.i64()?.sum().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use crate::loader::parse_csv;
    use crate::regions::RegionGroup;

    fn example() -> (PopulationTable, RegionCatalog) {
        let table = parse_csv(
            b"year,states,states_code,population\n\
              2019,California,CA,39512223\n\
              2019,Texas,TX,28995881\n\
              2018,California,CA,39461588\n",
        )
        .unwrap();
        let catalog = RegionCatalog::new(vec![
            RegionGroup::new("West", ["CA"]),
            RegionGroup::new("South", ["TX"]),
        ])
        .unwrap();
        (table, catalog)
    }

    fn state(name: &str, population: i64) -> StatePopulation {
        StatePopulation {
            state: name.into(),
            population,
        }
    }

    #[test]
    fn two_state_example() {
        let (t, catalog) = example();

        assert_eq!(total_population(&t, 2019).unwrap(), 68508104);
        assert_eq!(
            region_totals(&t, 2019, &catalog).unwrap(),
            [
                RegionTotal {
                    region: "West".into(),
                    population: 39512223
                },
                RegionTotal {
                    region: "South".into(),
                    population: 28995881
                },
            ]
        );
        assert_eq!(
            top_states(&t, 2019, DEFAULT_TOP_N).unwrap(),
            [state("California", 39512223), state("Texas", 28995881)]
        );
        assert_eq!(
            national_trend(&t).unwrap(),
            [
                TrendPoint {
                    year: 2018,
                    population: 39461588
                },
                TrendPoint {
                    year: 2019,
                    population: 68508104
                },
            ]
        );
    }

    #[test]
    fn unknown_year_fails_loudly() {
        let (t, catalog) = example();
        assert!(matches!(total_population(&t, 2017), Err(DashboardError::InvalidYear(2017))));
        assert!(matches!(
            region_totals(&t, 2017, &catalog),
            Err(DashboardError::InvalidYear(2017))
        ));
        assert!(matches!(top_states(&t, 2017, 10), Err(DashboardError::InvalidYear(2017))));
        assert!(matches!(state_values(&t, 2017), Err(DashboardError::InvalidYear(2017))));
        assert!(DerivedSummary::compute(&t, 2017, &catalog, 10).is_err());
    }

    #[test]
    fn uncovered_codes_are_left_out_of_regions() {
        let t = parse_csv(
            b"year,states,states_code,population\n\
              2019,California,CA,10\n\
              2019,Puerto Rico,PR,3\n",
        )
        .unwrap();
        let catalog = RegionCatalog::census();

        let regions = region_totals(&t, 2019, &catalog).unwrap();
        let west = regions.iter().find(|r| r.region == "West").unwrap();
        assert_eq!(west.population, 10);
        assert_eq!(regions.iter().map(|r| r.population).sum::<i64>(), 10);
        assert_eq!(total_population(&t, 2019).unwrap(), 13);

        let summary = DerivedSummary::compute(&t, 2019, &catalog, 10).unwrap();
        assert_eq!(summary.uncovered_population(), 3);
        assert_eq!(
            catalog.uncovered_codes(&t).unwrap().into_iter().collect::<Vec<_>>(),
            ["PR"]
        );
    }

    #[test]
    fn empty_regions_report_zero() {
        let (t, _) = example();
        let regions = region_totals(&t, 2018, &RegionCatalog::census()).unwrap();
        let names: Vec<&str> = regions.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(names, ["Northeast", "Midwest", "South", "West"]);
        assert_eq!(regions[0].population, 0);
        assert_eq!(regions[3].population, 39461588);
    }

    #[test]
    fn top_states_ties_keep_source_order() {
        let t = parse_csv(
            b"year,states,states_code,population\n\
              2019,Alpha,AA,5\n\
              2019,Bravo,BB,9\n\
              2019,Charlie,CC,5\n\
              2019,Delta,DD,5\n\
              2019,Echo,EE,1\n",
        )
        .unwrap();

        assert_eq!(
            top_states(&t, 2019, 3).unwrap(),
            [state("Bravo", 9), state("Alpha", 5), state("Charlie", 5)]
        );
        assert_eq!(top_states(&t, 2019, 10).unwrap().len(), 5);
        assert!(top_states(&t, 2019, 0).unwrap().is_empty());
    }

    #[test]
    fn duplicate_rows_are_summed() {
        let t = parse_csv(
            b"year,states,states_code,population\n\
              2019,Texas,TX,10\n\
              2019,Texas,TX,15\n",
        )
        .unwrap();
        assert_eq!(total_population(&t, 2019).unwrap(), 25);
        assert_eq!(
            region_totals(&t, 2019, &RegionCatalog::census()).unwrap()[2].population,
            25
        );
    }

    #[test]
    fn repeated_calls_are_identical() {
        let (t, catalog) = example();
        let first = DerivedSummary::compute(&t, 2019, &catalog, 10).unwrap();
        let second = DerivedSummary::compute(&t, 2019, &catalog, 10).unwrap();
        assert_eq!(first, second);
        assert_eq!(national_trend(&t).unwrap(), national_trend(&t).unwrap());
    }

    #[test]
    fn state_values_follow_source_order() {
        let (t, _) = example();
        let codes: Vec<String> = state_values(&t, 2019)
            .unwrap()
            .into_iter()
            .map(|v| v.states_code)
            .collect();
        assert_eq!(codes, ["CA", "TX"]);
    }
}
