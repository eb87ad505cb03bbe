use std::path::PathBuf;
use std::sync::Arc;

use population_dashboard::{
    national_trend, region_totals, top_states, total_population, DatasetLoader, PopulationTable,
    RegionCatalog, DEFAULT_TOP_N,
};

fn fixture() -> Arc<PopulationTable> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("us-population-sample.csv");
    DatasetLoader::from_path(path).load().expect("load fixture")
}

#[test]
fn regions_partition_the_covered_population() {
    let table = fixture();
    let catalog = RegionCatalog::census();

    for &year in table.distinct_years() {
        let total = total_population(&table, year).unwrap();
        let regional: i64 = region_totals(&table, year, &catalog)
            .unwrap()
            .iter()
            .map(|r| r.population)
            .sum();
        let uncovered: i64 = table
            .records()
            .unwrap()
            .iter()
            .filter(|r| r.year == year && catalog.region_of(&r.states_code).is_none())
            .map(|r| r.population)
            .sum();

        assert!(uncovered > 0, "fixture carries a territory outside the catalog");
        assert_eq!(total, regional + uncovered, "year {year}");
    }
}

#[test]
fn top_states_are_the_largest() {
    let table = fixture();

    for &year in table.distinct_years() {
        let rows: Vec<_> = table
            .records()
            .unwrap()
            .into_iter()
            .filter(|r| r.year == year)
            .collect();
        let top = top_states(&table, year, DEFAULT_TOP_N).unwrap();

        assert_eq!(top.len(), DEFAULT_TOP_N.min(rows.len()));
        assert!(top.windows(2).all(|w| w[0].population >= w[1].population));

        let smallest_included = top.last().unwrap().population;
        let excluded = rows
            .iter()
            .filter(|r| !top.iter().any(|t| t.state == r.states));
        for row in excluded {
            assert!(row.population <= smallest_included, "{} should rank", row.states);
        }
    }
}

#[test]
fn trend_has_one_ascending_point_per_year() {
    let table = fixture();
    let trend = national_trend(&table).unwrap();

    let years: Vec<i32> = trend.iter().map(|p| p.year).collect();
    assert_eq!(years, table.distinct_years().iter().copied().collect::<Vec<_>>());
    assert!(years.windows(2).all(|w| w[0] < w[1]));

    for point in &trend {
        assert_eq!(point.population, total_population(&table, point.year).unwrap());
    }
}

#[test]
fn fixture_totals() {
    let table = fixture();
    assert_eq!(table.year_choices(), [2019, 2018, 2017]);
    assert_eq!(total_population(&table, 2019).unwrap(), 199_293_950);

    let top = top_states(&table, 2019, 3).unwrap();
    let names: Vec<&str> = top.iter().map(|s| s.state.as_str()).collect();
    assert_eq!(names, ["California", "Texas", "Florida"]);

    let regions = region_totals(&table, 2019, &RegionCatalog::census()).unwrap();
    assert_eq!(regions.iter().map(|r| r.population).sum::<i64>(), 196_100_256);
}
