/// Column-name constants for the population dataset and derived frames.
/// Single source of truth - exported to Python via PyO3.

// ── Source record columns ───────────────────────────────────────────────────
pub mod record {
    pub const YEAR: &str = "year";
    pub const STATES: &str = "states";
    pub const STATES_CODE: &str = "states_code";
    pub const POPULATION: &str = "population";

    pub const REQUIRED: [&str; 4] = [YEAR, STATES, STATES_CODE, POPULATION];
}

// ── Derived summary columns ─────────────────────────────────────────────────
pub mod summary {
    pub const REGION: &str = "region";
    pub const STATE: &str = "state";
    pub const YEAR: &str = "year";
    pub const POPULATION: &str = "population";
}
