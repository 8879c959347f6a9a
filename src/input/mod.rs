//! Input loading: CSV parsing and age-label canonicalization

pub mod labels;
pub mod loader;

pub use labels::{canonical_age_class, EUROSTAT_AGE_LABELS, ISTAT_AGE_LABELS};
pub use loader::{
    deaths_for_year, load_eurostat_deaths, load_eurostat_population, load_istat_deaths,
    load_istat_population, load_standard_population, parse_eurostat_deaths,
    parse_eurostat_population, parse_istat_deaths, parse_istat_population,
    parse_standard_population, PopulationBySex, YearlyDeaths,
};
