//! Direct standardization of crude rates onto a standard population
//!
//! Given the national and regional rate tables and a standard reference
//! population (e.g. ESP2013), this module computes expected deaths per age
//! class and aggregates them into crude and age-standardized rates with 95%
//! confidence intervals per stratum. Crude intervals use the exact Poisson
//! (gamma) method; standardized intervals use the Fay-Feuer gamma method.

mod ci;
mod expected;
mod summary;

pub use ci::{fay_feuer_interval, poisson_interval, DEFAULT_ALPHA};
pub use expected::{expected_deaths, ExpectedRow, ExpectedSide};
pub use summary::{summarize, PopulationSummary, RateCi, StandardizedRates};

pub(crate) use summary::{population_summary, AgeContribution};
