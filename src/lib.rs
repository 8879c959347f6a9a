//! Mortality Comparison System - age-standardized mortality statistics for
//! a national population against its broader regional aggregate
//!
//! This library provides:
//! - Crude death rates per age class (per 100k, exact Poisson intervals)
//! - Direct standardization with Fay-Feuer gamma confidence intervals
//! - A sensitivity recomputation removing the national subset from the
//!   regional aggregate
//! - Kitagawa decomposition of the crude-rate gap into structure and rate
//!   effects
//!
//! Every computation is a pure, stateless transform over in-memory tables
//! keyed by age class, evaluated independently per (year, sex) stratum.

pub mod analysis;
pub mod error;
pub mod input;
pub mod kitagawa;
pub mod rates;
pub mod sensitivity;
pub mod standardize;
pub mod stratum;
pub mod table;

// Re-export commonly used types
pub use analysis::{AgeProfile, AnalysisResults, AnalysisRunner, StratumInputs};
pub use error::{AnalysisError, Result};
pub use kitagawa::{decompose, summarize_decomposition, KitagawaResult, KitagawaRow};
pub use rates::{death_rates, RateRow, PER_100K};
pub use sensitivity::{adjusted_aggregate, summarize_adjusted, AdjustedRow, SensitivityRates};
pub use standardize::{
    expected_deaths, summarize, ExpectedRow, ExpectedSide, PopulationSummary, RateCi,
    StandardizedRates, DEFAULT_ALPHA,
};
pub use stratum::{Sex, Stratum};
pub use table::{join_on_age, AgeKeyed, DeathsRow, PopulationRow, StandardPopulationRow};
